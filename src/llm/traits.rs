use super::types::ChatMessage;
use std::future::Future;
use std::pin::Pin;

/// Text generation capability the turn pipeline delegates phrasing to.
///
/// Latency, timeouts and retries belong to the implementation; callers treat
/// any error as "retry the same turn".
pub trait Generator: Send + Sync {
    /// Generator identifier (e.g. "openrouter").
    fn name(&self) -> &str;

    fn generate<'a>(
        &'a self,
        system_prompt: &'a str,
        messages: &'a [ChatMessage],
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>>;

    /// Optional pre-flight before the first turn.
    fn warmup(&self) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        Box::pin(async move { Ok(()) })
    }
}
