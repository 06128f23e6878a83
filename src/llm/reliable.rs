use super::traits::Generator;
use super::types::ChatMessage;
use crate::config::ReliabilityConfig;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

const STATUS_MARKER: &str = "API error (";

/// Check if an error is non-retryable (client errors that won't resolve with retries).
fn is_non_retryable(err: &anyhow::Error) -> bool {
    let msg = err.to_string();
    if is_missing_credentials(&msg) || is_quota_exhausted(&msg) {
        return true;
    }

    if let Some(reqwest_err) = err.downcast_ref::<reqwest::Error>()
        && let Some(status) = reqwest_err.status()
    {
        let code = status.as_u16();
        return status.is_client_error() && code != 429 && code != 408;
    }

    // Generators format HTTP failures as "... API error (401 Unauthorized): ...".
    msg.find(STATUS_MARKER)
        .and_then(|idx| msg.get(idx + STATUS_MARKER.len()..idx + STATUS_MARKER.len() + 3))
        .and_then(|code| code.parse::<u16>().ok())
        .is_some_and(|code| (400..500).contains(&code) && code != 429 && code != 408)
}

fn is_missing_credentials(message: &str) -> bool {
    message.contains("API key not set")
}

fn is_quota_exhausted(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("insufficient_quota")
        || lower.contains("exceeded your current quota")
        || lower.contains("billing")
}

/// Generator wrapper with retry + fallback behavior.
pub struct ReliableGenerator {
    generators: Vec<(String, Box<dyn Generator>)>,
    max_retries: u32,
    base_backoff_ms: u64,
}

impl ReliableGenerator {
    pub fn new(
        generators: Vec<(String, Box<dyn Generator>)>,
        max_retries: u32,
        base_backoff_ms: u64,
    ) -> Self {
        Self {
            generators,
            max_retries,
            base_backoff_ms: base_backoff_ms.max(50),
        }
    }

    pub fn from_config(generator: Box<dyn Generator>, reliability: &ReliabilityConfig) -> Self {
        let name = generator.name().to_string();
        Self::new(
            vec![(name, generator)],
            reliability.generator_retries,
            reliability.generator_backoff_ms,
        )
    }
}

impl Generator for ReliableGenerator {
    fn name(&self) -> &str {
        self.generators
            .first()
            .map_or("reliable", |(name, _)| name.as_str())
    }

    fn warmup(&self) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        Box::pin(async move {
            for (name, generator) in &self.generators {
                if let Err(e) = generator.warmup().await {
                    tracing::warn!(generator = name.as_str(), "Warmup failed (non-fatal): {e}");
                }
            }
            Ok(())
        })
    }

    fn generate<'a>(
        &'a self,
        system_prompt: &'a str,
        messages: &'a [ChatMessage],
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let mut failures = Vec::new();

            for (generator_name, generator) in &self.generators {
                let mut backoff_ms = self.base_backoff_ms;

                for attempt in 0..=self.max_retries {
                    match generator.generate(system_prompt, messages).await {
                        Ok(text) => {
                            if attempt > 0 {
                                tracing::info!(
                                    generator = generator_name.as_str(),
                                    attempt,
                                    "Generator recovered after retries"
                                );
                            }
                            return Ok(text);
                        }
                        Err(e) => {
                            let non_retryable = is_non_retryable(&e);
                            failures.push(format!(
                                "{generator_name} attempt {}/{}: {e}",
                                attempt + 1,
                                self.max_retries + 1
                            ));

                            if non_retryable {
                                tracing::warn!(
                                    generator = generator_name.as_str(),
                                    "Non-retryable error, switching generator"
                                );
                                break;
                            }

                            if attempt < self.max_retries {
                                tracing::warn!(
                                    generator = generator_name.as_str(),
                                    attempt = attempt + 1,
                                    max_retries = self.max_retries,
                                    "Generator call failed, retrying"
                                );
                                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                                backoff_ms = (backoff_ms.saturating_mul(2)).min(10_000);
                            }
                        }
                    }
                }
            }

            anyhow::bail!("All generators failed. Attempts:\n{}", failures.join("\n"))
        })
    }
}
