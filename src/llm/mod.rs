// ── Infrastructure ───────────────────────────────────────────────────────────
pub mod http_client;
pub mod postprocess;
pub mod scrub;
pub mod traits;
pub mod types;

// ── Decorator layers ────────────────────────────────────────────────────────
pub mod reliable;

// ── Generator implementations ───────────────────────────────────────────────
pub mod compatible;

pub use http_client::build_generator_client_with_timeout;
pub use postprocess::{ResponseSanitizer, post_process, trim_to_word_budget};
pub use scrub::{sanitize_api_error, scrub_secret_patterns};
pub use traits::Generator;
pub use types::{ChatMessage, MessageRole, recent_window};

pub use compatible::OpenAiCompatibleGenerator;
pub use reliable::ReliableGenerator;
