pub mod schema;

pub use schema::{
    Config, GeneratorConfig, MentorConfig, PolicyConfig, ReliabilityConfig, SanitizerConfig,
    SessionConfig,
};
