use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `Mentorflow` - phase-driven guided conversations for multi-day coaching.
#[derive(Parser, Debug)]
#[command(name = "mentorflow")]
#[command(version = "0.1.0")]
#[command(about = "Phase-driven guided conversations for multi-day LLM coaching.", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.mentorflow/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log decisions and prompts at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the action distribution a mentor style/tone resolves to
    Profile {
        /// Mentor style (gentle, socratic, coach, witness); defaults to config
        #[arg(long)]
        style: Option<String>,

        /// Mentor tone (warm, direct, playful, calm); defaults to config
        #[arg(long)]
        tone: Option<String>,
    },

    /// Run the decision layer offline over a scripted list of user messages
    Simulate {
        /// Seed for the action draw
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// The day's task
        #[arg(long)]
        task: String,

        /// The day's goal
        #[arg(long)]
        goal: String,

        /// Day number shown in the prompt
        #[arg(long, default_value_t = 1)]
        day: u32,

        /// Print the compiled prompt for every turn
        #[arg(long)]
        show_prompt: bool,

        /// User messages, one per turn
        #[arg(required = true)]
        messages: Vec<String>,
    },

    /// Talk to the configured generator for one day, state kept on disk
    Chat {
        /// Participant identifier used for the state file
        #[arg(long, default_value = "local")]
        participant: String,

        /// Name the mentor addresses the participant by
        #[arg(long)]
        name: Option<String>,

        /// Day number within the journey
        #[arg(long, default_value_t = 1)]
        day: u32,

        /// The day's task
        #[arg(long)]
        task: String,

        /// The day's goal
        #[arg(long)]
        goal: String,
    },
}
