use crate::app::simulate::run_simulation;
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::conversation::{DayPlan, resolve_mentor_profile};
use crate::llm::{ChatMessage, Generator, OpenAiCompatibleGenerator, ReliableGenerator};
use crate::session::{JsonFileStateStore, SessionKey, TurnEngine, TurnRequest};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Profile { style, tone } => {
            let style = style.unwrap_or_else(|| config.mentor.style.clone());
            let tone = tone.or_else(|| config.mentor.tone.clone());
            let profile = resolve_mentor_profile(&style, tone.as_deref());
            println!(
                "{}",
                serde_json::to_string_pretty(&profile).context("failed to render profile")?
            );
            Ok(())
        }

        Commands::Simulate {
            seed,
            task,
            goal,
            day,
            show_prompt,
            messages,
        } => {
            let plan = DayPlan::new(task, goal);
            for turn in run_simulation(&config, &plan, day, &messages, seed) {
                println!(
                    "{}",
                    serde_json::to_string(&turn).context("failed to render turn")?
                );
                if show_prompt {
                    println!("{}\n", turn.prompt);
                }
            }
            Ok(())
        }

        Commands::Chat {
            participant,
            name,
            day,
            task,
            goal,
        } => {
            let key = SessionKey::new(&participant, day);
            let display_name = name.unwrap_or(participant);
            run_chat(&config, key, display_name, DayPlan::new(task, goal)).await
        }
    }
}

async fn run_chat(
    config: &Config,
    key: SessionKey,
    participant_name: String,
    day: DayPlan,
) -> Result<()> {
    let primary = OpenAiCompatibleGenerator::from_config(&config.generator);
    let generator: Arc<dyn Generator> = Arc::new(ReliableGenerator::from_config(
        Box::new(primary),
        &config.reliability,
    ));
    generator.warmup().await?;

    let store = Arc::new(JsonFileStateStore::new(config.state_dir()));
    info!(key = %key, state_dir = %store.dir().display(), "Starting chat");
    let engine = TurnEngine::from_config(config, generator, store);

    if engine.state(&key).await?.is_some_and(|state| state.day_complete) {
        println!("Day {} is already complete.", key.day_number);
        return Ok(());
    }

    println!("Day {}. Type /quit to leave.", key.day_number);
    let mut history: Vec<ChatMessage> = Vec::new();
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut rng = rand::rng();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" || line == "/exit" {
            break;
        }

        let request = TurnRequest {
            user_text: line.clone(),
            recent_turns: history.clone(),
            participant_name: participant_name.clone(),
            day: day.clone(),
        };
        match engine.run_turn(&key, request, &mut rng).await {
            Ok(outcome) => {
                println!("{}", outcome.reply);
                history.push(ChatMessage::user(line));
                history.push(ChatMessage::assistant(outcome.reply));
                if outcome.day_complete {
                    println!("\nDay {} complete.", key.day_number);
                    break;
                }
            }
            Err(e) if e.is_retryable_turn() => {
                warn!("Turn failed, nothing was saved: {e}");
                println!("(the mentor could not answer; send the message again)");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
