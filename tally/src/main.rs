//! Tally binary
//!
//! Line-oriented front end: each line typed at the prompt is one intent.
//! Press enter to count, `help` for everything else.

use anyhow::Context;
use chrono::Local;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tally::intent::HELP;
use tally::{
    FileSlotStore, HistoryRepository, Intent, Screen, TallyAction, TallyConfig, TallyEnvironment,
    TallyReducer, TallyState,
};
use tally_core::environment::SystemClock;
use tally_core::feedback::{FeedbackSignal, NoFeedback};
use tally_core::storage::SlotStore;
use tally_runtime::Store;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type TallyStore = Store<TallyState, TallyAction, TallyEnvironment, TallyReducer>;

/// Rings the terminal bell on every tap
struct TerminalBell;

impl FeedbackSignal for TerminalBell {
    fn pulse(&self, _duration: Duration) {
        let mut stderr = std::io::stderr();
        // a missing terminal is not worth reporting
        let _ = stderr.write_all(b"\x07").and_then(|()| stderr.flush());
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = TallyConfig::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let slots = FileSlotStore::open(&config.data_dir)
        .with_context(|| format!("cannot open data directory {}", config.data_dir.display()))?;
    tracing::info!(dir = %slots.root().display(), key = %config.storage_key, "Starting tally");

    let slots: Arc<dyn SlotStore> = Arc::new(slots);
    let repository = HistoryRepository::new(slots, config.storage_key.clone());
    let state = TallyState::hydrate(&repository, config.default_step);

    let feedback: Arc<dyn FeedbackSignal> = if config.feedback_ms == 0 {
        Arc::new(NoFeedback)
    } else {
        Arc::new(TerminalBell)
    };
    let env = TallyEnvironment::new(Arc::new(SystemClock), repository, feedback)
        .with_settings(config.settings());
    let store = Store::new(state, TallyReducer::new(), env);

    run(&store).await?;

    tracing::info!("Bye");
    Ok(())
}

async fn run(store: &TallyStore) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    render(store).await?;

    while let Some(line) = lines.next_line().await? {
        match Intent::parse(&line) {
            Ok(Intent::Quit) => break,
            Ok(Intent::Help) => {
                println!("{HELP}");
                prompt()?;
                continue;
            },
            Ok(Intent::ClearHistory) => {
                if store.state(|s| s.history.is_empty()).await {
                    println!("Nothing to clear.");
                } else if confirm(&mut lines).await? {
                    store.send(TallyAction::ClearHistory).await?;
                }
            },
            Ok(Intent::Dispatch(action)) => store.send(action).await?,
            Err(error) => {
                println!("{error}");
                prompt()?;
                continue;
            },
        }
        render(store).await?;
    }

    Ok(())
}

async fn confirm(lines: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<bool> {
    print!("Delete all counter logs? This cannot be undone. [y/N] ");
    std::io::stdout().flush()?;
    let answer = lines.next_line().await?.unwrap_or_default();
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

async fn render(store: &TallyStore) -> anyhow::Result<()> {
    let screen = store.state(|s| Screen::project(s, &Local)).await;
    println!("\n{screen}");
    prompt()
}

fn prompt() -> anyhow::Result<()> {
    print!("> ");
    std::io::stdout().flush()?;
    Ok(())
}
