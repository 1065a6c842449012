//! rytm - play declarative chains from YAML scores.
//!
//! Usage:
//!   rytm play <SCORE>    Run a score until its last beat has played
//!   rytm check <SCORE>   Validate a score and list its beats

use clap::{Parser, Subcommand};
use rytm::{BeatConfig, Step, TokioHost, YamlLoader};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::LocalSet;
use tracing::{error, info};

/// rytm - continuation chaining playground
#[derive(Parser)]
#[command(name = "rytm")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a score until its last beat has played
    Play {
        /// Path to the score YAML file
        #[arg(value_name = "SCORE")]
        score: PathBuf,

        /// Give up after this many milliseconds (default: wait forever)
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Validate a score without running it
    Check {
        /// Path to the score YAML file
        #[arg(value_name = "SCORE")]
        score: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play { score, timeout_ms } => {
            play(score, timeout_ms).await?;
        }
        Commands::Check { score } => {
            check(score)?;
        }
    }

    Ok(())
}

/// Play a score on the tokio host.
async fn play(path: PathBuf, timeout_ms: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    info!("Loading score from: {}", path.display());
    let score = YamlLoader::load_score(&path)?;

    let local = LocalSet::new();
    local
        .run_until(async move {
            let chain = score.build(Rc::new(TokioHost));
            let done = Rc::new(Notify::new());
            {
                let done = done.clone();
                chain.append_labeled("finish", move |_, _| {
                    done.notify_one();
                    Step::Suspend
                });
            }

            info!("Playing '{}' ({} beat(s))", chain.name(), score.beats.len());
            let started = tokio::time::Instant::now();
            chain.go();

            match timeout_ms {
                Some(ms) => {
                    if tokio::time::timeout(Duration::from_millis(ms), done.notified())
                        .await
                        .is_err()
                    {
                        error!("Score did not finish within {}ms", ms);
                        return Err(format!("timed out after {}ms", ms).into());
                    }
                }
                None => done.notified().await,
            }

            info!("Finished in {:?}", started.elapsed());
            Ok::<(), Box<dyn std::error::Error>>(())
        })
        .await
}

/// Validate a score and print its beats.
fn check(path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let score = match YamlLoader::load_score(&path) {
        Ok(score) => score,
        Err(e) => {
            error!("Validation failed: {}", e);
            return Err(e.into());
        }
    };

    println!("Score '{}': OK", score.chain.name);
    println!("  Arm joins: {}", score.chain.arm_joins);
    println!("  Beats:");
    for (i, beat) in score.beats.iter().enumerate() {
        let detail = match beat {
            BeatConfig::Log(text) => text.clone(),
            BeatConfig::Wait(ms) => format!("{}ms", ms),
            BeatConfig::All(delays) | BeatConfig::Once(delays) => format!("{:?}ms", delays),
            BeatConfig::Emit(value) => value.to_string(),
        };
        println!("    {}. {} {}", i + 1, beat.kind(), detail);
    }

    Ok(())
}
