//! Pharos CLI binary.
//!
//! Runs the discovery engine over a JSON content fixture, for trying the
//! library end to end without external services.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use pharos::compliance::ViewerContext;
use pharos::config::DiscoveryConfig;
use pharos::content::{ContentItem, UserProfile};
use pharos::engine::{Discovery, DiscoveryEngine, DiscoveryRequest};
use pharos::store::InteractionEvent;

#[derive(Parser)]
#[command(name = "pharos", version, about = "Content discovery engine CLI")]
struct PharosArgs {
    /// Path to a JSON fixture with items, profiles, and interactions.
    #[arg(long, global = true, default_value = "fixture.json")]
    fixture: PathBuf,

    /// Increase verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search the fixture content.
    Search {
        /// Query text.
        query: String,
        /// Requesting user id.
        #[arg(long)]
        user: Option<String>,
        /// Maximum results.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Show the current trending list.
    Trending {
        /// Maximum results.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Blended recommendations for a user.
    Recommend {
        /// User id.
        user: String,
        /// Maximum results.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// The no-query explore surface.
    Explore {
        /// Requesting user id.
        #[arg(long)]
        user: Option<String>,
    },
}

/// On-disk fixture format.
#[derive(Deserialize)]
struct Fixture {
    items: Vec<ContentItem>,
    #[serde(default)]
    profiles: Vec<UserProfile>,
    #[serde(default)]
    interactions: Vec<InteractionEvent>,
}

#[tokio::main]
async fn main() {
    let args = PharosArgs::parse();

    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    if let Err(e) = run(args).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(args: PharosArgs) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.fixture)?;
    let fixture: Fixture = serde_json::from_str(&raw)?;

    let engine = DiscoveryEngine::in_memory(
        DiscoveryConfig::default(),
        fixture.items,
        fixture.profiles,
        fixture.interactions,
    )?;

    // Populate the trending store once so every surface has records.
    let stats = engine.run_trending_pass();
    tracing::info!(
        candidates = stats.candidates,
        stored = stats.stored,
        "trending pass complete"
    );

    match args.command {
        Command::Search { query, user, limit } => {
            let mut request = DiscoveryRequest::new(query).with_page(pharos::response::PageRequest {
                cursor: None,
                limit,
            });
            if let Some(user) = user {
                request = request.with_user(user);
            }

            match engine.discover(&request).await? {
                Discovery::Ranked(response) => print_json(&response)?,
                Discovery::Browse(response) => print_json(&response)?,
            }
        }
        Command::Trending { limit } => {
            let response = engine.trending(&ViewerContext::anonymous(), limit)?;
            print_json(&response)?;
        }
        Command::Recommend { user, limit } => {
            let response = engine
                .recommend(&user, &ViewerContext::anonymous(), limit)
                .await?;
            print_json(&response)?;
        }
        Command::Explore { user } => {
            let mut request = DiscoveryRequest::new("");
            if let Some(user) = user {
                request = request.with_user(user);
            }
            let response = engine.explore(&request)?;
            print_json(&response)?;
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
