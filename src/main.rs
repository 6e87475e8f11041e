//! Command line front end for the club tournament engine
//!
//! Reads players and matches as JSON files, runs one engine operation and
//! prints the result as JSON on stdout. Logs go to stderr.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use club_tournament::config::AppConfig;
use club_tournament::matches::{head_to_head, MatchProcessor};
use club_tournament::pairing::{PairingGenerator, PairingOptions};
use club_tournament::ranking::{EventStatistics, RankingAggregator};
use club_tournament::utils::{current_timestamp, parse_timestamp};
use club_tournament::{Match, PairHistory, Player, RankingEntry, ScoreSubmission};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Club Tournament Engine - ratings, standings and Swiss pairings
#[derive(Parser)]
#[command(
    name = "club-tournament",
    version,
    about = "Rating, ranking and Swiss pairing engine for club tournaments",
    long_about = "Processes match results into Elo rating and category changes, builds \
                 deterministic standings and generates Swiss-style rounds that avoid recent \
                 rematches. All records are exchanged as JSON files."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        global = true,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, global = true, help = "Enable debug mode with verbose logging")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a reported score to a pending match
    Process {
        /// Pending match (JSON)
        #[arg(long = "match", value_name = "FILE")]
        match_file: PathBuf,
        #[arg(long, allow_negative_numbers = true)]
        player1_score: i64,
        #[arg(long, allow_negative_numbers = true)]
        player2_score: i64,
        /// Earlier matches of the event, for direct-meeting tie-breaks (JSON array)
        #[arg(long, value_name = "FILE")]
        history: Option<PathBuf>,
        /// Submission time (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<String>,
    },

    /// Record a forfeit on a pending match
    Forfeit {
        #[arg(long = "match", value_name = "FILE")]
        match_file: PathBuf,
        /// Id of the forfeiting player
        #[arg(long)]
        player: String,
        #[arg(long, default_value = "forfeit")]
        reason: String,
        #[arg(long, value_name = "FILE")]
        history: Option<PathBuf>,
        #[arg(long)]
        at: Option<String>,
    },

    /// Compute standings
    Rank {
        /// Matches (JSON array)
        #[arg(long, value_name = "FILE")]
        matches: PathBuf,
        /// Roster (JSON array)
        #[arg(long, value_name = "FILE")]
        players: PathBuf,
        /// Restrict to one round
        #[arg(long)]
        round: Option<u32>,
        /// Print event statistics instead of standings
        #[arg(long)]
        stats: bool,
    },

    /// Generate a round of pairings
    Pair {
        #[arg(long, value_name = "FILE")]
        players: PathBuf,
        /// Earlier matches of the event (JSON array)
        #[arg(long, value_name = "FILE")]
        matches: Option<PathBuf>,
        /// Standings after the previous round (JSON array)
        #[arg(long, value_name = "FILE")]
        standings: Option<PathBuf>,
        #[arg(long)]
        event: String,
        #[arg(long)]
        round: u32,
        /// Shuffle the first round with this seed
        #[arg(long)]
        seed: Option<u64>,
        /// Schedule time (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<String>,
    },

    /// Summarize the direct meetings between two players
    HeadToHead {
        /// Matches (JSON array)
        #[arg(long, value_name = "FILE")]
        matches: PathBuf,
        #[arg(long)]
        player_a: String,
        #[arg(long)]
        player_b: String,
    },

    /// Validate configuration and exit
    CheckConfig,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    club_tournament::config::validate_config(&config)?;
    Ok(config)
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

async fn read_optional<T: DeserializeOwned + Default>(path: Option<&PathBuf>) -> Result<T> {
    match path {
        Some(path) => read_json(path).await,
        None => Ok(T::default()),
    }
}

fn timestamp(at: Option<&str>) -> Result<DateTime<Utc>> {
    at.map(parse_timestamp)
        .transpose()
        .map(|ts| ts.unwrap_or_else(current_timestamp))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(command: Command, config: AppConfig) -> Result<()> {
    match command {
        Command::Process {
            match_file,
            player1_score,
            player2_score,
            history,
            at,
        } => {
            let processor = MatchProcessor::from_config(&config)?;
            let current: Match = read_json(&match_file).await?;
            let history: Vec<Match> = read_optional(history.as_ref()).await?;
            let submission =
                ScoreSubmission::new(player1_score, player2_score, timestamp(at.as_deref())?);

            let processed = processor.process(&current, &submission, &history)?;
            print_json(&processed)
        }

        Command::Forfeit {
            match_file,
            player,
            reason,
            history,
            at,
        } => {
            let processor = MatchProcessor::from_config(&config)?;
            let current: Match = read_json(&match_file).await?;
            let history: Vec<Match> = read_optional(history.as_ref()).await?;

            let processed = processor.process_forfeit(
                &current,
                &player,
                &reason,
                timestamp(at.as_deref())?,
                &history,
            )?;
            print_json(&processed)
        }

        Command::Rank {
            matches,
            players,
            round,
            stats,
        } => {
            let matches: Vec<Match> = read_json(&matches).await?;
            let players: Vec<Player> = read_json(&players).await?;

            if stats {
                let summary = EventStatistics::compute(&matches, &players, &config.categories);
                return print_json(&summary);
            }

            let aggregator = RankingAggregator::new(config.scoring.clone());
            let standings = match round {
                Some(round) => aggregator.aggregate_round(&matches, &players, round),
                None => aggregator.aggregate(&matches, &players),
            };
            print_json(&standings)
        }

        Command::Pair {
            players,
            matches,
            standings,
            event,
            round,
            seed,
            at,
        } => {
            let players: Vec<Player> = read_json(&players).await?;
            let matches: Vec<Match> = read_optional(matches.as_ref()).await?;
            let standings: Option<Vec<RankingEntry>> = match standings {
                Some(path) => Some(read_json(&path).await?),
                None => None,
            };

            let options = PairingOptions {
                event_id: event,
                is_first_round: round <= 1,
                previous_standings: standings,
                random_seed: seed,
                scheduled_at: timestamp(at.as_deref())?,
            };
            let history = PairHistory::from_matches(&matches);
            let generator = PairingGenerator::new(config.pairing.clone(), config.scoring.clone());

            let pairing = generator.generate_round(&players, &history, round, &options);
            for message in pairing.warning_messages() {
                info!("{}", message);
            }
            print_json(&pairing)
        }

        Command::HeadToHead {
            matches,
            player_a,
            player_b,
        } => {
            let matches: Vec<Match> = read_json(&matches).await?;
            print_json(&head_to_head(&matches, &player_a, &player_b))
        }

        Command::CheckConfig => {
            info!("Configuration validation successful");
            print_json(&config)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("{} v{}", config.service.name, club_tournament::VERSION);

    if let Err(e) = run(args.command, config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
