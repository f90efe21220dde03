//! callbench - load-testing client for the Loop call-signaling service

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use callbench::config::Config;
use callbench::estimate::{self, UsageInputs};
use callbench::scenario;
use callbench::signaling::handlers::Variant;

#[derive(Parser)]
#[command(name = "callbench")]
#[command(about = "Load-testing client for the Loop call-signaling service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the service under test (overrides config file)
    #[arg(short, long, global = true)]
    server: Option<String>,

    /// Simple-push URL sent at registration (overrides config file)
    #[arg(long, global = true)]
    push_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Which call-progress scenario to run.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CallVariant {
    /// Full negotiation: both legs must reach connected
    Basic,
    /// No callee ever joins; expect terminated/timeout
    SupervisoryTimeout,
    /// Callee joins but never accepts; expect terminated/timeout
    RingingTimeout,
    /// Accept happens but media-up stalls; expect terminated/timeout
    ConnectionTimeout,
}

impl From<CallVariant> for Variant {
    fn from(variant: CallVariant) -> Self {
        match variant {
            CallVariant::Basic => Variant::Basic,
            CallVariant::SupervisoryTimeout => Variant::SupervisoryTimeout,
            CallVariant::RingingTimeout => Variant::RingingTimeout,
            CallVariant::ConnectionTimeout => Variant::ConnectionTimeout,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run one call scenario iteration end to end
    Call {
        /// Scenario variant
        #[arg(long, value_enum, default_value = "basic")]
        variant: CallVariant,
    },

    /// HTTP-only churn: set up calls, reject a fraction, verify statuses
    Churn,

    /// Room scenario: N participants join/refresh/leave with random behavior
    Room {
        /// Number of simulated participants
        #[arg(short, long, default_value = "4")]
        participants: u32,
    },

    /// Estimate server storage usage for a given load profile
    Estimate {
        /// Number of registered users
        users: u64,

        /// Average calls per user per day
        daily_calls: u64,

        /// Call-URL revocations per month
        #[arg(default_value = "0")]
        monthly_revocations: u64,

        /// Number of active rooms
        #[arg(long, default_value = "0")]
        rooms: u64,

        /// Average participants per room
        #[arg(long, default_value = "0")]
        participants_per_room: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = Config::load()?.with_overrides(cli.server, cli.push_url);

    match cli.command {
        Commands::Call { variant } => {
            tracing::info!(?variant, server = %config.server_url, "running call scenario");
            scenario::run_call_scenario(&config, variant.into()).await?;
        }
        Commands::Churn => {
            tracing::info!(server = %config.server_url, "running churn scenario");
            scenario::run_churn_scenario(&config).await?;
        }
        Commands::Room { participants } => {
            tracing::info!(participants, server = %config.server_url, "running room scenario");
            scenario::run_room_scenario(&config, participants).await?;
        }
        Commands::Estimate {
            users,
            daily_calls,
            monthly_revocations,
            rooms,
            participants_per_room,
        } => {
            let inputs = UsageInputs {
                users,
                daily_calls,
                monthly_revocations,
                rooms,
                participants_per_room,
            };
            println!("{}", estimate::report(&inputs));
        }
    }

    Ok(())
}
