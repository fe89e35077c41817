use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::GlobalOpts;

#[derive(Parser)]
#[command(name = "dayflow", version, about = "Dayflow day planner CLI")]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Time block management
    Block {
        #[command(subcommand)]
        action: commands::block::BlockAction,
    },
    /// Free time on the current day
    Gap {
        #[command(subcommand)]
        action: commands::gap::GapAction,
    },
    /// Chain library and placement
    Chain {
        #[command(subcommand)]
        action: commands::chain::ChainAction,
    },
    /// Pillars and due tracking
    Pillar {
        #[command(subcommand)]
        action: commands::pillar::PillarAction,
    },
    /// Reconstruct a day from its gaps
    Backfill(commands::backfill::BackfillArgs),
    /// AI suggestion routing and approval
    Suggest {
        #[command(subcommand)]
        action: commands::suggest::SuggestAction,
    },
    /// Current day selection
    Day {
        #[command(subcommand)]
        action: commands::day::DayAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("DAYFLOW_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Block { action } => commands::block::run(&cli.global, action),
        Commands::Gap { action } => commands::gap::run(&cli.global, action),
        Commands::Chain { action } => commands::chain::run(&cli.global, action),
        Commands::Pillar { action } => commands::pillar::run(&cli.global, action),
        Commands::Backfill(args) => commands::backfill::run(&cli.global, args),
        Commands::Suggest { action } => commands::suggest::run(&cli.global, action),
        Commands::Day { action } => commands::day::run(&cli.global, action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
