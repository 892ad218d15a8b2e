//! vocadrill CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "vocadrill", version, about = "Vocabulary practice from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive practice session
    Practice {
        /// Path to a .toml deck
        #[arg(long)]
        deck: PathBuf,

        /// Number of practices in the session
        #[arg(long, default_value = "10")]
        count: usize,

        /// Practice kinds (comma-separated, e.g. "selection,filling,reading")
        #[arg(long)]
        kinds: Option<String>,

        /// Seed for a reproducible session
        #[arg(long)]
        seed: Option<u64>,

        /// History file (defaults to the configured path)
        #[arg(long)]
        history: Option<PathBuf>,

        /// Directory for the session report (defaults to the configured path)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Grade a free-text answer against one or more keys
    Grade {
        /// Accepted answer; repeat or separate alternatives with ';'
        #[arg(long = "key", required = true)]
        keys: Vec<String>,

        /// The answer to grade
        #[arg(long)]
        answer: String,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show what the scheduler would pick next
    Schedule {
        /// Path to a .toml deck
        #[arg(long)]
        deck: PathBuf,

        /// Number of subjects to draw
        #[arg(long, default_value = "10")]
        count: usize,

        /// Seed for a reproducible draw
        #[arg(long)]
        seed: Option<u64>,

        /// History file (defaults to the configured path)
        #[arg(long)]
        history: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show accuracy and the weakest words of a deck
    Stats {
        /// Path to a .toml deck or directory
        #[arg(long)]
        deck: PathBuf,

        /// Number of weak subjects to list
        #[arg(long, default_value = "10")]
        limit: usize,

        /// History file (defaults to the configured path)
        #[arg(long)]
        history: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Fill in missing paragraph meanings with the translator chain
    Translate {
        /// Path to a .toml deck
        #[arg(long)]
        deck: PathBuf,

        /// Where to write the updated deck (defaults to overwriting it)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compare two session reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Accuracy change below which a kind counts as unchanged
        #[arg(long, default_value = "0.05")]
        threshold: f64,

        /// Exit code 1 if any kind declined
        #[arg(long)]
        fail_on_decline: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate deck TOML files
    Validate {
        /// Path to a deck file or directory
        #[arg(long)]
        deck: PathBuf,
    },

    /// Create a starter config and example deck
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vocadrill=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Practice {
            deck,
            count,
            kinds,
            seed,
            history,
            output,
            config,
        } => commands::practice::execute(deck, count, kinds, seed, history, output, config),
        Commands::Grade {
            keys,
            answer,
            format,
            config,
        } => commands::grade::execute(keys, answer, format, config),
        Commands::Schedule {
            deck,
            count,
            seed,
            history,
            config,
        } => commands::schedule::execute(deck, count, seed, history, config),
        Commands::Stats {
            deck,
            limit,
            history,
            config,
        } => commands::stats::execute(deck, limit, history, config),
        Commands::Translate {
            deck,
            output,
            config,
        } => commands::translate::execute(deck, output, config).await,
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_decline,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_decline, format),
        Commands::Validate { deck } => commands::validate::execute(deck),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
