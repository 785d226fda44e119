mod cmd;
mod output;
mod pipeline;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use pipeline::{Overrides, StageOptions};
use spitcode_core::stage::Stage;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "spitcode",
    about = "Speak a use case, get a reviewed and hardened FastAPI app from a local model",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .spitcode/ or .git/)
    #[arg(long, global = true, env = "SPITCODE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Model server base URL (overrides config and SPITCODE_OLLAMA_URL)
    #[arg(long, global = true)]
    server_url: Option<String>,

    /// Model name (overrides config and SPITCODE_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .spitcode/config.yaml and the session, outputs and rag_docs directories
    Init,

    /// Capture the use case: record and transcribe, or take it as text
    Record {
        /// Use this text as the transcript instead of recording
        #[arg(long)]
        text: Option<String>,

        /// Recording length in seconds (default from config)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        seconds: Option<u32>,
    },

    /// Generate outputs/main.py from the transcript
    Generate,

    /// Review outputs/main.py against the documentation corpus
    Analyze {
        /// Re-embed the corpus even when the cached index is current
        #[arg(long)]
        reindex: bool,
    },

    /// Parse outputs/analysis.txt into outputs/review_chunks.json
    Parse,

    /// Refactor outputs/main.py using the parsed review
    Improve,

    /// Harden outputs/main_rewritten.py for production
    Harden,

    /// Write outputs/README.md for the hardened app
    Readme,

    /// Run the whole pipeline, stopping at the first failed stage
    Build {
        /// Use case text; skips the microphone
        use_case: Option<String>,

        /// Start from this stage instead of record
        #[arg(long, value_name = "STAGE", default_value = "record")]
        from: Stage,
    },

    /// Build the retrieval index over the documentation corpus
    Index {
        /// Re-embed even when the cached index is current
        #[arg(long)]
        force: bool,
    },

    /// Show the state of the last pipeline run
    Status,

    /// Show or validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Build { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let overrides = Overrides {
        server_url: cli.server_url,
        model: cli.model,
    };

    let stage = |stage: Stage, opts: StageOptions| {
        cmd::stage::run(&root, &overrides, stage, opts, cli.json)
    };

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Record { text, seconds } => stage(
            Stage::Record,
            StageOptions {
                text,
                seconds,
                ..Default::default()
            },
        ),
        Commands::Generate => stage(Stage::Generate, StageOptions::default()),
        Commands::Analyze { reindex } => stage(
            Stage::Analyze,
            StageOptions {
                force_index: reindex,
                ..Default::default()
            },
        ),
        Commands::Parse => stage(Stage::Parse, StageOptions::default()),
        Commands::Improve => stage(Stage::Improve, StageOptions::default()),
        Commands::Harden => stage(Stage::Harden, StageOptions::default()),
        Commands::Readme => stage(Stage::Readme, StageOptions::default()),
        Commands::Build { use_case, from } => {
            cmd::build::run(&root, &overrides, use_case, from, cli.json)
        }
        Commands::Index { force } => cmd::index::run(&root, &overrides, force, cli.json),
        Commands::Status => cmd::status::run(&root, cli.json),
        Commands::Config { subcommand } => {
            cmd::config::run(&root, &overrides, subcommand, cli.json)
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
