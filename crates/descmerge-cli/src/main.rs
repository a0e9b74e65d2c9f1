use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "descmerge",
    about = "Maintain merged yarn + jar description mappings",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Working root holding the documents and the mappings directory
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,
    /// Config file (default: <root>/descmerge.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full update: pull descriptions, refresh the registry,
    /// reconcile merged mappings, and rebuild the index.
    Update {
        /// Commit and push the working root afterwards
        #[arg(long)]
        push: bool,
        /// Use the description dataset checkout as-is instead of pulling it
        #[arg(long)]
        no_pull: bool,
    },
    /// Refresh the release registry document only
    Registry,
    /// Reconcile the combined document against the saved registry
    Combine {
        /// Regenerate every merged mapping afterwards
        #[arg(long)]
        force: bool,
    },
    /// Rebuild the index document from the saved combined document
    Index,
}

impl Commands {
    /// Whether the command may invoke the merge tool.
    fn runs_merge(&self) -> bool {
        matches!(self, Commands::Update { .. } | Commands::Combine { .. })
    }
}

fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let ctx = commands::Context::load(&cli.root, cli.config.as_deref())?;
    if cli.command.runs_merge() {
        ctx.require_merge_tool()?;
    }

    match cli.command {
        Commands::Update { push, no_pull } => commands::update::update(&ctx, push, !no_pull),
        Commands::Registry => commands::stages::registry(&ctx),
        Commands::Combine { force } => commands::stages::combine(&ctx, force),
        Commands::Index => commands::stages::index(&ctx),
    }
}
