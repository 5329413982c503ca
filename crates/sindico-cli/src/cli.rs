use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "sindico-sync")]
#[command(about = "Review and settle App Síndico offline-sync conflicts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the conflict ledger database
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to the sync settings file
    #[arg(long = "config", global = true, value_name = "PATH")]
    pub config_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare local and server snapshots of a store and record conflicts
    Detect {
        /// Store the snapshots belong to (e.g. announcements, polls)
        #[arg(long)]
        store: String,
        /// JSON array of locally cached records
        #[arg(long, value_name = "FILE")]
        local: PathBuf,
        /// JSON array of server records
        #[arg(long, value_name = "FILE")]
        server: PathBuf,
        /// Resolve conflicts immediately instead of leaving them pending
        #[arg(long)]
        auto_resolve: bool,
        /// Strategy used with --auto-resolve (defaults to the configured one)
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recorded conflicts
    List {
        #[command(flatten)]
        state: StateArgs,
        /// Only show conflicts of this store
        #[arg(long)]
        store: Option<String>,
        /// Number of conflicts to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a field-by-field comparison of one conflict
    Diff {
        /// Ledger id of the conflict
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve pending conflicts
    Resolve {
        /// Ledger id of the conflict (omit with --all)
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        id: Option<i64>,
        /// Resolve every pending conflict
        #[arg(long)]
        all: bool,
        /// Only resolve conflicts of this store (with --all)
        #[arg(long, requires = "all")]
        store: Option<String>,
        /// Strategy picking the kept side (defaults to the configured one)
        #[arg(long, value_enum, conflicts_with_all = ["merge", "manual"])]
        strategy: Option<StrategyArg>,
        /// Keep the structural merge of both sides
        #[arg(long, conflicts_with = "manual")]
        merge: bool,
        /// Keep the record stored in this JSON file
        #[arg(long, value_name = "FILE", conflicts_with = "all")]
        manual: Option<PathBuf>,
    },
    /// Show conflict counts by state, store and type
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export the full conflict history as JSON
    Export {
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Delete resolved conflicts past the retention window
    Clear {
        /// Retention window in days (defaults to the configured one)
        #[arg(long, value_name = "DAYS")]
        older_than_days: Option<u32>,
    },
    /// Manage sync settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Clone, Copy, Debug, Default)]
#[group(multiple = false)]
pub struct StateArgs {
    /// Only show pending conflicts
    #[arg(long)]
    pub pending: bool,
    /// Only show resolved conflicts
    #[arg(long)]
    pub resolved: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StrategyArg {
    Newest,
    Oldest,
    Local,
    Server,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Create or update the settings file
    Init {
        /// Default resolution strategy
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
        /// Resolve conflicts as soon as they are detected
        #[arg(long)]
        auto_resolve: Option<bool>,
        /// Merge instead of picking a side when auto-resolving
        #[arg(long)]
        prefer_merge: Option<bool>,
        /// Days to keep resolved conflicts
        #[arg(long, value_name = "DAYS")]
        retention_days: Option<u32>,
    },
    /// Print the effective settings
    Show,
}
