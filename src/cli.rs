use std::path::PathBuf;

use clap::{Parser, Subcommand, builder::styling};

const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::Green.on_default().bold())
    .usage(styling::AnsiColor::Green.on_default().bold())
    .literal(styling::AnsiColor::Cyan.on_default().bold())
    .placeholder(styling::AnsiColor::Cyan.on_default());

#[derive(Parser)]
#[command(name = "devblogger")]
#[command(author, version, long_about = None)]
#[command(styles = STYLES)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the active AI provider (disables fallback)
    #[arg(short, long, global = true)]
    pub provider: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a blog article from commit records
    Generate {
        /// JSON file with the commit records (newest first), `-` for stdin
        #[arg(short, long)]
        commits: PathBuf,

        /// Repository the commits belong to (owner/name)
        #[arg(short, long)]
        repository: String,

        /// Only include commits on or after this date (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,

        /// Only include commits on or before this date (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,

        /// Only include commits whose message or file paths match this text
        #[arg(short, long)]
        query: Option<String>,

        /// Cap the number of commits fed into generation
        #[arg(short = 'n', long)]
        max_commits: Option<usize>,

        /// Prompt template override for this run
        #[arg(long)]
        prompt: Option<String>,

        /// Tags attached to the generated entry (repeatable)
        #[arg(short, long)]
        tag: Vec<String>,

        /// Maximum tokens for the provider response
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Sampling temperature
        #[arg(long)]
        temperature: Option<f32>,
    },

    /// Re-generate an existing entry in place
    Regenerate {
        /// Id of the entry to regenerate
        id: String,

        /// JSON file with the commit records, `-` for stdin
        #[arg(short, long)]
        commits: PathBuf,

        /// Prompt template override for this run
        #[arg(long)]
        prompt: Option<String>,

        /// Tags replacing the stored ones (repeatable; omit to keep)
        #[arg(short, long)]
        tag: Vec<String>,

        /// Maximum tokens for the provider response
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Sampling temperature
        #[arg(long)]
        temperature: Option<f32>,
    },

    /// List stored entries, newest first
    List {
        /// Only entries for this repository
        #[arg(short, long)]
        repository: Option<String>,

        /// Maximum number of entries to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search entries by text, tags and dates
    Search {
        /// Free text matched against title, tags and body
        query: String,

        /// Only entries for this repository
        #[arg(short, long)]
        repository: Option<String>,

        /// Require this tag (repeatable, all must match)
        #[arg(short, long)]
        tag: Vec<String>,

        /// Only entries created on or after this date
        #[arg(long)]
        since: Option<String>,

        /// Only entries created on or before this date
        #[arg(long)]
        until: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print one entry
    Show {
        /// Id of the entry
        id: String,

        /// Print the raw file including frontmatter
        #[arg(long)]
        raw: bool,
    },

    /// Export entries to JSON or combined markdown
    Export {
        /// Ids to export; omit to export everything
        ids: Vec<String>,

        /// Output format: json | markdown
        #[arg(short, long, default_value = "markdown")]
        format: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete an entry
    Delete {
        /// Id of the entry
        id: String,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Open an entry in the system editor and re-save it
    Edit {
        /// Id of the entry
        id: String,
    },

    /// Check index/file consistency without modifying anything
    Validate,

    /// Fix index/file drift found by validate
    Repair,

    /// Delete entries older than the configured threshold
    Prune {
        /// Age threshold in days (overrides config)
        #[arg(long)]
        days: Option<u32>,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Show storage statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Test connectivity of every configured provider
    Test,

    /// List models available for a provider
    Models {
        /// Provider name; defaults to the active provider
        name: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration (secrets masked)
    Show,

    /// Switch the active provider
    Use {
        /// Provider name to activate
        name: String,
    },

    /// Edit configuration file
    Edit,

    /// Validate configuration and test the provider chain
    Validate,
}
