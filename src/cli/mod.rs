//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// wishsync - Incremental importer for gacha wish history
#[derive(Parser, Debug)]
#[command(name = "wishsync", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.wishsync/data/wishsync.db)
    #[arg(long, global = true, env = "WISHSYNC_DB")]
    pub db: Option<PathBuf>,

    /// Actor name for audit trail
    #[arg(long, global = true, env = "WISHSYNC_ACTOR")]
    pub actor: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the wish database
    Init {
        /// Recreate the database if it already exists
        #[arg(long)]
        force: bool,
    },

    /// Print version information
    Version,

    /// Local user management
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Import new wishes for a user from the provider
    Import(ImportArgs),

    /// Show the newest wishes of every banner
    Banners {
        /// User ID or email
        user: String,
    },

    /// List one banner's history, newest first
    List {
        /// User ID or email
        user: String,

        /// Banner (novice, permanent, character, weapon, or gacha code)
        banner: String,

        /// Page number, starting at 0
        #[arg(short, long, default_value = "0")]
        page: u32,
    },

    /// Count stored wishes
    Count {
        /// User ID or email
        user: String,

        /// Only count this banner
        #[arg(short, long)]
        banner: Option<String>,
    },

    /// Delete every stored wish of a user
    Delete {
        /// User ID or email
        user: String,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Show a user's audit history
    History {
        /// User ID or email
        user: String,

        /// Maximum events to show
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },

    /// Provider endpoint configuration
    Provider {
        #[command(subcommand)]
        command: ProviderCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// User Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Create a local user
    Create {
        /// Contact email (unique)
        email: String,

        /// Preferred provider language (e.g. en-us)
        #[arg(long)]
        lang: Option<String>,
    },

    /// Show a user
    Show {
        /// User ID or email
        user: String,
    },

    /// List all users
    List,

    /// Link a provider account to a user
    Link {
        /// User ID or email
        user: String,

        /// Provider account uid
        uid: String,

        /// Provider display name
        #[arg(long)]
        username: Option<String>,
    },
}

// ============================================================================
// Import
// ============================================================================

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// User ID or email
    pub user: String,

    /// Provider authkey (from the in-game wish history URL)
    #[arg(long, env = "WISHSYNC_AUTHKEY", hide_env_values = true)]
    pub authkey: String,

    /// Compare (time, id) against the stored cutoff instead of time alone
    #[arg(long)]
    pub strict_cutoff: bool,
}

// ============================================================================
// Provider Commands
// ============================================================================

#[derive(Subcommand, Debug, Clone)]
pub enum ProviderCommands {
    /// Show resolved provider settings and reachability
    Status,

    /// Save provider settings to ~/.wishsync/config.json
    Configure {
        /// Gacha log endpoint URL
        #[arg(long)]
        gacha_endpoint: Option<String>,

        /// Identity lookup endpoint URL
        #[arg(long)]
        identity_endpoint: Option<String>,

        /// Response language (e.g. en-us)
        #[arg(long)]
        lang: Option<String>,

        /// Records per page (1-20)
        #[arg(long)]
        page_size: Option<u32>,
    },
}
