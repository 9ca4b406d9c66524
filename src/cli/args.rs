//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::domain::CloneDepth;

/// Prototype cloning for cyclic object graphs: shallow and deep copies with identity tracking
#[derive(Parser, Debug)]
#[command(name = "protoclone")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Local config file (overrides the global config)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the shallow/deep clone demonstration and check every observation
    Demo {
        /// Graph fixture (TOML); built-in scenario if omitted
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        fixture: Option<PathBuf>,
    },

    /// Clone a fixture graph and report identities and sharing
    #[command(name = "clone")]
    CloneGraph {
        /// Clone depth: shallow or deep (default from config)
        #[arg(long)]
        depth: Option<CloneDepth>,
        /// Graph fixture (TOML); built-in scenario if omitted
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        fixture: Option<PathBuf>,
        /// Print graph trees (also enabled by show_tree in config)
        #[arg(short, long)]
        tree: bool,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create global config template
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Show config paths
    Path,
}
