//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Forest reconstruction for parent-linked records: flatten hierarchies and rebuild ordered trees
#[derive(Parser, Debug)]
#[command(name = "rsforest")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Raise log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rebuild the sorted forest (matched ids plus their ancestors)
    Tree {
        /// Record file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Only show these ids and their ancestors
        #[arg(long = "id")]
        ids: Vec<String>,
    },

    /// Flatten into an ordered list with parent ids restamped
    Flat {
        /// Record file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Only list these ids and their ancestors
        #[arg(long = "id")]
        ids: Vec<String>,
        /// Write the flat list as a record file instead of printing it
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Flatten all descendants of a node
    Subtree {
        /// Record file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Root id
        id: String,
    },

    /// List ids together with all their ancestors
    Ancestors {
        /// Record file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Ids to start from
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// List descendants of a node in level order
    Descendants {
        /// Record file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Root id
        id: String,
    },

    /// Validate a record file (duplicates, cycles, unknown parents)
    Check {
        /// Record file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
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
    Show {
        /// Directory whose .rsforest.toml takes part in the merge
        #[arg(value_hint = ValueHint::DirPath)]
        dir: Option<PathBuf>,
        /// Show only defaults merged with the global config
        #[arg(short, long, conflicts_with = "dir")]
        global: bool,
    },

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}
