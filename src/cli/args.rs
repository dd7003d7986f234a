//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Ordered tree and sequence manager: cycle-safe hierarchies and uniquely numbered lists
#[derive(Parser, Debug)]
#[command(name = "ordtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug level (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Project directory holding a local .ordtree.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    /// Data file, overrides configuration
    #[arg(long, global = true, env = "ORDTREE_DATA_FILE", value_hint = ValueHint::FilePath)]
    pub data_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the node tree
    Node {
        #[command(subcommand)]
        command: NodeCommands,
    },

    /// Manage numbered sequences
    Seq {
        #[command(subcommand)]
        command: SeqCommands,
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
pub enum NodeCommands {
    /// Create a node
    Add {
        /// Node title
        title: String,
        /// Parent node (default: new root)
        #[arg(short, long)]
        parent: Option<u64>,
        /// Explicit sibling order (default: after the last sibling)
        #[arg(short, long)]
        order: Option<u32>,
        /// Extra payload attribute, repeatable
        #[arg(short, long = "attr", value_name = "KEY=VALUE")]
        attributes: Vec<String>,
    },

    /// Re-parent a node
    Move {
        /// Node to move
        id: u64,
        /// New parent (default: make the node a root)
        #[arg(short, long)]
        parent: Option<u64>,
        /// Explicit sibling order under the new parent
        #[arg(short, long)]
        order: Option<u32>,
    },

    /// Set the order of all children of a parent
    Reorder {
        /// Parent node (default: the roots)
        #[arg(short, long)]
        parent: Option<u64>,
        /// Children in their new order
        #[arg(required = true, num_args = 1..)]
        ids: Vec<u64>,
    },

    /// Show the chain from a node up to its root
    Ancestors {
        id: u64,
    },

    /// List every node below a node
    Descendants {
        id: u64,
    },

    /// Delete a node (children handled by delete_policy)
    Rm {
        id: u64,
    },

    /// Show the tree
    Tree {
        /// Only the subtree rooted here
        #[arg(short, long)]
        root: Option<u64>,
    },

    /// Depth-annotated pre-order listing
    Flat {
        /// Only the subtree rooted here
        #[arg(short, long)]
        root: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SeqCommands {
    /// Create a collection
    New {
        /// Collection title
        title: String,
    },

    /// List collections
    Collections,

    /// List the items of a collection in position order
    List {
        collection: u64,
    },

    /// Insert an item into a collection
    Insert {
        collection: u64,
        /// Item title
        title: String,
        /// Zero-based position (default: append)
        #[arg(short, long)]
        position: Option<u32>,
        /// Explicit number (default: highest + 1)
        #[arg(short, long)]
        number: Option<u32>,
    },

    /// Set the order of all items of a collection
    Reorder {
        collection: u64,
        /// Items in their new order
        #[arg(required = true, num_args = 1..)]
        ids: Vec<u64>,
    },

    /// Give an item a number, swapping with its current holder
    Renumber {
        item: u64,
        number: u32,
    },

    /// Remove an item
    Rm {
        item: u64,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Show config file locations
    Path,
    /// Create a template config file
    Init {
        /// Create global config instead of local
        #[arg(short, long)]
        global: bool,
    },
}
