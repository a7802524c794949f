use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse, highlight and query Ren'Py scripts.
#[derive(Parser, Debug)]
#[command(name = "renpy", version)]
#[command(about = "Parse, highlight and query Ren'Py scripts")]
pub struct Cli {
    /// Language config (YAML) overriding file types and queries.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse files and print their syntax trees.
    Parse {
        /// Files or directories (searched for matching file types).
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Print trees as JSON instead of S-expressions.
        #[arg(long)]
        json: bool,
        /// Only report files that contain errors.
        #[arg(short, long)]
        quiet: bool,
    },
    /// Print highlight captures and fold regions for a file.
    Highlight {
        /// File to highlight.
        path: PathBuf,
    },
    /// Run a query file against files and print its captures.
    Query {
        /// Query source (`.scm`).
        query: PathBuf,
        /// Files or directories.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print the grammar's node types as JSON.
    NodeTypes,
}
