//! Defines the command-line arguments and subcommands for the Sable CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "sable",
    version,
    about = "The parser front end for the Sable configuration language."
)]
pub struct SableArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the Abstract Syntax Tree (AST) for a source file.
    Ast {
        /// The path to the Sable file to parse.
        #[arg(required = true)]
        file: PathBuf,
        /// Emit the tree as JSON instead of the pretty form.
        #[arg(long)]
        json: bool,
    },
    /// Parse a source file and report diagnostics without output.
    Check {
        /// The path to the Sable file to check.
        #[arg(required = true)]
        file: PathBuf,
    },
}
