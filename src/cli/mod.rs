//! The Sable command-line interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use clap::Parser;
use std::path::Path;
use std::process;

use crate::cli::args::{Command, SableArgs};
use crate::errors::print_error;
use crate::loader;

pub mod args;

/// The main entry point for the CLI.
pub fn run() {
    let args = SableArgs::parse();

    let result = match args.command {
        Command::Ast { file, json } => handle_ast(&file, json),
        Command::Check { file } => handle_check(&file),
    };

    if let Err(error) = result {
        print_error(error);
        process::exit(1);
    }
}

/// Handles the `ast` subcommand.
fn handle_ast(path: &Path, json: bool) -> Result<(), crate::SableError> {
    let root = loader::parse_file(path)?;
    if json {
        match serde_json::to_string_pretty(&root) {
            Ok(rendered) => println!("{}", rendered),
            Err(error) => {
                eprintln!("Error: failed to serialize AST: {}", error);
                process::exit(1);
            }
        }
    } else {
        println!("{}", root.pretty());
    }
    Ok(())
}

/// Handles the `check` subcommand.
fn handle_check(path: &Path) -> Result<(), crate::SableError> {
    loader::parse_file(path)?;
    println!("{}: ok", path.display());
    Ok(())
}
