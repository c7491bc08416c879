//! Developer tool over the parlance front end.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "parlance", version, about = "Inspect parlance message patterns and modules")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Split a message pattern and dump its parsing program.
    Split {
        /// The message pattern, e.g. '«_‡,»# good'.
        pattern: String,
    },
    /// Scan a module file and dump its tokens.
    Scan {
        /// Path to the module source.
        path: std::path::PathBuf,
    },
    /// Parse and display a module file's header.
    Header {
        /// Path to the module source.
        path: std::path::PathBuf,
    },
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Split { pattern } => commands::split(&pattern),
        Command::Scan { path } => commands::scan(&path),
        Command::Header { path } => commands::header(&path),
    };
    match outcome {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            std::process::ExitCode::FAILURE
        }
    }
}
