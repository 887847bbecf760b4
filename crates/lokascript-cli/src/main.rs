// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! LokaScript compiler command-line interface.
//!
//! This is the main entry point for the `lokascript` command.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use miette::Result;

mod commands;
mod config;
mod diagnostic;
mod sources;

use config::Overrides;

/// LokaScript: compile multilingual DOM scripts to JavaScript modules
#[derive(Debug, Parser)]
#[command(name = "lokascript")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log compiler decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile a script, or every .lks script in a directory
    Compile {
        /// Script file or directory
        path: Utf8PathBuf,

        /// Output file (single script) or directory (batch)
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Validate and parse scripts without generating code
    Check {
        /// Script file or directory
        path: Utf8PathBuf,
    },

    /// Print the analysis of a script as JSON
    Analyze {
        /// Script file
        path: Utf8PathBuf,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Print the tokens of a script
    Tokens {
        /// Script file
        path: Utf8PathBuf,
    },

    /// Match text against one language's patterns and print the result as JSON
    Match {
        /// Script text
        text: String,

        /// Language code
        #[arg(short, long, default_value = "en")]
        language: String,
    },

    /// List the supported languages
    Languages,
}

fn main() -> Result<()> {
    // Install miette's fancy error handler
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Compile {
            path,
            output,
            overrides,
        } => commands::compile::run(&path, output.as_deref(), &overrides),
        Command::Check { path } => commands::check::run(&path),
        Command::Analyze { path, overrides } => commands::analyze::run(&path, &overrides),
        Command::Tokens { path } => commands::tokens::run(&path),
        Command::Match { text, language } => commands::pattern_match::run(&text, &language),
        Command::Languages => commands::languages::run(),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{e:?}");
            std::process::exit(1);
        }
    }
}

/// Logs to stderr, filtered by `LOKASCRIPT_LOG`.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let default = if verbose {
        "lokascript_core=debug,lokascript=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_env("LOKASCRIPT_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
