// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! nanoqt CLI - run scripts with CommonJS-style modules

mod repl;

use anyhow::Context;
use clap::Parser;
use nanoqt_runtime::{Config, Runtime};
use owo_colors::OwoColorize;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "nanoqt",
    about = "Script runner with CommonJS-style require()",
    version,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Script file to execute
    script: Option<PathBuf>,

    /// Evaluate script from command line
    #[arg(short = 'e', long = "eval", conflicts_with = "script")]
    eval: Option<String>,

    /// Append a directory to the default module path
    #[arg(short = 'I', long = "module-path", value_name = "DIR")]
    module_path: Vec<PathBuf>,

    /// Start interactive REPL (after running the script, if any)
    #[arg(short = 'i', long = "interactive", alias = "repl")]
    interactive: bool,

    /// Read configuration from this file instead of the default locations
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&cli, &config);
    debug!(?config, "configuration loaded");

    let mut runtime = Runtime::new(config);

    let outcome = if let Some(code) = &cli.eval {
        Some(runtime.eval(code))
    } else if let Some(script) = &cli.script {
        Some(runtime.run_file(script))
    } else if !cli.interactive && !atty::is(atty::Stream::Stdin) {
        // Read from stdin
        let mut code = String::new();
        if let Err(e) = std::io::stdin().read_to_string(&mut code) {
            eprintln!("{}: {}", "Error".red().bold(), e);
            return ExitCode::FAILURE;
        }
        Some(runtime.eval(&code))
    } else {
        None
    };

    let status = match outcome {
        Some(Ok(value)) => {
            if cli.eval.is_some() && !value.is_undefined() {
                println!("{}", value.inspect());
            }
            ExitCode::SUCCESS
        }
        Some(Err(e)) => {
            repl::print_error(&e);
            ExitCode::FAILURE
        }
        None => ExitCode::SUCCESS,
    };

    let no_input = cli.eval.is_none() && cli.script.is_none();
    if cli.interactive || (no_input && atty::is(atty::Stream::Stdin)) {
        return match repl::Repl::new(runtime) {
            Ok(mut repl) => match repl.run() {
                Ok(()) => status,
                Err(e) => {
                    eprintln!("{}: {}", "Error".red().bold(), e);
                    ExitCode::FAILURE
                }
            },
            Err(e) => {
                eprintln!("{}: {}", "Error".red().bold(), e);
                ExitCode::FAILURE
            }
        };
    }

    status
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::from_file(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?;
            config.merge_env(std::env::vars_os());
            config
        }
        None => Config::load().context("failed to load configuration")?,
    };
    config.module_path.extend(cli.module_path.iter().cloned());
    Ok(config)
}

fn init_logging(cli: &Cli, config: &Config) {
    let directive = if cli.verbose {
        "nanoqt=debug,nanoqt_runtime=debug"
    } else {
        config.log_level.as_str()
    };
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
