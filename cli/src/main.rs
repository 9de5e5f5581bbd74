// /////////////////////////////////////////////////////////////////////////////
// Variability Analysis Infrastructure
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Binary entry point: parses the three-mode CLI surface and dispatches to
//! a one-shot batch analysis, a long-running server, or a one-shot client
//! request against `variability-core`.
//!
//! The real model loading and analysis plugins this infrastructure would
//! normally run (variability, build, code models) are out of scope here —
//! see `variability-core`'s crate documentation. [`handler::EchoAnalysisHandler`]
//! exists only to give server mode something real to drive the wire
//! protocol with.

mod handler;

use std::process::ExitCode as ProcessExitCode;
use std::sync::Arc;

use variability_bootstrap::cli::{parse_cli, resolve, Mode};
use variability_bootstrap::config::PropertiesConfig;
use variability_bootstrap::exit_code::ExitCode;
use variability_bootstrap::logger::init_tracing;
use variability_core::{Client, ProgressReporter, Server};

use handler::EchoAnalysisHandler;

#[tokio::main]
async fn main() -> ProcessExitCode {
    let cli = parse_cli();
    let verbose = cli.verbose;
    init_tracing(verbose);

    let mode = match resolve(cli) {
        Ok(mode) => mode,
        Err(err) => {
            tracing::error!(target: "cli", "{err}");
            return to_process_exit_code(ExitCode::Error);
        }
    };

    let exit_code = match mode {
        Mode::Batch { config_path, archive } => run_batch(&config_path, archive),
        Mode::Server { address, config_path } => run_server(address.as_deref(), &config_path).await,
        Mode::Client { address, payload } => run_client(&address, &payload).await,
    };

    to_process_exit_code(exit_code)
}

fn to_process_exit_code(code: ExitCode) -> ProcessExitCode {
    ProcessExitCode::from(code.as_i32() as u8)
}

/// Loads the properties file and runs one analysis pass over it, printing a
/// summary. `archive` only changes the log message emitted — there is no
/// real archive format in scope here.
fn run_batch(config_path: &str, archive: bool) -> ExitCode {
    let config = match PropertiesConfig::load(config_path) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(target: "cli", "failed to load {config_path}: {err}");
            return ExitCode::Error;
        }
    };

    tracing::info!(target: "cli", "loaded {} config entries from {config_path}", config.len());

    let handler = EchoAnalysisHandler::new();
    let summary = handler.analyze(&format!("batch analysis of {config_path}"));
    println!("{summary}");

    if archive {
        tracing::info!(target: "cli", "archive requested: would persist results alongside {config_path}");
    }

    ExitCode::Success
}

/// Starts a server at `address` (or the core's default) serving
/// [`EchoAnalysisHandler`], running until the process receives Ctrl+C or a
/// client sends the shutdown sentinel.
async fn run_server(address: Option<&str>, config_path: &str) -> ExitCode {
    if let Err(err) = PropertiesConfig::load(config_path) {
        tracing::error!(target: "cli", "failed to load {config_path}: {err}");
        return ExitCode::Error;
    }

    let handler = Arc::new(EchoAnalysisHandler::with_reporter(ProgressReporter::global()));

    let server = match Server::start(address, handler).await {
        Ok(server) => server,
        Err(err) => {
            tracing::error!(target: "cli", "failed to start server: {err}");
            return ExitCode::Error;
        }
    };

    tracing::info!(target: "cli", "listening on {}", server.local_addr());

    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!(target: "cli", "received interrupt, shutting down");
        server.stop();
    }

    ExitCode::Success
}

/// Sends `payload` to `address` and prints the reply.
async fn run_client(address: &str, payload: &str) -> ExitCode {
    let client = match Client::connect(address).await {
        Ok(client) => client,
        Err(err) => {
            tracing::error!(target: "cli", "failed to connect to {address}: {err}");
            return ExitCode::Error;
        }
    };

    match client.send(payload).await {
        Ok(reply) => {
            println!("{reply}");
            ExitCode::Success
        }
        Err(err) => {
            tracing::error!(target: "cli", "request to {address} failed: {err}");
            ExitCode::Error
        }
    }
}
