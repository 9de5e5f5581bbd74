// /////////////////////////////////////////////////////////////////////////////
// Variability Analysis Infrastructure
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Mode Resolution
//!
//! Turns a parsed [`super::parser::Cli`] into exactly one [`Mode`],
//! rejecting the flag combinations the three-mode surface doesn't define
//! (`--server` and `--client` together, `--archive` outside batch mode).

use thiserror::Error;

use super::parser::Cli;

/// A resolved run mode, ready for `variability-cli`'s `main` to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Analyze `config_path` once and exit.
    Batch { config_path: String, archive: bool },
    /// Serve requests at `address` (`None` selects the core's default).
    Server { address: Option<String>, config_path: String },
    /// Send `payload` to `address` and print the reply.
    Client { address: String, payload: String },
}

/// An invalid combination of CLI flags.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("--server and --client cannot be used together")]
    ServerAndClientBothSet,
    #[error("--archive only applies to batch mode, not --server or --client")]
    ArchiveOutsideBatchMode,
}

/// Resolves `cli` into a [`Mode`], or the first invalid combination found.
pub fn resolve(cli: Cli) -> Result<Mode, ValidationError> {
    if cli.server.is_some() && cli.client.is_some() {
        return Err(ValidationError::ServerAndClientBothSet);
    }

    if cli.archive && (cli.server.is_some() || cli.client.is_some()) {
        return Err(ValidationError::ArchiveOutsideBatchMode);
    }

    if let Some(address) = cli.client {
        return Ok(Mode::Client {
            address,
            payload: cli.target,
        });
    }

    if let Some(address) = cli.server {
        let address = if address.is_empty() { None } else { Some(address) };
        return Ok(Mode::Server {
            address,
            config_path: cli.target,
        });
    }

    Ok(Mode::Batch {
        config_path: cli.target,
        archive: cli.archive,
    })
}
