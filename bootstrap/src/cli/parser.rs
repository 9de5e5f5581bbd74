// /////////////////////////////////////////////////////////////////////////////
// Variability Analysis Infrastructure
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Parser
//!
//! Command-line argument parsing using clap. This module only defines the
//! raw flag surface; resolving it into a [`super::Mode`] (and rejecting
//! nonsensical flag combinations) happens in [`super::validator`].

use clap::Parser;

/// Raw CLI arguments for `variability-cli`.
///
/// ```text
/// variability-cli <config.properties> [--archive]
/// variability-cli --server[=host::port] <config.properties>
/// variability-cli --client=host::port <payload>
/// ```
#[derive(Parser, Debug, Clone)]
#[command(name = "variability-cli")]
#[command(about = concat!("Variability analysis CLI v", env!("CARGO_PKG_VERSION")))]
#[command(version)]
pub struct Cli {
    /// A `.properties` config file path (batch and `--server` modes), or
    /// the request payload to send (`--client` mode).
    pub target: String,

    /// Run as a server instead of a one-shot batch analysis. An optional
    /// `host::port` may follow `=`; when omitted, the core's default
    /// address is used.
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    pub server: Option<String>,

    /// Run as a client against `host::port`, sending `target` as the
    /// request payload.
    #[arg(long, value_name = "host::port")]
    pub client: Option<String>,

    /// Batch mode only: also persist a copy of the analyzed model.
    #[arg(long)]
    pub archive: bool,

    /// Enable debug-level logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parses `std::env::args()`. Clap exits the process on `--help`/`--version`
/// or a usage error, matching its usual CLI behavior.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_batch_mode_flags() {
        let cli = Cli::parse_from(["variability-cli", "app.properties", "--archive"]);
        assert_eq!(cli.target, "app.properties");
        assert!(cli.archive);
        assert!(cli.server.is_none());
        assert!(cli.client.is_none());
    }

    #[test]
    fn parses_server_mode_with_explicit_address() {
        let cli = Cli::parse_from(["variability-cli", "--server=127.0.0.1::4000", "app.properties"]);
        assert_eq!(cli.server.as_deref(), Some("127.0.0.1::4000"));
        assert_eq!(cli.target, "app.properties");
    }

    #[test]
    fn parses_server_mode_with_default_address() {
        let cli = Cli::parse_from(["variability-cli", "--server", "app.properties"]);
        assert_eq!(cli.server.as_deref(), Some(""));
    }

    #[test]
    fn parses_client_mode() {
        let cli = Cli::parse_from(["variability-cli", "--client=127.0.0.1::4000", "hello world"]);
        assert_eq!(cli.client.as_deref(), Some("127.0.0.1::4000"));
        assert_eq!(cli.target, "hello world");
    }
}
