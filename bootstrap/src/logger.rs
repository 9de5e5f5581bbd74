// /////////////////////////////////////////////////////////////////////////////
// Variability Analysis Infrastructure
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap Logger
//!
//! Lightweight logging abstraction for the bootstrap phase, separate from
//! `variability-core`'s own `tracing` calls: `init_tracing` installs the
//! one process-wide subscriber, and [`BootstrapLogger`] gives bootstrap
//! code (CLI validation, config loading) a trait it can swap for
//! [`NoOpLogger`] in tests instead of depending on a global subscriber
//! having been installed.

use std::sync::Once;

static INIT: Once = Once::new();

/// Installs a `tracing_subscriber::FmtSubscriber` as the global default.
/// Safe to call more than once per process; only the first call takes
/// effect.
pub fn init_tracing(verbose: bool) {
    INIT.call_once(|| {
        let subscriber = tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO })
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

/// Bootstrap-phase logging abstraction, testable with a no-op
/// implementation instead of requiring a real subscriber.
pub trait BootstrapLogger: Send + Sync {
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
    fn debug(&self, message: &str);
}

/// Routes bootstrap messages through `tracing`, tagged with the
/// `bootstrap` target.
#[derive(Debug, Default)]
pub struct ConsoleLogger;

impl BootstrapLogger for ConsoleLogger {
    fn error(&self, message: &str) {
        tracing::error!(target: "bootstrap", "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "bootstrap", "{message}");
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "bootstrap", "{message}");
    }

    fn debug(&self, message: &str) {
        tracing::debug!(target: "bootstrap", "{message}");
    }
}

/// Discards everything. Used by tests that exercise bootstrap logic
/// without wanting log output.
#[derive(Debug, Default)]
pub struct NoOpLogger;

impl BootstrapLogger for NoOpLogger {
    fn error(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn debug(&self, _message: &str) {}
}
