// /////////////////////////////////////////////////////////////////////////////
// Variability Analysis Infrastructure
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Core Error System
//!
//! A single `thiserror`-derived enum for the three concurrency subsystems
//! (`pipeline`, `progress`, `net`). Per-item faults inside the pipeline and
//! reporter never surface through this type — they are contained at the
//! source (see `pipeline::ItemState` and `progress`'s swallow-and-log
//! behavior). Only construction, misuse, and transport-boundary failures are
//! represented here.

use thiserror::Error;

/// Errors raised synchronously to callers at component boundaries.
///
/// Per-item transform/consumer faults and reporter formatting faults are
/// intentionally absent from this enum: they are contained inside the
/// pipeline and reporter respectively and never propagate to a caller.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// A constructor contract was violated (e.g. worker count of zero, a
    /// malformed `host::port` string).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An API was called in the wrong phase (e.g. `add` after `end`, a
    /// second `start` on an already-running server).
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// A client's reachability probe did not succeed within the configured
    /// timeout.
    #[error("unreachable: {0}")]
    Unreachable(String),

    /// Transient stream I/O failure. The server loop logs and absorbs these;
    /// this variant exists so internal helpers have something to return.
    #[error("I/O failure: {0}")]
    IoFailure(String),
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::IoFailure(err.to_string())
    }
}
