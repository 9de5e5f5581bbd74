// /////////////////////////////////////////////////////////////////////////////
// Variability Analysis Infrastructure
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Enforce zero-panic production code at compile time
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # Bootstrap Module
//!
//! The bootstrap module sits **outside** `variability-core` and provides
//! everything a binary entry point needs before it can hand a request to
//! the core:
//!
//! - **CLI parsing** - the three-mode argument surface (`cli`)
//! - **Config loading** - a Java-style `.properties` file reader (`config`)
//! - **Logging** - a `tracing_subscriber` init guarded against double-init
//!   (`logger`)
//! - **Exit codes** - the two-value exit status the spec defines (`exit_code`)
//!
//! None of this talks to the network or the pipeline; it only prepares the
//! strings and settings that `variability-cli` passes into `variability-core`.

pub mod cli;
pub mod config;
pub mod exit_code;
pub mod logger;
