// /////////////////////////////////////////////////////////////////////////////
// Variability Analysis Infrastructure
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Variability Analysis Concurrency Core
//!
//! The three concurrency primitives shared by the product-line analysis
//! infrastructure (variability model, build model, code model extractors):
//!
//! - [`pipeline`] — an order-preserving parallel worker pool.
//! - [`progress`] — a process-wide progress reporter daemon.
//! - [`net`] — a framed request/response server and matching client.
//!
//! Everything else in the surrounding infrastructure — config loading,
//! logging delivery timing, the analysis plugins themselves — is an
//! external collaborator to these three components and lives outside this
//! crate (see `variability-bootstrap` and the `variability-cli` binary).

pub mod error;
pub mod net;
pub mod pipeline;
pub mod progress;

pub use error::CoreError;
pub use net::{Client, Handler, Server};
pub use pipeline::Pipeline;
pub use progress::{ProgressReporter, Tracker};
