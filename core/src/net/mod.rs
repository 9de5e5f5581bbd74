// /////////////////////////////////////////////////////////////////////////////
// Variability Analysis Infrastructure
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Request/response server and client over a framed TCP wire protocol.
//!
//! - [`framing`] — the `[<EOM>]` line-framing codec shared by both ends.
//! - [`addr`] — `host::port` address parsing.
//! - [`server`] — the single-listener server and its [`server::Handler`] trait.
//! - [`client`] — the matching one-shot client.

pub mod addr;
pub mod client;
pub mod framing;
pub mod server;

pub use client::Client;
pub use server::{Handler, Server};
