// /////////////////////////////////////////////////////////////////////////////
// Variability Analysis Infrastructure
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `host::port` address parsing.
//!
//! The wire protocol's addresses use a literal double-colon separator
//! rather than the usual single colon, so that an IPv6 literal host (which
//! may itself contain colons) can still be told apart from its port.

use std::net::SocketAddr;

use crate::error::CoreError;

/// Default address used when the caller omits one: `127.0.0.1::3141`.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1::3141";

/// Resolves a `host::port` string to a concrete socket address.
///
/// The split is anchored on the *last* occurrence of `::` so that an IPv6
/// host literal such as `::1` still parses correctly as `::1::3141`.
pub async fn resolve(spec: &str) -> Result<SocketAddr, CoreError> {
    let (host, port_str) = spec
        .rsplit_once("::")
        .ok_or_else(|| CoreError::InvalidArgument(format!("malformed address '{spec}', expected host::port")))?;

    if host.is_empty() {
        return Err(CoreError::InvalidArgument(format!("malformed address '{spec}', empty host")));
    }

    let port: u16 = port_str
        .parse()
        .map_err(|_| CoreError::InvalidArgument(format!("invalid port '{port_str}' in '{spec}'")))?;

    let lookup_target = if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    };

    tokio::net::lookup_host(&lookup_target)
        .await
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| CoreError::InvalidArgument(format!("could not resolve '{spec}'")))
}
