// /////////////////////////////////////////////////////////////////////////////
// Variability Analysis Infrastructure
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Request/response client matching [`super::server::Server`]'s wire
//! protocol.
//!
//! A `Client` is one-shot: the constructor probes reachability and opens a
//! connection, and the first successful [`Client::send`] consumes it. Any
//! further `send` call returns an empty reply rather than reopening the
//! connection, matching the server's "one message per connection" contract.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use super::addr;
use super::framing;
use crate::error::CoreError;

const REACHABILITY_TIMEOUT: Duration = Duration::from_secs(2);

/// A one-shot client connection to a [`super::server::Server`].
pub struct Client {
    stream: Mutex<Option<TcpStream>>,
}

impl Client {
    /// Resolves `address` (`host::port`) and opens a connection, bounded by
    /// a reachability timeout. Fails with `InvalidArgument` for a malformed
    /// address or `Unreachable` if the peer cannot be reached in time.
    pub async fn connect(address: &str) -> Result<Self, CoreError> {
        let socket_addr = addr::resolve(address).await?;

        let stream = tokio::time::timeout(REACHABILITY_TIMEOUT, TcpStream::connect(socket_addr))
            .await
            .map_err(|_| CoreError::Unreachable(format!("timed out connecting to {address}")))?
            .map_err(|err| CoreError::Unreachable(format!("{address}: {err}")))?;

        Ok(Self {
            stream: Mutex::new(Some(stream)),
        })
    }

    /// Writes a framed `message` and waits for the framed reply.
    ///
    /// After the first successful call, the connection is spent: further
    /// calls return an empty string immediately without touching the
    /// network.
    pub async fn send(&self, message: &str) -> Result<String, CoreError> {
        let stream = self.stream.lock().take();
        let mut stream = match stream {
            Some(stream) => stream,
            None => return Ok(String::new()),
        };

        stream.write_all(&framing::encode(message)).await?;
        stream.flush().await?;

        let mut reader = BufReader::new(&mut stream);
        let reply = framing::read_message(&mut reader).await?;
        Ok(reply.unwrap_or_default())
    }

    /// Releases the underlying connection, if still held.
    pub fn close(&self) {
        self.stream.lock().take();
    }
}
