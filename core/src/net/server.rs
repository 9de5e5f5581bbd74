// /////////////////////////////////////////////////////////////////////////////
// Variability Analysis Infrastructure
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Single-listener request/response server.
//!
//! Accepts framed messages over TCP and hands each one to an injected
//! [`Handler`], replying with the handler's summary. A message that
//! trim-equals the shutdown sentinel (`"shutdown"`) gets a reply of
//! `"Shutting down"` and causes the accept loop to close the listener
//! instead of handing the message to the handler.
//!
//! Per-connection work runs on its own spawned task (bounded only by the
//! Tokio runtime's worker pool), but each connection serves exactly one
//! message before closing — the server always returns to `Listening`
//! between messages, matching the client's one-shot `send` semantics. The
//! accept loop tracks its spawned connection tasks in a `JoinSet` and
//! drains it before clearing the single-instance flag, so stopping a
//! server always waits out any handler invocation still in flight.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;

use super::addr::{self, DEFAULT_ADDRESS};
use super::framing;
use crate::error::CoreError;

const SHUTDOWN_SENTINEL: &str = "shutdown";

/// A plugged-in task that processes one message and returns a textual
/// summary. Implementations must not panic across this boundary — a panic
/// is treated as an internal handler fault and becomes an empty reply
/// rather than taking down the connection or the server.
pub trait Handler: Send + Sync {
    fn handle(&self, message: &str) -> String;
}

/// Enforces "exactly one live instance per process" at the API boundary,
/// per the specification's server state model.
static SERVER_ACTIVE: AtomicBool = AtomicBool::new(false);

/// A running request/response server.
///
/// Dropping a `Server` does not stop it — call [`Server::stop`] explicitly,
/// or send the shutdown sentinel from a client, to close the listener.
pub struct Server {
    stop_tx: watch::Sender<bool>,
    local_addr: SocketAddr,
}

impl Server {
    /// Starts listening at `address` (default `127.0.0.1::3141` if `None`)
    /// and begins accepting connections on a spawned task. Fails with
    /// `IllegalState` if a `Server` is already running in this process, or
    /// `InvalidArgument` if `address` is malformed or unbindable.
    pub async fn start(address: Option<&str>, handler: Arc<dyn Handler>) -> Result<Self, CoreError> {
        if SERVER_ACTIVE.swap(true, Ordering::SeqCst) {
            return Err(CoreError::IllegalState("a server is already running in this process".to_string()));
        }

        let socket_addr = match addr::resolve(address.unwrap_or(DEFAULT_ADDRESS)).await {
            Ok(socket_addr) => socket_addr,
            Err(err) => {
                SERVER_ACTIVE.store(false, Ordering::SeqCst);
                return Err(err);
            }
        };

        let listener = match TcpListener::bind(socket_addr).await {
            Ok(listener) => listener,
            Err(err) => {
                SERVER_ACTIVE.store(false, Ordering::SeqCst);
                return Err(CoreError::from(err));
            }
        };

        let local_addr = listener.local_addr().unwrap_or(socket_addr);
        tracing::info!(target: "net", "listening on {local_addr}");

        let (stop_tx, stop_rx) = watch::channel(false);
        spawn_accept_loop(listener, handler, stop_tx.clone(), stop_rx);

        Ok(Self { stop_tx, local_addr })
    }

    /// Closes the listener so the accept loop unblocks. Idle if the server
    /// already stopped (e.g. via the shutdown sentinel).
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// The socket address actually bound, useful when `start` was given
    /// port `0` to pick an ephemeral port.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

fn spawn_accept_loop(listener: TcpListener, handler: Arc<dyn Handler>, stop_tx: watch::Sender<bool>, mut stop_rx: watch::Receiver<bool>) {
    tokio::spawn(async move {
        let mut connections = JoinSet::new();
        loop {
            tokio::select! {
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let handler = Arc::clone(&handler);
                            let stop_tx = stop_tx.clone();
                            connections.spawn(async move {
                                if let Err(err) = serve_one_message(stream, handler, stop_tx).await {
                                    tracing::error!(target: "net", "connection from {peer} failed: {err}");
                                }
                            });
                        }
                        Err(err) => {
                            tracing::error!(target: "net", "accept failed: {err}");
                        }
                    }
                }
            }
        }

        // Drain in-flight handlers before freeing the singleton slot, so a
        // caller never observes a fresh `Server::start` succeed while the
        // just-stopped instance still has a handler running.
        while connections.join_next().await.is_some() {}

        tracing::info!(target: "net", "listener closed");
        SERVER_ACTIVE.store(false, Ordering::SeqCst);
    });
}

async fn serve_one_message(mut stream: TcpStream, handler: Arc<dyn Handler>, stop_tx: watch::Sender<bool>) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.split();
    let mut reader = BufReader::new(read_half);

    let message = match framing::read_message(&mut reader).await? {
        Some(message) => message,
        None => return Ok(()),
    };

    if message.trim() == SHUTDOWN_SENTINEL {
        write_half.write_all(&framing::encode("Shutting down")).await?;
        write_half.flush().await?;
        let _ = stop_tx.send(true);
        return Ok(());
    }

    let summary = {
        let handler = Arc::clone(&handler);
        let message = message.clone();
        tokio::task::spawn_blocking(move || {
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler.handle(&message))).unwrap_or_default()
        })
        .await
        .unwrap_or_default()
    };

    write_half.write_all(&framing::encode(&summary)).await?;
    write_half.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::client::Client;
    use std::time::Duration;

    struct EchoHandler;
    impl Handler for EchoHandler {
        fn handle(&self, message: &str) -> String {
            format!("echo: {message}")
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    fn addr_string(server: &Server) -> String {
        let socket_addr = server.local_addr();
        format!("{}::{}", socket_addr.ip(), socket_addr.port())
    }

    // `Server` enforces a single live instance per process via a global
    // flag, so tests that start one must not run concurrently with each
    // other; `cargo test` otherwise runs test functions in parallel.
    static SINGLETON_GUARD: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[tokio::test]
    async fn refuses_a_second_concurrent_instance() {
        let _serial = SINGLETON_GUARD.lock().unwrap();
        let first = Server::start(Some("127.0.0.1::0"), Arc::new(EchoHandler)).await.unwrap();
        let second = Server::start(Some("127.0.0.1::0"), Arc::new(EchoHandler)).await;
        assert!(matches!(second, Err(CoreError::IllegalState(_))));
        first.stop();
        settle().await;
    }

    #[tokio::test]
    async fn end_to_end_request_and_shutdown() {
        // S5: ping -> echo reply; shutdown -> "Shutting down"; third connect fails.
        let _serial = SINGLETON_GUARD.lock().unwrap();
        let server = Server::start(Some("127.0.0.1::0"), Arc::new(EchoHandler)).await.unwrap();
        let address = addr_string(&server);

        let client = Client::connect(&address).await.unwrap();
        let reply = client.send("ping").await.unwrap();
        assert_eq!(reply, "echo: ping");

        let shutdown_client = Client::connect(&address).await.unwrap();
        let reply = shutdown_client.send("shutdown").await.unwrap();
        assert_eq!(reply, "Shutting down");

        settle().await;

        let third = Client::connect(&address).await;
        assert!(matches!(third, Err(CoreError::Unreachable(_))));
    }

    #[tokio::test]
    async fn multi_line_payload_round_trips_through_the_wire() {
        // S6: body "line1\nline2" terminated by [<EOM>].
        let _serial = SINGLETON_GUARD.lock().unwrap();
        struct CapturingHandler {
            seen: parking_lot::Mutex<Option<String>>,
        }
        impl Handler for CapturingHandler {
            fn handle(&self, message: &str) -> String {
                *self.seen.lock() = Some(message.to_string());
                "ok".to_string()
            }
        }

        let handler = Arc::new(CapturingHandler {
            seen: parking_lot::Mutex::new(None),
        });
        let server = Server::start(Some("127.0.0.1::0"), Arc::clone(&handler) as Arc<dyn Handler>)
            .await
            .unwrap();
        let address = addr_string(&server);

        let client = Client::connect(&address).await.unwrap();
        let reply = client.send("line1\nline2").await.unwrap();
        assert_eq!(reply, "ok");
        assert_eq!(handler.seen.lock().clone(), Some("line1\nline2".to_string()));

        server.stop();
        settle().await;
    }

    #[tokio::test]
    async fn client_send_is_one_shot() {
        let _serial = SINGLETON_GUARD.lock().unwrap();
        let server = Server::start(Some("127.0.0.1::0"), Arc::new(EchoHandler)).await.unwrap();
        let address = addr_string(&server);

        let client = Client::connect(&address).await.unwrap();
        let first = client.send("hello").await.unwrap();
        assert_eq!(first, "echo: hello");

        let second = client.send("again").await.unwrap();
        assert_eq!(second, "");

        server.stop();
        settle().await;
    }
}
