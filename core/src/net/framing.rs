// /////////////////////////////////////////////////////////////////////////////
// Variability Analysis Infrastructure
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Line-oriented message framing.
//!
//! A message is a sequence of text lines terminated by a line that ends
//! with the literal marker `[<EOM>]`. The marker is stripped on read; any
//! bytes preceding it on that line are appended as the final line of the
//! accumulated message. Lines are joined with `\n`.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// The literal framing terminator.
pub const EOM: &str = "[<EOM>]";

/// Encodes `message` as framed bytes ready to write to a socket.
///
/// Every line of `message` is written verbatim except the last, which gets
/// the EOM marker appended before its trailing newline. A message
/// containing no `\n` at all still gets exactly one framed line.
pub fn encode(message: &str) -> Vec<u8> {
    let mut framed = String::with_capacity(message.len() + EOM.len() + 1);
    let mut lines = message.split('\n').peekable();
    while let Some(line) = lines.next() {
        framed.push_str(line);
        if lines.peek().is_some() {
            framed.push('\n');
        } else {
            framed.push_str(EOM);
            framed.push('\n');
        }
    }
    framed.into_bytes()
}

/// Reads one framed message from `reader`.
///
/// Returns `Ok(None)` if the stream was closed before any bytes of a new
/// message arrived (a clean disconnect between messages). Returns
/// `Err(UnexpectedEof)` if the stream closes mid-message.
pub async fn read_message<R>(reader: &mut R) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut accumulated: Vec<String> = Vec::new();

    loop {
        let mut raw = String::new();
        let bytes_read = reader.read_line(&mut raw).await?;

        if bytes_read == 0 {
            if accumulated.is_empty() {
                return Ok(None);
            }
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed mid-message",
            ));
        }

        let mut line = raw.trim_end_matches('\n').to_string();
        if line.ends_with('\r') {
            line.pop();
        }

        if let Some(body) = line.strip_suffix(EOM) {
            accumulated.push(body.to_string());
            return Ok(Some(accumulated.join("\n")));
        }
        accumulated.push(line);
    }
}
