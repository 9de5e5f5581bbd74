// /////////////////////////////////////////////////////////////////////////////
// Variability Analysis Infrastructure
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! A demonstration [`variability_core::Handler`]. It is not one of the real
//! analysis plugins this infrastructure would normally dispatch to — those
//! (variability, build, and code model analyses) are out of scope — but it
//! gives server mode something real to run: it fans each word in the
//! request out across a small pipeline, uppercases it, and reports progress
//! on a tracker before replying with the joined result.

use std::sync::{Arc, Mutex};

use variability_core::net::server::Handler;
use variability_core::{Pipeline, ProgressReporter};

const WORKERS: usize = 4;

pub struct EchoAnalysisHandler {
    reporter: &'static ProgressReporter,
}

impl EchoAnalysisHandler {
    pub fn new() -> Self {
        Self::with_reporter(ProgressReporter::global())
    }

    pub fn with_reporter(reporter: &'static ProgressReporter) -> Self {
        Self { reporter }
    }

    /// Runs the analysis synchronously, independent of the `Handler` trait,
    /// for batch mode where there's no connection to reply on.
    pub fn analyze(&self, message: &str) -> String {
        self.handle(message)
    }
}

impl Default for EchoAnalysisHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for EchoAnalysisHandler {
    fn handle(&self, message: &str) -> String {
        let words: Vec<&str> = message.split_whitespace().collect();
        if words.is_empty() {
            return String::new();
        }

        let tracker = self.reporter.track("analyze", Some(words.len() as u64));
        let results = Arc::new(Mutex::new(Vec::with_capacity(words.len())));
        let sink = Arc::clone(&results);

        let pipeline = match Pipeline::new(
            |word: String| word.to_uppercase(),
            move |upper| {
                if let Ok(mut sink) = sink.lock() {
                    sink.push(upper);
                }
            },
            WORKERS.min(words.len()),
        ) {
            Ok(pipeline) => pipeline,
            Err(err) => {
                tracing::error!(target: "cli", "failed to start analysis pipeline: {err}");
                return String::new();
            }
        };

        for word in words {
            if pipeline.add(word.to_string()).is_err() {
                break;
            }
            tracker.one_done();
        }
        pipeline.end();
        pipeline.join();
        tracker.close();

        results.lock().map(|joined| joined.join(" ")).unwrap_or_default()
    }
}
