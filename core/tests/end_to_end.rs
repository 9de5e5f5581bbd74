// /////////////////////////////////////////////////////////////////////////////
// Variability Analysis Infrastructure
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Black-box integration tests exercising the public API surface the way a
//! real caller would: a server whose handler drives a pipeline internally,
//! reporting progress on a tracker as it goes.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use variability_core::net::server::Handler;
use variability_core::{Client, Pipeline, ProgressReporter, Server};

struct CountingHandler {
    reporter: Arc<ProgressReporter>,
}

impl Handler for CountingHandler {
    fn handle(&self, message: &str) -> String {
        let tracker = self.reporter.track("request", Some(1));
        let results = Arc::new(Mutex::new(Vec::new()));
        let out = Arc::clone(&results);

        let pipeline = Pipeline::new(|word: String| word.to_uppercase(), move |upper| out.lock().unwrap().push(upper), 2).unwrap();

        for word in message.split_whitespace() {
            pipeline.add(word.to_string()).unwrap();
        }
        pipeline.end();
        pipeline.join();

        tracker.one_done();
        tracker.close();

        results.lock().unwrap().join(" ")
    }
}

#[tokio::test]
async fn server_handler_can_drive_a_pipeline_and_report_progress() {
    let reporter = Arc::new(ProgressReporter::new(Duration::from_secs(3600)));
    let handler = Arc::new(CountingHandler {
        reporter: Arc::clone(&reporter),
    });

    let server = Server::start(Some("127.0.0.1::0"), handler)
        .await
        .expect("server should start on an ephemeral port");
    let bound = server.local_addr();
    let address = format!("{}::{}", bound.ip(), bound.port());

    let client = Client::connect(&address).await.expect("loopback connect should succeed");
    let reply = client.send("hello world").await.expect("send should succeed");
    assert_eq!(reply, "HELLO WORLD");

    let lines = reporter.tick_now();
    assert_eq!(lines, vec!["request finished 1 of 1 (100%) items and is done"]);

    server.stop();
    tokio::time::sleep(Duration::from_millis(50)).await;
}
