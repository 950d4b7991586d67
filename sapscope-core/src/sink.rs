//! Remote log sink
//!
//! Fire-and-forget delivery of structured JSON events to a configured HTTP
//! endpoint. Events are handed to a background worker over a channel so the
//! pipeline never blocks on the network, and delivery failures are logged
//! at debug level and never surfaced to the user.

use crate::config::SinkConfig;
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Handle for posting events to the remote sink.
///
/// A disabled sink is a no-op, so callers can log unconditionally.
pub struct RemoteSink {
    tx: Option<mpsc::Sender<serde_json::Value>>,
    worker: Option<JoinHandle<()>>,
}

impl RemoteSink {
    /// A sink that drops every event.
    pub fn disabled() -> Self {
        Self {
            tx: None,
            worker: None,
        }
    }

    /// Build a sink from configuration. Misconfiguration degrades to a
    /// disabled sink rather than failing the run.
    pub fn new(config: &SinkConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        let endpoint = match &config.endpoint {
            Some(e) => e.clone(),
            None => {
                tracing::warn!("sink.endpoint is not set, remote sink disabled");
                return Self::disabled();
            }
        };
        let timeout = Duration::from_secs(config.timeout_secs);

        let (tx, rx) = mpsc::channel::<serde_json::Value>();
        let worker = std::thread::spawn(move || {
            let client = match reqwest::blocking::Client::builder().timeout(timeout).build() {
                Ok(c) => c,
                Err(e) => {
                    tracing::debug!(error = %e, "Failed to build sink HTTP client");
                    return;
                }
            };
            for event in rx {
                if let Err(e) = client.post(&endpoint).json(&event).send() {
                    tracing::debug!(error = %e, "Failed to deliver sink event");
                }
            }
        });

        Self {
            tx: Some(tx),
            worker: Some(worker),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queue one event. Never blocks, never fails.
    pub fn log(&self, event: serde_json::Value) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}

impl Drop for RemoteSink {
    fn drop(&mut self) {
        // Close the channel, then give the worker a chance to drain what
        // was already queued.
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
