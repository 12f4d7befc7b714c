//! Background worker for stats API requests
//!
//! Keeps the UI loop free of network I/O. Requests and results cross
//! thread boundaries over mpsc channels; the app polls for results once
//! per frame.

use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};

use crate::api::client::StatsClient;
use crate::api::types::{AccessResponse, InsightsResponse, LightsResponse, SummaryResponse};
use crate::data::cache::WindowKey;
use crate::error::Result;

/// Why a window request was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrigin {
    /// Drives the visible chart; carries the issuing sequence number
    View { seq: u64 },
    /// Speculative neighbor fetch; failures are swallowed
    Prefetch,
}

/// Requests that can be sent to the background worker
pub enum WorkerRequest {
    /// Fetch one binned access window
    Window { key: WindowKey, origin: FetchOrigin },
    /// Fetch aggregate counters
    Summary { refresh: bool, seq: u64 },
    /// Fetch outage/load insights
    Insights { seq: u64 },
    /// Fetch light on/off events for an interval
    Lights { start_ms: i64, end_ms: i64, seq: u64 },
    /// Shut down the worker
    Shutdown,
}

/// Results returned from the background worker
pub enum WorkerResult {
    Window {
        key: WindowKey,
        origin: FetchOrigin,
        result: Result<AccessResponse>,
    },
    Summary {
        seq: u64,
        result: Result<SummaryResponse>,
    },
    Insights {
        seq: u64,
        result: Result<InsightsResponse>,
    },
    Lights {
        seq: u64,
        result: Result<LightsResponse>,
    },
}

/// Background worker that executes API requests off the UI thread
pub struct FetchWorker {
    tx: Sender<WorkerRequest>,
    rx: Receiver<WorkerResult>,
    handle: Option<JoinHandle<()>>,
}

impl FetchWorker {
    /// Spawn a new worker thread owning the HTTP client
    pub fn spawn(client: StatsClient) -> Self {
        let (req_tx, req_rx) = channel::<WorkerRequest>();
        let (res_tx, res_rx) = channel::<WorkerResult>();

        let handle = thread::spawn(move || {
            Self::worker_loop(client, req_rx, res_tx);
        });

        Self {
            tx: req_tx,
            rx: res_rx,
            handle: Some(handle),
        }
    }

    fn worker_loop(client: StatsClient, rx: Receiver<WorkerRequest>, tx: Sender<WorkerResult>) {
        while let Ok(request) = rx.recv() {
            let result = match request {
                WorkerRequest::Window { key, origin } => WorkerResult::Window {
                    key,
                    origin,
                    result: client.access(key.end_time_ms, key.range_sec, key.bin_sec),
                },
                WorkerRequest::Summary { refresh, seq } => WorkerResult::Summary {
                    seq,
                    result: client.summary(refresh),
                },
                WorkerRequest::Insights { seq } => WorkerResult::Insights {
                    seq,
                    result: client.insights(),
                },
                WorkerRequest::Lights { start_ms, end_ms, seq } => WorkerResult::Lights {
                    seq,
                    result: client.lights(start_ms, end_ms),
                },
                WorkerRequest::Shutdown => break,
            };

            if tx.send(result).is_err() {
                break;
            }
        }
    }

    /// Send a request to the worker (non-blocking)
    pub fn request(&self, req: WorkerRequest) {
        let _ = self.tx.send(req);
    }

    /// Poll for one completed result (non-blocking)
    pub fn poll(&self) -> Option<WorkerResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => None,
        }
    }
}

impl Drop for FetchWorker {
    fn drop(&mut self) {
        let _ = self.tx.send(WorkerRequest::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_shuts_down_cleanly() {
        let client = StatsClient::new("http://127.0.0.1:1").unwrap();
        let worker = FetchWorker::spawn(client);
        assert!(worker.poll().is_none());
        drop(worker); // joins without hanging
    }
}
