//! Availability polling for transformed assets
//!
//! A freshly requested transformation is generated lazily by the provider,
//! so its URL answers with an error until processing finishes. The poller
//! probes the URL on a fixed interval and publishes an estimated progress
//! through a watch channel until the asset is served.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Default delay between two availability probes
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Checks whether a URL is being served
#[async_trait]
pub trait Probe: Send + Sync {
    async fn is_ready(&self, url: &str) -> bool;
}

/// Probe that issues a HEAD request; any success status means ready
#[derive(Debug, Clone, Default)]
pub struct HttpProbe {
    http: reqwest::Client,
}

impl HttpProbe {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn is_ready(&self, url: &str) -> bool {
        match self.http.head(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Availability probe for {} failed: {}", url, e);
                false
            }
        }
    }
}

/// Progress estimate for an upload followed by provider-side processing
///
/// The upload phase maps onto 0-90%. While waiting for processing the
/// estimate creeps up by one point per miss and stays below 100 until the
/// asset is actually available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressEstimator {
    value: u8,
}

impl ProgressEstimator {
    pub const UPLOAD_SHARE: f64 = 0.9;
    pub const PROCESSING_CAP: u8 = 99;

    pub fn starting_at(value: u8) -> Self {
        Self {
            value: value.min(Self::PROCESSING_CAP),
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Record upload progress; never moves the estimate backwards
    pub fn observe_upload(&mut self, loaded: u64, total: u64) -> u8 {
        if total > 0 {
            let percent = (loaded.min(total) as f64 / total as f64) * 100.0;
            let mapped = (percent * Self::UPLOAD_SHARE).round() as u8;
            self.value = self.value.max(mapped);
        }
        self.value
    }

    /// One unsuccessful availability probe
    pub fn tick(&mut self) -> u8 {
        self.value = (self.value + 1).min(Self::PROCESSING_CAP).max(self.value);
        self.value
    }

    pub fn complete(&mut self) -> u8 {
        self.value = 100;
        self.value
    }
}

/// Snapshot published after every probe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollStatus {
    pub url: String,
    pub progress: u8,
    pub ready: bool,
    pub attempts: u32,
}

/// Spawns polling tasks sharing one probe
#[derive(Clone)]
pub struct AvailabilityPoller {
    probe: Arc<dyn Probe>,
    interval: Duration,
}

impl AvailabilityPoller {
    pub fn new(probe: Arc<dyn Probe>, interval: Duration) -> Self {
        Self { probe, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start polling `url`; the task stops once it is ready, when the
    /// returned handle is dropped, or when every subscriber has gone away
    pub fn spawn(&self, url: String, start_progress: u8) -> PollTask {
        let mut estimator = ProgressEstimator::starting_at(start_progress);
        let (tx, rx) = watch::channel(PollStatus {
            url: url.clone(),
            progress: estimator.value(),
            ready: false,
            attempts: 0,
        });

        let probe = self.probe.clone();
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut attempts = 0u32;
            loop {
                attempts += 1;
                let ready = probe.is_ready(&url).await;
                let progress = if ready {
                    estimator.complete()
                } else {
                    estimator.tick()
                };

                let status = PollStatus {
                    url: url.clone(),
                    progress,
                    ready,
                    attempts,
                };
                if tx.send(status).is_err() {
                    debug!("Stopped polling {}: no subscribers left", url);
                    return;
                }

                if ready {
                    info!("{} became available after {} probes", url, attempts);
                    return;
                }

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = tx.closed() => {
                        debug!("Stopped polling {}: no subscribers left", url);
                        return;
                    }
                }
            }
        });

        PollTask { status: rx, handle }
    }
}

/// Handle to a running poll; dropping it cancels the poll
pub struct PollTask {
    status: watch::Receiver<PollStatus>,
    handle: JoinHandle<()>,
}

impl PollTask {
    pub fn subscribe(&self) -> watch::Receiver<PollStatus> {
        self.status.clone()
    }

    pub fn current(&self) -> PollStatus {
        self.status.borrow().clone()
    }

    /// Wait for the next published status; `None` once polling has ended
    pub async fn next(&mut self) -> Option<PollStatus> {
        self.status.changed().await.ok()?;
        Some(self.status.borrow_and_update().clone())
    }

    /// Resolve with the final status once the asset is available
    pub async fn wait_ready(mut self) -> Option<PollStatus> {
        loop {
            let status = self.next().await?;
            if status.ready {
                return Some(status);
            }
        }
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
