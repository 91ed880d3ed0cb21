//! Best-effort activity logging of saved measures
//!
//! Logging never affects a save: failures are reported with `log::warn!` and
//! dropped, nothing is retried. Short-lived callers such as the CLI call
//! [`ActivityLog::flush`] before exiting so in-flight requests get a chance to
//! finish.

use measure_model::ActivityRecord;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const FLUSH_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Path appended to the configured endpoint
pub const ACTIVITY_PATH: &str = "/api/field-estimations";

#[derive(Debug, thiserror::Error)]
pub enum ActivityError {
    #[error("failed to encode activity record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("activity request failed: {0}")]
    Network(String),
}

/// Receiver of activity records emitted after successful saves
pub trait ActivityLog: Send + Sync {
    /// Hand a record to the log. Must not block the caller on I/O.
    fn record(&self, record: ActivityRecord);

    /// Wait for records handed over so far to be delivered or given up on
    fn flush(&self) {}
}

impl<T: ActivityLog + ?Sized> ActivityLog for Box<T> {
    fn record(&self, record: ActivityRecord) {
        (**self).record(record);
    }

    fn flush(&self) {
        (**self).flush();
    }
}

/// Discards every record
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopActivityLog;

impl ActivityLog for NoopActivityLog {
    fn record(&self, record: ActivityRecord) {
        log::debug!("activity logging disabled, dropping record for '{}'", record.name);
    }
}

/// Keeps records in memory; clones share the same buffer
#[derive(Debug, Default, Clone)]
pub struct MemoryActivityLog {
    records: Arc<Mutex<Vec<ActivityRecord>>>,
}

impl MemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ActivityRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ActivityLog for MemoryActivityLog {
    fn record(&self, record: ActivityRecord) {
        match self.records.lock() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }
}

/// Posts records as JSON to `<endpoint>/api/field-estimations`
///
/// Each record is sent from its own thread. Clones share the set of pending
/// requests, so flushing any clone waits for all of them.
#[derive(Debug, Clone)]
pub struct HttpActivityLog {
    agent: ureq::Agent,
    url: String,
    token: Option<String>,
    timeout: Duration,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl HttpActivityLog {
    pub fn new(endpoint: &str, token: Option<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            url: activity_url(endpoint),
            token,
            timeout,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Post one record and wait for the response
    pub fn send_blocking(&self, record: &ActivityRecord) -> Result<(), ActivityError> {
        let body = serde_json::to_string(record)?;

        let mut request = self.agent.post(&self.url).set("Content-Type", "application/json");
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        request.send_string(&body).map_err(|e| ActivityError::Network(e.to_string()))?;
        Ok(())
    }

    /// Number of requests still in flight
    pub fn pending(&self) -> usize {
        self.with_pending(|pending| pending.iter().filter(|h| !h.is_finished()).count())
    }

    fn with_pending<R>(&self, f: impl FnOnce(&mut Vec<JoinHandle<()>>) -> R) -> R {
        match self.pending.lock() {
            Ok(mut pending) => f(&mut pending),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

impl ActivityLog for HttpActivityLog {
    fn record(&self, record: ActivityRecord) {
        let sender = self.clone();
        let handle = std::thread::spawn(move || match sender.send_blocking(&record) {
            Ok(()) => log::debug!("logged activity for '{}'", record.name),
            Err(e) => log::warn!("failed to log activity for '{}': {e}", record.name),
        });

        self.with_pending(|pending| {
            pending.retain(|h| !h.is_finished());
            pending.push(handle);
        });
    }

    /// Waits at most the request timeout; requests still running after that
    /// are left detached.
    fn flush(&self) {
        let handles = self.with_pending(std::mem::take);
        let deadline = Instant::now() + self.timeout;

        for handle in handles {
            while !handle.is_finished() && Instant::now() < deadline {
                std::thread::sleep(FLUSH_POLL_INTERVAL);
            }
            if !handle.is_finished() {
                log::warn!(
                    "activity request to {} still running after {:?}",
                    self.url,
                    self.timeout
                );
                continue;
            }
            if handle.join().is_err() {
                log::warn!("activity request thread panicked");
            }
        }
    }
}

fn activity_url(endpoint: &str) -> String {
    format!("{}{ACTIVITY_PATH}", endpoint.trim_end_matches('/'))
}
