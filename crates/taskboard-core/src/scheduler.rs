use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::digest::DigestService;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fires once a day at a fixed UTC wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    /// Parses `HH:MM`.
    pub fn parse(s: &str) -> Option<Self> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M").ok().map(Self::new)
    }

    pub fn at(&self) -> NaiveTime {
        self.at
    }

    /// The first firing strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive().and_time(self.at).and_utc();
        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }
}

impl Default for DailySchedule {
    fn default() -> Self {
        Self::new(NaiveTime::MIN)
    }
}

pub struct DigestScheduler {
    digest: Arc<DigestService>,
    schedule: DailySchedule,
    clock: Arc<dyn Clock>,
}

pub struct SchedulerHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl DigestScheduler {
    pub fn new(digest: Arc<DigestService>, schedule: DailySchedule, clock: Arc<dyn Clock>) -> Self {
        Self {
            digest,
            schedule,
            clock,
        }
    }

    pub fn start(self) -> SchedulerHandle {
        let token = CancellationToken::new();
        let task = tokio::spawn(self.run_loop(token.clone()));
        SchedulerHandle { token, task }
    }

    async fn run_loop(self, token: CancellationToken) {
        info!(at = %self.schedule.at(), "Digest scheduler started");

        loop {
            let now = self.clock.now();
            let next = self.schedule.next_after(now);
            let wait = (next - now).to_std().unwrap_or_default();
            info!(next_run = %next, "Next digest scheduled");

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }

            if let Err(e) = self.digest.run().await {
                error!(error = %e, "Digest run failed");
            }
        }

        info!("Digest scheduler stopped");
    }
}

impl SchedulerHandle {
    /// Cancels the loop and waits for it. A run already in progress finishes first.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "Digest scheduler task ended abnormally");
        }
    }
}
