//! Wait-for-convergence polling
//!
//! Observes remote status at a fixed interval until it settles or a
//! deadline passes. Only reads are issued; the remote operation itself is
//! never aborted.

use crate::error::{ReconcileError, Result};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout};

/// Default interval between status reads
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Lower bound on the poll interval
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Wait settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Overall deadline, measured from the first status read
    pub timeout: Duration,
    interval: Duration,
}

impl WaitConfig {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    /// Poll interval, clamped to [`MIN_POLL_INTERVAL`]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Call `poll` until it yields a value or the deadline passes
///
/// Errors from `poll` propagate immediately. No attempt is started at or
/// after the deadline, and an attempt still in flight when the deadline
/// passes is dropped.
pub async fn wait_until<T, F, Fut>(config: &WaitConfig, what: &str, mut poll: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let deadline = Instant::now() + config.timeout;
    let timed_out = || ReconcileError::Timeout(format!("Timed out waiting for {}.", what));

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(timed_out());
        }

        match timeout(remaining, poll()).await {
            Ok(result) => {
                if let Some(value) = result? {
                    return Ok(value);
                }
            }
            Err(_) => return Err(timed_out()),
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        sleep(config.interval.min(remaining)).await;
    }
}

/// One observed status and the value it has to reach
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCheck {
    pub subject: String,
    pub current: String,
    pub expected: String,
}

impl StatusCheck {
    pub fn new(
        subject: impl Into<String>,
        current: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            current: current.into(),
            expected: expected.into(),
        }
    }

    /// Status comparison ignores case
    pub fn is_settled(&self) -> bool {
        self.current.eq_ignore_ascii_case(&self.expected)
    }
}

/// Source of status observations for [`wait_for_status`]
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Read the primary resource and any secondarily affected ones
    async fn check(&self) -> Result<Vec<StatusCheck>>;
}

/// Wait until every check reported by `source` is settled
pub async fn wait_for_status<P>(config: &WaitConfig, what: &str, source: &P) -> Result<()>
where
    P: StatusSource + ?Sized,
{
    wait_until(config, what, || async {
        let checks = source.check().await?;
        if checks.iter().all(StatusCheck::is_settled) {
            return Ok(Some(()));
        }
        for check in checks.iter().filter(|c| !c.is_settled()) {
            tracing::debug!(
                "{} is {}, waiting for {}",
                check.subject,
                check.current,
                check.expected
            );
        }
        Ok::<_, ReconcileError>(None)
    })
    .await
}
