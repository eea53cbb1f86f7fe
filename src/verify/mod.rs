//! Health-verification poller.
//!
//! After a compose stack is (re)started, the [`Verifier`] repeatedly samples
//! the fleet and drives a small state machine until a terminal verdict:
//!
//! - `Polling` → `Failed` — some service is definitively broken (exited,
//!   restarting, or an explicitly failing probe). Checked first on every
//!   iteration; irreversible because the loop exits on that iteration.
//! - `Polling` → `Verified` — every service has been running with a passing
//!   (or absent) probe continuously for the whole stability window.
//! - `Polling` → `TimedOut` — neither of the above within the budget.
//!
//! A single healthy sample is not enough evidence: probes can flap right
//! after a forced recreate while dependent services race to bind ports. The
//! stability window is fleet-wide — any service losing full health resets
//! the clock for all of them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use crate::fleet::{FleetSnapshot, HealthStatus, SnapshotSource, SourceError};

/// Sleep slice granularity; keeps Ctrl-C latency well under the poll interval.
const CANCEL_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// Timing knobs for one verification run.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Total budget before giving up with `TimedOut`.
    pub timeout: Duration,
    /// Continuous fully-healthy duration required for `Verified`.
    pub stable_window: Duration,
    /// Sleep between fleet samples.
    pub poll_interval: Duration,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            stable_window: Duration::from_secs(15),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Terminal outcome of a verification run. Produced at most once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The whole fleet stayed fully healthy for the stability window.
    Verified,
    /// At least one service is definitively broken. A service appears in
    /// exactly one bucket; a dead container takes precedence over its own
    /// stale probe result.
    Failed {
        /// Services whose container exited or is restart-looping.
        exited: Vec<String>,
        /// Services whose health probe reports unhealthy.
        unhealthy: Vec<String>,
    },
    /// The budget ran out without a fail-fast condition or full stability.
    /// Carries the last observed snapshot for diagnosis.
    TimedOut { last: FleetSnapshot },
}

impl Verdict {
    pub fn is_verified(&self) -> bool {
        matches!(self, Verdict::Verified)
    }
}

/// A verification run that could not produce a verdict at all.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The snapshot query failed or returned garbage. Not retried within
    /// the same poll; surfaced verbatim to the caller.
    #[error("snapshot source unavailable: {0}")]
    Source(#[from] SourceError),

    /// The caller's cancellation flag was raised mid-run.
    #[error("verification interrupted")]
    Interrupted,
}

/// The poller itself. One value per verification run; the stability clock
/// and deadline are fields here, never ambient state, so concurrent
/// verifications of different deployments cannot interfere.
#[derive(Debug)]
pub struct Verifier {
    config: VerifyConfig,
    /// Start of the current continuous fully-healthy stretch. Reset to
    /// `None` whenever any service loses full health.
    stable_since: Option<Instant>,
}

impl Verifier {
    pub fn new(config: VerifyConfig) -> Self {
        Self {
            config,
            stable_since: None,
        }
    }

    /// Drive the poll loop to a terminal verdict.
    ///
    /// Blocks the calling thread; `cancel` aborts promptly (the inter-poll
    /// sleep is sliced) with [`VerifyError::Interrupted`]. A source failure
    /// aborts the run immediately rather than counting as "still starting".
    pub fn run(
        &mut self,
        source: &dyn SnapshotSource,
        cancel: &AtomicBool,
    ) -> Result<Verdict, VerifyError> {
        let deadline = Instant::now() + self.config.timeout;
        self.stable_since = None;
        let mut last_snapshot = FleetSnapshot::new();

        loop {
            if cancel.load(Ordering::SeqCst) {
                return Err(VerifyError::Interrupted);
            }

            if Instant::now() >= deadline {
                warn!(
                    timeout_secs = self.config.timeout.as_secs(),
                    "verification budget exhausted"
                );
                return Ok(Verdict::TimedOut {
                    last: last_snapshot,
                });
            }

            let fleet = source.fleet_snapshot()?;
            if let Some(verdict) = self.step(Instant::now(), &fleet) {
                return Ok(verdict);
            }
            last_snapshot = fleet;

            self.sleep(cancel)?;
        }
    }

    /// One iteration of the state machine: fail-fast classification first,
    /// then the fleet-wide stability check. Returns a verdict only when a
    /// terminal state is reached; `now` is injected so tests can drive the
    /// clock synthetically.
    pub fn step(&mut self, now: Instant, fleet: &FleetSnapshot) -> Option<Verdict> {
        let mut exited = Vec::new();
        let mut unhealthy = Vec::new();
        for svc in fleet.services() {
            if svc.run_state.is_terminal_failure() {
                exited.push(svc.name.clone());
            } else if svc.health == HealthStatus::Unhealthy {
                unhealthy.push(svc.name.clone());
            }
        }
        if !exited.is_empty() || !unhealthy.is_empty() {
            warn!(?exited, ?unhealthy, "fail-fast: broken services detected");
            self.stable_since = None;
            return Some(Verdict::Failed { exited, unhealthy });
        }

        if fleet.is_fully_healthy() {
            let since = *self.stable_since.get_or_insert(now);
            let held = now.duration_since(since);
            if held >= self.config.stable_window {
                return Some(Verdict::Verified);
            }
            debug!(
                held_ms = held.as_millis() as u64,
                required_ms = self.config.stable_window.as_millis() as u64,
                "fleet fully healthy, holding for stability window"
            );
        } else {
            if self.stable_since.is_some() {
                debug!("fleet lost full health; stability window reset");
            }
            self.stable_since = None;
        }

        None
    }

    /// Interruptible inter-poll sleep.
    fn sleep(&self, cancel: &AtomicBool) -> Result<(), VerifyError> {
        let until = Instant::now() + self.config.poll_interval;
        loop {
            if cancel.load(Ordering::SeqCst) {
                return Err(VerifyError::Interrupted);
            }
            let now = Instant::now();
            if now >= until {
                return Ok(());
            }
            std::thread::sleep(CANCEL_CHECK_INTERVAL.min(until - now));
        }
    }
}
