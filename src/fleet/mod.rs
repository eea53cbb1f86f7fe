//! Fleet model: per-service run-state and health snapshots.
//!
//! A `FleetSnapshot` is one atomic observation of every service managed by a
//! compose project. Snapshots are recomputed on every poll and never mutated
//! after construction; the verifier consumes them through the
//! [`SnapshotSource`] trait so the wire protocol (`docker compose ps`) stays
//! out of the state machine.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Process-lifecycle state of a service's container.
///
/// Anything the orchestrator reports beyond the three states we act on is
/// preserved verbatim in `Other` — a service stuck in `created` or
/// `paused` must neither pass nor fail-fast verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Running,
    Exited,
    Restarting,
    Other(String),
}

impl RunState {
    /// Parse a compose `State` string. Unrecognized states are kept as-is.
    pub fn from_compose(state: &str) -> Self {
        match state.trim().to_ascii_lowercase().as_str() {
            "running" => RunState::Running,
            "exited" => RunState::Exited,
            "restarting" => RunState::Restarting,
            other => RunState::Other(other.to_string()),
        }
    }

    /// A state that can never recover within this container instance.
    /// `Exited` and `Restarting` both mean the process already died at
    /// least once since the deploy.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, RunState::Exited | RunState::Restarting)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Running => write!(f, "running"),
            RunState::Exited => write!(f, "exited"),
            RunState::Restarting => write!(f, "restarting"),
            RunState::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Probe-reported health of a service.
///
/// `None` means the service declares no health probe at all and is judged
/// by [`RunState`] alone — it must never block verification waiting for a
/// health value that will never arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    None,
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    /// Parse a compose `Health` string. An empty string means the service
    /// has no probe. Transitional values (`starting`) map to `None`: the
    /// stability window is what turns "probe not failed yet" into
    /// "durably healthy".
    pub fn from_compose(health: &str) -> Self {
        match health.trim().to_ascii_lowercase().as_str() {
            "healthy" => HealthStatus::Healthy,
            "unhealthy" => HealthStatus::Unhealthy,
            _ => HealthStatus::None,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::None => write!(f, "no probe"),
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// One service's state at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSnapshot {
    pub name: String,
    pub run_state: RunState,
    pub health: HealthStatus,
}

impl ServiceSnapshot {
    pub fn new(name: impl Into<String>, run_state: RunState, health: HealthStatus) -> Self {
        Self {
            name: name.into(),
            run_state,
            health,
        }
    }

    /// Running, with either a passing probe or no probe at all.
    pub fn is_fully_healthy(&self) -> bool {
        self.run_state == RunState::Running
            && matches!(self.health, HealthStatus::None | HealthStatus::Healthy)
    }
}

/// All services of one compose project, captured in a single poll.
///
/// Keyed by service name; BTreeMap so diagnostics render in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetSnapshot {
    services: BTreeMap<String, ServiceSnapshot>,
}

impl FleetSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a service observation. A duplicate name replaces the earlier
    /// entry (compose emits each service once, so this only matters for
    /// hand-built snapshots in tests).
    pub fn insert(&mut self, snapshot: ServiceSnapshot) {
        self.services.insert(snapshot.name.clone(), snapshot);
    }

    pub fn get(&self, name: &str) -> Option<&ServiceSnapshot> {
        self.services.get(name)
    }

    pub fn services(&self) -> impl Iterator<Item = &ServiceSnapshot> {
        self.services.values()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Every service running with a passing (or absent) probe.
    /// An empty fleet is never fully healthy — there is nothing to verify.
    pub fn is_fully_healthy(&self) -> bool {
        !self.services.is_empty() && self.services.values().all(ServiceSnapshot::is_fully_healthy)
    }
}

impl FromIterator<ServiceSnapshot> for FleetSnapshot {
    fn from_iter<I: IntoIterator<Item = ServiceSnapshot>>(iter: I) -> Self {
        let mut fleet = FleetSnapshot::new();
        for snapshot in iter {
            fleet.insert(snapshot);
        }
        fleet
    }
}

/// The snapshot query itself could not be performed or produced garbage.
///
/// This is distinct from an unhealthy fleet: a fleet we could observe gets a
/// verdict, a fleet we could not observe gets this error.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("could not query the orchestrator: {0}")]
    Query(String),

    #[error("malformed service listing: {0}")]
    Malformed(String),
}

/// Anything that can produce an atomic per-poll view of the fleet.
///
/// The production implementation shells out to `docker compose ps`; tests
/// substitute a scripted source. The verifier depends only on this trait.
pub trait SnapshotSource {
    fn fleet_snapshot(&self) -> Result<FleetSnapshot, SourceError>;
}
