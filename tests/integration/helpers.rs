//! Shared fixtures: fleet builders and a scripted snapshot source.

use std::collections::VecDeque;
use std::sync::Mutex;

use dockhand::fleet::{
    FleetSnapshot, HealthStatus, RunState, ServiceSnapshot, SnapshotSource, SourceError,
};

/// Build a fleet from (name, run-state, health) triples.
pub fn fleet(services: &[(&str, RunState, HealthStatus)]) -> FleetSnapshot {
    services
        .iter()
        .map(|(name, state, health)| ServiceSnapshot::new(*name, state.clone(), *health))
        .collect()
}

/// One scripted poll outcome.
#[derive(Clone)]
pub enum Step {
    Fleet(FleetSnapshot),
    Fail(String),
}

/// Snapshot source that replays a fixed script, repeating the final step
/// forever once the script is exhausted.
pub struct ScriptedSource {
    steps: Mutex<VecDeque<Step>>,
}

impl ScriptedSource {
    pub fn new(steps: Vec<Step>) -> Self {
        assert!(!steps.is_empty(), "script must not be empty");
        Self {
            steps: Mutex::new(steps.into()),
        }
    }
}

impl SnapshotSource for ScriptedSource {
    fn fleet_snapshot(&self) -> Result<FleetSnapshot, SourceError> {
        let mut steps = self.steps.lock().unwrap();
        let step = if steps.len() > 1 {
            steps.pop_front().unwrap()
        } else {
            steps.front().cloned().unwrap()
        };
        match step {
            Step::Fleet(fleet) => Ok(fleet),
            Step::Fail(msg) => Err(SourceError::Query(msg)),
        }
    }
}
