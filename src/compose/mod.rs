//! docker compose subprocess runner and snapshot adapter.
//!
//! Wraps `docker compose` invocations with consistent error handling, and
//! adapts the `ps --format json` line protocol (one JSON object per line)
//! into the [`FleetSnapshot`] abstraction the verifier consumes. The line
//! format is an external protocol detail and stays entirely inside this
//! module.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::fleet::{
    FleetSnapshot, HealthStatus, RunState, ServiceSnapshot, SnapshotSource, SourceError,
};

/// One line of `docker compose ps --format json` output. Only the fields
/// the verifier needs; compose emits many more.
#[derive(Debug, Deserialize)]
struct PsEntry {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "State")]
    state: String,
    #[serde(rename = "Health", default)]
    health: String,
}

/// Handle to one compose project's CLI.
pub struct ComposeCli {
    project_dir: PathBuf,
    docker: PathBuf,
}

impl ComposeCli {
    /// Locate the `docker` binary and bind to a project directory.
    pub fn new(project_dir: impl Into<PathBuf>) -> Result<Self> {
        let docker = which::which("docker")
            .context("docker binary not found in PATH. Install Docker or add it to PATH.")?;
        Ok(Self {
            project_dir: project_dir.into(),
            docker,
        })
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    fn compose(&self) -> Command {
        let mut cmd = Command::new(&self.docker);
        cmd.arg("compose").current_dir(&self.project_dir);
        cmd
    }

    /// `docker compose up -d --build --force-recreate --remove-orphans`.
    ///
    /// Streams build output to the caller's terminal; bails on a non-zero
    /// exit.
    pub fn up(&self) -> Result<()> {
        let status = self
            .compose()
            .args(["up", "-d", "--build", "--force-recreate", "--remove-orphans"])
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| {
                format!(
                    "Failed to execute docker compose up in {}",
                    self.project_dir.display()
                )
            })?;
        if !status.success() {
            bail!("docker compose up failed with {status}");
        }
        Ok(())
    }

    /// Raw `docker compose ps --all --format json` output.
    ///
    /// `--all` so exited containers still appear in the listing; without it
    /// a crashed service would look missing instead of exited.
    fn ps_json(&self) -> Result<String, SourceError> {
        let output = self
            .compose()
            .args(["ps", "--all", "--format", "json"])
            .output()
            .map_err(|e| SourceError::Query(format!("failed to execute docker compose ps: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SourceError::Query(format!(
                "docker compose ps exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl SnapshotSource for ComposeCli {
    fn fleet_snapshot(&self) -> Result<FleetSnapshot, SourceError> {
        let raw = self.ps_json()?;
        let fleet = parse_ps_output(&raw)?;
        debug!(services = fleet.len(), "fleet snapshot taken");
        Ok(fleet)
    }
}

/// Parse the one-JSON-object-per-line `ps` output into a snapshot.
///
/// Any line that fails to parse poisons the whole poll: a half-readable
/// listing must not be mistaken for a fleet that is still starting.
pub fn parse_ps_output(raw: &str) -> Result<FleetSnapshot, SourceError> {
    let mut fleet = FleetSnapshot::new();
    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let entry: PsEntry = serde_json::from_str(line)
            .map_err(|e| SourceError::Malformed(format!("unparseable ps line {line:?}: {e}")))?;
        fleet.insert(ServiceSnapshot::new(
            entry.name,
            RunState::from_compose(&entry.state),
            HealthStatus::from_compose(&entry.health),
        ));
    }
    if fleet.is_empty() {
        return Err(SourceError::Malformed(
            "compose ps listed no services. Is the stack defined and up?".to_string(),
        ));
    }
    Ok(fleet)
}
