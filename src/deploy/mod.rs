//! Deployment plumbing: fresh checkout, artifact placement, env rendering.
//!
//! Every step here is deterministic side-effect-only work; the decision
//! logic lives in [`crate::verify`]. Steps mirror the pipeline: wipe the
//! deploy directory, shallow-clone the repository, drop the built artifact
//! in place, render the compose `.env`, then hand off to compose.

use std::path::{Component, Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};

/// Everything a deploy run needs to know up front.
#[derive(Debug, Clone)]
pub struct DeployPlan {
    /// Repository to shallow-clone.
    pub repo_url: String,
    /// Built artifact on this machine, moved (not copied) into the checkout.
    pub artifact: PathBuf,
    /// Root of the checkout on this machine. Wiped on every deploy.
    pub deploy_dir: PathBuf,
    /// Extra KEY=VALUE pairs appended to the rendered `.env`.
    pub extra_env: Vec<(String, String)>,
}

impl DeployPlan {
    /// Directory holding the compose file, and the cwd for compose commands.
    pub fn compose_dir(&self) -> PathBuf {
        self.deploy_dir.join("docker")
    }

    /// Where the artifact lands inside the checkout.
    pub fn artifact_dest(&self) -> PathBuf {
        self.deploy_dir.join("backend").join("backend.jar")
    }

    pub fn env_file(&self) -> PathBuf {
        self.compose_dir().join(".env")
    }

    /// Remove the previous checkout. A missing directory is fine; anything
    /// else (permissions, open handles) is not.
    pub fn clean_deploy_dir(&self) -> Result<()> {
        match std::fs::remove_dir_all(&self.deploy_dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| {
                format!("Failed to remove deploy dir {}", self.deploy_dir.display())
            }),
        }
    }

    /// `git clone --depth 1 <url> <deploy_dir>`.
    pub fn clone_repo(&self) -> Result<()> {
        let output = Command::new("git")
            .args(["clone", "--depth", "1", &self.repo_url])
            .arg(&self.deploy_dir)
            .output()
            .with_context(|| format!("Failed to execute: git clone {}", self.repo_url))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("git clone failed: {}", stderr.trim());
        }
        Ok(())
    }

    /// Move the artifact into the checkout, creating parent directories.
    /// Falls back to copy-and-remove when the rename crosses filesystems.
    pub fn place_artifact(&self) -> Result<()> {
        let dest = self.artifact_dest();
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        if std::fs::rename(&self.artifact, &dest).is_err() {
            std::fs::copy(&self.artifact, &dest).with_context(|| {
                format!(
                    "Failed to move artifact {} to {}",
                    self.artifact.display(),
                    dest.display()
                )
            })?;
            std::fs::remove_file(&self.artifact).with_context(|| {
                format!("Failed to remove source artifact {}", self.artifact.display())
            })?;
        }
        Ok(())
    }

    /// The `.env` contents: artifact path relative to the compose dir, then
    /// the user-supplied pairs in the order given.
    pub fn render_env(&self) -> String {
        let jar_rel = relative_path(&self.artifact_dest(), &self.compose_dir());
        let mut env = format!("HOST_PATH_JAR={}\n", jar_rel.display());
        for (key, value) in &self.extra_env {
            env.push_str(&format!("{key}={value}\n"));
        }
        env
    }

    pub fn write_env(&self) -> Result<()> {
        let env_file = self.env_file();
        if let Some(parent) = env_file.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&env_file, self.render_env())
            .with_context(|| format!("Failed to write {}", env_file.display()))
    }
}

/// Express `target` relative to `base` by stripping the common prefix and
/// backing out of what remains. Both paths are lexical; no filesystem access.
fn relative_path(target: &Path, base: &Path) -> PathBuf {
    let target_parts: Vec<Component> = target.components().collect();
    let base_parts: Vec<Component> = base.components().collect();

    let common = target_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base_parts.len() {
        rel.push("..");
    }
    for part in &target_parts[common..] {
        rel.push(part);
    }
    rel
}

/// clap value parser for `--env KEY=VALUE` pairs.
pub fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    let Some((key, value)) = s.split_once('=') else {
        return Err(format!("expected KEY=VALUE, got {s:?}"));
    };
    if key.is_empty() {
        return Err("environment key must not be empty".to_string());
    }
    Ok((key.to_string(), value.to_string()))
}
