//! Verify command - health-check an already-running compose stack.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use colored::Colorize;

use crate::commands::render_fleet;
use crate::compose::ComposeCli;
use crate::config::VerifySettings;
use crate::fleet::SnapshotSource;
use crate::verify::{Verdict, Verifier, VerifyError};

/// Execute the verify command against a compose project directory.
pub fn execute(
    project_dir: PathBuf,
    timeout: Option<u64>,
    stable: Option<u64>,
    poll_interval: Option<u64>,
) -> Result<()> {
    let mut settings = VerifySettings::load(&project_dir)?;
    settings.apply_flags(timeout, stable, poll_interval);

    let compose = ComposeCli::new(project_dir)?;
    let cancel = install_interrupt_handler()?;
    run_verification(&compose, &settings, &cancel)
}

/// Wire Ctrl-C to the verifier's cancellation flag so the poll loop aborts
/// promptly instead of finishing its sleep.
pub(crate) fn install_interrupt_handler() -> Result<Arc<AtomicBool>> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .context("Failed to install Ctrl-C handler")?;
    Ok(cancel)
}

/// Run the verifier and translate its verdict into output and exit status.
/// `Verified` returns Ok; everything else prints a diagnostic and bails.
pub(crate) fn run_verification(
    source: &dyn SnapshotSource,
    settings: &VerifySettings,
    cancel: &AtomicBool,
) -> Result<()> {
    let config = settings.to_verify_config()?;

    println!("{} Verifying deployment health", "→".cyan().bold());
    println!(
        "  {}",
        format!(
            "timeout {}s, stable window {}s, poll every {}s",
            settings.timeout_seconds, settings.stable_seconds, settings.poll_interval_seconds
        )
        .dimmed()
    );

    let mut verifier = Verifier::new(config);
    match verifier.run(source, cancel) {
        Ok(Verdict::Verified) => {
            println!(
                "{} Deployment verified: all services healthy for {}s",
                "✓".green().bold(),
                settings.stable_seconds
            );
            Ok(())
        }
        Ok(Verdict::Failed { exited, unhealthy }) => {
            println!("{} Deployment is broken", "✗".red().bold());
            if !exited.is_empty() {
                println!(
                    "  {} exited/restarting: {}",
                    "✗".red(),
                    exited.join(", ").bold()
                );
            }
            if !unhealthy.is_empty() {
                println!("  {} unhealthy: {}", "✗".red(), unhealthy.join(", ").bold());
            }
            bail!("deployment verification failed")
        }
        Ok(Verdict::TimedOut { last }) => {
            println!(
                "{} Fleet never stabilized within {}s",
                "✗".red().bold(),
                settings.timeout_seconds
            );
            if last.is_empty() {
                println!("  {}", "no snapshot was observed before the deadline".dimmed());
            } else {
                println!("  Last observed fleet state:");
                render_fleet(&last);
            }
            bail!("deployment verification timed out")
        }
        Err(VerifyError::Interrupted) => {
            println!("{} Verification interrupted", "⚠".yellow().bold());
            bail!("verification interrupted")
        }
        Err(e @ VerifyError::Source(_)) => Err(e).context("Could not observe the fleet"),
    }
}
