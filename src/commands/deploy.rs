//! Deploy command - run the full pipeline, then verify the result.

use anyhow::Result;
use colored::Colorize;

use crate::commands::verify::{install_interrupt_handler, run_verification};
use crate::compose::ComposeCli;
use crate::config::VerifySettings;
use crate::deploy::DeployPlan;

/// Execute the deploy pipeline: fresh checkout, artifact in place, `.env`
/// rendered, compose stack recreated, then health verification (unless
/// `--no-verify`).
pub fn execute(
    plan: DeployPlan,
    no_verify: bool,
    timeout: Option<u64>,
    stable: Option<u64>,
    poll_interval: Option<u64>,
) -> Result<()> {
    println!(
        "{} Cleaning {}",
        "→".cyan().bold(),
        plan.deploy_dir.display()
    );
    plan.clean_deploy_dir()?;

    println!("{} Cloning {}", "→".cyan().bold(), plan.repo_url.bold());
    plan.clone_repo()?;

    println!(
        "{} Placing artifact at {}",
        "→".cyan().bold(),
        plan.artifact_dest().display()
    );
    plan.place_artifact()?;

    println!("{} Writing {}", "→".cyan().bold(), plan.env_file().display());
    plan.write_env()?;

    let compose = ComposeCli::new(plan.compose_dir())?;
    println!("{} Bringing containers up", "→".cyan().bold());
    compose.up()?;

    if no_verify {
        println!(
            "{} Deploy finished {}",
            "✓".green().bold(),
            "(verification skipped)".dimmed()
        );
        return Ok(());
    }

    let mut settings = VerifySettings::load(compose.project_dir())?;
    settings.apply_flags(timeout, stable, poll_interval);

    let cancel = install_interrupt_handler()?;
    run_verification(&compose, &settings, &cancel)?;

    println!("{} Deploy finished", "✓".green().bold());
    Ok(())
}
