//! Command implementations for the dockhand CLI.

pub mod deploy;
pub mod status;
pub mod verify;

use colored::Colorize;

use crate::fleet::{FleetSnapshot, HealthStatus};

/// Render one line per service with a health glyph, in name order.
pub(crate) fn render_fleet(fleet: &FleetSnapshot) {
    for svc in fleet.services() {
        let glyph = if svc.is_fully_healthy() {
            "✓".green().bold()
        } else if svc.run_state.is_terminal_failure() || svc.health == HealthStatus::Unhealthy {
            "✗".red().bold()
        } else {
            "⚠".yellow().bold()
        };
        println!(
            "  {} {} {}",
            glyph,
            svc.name.bold(),
            format!("({}, {})", svc.run_state, svc.health).dimmed()
        );
    }
}
