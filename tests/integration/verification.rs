//! End-to-end verification runs against a scripted snapshot source.

use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use dockhand::fleet::{HealthStatus, RunState};
use dockhand::verify::{Verdict, Verifier, VerifyConfig, VerifyError};

use crate::helpers::{fleet, ScriptedSource, Step};

fn fast_config() -> VerifyConfig {
    VerifyConfig {
        timeout: Duration::from_secs(2),
        stable_window: Duration::from_millis(60),
        poll_interval: Duration::from_millis(10),
    }
}

#[test]
fn healthy_fleet_with_probed_and_probeless_services_verifies() {
    // web has a probe, db judges by run-state alone.
    let source = ScriptedSource::new(vec![Step::Fleet(fleet(&[
        ("web", RunState::Running, HealthStatus::Healthy),
        ("db", RunState::Running, HealthStatus::None),
    ]))]);

    let mut verifier = Verifier::new(fast_config());
    let verdict = verifier.run(&source, &AtomicBool::new(false)).unwrap();
    assert_eq!(verdict, Verdict::Verified);
}

#[test]
fn exited_service_fails_on_the_first_sample() {
    let source = ScriptedSource::new(vec![Step::Fleet(fleet(&[
        ("web", RunState::Running, HealthStatus::Healthy),
        ("db", RunState::Exited, HealthStatus::None),
    ]))]);

    let started = Instant::now();
    let mut verifier = Verifier::new(fast_config());
    let verdict = verifier.run(&source, &AtomicBool::new(false)).unwrap();

    assert_eq!(
        verdict,
        Verdict::Failed {
            exited: vec!["db".to_string()],
            unhealthy: vec![],
        }
    );
    // Fail-fast, not a timeout: the run ends well inside the budget.
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn unhealthy_probe_is_reported_in_the_unhealthy_bucket() {
    let source = ScriptedSource::new(vec![Step::Fleet(fleet(&[(
        "web",
        RunState::Running,
        HealthStatus::Unhealthy,
    )]))]);

    let mut verifier = Verifier::new(fast_config());
    let verdict = verifier.run(&source, &AtomicBool::new(false)).unwrap();
    assert_eq!(
        verdict,
        Verdict::Failed {
            exited: vec![],
            unhealthy: vec!["web".to_string()],
        }
    );
}

#[test]
fn flip_to_restarting_terminates_the_run_at_the_flip() {
    let healthy = fleet(&[("web", RunState::Running, HealthStatus::Healthy)]);
    let restarting = fleet(&[("web", RunState::Restarting, HealthStatus::None)]);
    let source = ScriptedSource::new(vec![
        Step::Fleet(healthy.clone()),
        Step::Fleet(healthy),
        Step::Fleet(restarting),
    ]);

    let config = VerifyConfig {
        timeout: Duration::from_secs(5),
        stable_window: Duration::from_secs(5),
        poll_interval: Duration::from_millis(10),
    };
    let mut verifier = Verifier::new(config);
    let verdict = verifier.run(&source, &AtomicBool::new(false)).unwrap();
    assert_eq!(
        verdict,
        Verdict::Failed {
            exited: vec!["web".to_string()],
            unhealthy: vec![],
        }
    );
}

#[test]
fn perpetually_settling_service_times_out_with_the_last_snapshot() {
    // A state that is neither running nor terminal: never verifies, never
    // fail-fasts, so the budget runs out.
    let source = ScriptedSource::new(vec![Step::Fleet(fleet(&[(
        "web",
        RunState::Other("created".to_string()),
        HealthStatus::None,
    )]))]);

    let config = VerifyConfig {
        timeout: Duration::from_millis(150),
        stable_window: Duration::from_secs(5),
        poll_interval: Duration::from_millis(10),
    };
    let mut verifier = Verifier::new(config);
    let verdict = verifier.run(&source, &AtomicBool::new(false)).unwrap();

    match verdict {
        Verdict::TimedOut { last } => {
            let web = last.get("web").expect("last snapshot carries the fleet");
            assert_eq!(web.run_state, RunState::Other("created".to_string()));
        }
        other => panic!("expected TimedOut, got {other:?}"),
    }
}

#[test]
fn source_failure_aborts_the_run_instead_of_counting_as_starting() {
    let source = ScriptedSource::new(vec![Step::Fail("docker not reachable".to_string())]);

    let mut verifier = Verifier::new(fast_config());
    let err = verifier
        .run(&source, &AtomicBool::new(false))
        .expect_err("source failure must not produce a verdict");
    assert!(matches!(err, VerifyError::Source(_)));
}

#[test]
fn raised_cancel_flag_interrupts_promptly() {
    let source = ScriptedSource::new(vec![Step::Fleet(fleet(&[(
        "web",
        RunState::Other("created".to_string()),
        HealthStatus::None,
    )]))]);

    let config = VerifyConfig {
        timeout: Duration::from_secs(60),
        stable_window: Duration::from_secs(15),
        poll_interval: Duration::from_secs(2),
    };
    let cancel = AtomicBool::new(true);

    let started = Instant::now();
    let mut verifier = Verifier::new(config);
    let err = verifier.run(&source, &cancel).expect_err("must be interrupted");
    assert!(matches!(err, VerifyError::Interrupted));
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn recovery_after_a_reset_restarts_the_stability_clock() {
    // healthy → settling → healthy: the early healthy stretch earns no
    // credit, but the fleet still verifies once the post-recovery stretch
    // holds for the full window.
    let healthy = fleet(&[("web", RunState::Running, HealthStatus::Healthy)]);
    let settling = fleet(&[(
        "web",
        RunState::Other("created".to_string()),
        HealthStatus::None,
    )]);
    let source = ScriptedSource::new(vec![
        Step::Fleet(healthy.clone()),
        Step::Fleet(healthy.clone()),
        Step::Fleet(settling),
        Step::Fleet(healthy),
    ]);

    let config = VerifyConfig {
        timeout: Duration::from_secs(2),
        stable_window: Duration::from_millis(80),
        poll_interval: Duration::from_millis(10),
    };
    let started = Instant::now();
    let mut verifier = Verifier::new(config);
    let verdict = verifier.run(&source, &AtomicBool::new(false)).unwrap();

    assert_eq!(verdict, Verdict::Verified);
    // Three polls before the reset plus a full window after it.
    assert!(started.elapsed() >= Duration::from_millis(100));
}
