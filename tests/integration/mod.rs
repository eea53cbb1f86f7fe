//! Integration tests for dockhand's health-verification loop.
//!
//! These drive the real `Verifier::run` loop (real clock, real sleeps, at
//! millisecond scale) against a scripted snapshot source.

pub mod helpers;
pub mod verification;
