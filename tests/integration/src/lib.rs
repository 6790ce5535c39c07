//! Integration tests for the custody call surface
//!
//! This test suite validates:
//! - End-to-end propose / confirm / cancel flows
//! - Quorum floor enforcement through finalized removals
//! - Reentrancy from the value-transfer primitive
//! - Per-call atomicity on failure
//! - Protocol properties over generated inputs
//! - Audit chain, snapshot export and config-driven construction




#[cfg(test)]
mod reentrancy_tests;


#[cfg(test)]
mod observability_tests;
