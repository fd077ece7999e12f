//! Integration and property test suite for the Beck spend engine.
//!
//! The tests/ directory drives the public API end to end: named wallet
//! scenarios against the in-memory coin view, and randomized property
//! tests for the invariants the engine promises (value conservation,
//! dust-free outputs, reservation hygiene, determinism).

pub mod helpers;
