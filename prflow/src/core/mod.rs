//! Deterministic, pure logic for the working-tree state engine.
//!
//! Core modules must be free of I/O side effects. They operate on snapshots
//! and static tables and return deterministic outputs suitable for tests.

pub mod branch_name;
pub mod branch_point;
pub mod catalog;
pub mod classifier;
pub mod porcelain;
pub mod relationship;
pub mod types;
