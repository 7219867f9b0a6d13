//! Deterministic, pure logic shared by the dispatcher.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! task tables and return deterministic outputs suitable for tests.

pub mod invariants;
pub mod pattern;
pub mod plan;
pub mod table;
pub mod tools;
pub mod types;
