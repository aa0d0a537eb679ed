//! Deterministic, pure logic for the listing wizard.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod categories;
pub mod counter;
pub mod error;
pub mod favorites;
pub mod fields;
pub mod navigator;
pub mod steps;
pub mod types;
