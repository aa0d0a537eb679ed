//! Multi-step listing-creation wizard.
//!
//! The crate keeps a strict split between pure logic and side effects:
//!
//! - **[`core`]**: field catalog and Field Store, step catalog and content
//!   selector, step navigator, favorite-set arithmetic. No I/O.
//! - **[`io`]**: project scaffolding, config, the JSON persistence
//!   collaborator, notification sink and refresh signal.
//!
//! Orchestration modules ([`wizard`], [`submission`], [`favorites`], [`run`])
//! compose core logic with I/O for the CLI and the UI server.

pub mod core;
pub mod exit_codes;
pub mod favorites;
pub mod io;
pub mod logging;
pub mod render;
pub mod run;
pub mod submission;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod wizard;
