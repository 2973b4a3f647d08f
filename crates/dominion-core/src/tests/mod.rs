//! Cross-module tests for the attack pipeline.
//!
//! - `determinism.rs`: same seed and same requests give the same state
//! - `integration.rs`: end-to-end attacks through the service, including
//!   concurrent attacks on one defender
//! - `helpers.rs`: standard game setup and request builders

mod determinism;
mod helpers;

// Re-export for convenience
pub use helpers::*;
