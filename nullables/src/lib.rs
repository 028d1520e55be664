//! Nullable infrastructure for deterministic testing.
//!
//! The registry core only reaches the outside world through the token ledger, the
//! challenge resolver and the caller-supplied clock. This crate provides test-friendly
//! implementations of each that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Can be told to fail, to exercise rollback paths
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod ledger;
pub mod resolver;

pub use clock::NullClock;
pub use ledger::NullLedger;
pub use resolver::{NullResolver, ScriptedPoll};
