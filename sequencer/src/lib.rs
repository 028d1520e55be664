//! The token-curated registry sequencer.
//!
//! Owns the token ledger and the three state machines (registry, parameterizer,
//! voting) and runs every operation transactionally: the operation executes
//! against a copy of the state and a staged ledger, and is committed only if it
//! succeeds as a whole. Events are published on the [`EventBus`] after commit.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod sequencer;

pub use config::TcrConfig;
pub use error::TcrError;
pub use events::EventBus;
pub use logging::{init_logging, LogFormat};
pub use sequencer::{Sequencer, TcrState};
