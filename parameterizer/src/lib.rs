//! Governance over the registry's numeric parameters.
//!
//! Every parameter, including the ones that govern this process, changes through a
//! reparameterization proposal: the proposer stakes `pMinDeposit`, anyone may match
//! the stake to challenge, and a commit-reveal poll settles challenged proposals.

pub mod engine;
pub mod error;
pub mod proposal;
pub mod store;

pub use engine::{Parameterizer, ProposalOutcome, PROCESS_BY_BUFFER};
pub use error::ParameterizerError;
pub use proposal::{ParamProposal, ProposalPhase};
pub use store::ParamStore;
