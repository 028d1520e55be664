use tcr_challenge::{ChallengeError, ResolverError};
use tcr_ledger::LedgerError;
use tcr_types::{Param, ProposalId, TypesError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParameterizerError {
    #[error("proposal {0} not found")]
    ProposalNotFound(ProposalId),

    #[error("proposal {0} already exists")]
    ProposalExists(ProposalId),

    #[error("{name} is already {value}")]
    NoOpProposal { name: Param, value: u128 },

    #[error("proposal {existing} for {name} is still pending")]
    ProposalPending { name: Param, existing: ProposalId },

    #[error("proposal {0} is already challenged")]
    AlreadyChallenged(ProposalId),

    #[error("proposal {0} has expired")]
    ProposalExpired(ProposalId),

    #[error("application period of proposal {0} is still running")]
    ApplicationPeriodActive(ProposalId),

    #[error("challenge against proposal {0} cannot be resolved yet")]
    ChallengeUnresolved(ProposalId),

    #[error("proposal {0} is not challenged")]
    NotChallenged(ProposalId),

    #[error("process-by deadline would overflow")]
    ProcessByOverflow,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("invalid parameter value: {0}")]
    Param(#[from] TypesError),

    #[error("challenge error: {0}")]
    Challenge(#[from] ChallengeError),

    #[error("resolver error: {0}")]
    Resolver(#[from] ResolverError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
