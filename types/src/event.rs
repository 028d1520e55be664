//! Structured notifications emitted by the registry, parameterizer and voting engine.
//!
//! Engines buffer these while an operation runs; the sequencer publishes them only
//! after the operation has committed, so a rejected operation emits nothing.

use crate::{Address, ListingHash, Param, PollId, ProposalId, Timestamp, VoteOption};
use serde::{Deserialize, Serialize};

/// Which kind of entity a challenge contests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectKind {
    Listing,
    Proposal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TcrEvent {
    // ── Registry ──────────────────────────────────────────────────────────
    Application {
        listing: ListingHash,
        applicant: Address,
        deposit: u128,
        app_end: Timestamp,
        data: String,
    },
    ChallengeInitiated {
        listing: ListingHash,
        challenge_id: PollId,
        challenger: Address,
        commit_end: Timestamp,
        reveal_end: Timestamp,
        data: String,
    },
    Deposit {
        listing: ListingHash,
        added: u128,
        new_total: u128,
        owner: Address,
    },
    Withdrawal {
        listing: ListingHash,
        withdrew: u128,
        new_total: u128,
        owner: Address,
    },
    ApplicationWhitelisted {
        listing: ListingHash,
    },
    ApplicationRemoved {
        listing: ListingHash,
    },
    ListingRemoved {
        listing: ListingHash,
    },
    ListingWithdrawn {
        listing: ListingHash,
        owner: Address,
    },
    TouchAndRemoved {
        listing: ListingHash,
    },
    ExitInitialized {
        listing: ListingHash,
        exit_time: Timestamp,
        exit_delay_end: Timestamp,
        owner: Address,
    },
    ChallengeFailed {
        subject: SubjectKind,
        challenge_id: PollId,
        reward_pool: u128,
        total_tokens: u128,
    },
    ChallengeSucceeded {
        subject: SubjectKind,
        challenge_id: PollId,
        reward_pool: u128,
        total_tokens: u128,
    },
    RewardClaimed {
        subject: SubjectKind,
        challenge_id: PollId,
        reward: u128,
        voter: Address,
    },

    // ── Parameterizer ─────────────────────────────────────────────────────
    NewProposal {
        prop_id: ProposalId,
        name: Param,
        value: u128,
        deposit: u128,
        app_end: Timestamp,
        proposer: Address,
    },
    ProposalChallenged {
        prop_id: ProposalId,
        challenge_id: PollId,
        challenger: Address,
        commit_end: Timestamp,
        reveal_end: Timestamp,
    },
    ProposalAccepted {
        prop_id: ProposalId,
        name: Param,
        value: u128,
    },
    ProposalExpired {
        prop_id: ProposalId,
    },

    // ── Voting ────────────────────────────────────────────────────────────
    PollCreated {
        poll_id: PollId,
        vote_quorum: u128,
        commit_end: Timestamp,
        reveal_end: Timestamp,
    },
    VoteCommitted {
        poll_id: PollId,
        num_tokens: u128,
        voter: Address,
    },
    VoteRevealed {
        poll_id: PollId,
        num_tokens: u128,
        votes_for: u128,
        votes_against: u128,
        choice: VoteOption,
        voter: Address,
    },
    VotingRightsGranted {
        num_tokens: u128,
        voter: Address,
    },
    VotingRightsWithdrawn {
        num_tokens: u128,
        voter: Address,
    },
    TokensRescued {
        poll_id: PollId,
        voter: Address,
    },
}

impl TcrEvent {
    /// Short stable name, used as the `event` field in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Application { .. } => "application",
            Self::ChallengeInitiated { .. } => "challenge_initiated",
            Self::Deposit { .. } => "deposit",
            Self::Withdrawal { .. } => "withdrawal",
            Self::ApplicationWhitelisted { .. } => "application_whitelisted",
            Self::ApplicationRemoved { .. } => "application_removed",
            Self::ListingRemoved { .. } => "listing_removed",
            Self::ListingWithdrawn { .. } => "listing_withdrawn",
            Self::TouchAndRemoved { .. } => "touch_and_removed",
            Self::ExitInitialized { .. } => "exit_initialized",
            Self::ChallengeFailed { .. } => "challenge_failed",
            Self::ChallengeSucceeded { .. } => "challenge_succeeded",
            Self::RewardClaimed { .. } => "reward_claimed",
            Self::NewProposal { .. } => "new_proposal",
            Self::ProposalChallenged { .. } => "proposal_challenged",
            Self::ProposalAccepted { .. } => "proposal_accepted",
            Self::ProposalExpired { .. } => "proposal_expired",
            Self::PollCreated { .. } => "poll_created",
            Self::VoteCommitted { .. } => "vote_committed",
            Self::VoteRevealed { .. } => "vote_revealed",
            Self::VotingRightsGranted { .. } => "voting_rights_granted",
            Self::VotingRightsWithdrawn { .. } => "voting_rights_withdrawn",
            Self::TokensRescued { .. } => "tokens_rescued",
        }
    }
}
