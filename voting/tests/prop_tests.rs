use proptest::prelude::*;
use tcr_types::PollId;
use tcr_voting::{LockIndex, QuorumRule};

proptest! {
    #[test]
    fn insert_point_is_always_a_valid_position(
        amounts in prop::collection::vec(0u128..1_000, 1..40),
        candidate in 0u128..1_000,
    ) {
        let mut index = LockIndex::new();
        for (i, tokens) in amounts.iter().enumerate() {
            let poll = i as PollId + 1;
            let prev = index.insert_point(*tokens, poll);
            prop_assert!(index.valid_position(prev, poll, *tokens));
            prop_assert!(index.insert(poll, *tokens, prev));
        }
        let fresh = amounts.len() as PollId + 1;
        let prev = index.insert_point(candidate, fresh);
        prop_assert!(index.valid_position(prev, fresh, candidate));
        prop_assert_eq!(index.locked_tokens(), *amounts.iter().max().unwrap());
    }

    #[test]
    fn removal_keeps_maximum_consistent(
        amounts in prop::collection::vec(1u128..1_000, 2..30),
        remove_every in 2usize..5,
    ) {
        let mut index = LockIndex::new();
        for (i, tokens) in amounts.iter().enumerate() {
            let poll = i as PollId + 1;
            let prev = index.insert_point(*tokens, poll);
            index.insert(poll, *tokens, prev);
        }
        let mut remaining = Vec::new();
        for (i, tokens) in amounts.iter().enumerate() {
            if i % remove_every == 0 {
                prop_assert_eq!(index.remove(i as PollId + 1), Some(*tokens));
            } else {
                remaining.push(*tokens);
            }
        }
        prop_assert_eq!(index.locked_tokens(), remaining.iter().copied().max().unwrap_or(0));
        prop_assert_eq!(index.len(), remaining.len());
    }

    #[test]
    fn more_support_never_fails_a_passing_poll(
        quorum in 0u128..=100,
        votes_for in 0u128..1_000_000,
        votes_against in 0u128..1_000_000,
        extra in 1u128..1_000,
    ) {
        for rule in [QuorumRule::RevealedShare, QuorumRule::RevealedShareWithMajority] {
            if rule.passes(quorum, votes_for, votes_against) {
                prop_assert!(rule.passes(quorum, votes_for + extra, votes_against));
            }
            if !rule.passes(quorum, votes_for, votes_against) {
                prop_assert!(!rule.passes(quorum, votes_for, votes_against + extra));
            }
        }
    }
}
