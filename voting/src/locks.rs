//! Per-voter lock bookkeeping.
//!
//! Every unrevealed commitment is a node `(tokens, poll)` in an ordered set, so the
//! locked amount is the last node's tokens. Callers still pass the poll they expect
//! to precede the new node; the hint is checked the same way a sorted linked list
//! would check it (`prev.tokens <= tokens <= next.tokens`).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use tcr_types::PollId;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockIndex {
    ordered: BTreeSet<(u128, PollId)>,
    by_poll: BTreeMap<PollId, u128>,
}

impl LockIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_poll.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_poll.is_empty()
    }

    pub fn contains(&self, poll_id: PollId) -> bool {
        self.by_poll.contains_key(&poll_id)
    }

    pub fn tokens_for(&self, poll_id: PollId) -> Option<u128> {
        self.by_poll.get(&poll_id).copied()
    }

    /// Largest amount locked by any node.
    pub fn locked_tokens(&self) -> u128 {
        self.ordered.last().map_or(0, |(tokens, _)| *tokens)
    }

    /// The poll holding the largest lock.
    pub fn last_node(&self) -> Option<PollId> {
        self.ordered.last().map(|(_, poll)| *poll)
    }

    /// Polls in ascending lock order.
    pub fn iter(&self) -> impl Iterator<Item = (PollId, u128)> + '_ {
        self.ordered.iter().map(|(tokens, poll)| (*poll, *tokens))
    }

    /// The node `tokens` should follow: the last node (other than `poll_id`) locking
    /// at most `tokens`. `None` means the head of the list.
    pub fn insert_point(&self, tokens: u128, poll_id: PollId) -> Option<PollId> {
        self.ordered
            .range(..=(tokens, PollId::MAX))
            .rev()
            .map(|(_, poll)| *poll)
            .find(|poll| *poll != poll_id)
    }

    /// Whether placing `(tokens, poll_id)` right after `prev` keeps the order.
    pub fn valid_position(&self, prev: Option<PollId>, poll_id: PollId, tokens: u128) -> bool {
        let after = match prev {
            Some(prev_poll) => {
                let Some(prev_tokens) = self.tokens_for(prev_poll) else {
                    return false;
                };
                if prev_poll == poll_id || prev_tokens > tokens {
                    return false;
                }
                Bound::Excluded((prev_tokens, prev_poll))
            }
            None => Bound::Unbounded,
        };
        let next = self
            .ordered
            .range((after, Bound::Unbounded))
            .find(|(_, poll)| *poll != poll_id);
        next.map_or(true, |(next_tokens, _)| tokens <= *next_tokens)
    }

    /// Add a node. Returns `false` if the hint is not a valid position or the poll is
    /// already locked; the index is unchanged in that case.
    pub fn insert(&mut self, poll_id: PollId, tokens: u128, prev: Option<PollId>) -> bool {
        if self.contains(poll_id) || !self.valid_position(prev, poll_id, tokens) {
            return false;
        }
        self.ordered.insert((tokens, poll_id));
        self.by_poll.insert(poll_id, tokens);
        true
    }

    pub fn remove(&mut self, poll_id: PollId) -> Option<u128> {
        let tokens = self.by_poll.remove(&poll_id)?;
        self.ordered.remove(&(tokens, poll_id));
        Some(tokens)
    }
}
