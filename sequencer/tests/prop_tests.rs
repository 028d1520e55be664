use proptest::prelude::*;
use tcr_crypto::{listing_hash, vote_commitment};
use tcr_ledger::TokenLedger;
use tcr_nullables::{NullClock, NullLedger};
use tcr_registry::StatusUpdate;
use tcr_sequencer::{Sequencer, TcrConfig};
use tcr_types::{Address, VoteOption};

fn voter(i: usize) -> Address {
    Address::new(format!("voter{i}"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A full challenge round moves tokens around but never creates or destroys
    /// them, and voter payouts stay within the pool.
    #[test]
    fn challenge_round_conserves_supply(
        deposit in 10u128..200,
        votes in prop::collection::vec((any::<bool>(), 1u128..500, any::<bool>()), 0..6),
    ) {
        let config = TcrConfig::default();
        let mut ledger = NullLedger::new()
            .with_balance("owner", 1_000)
            .with_balance("challenger", 1_000);
        for i in 0..votes.len() {
            ledger.mint(&voter(i), 1_000);
        }
        let everyone: Vec<Address> = [Address::new("owner"), Address::new("challenger")]
            .into_iter()
            .chain((0..votes.len()).map(voter))
            .collect();
        for who in &everyone {
            ledger.approve(who, &config.registry_escrow, u128::MAX).unwrap();
            ledger.approve(who, &config.voting_escrow, u128::MAX).unwrap();
        }
        let supply = ledger.total_supply();
        let mut tcr = Sequencer::new(&config, ledger).unwrap();
        let clock = NullClock::new(10_000);

        let hash = listing_hash(b"listing");
        tcr.apply(&Address::new("owner"), hash, deposit, "", clock.now()).unwrap();
        let poll_id = tcr
            .challenge(&Address::new("challenger"), hash, "", clock.now())
            .unwrap()
            .unwrap();

        for (i, (support, tokens, _)) in votes.iter().enumerate() {
            let option = if *support { VoteOption::For } else { VoteOption::Against };
            let prev = tcr.get_insert_point_for_num_tokens(&voter(i), *tokens, poll_id);
            tcr.commit_vote(&voter(i), poll_id, vote_commitment(option, i as u64), *tokens, prev, clock.now())
                .unwrap();
        }
        clock.advance(600);
        for (i, (support, _, reveal)) in votes.iter().enumerate() {
            if *reveal {
                let option = if *support { VoteOption::For } else { VoteOption::Against };
                tcr.reveal_vote(&voter(i), poll_id, option, i as u64, clock.now()).unwrap();
            }
        }
        clock.advance(600);

        let update = tcr.update_status(hash, clock.now()).unwrap();
        let settled = matches!(
            update,
            StatusUpdate::ChallengeFailed { .. } | StatusUpdate::ChallengeSucceeded
        );
        prop_assert!(settled, "unexpected status update {:?}", update);

        let mut paid = 0u128;
        for i in 0..votes.len() {
            if let Ok(reward) = tcr.claim_reward(&voter(i), poll_id, i as u64, clock.now()) {
                paid += reward;
            }
        }
        let challenge = tcr.listing_challenge(poll_id).unwrap();
        prop_assert_eq!(challenge.paid_out, paid);
        prop_assert!(paid <= challenge.reward_pool);

        prop_assert_eq!(tcr.ledger().circulating(), supply);
        let escrow = tcr.ledger().balance_of(tcr.registry().escrow());
        let staked: u128 = tcr.registry().listings().map(|(_, l)| l.unstaked_deposit).sum();
        prop_assert!(escrow >= staked);
    }
}
