use proptest::prelude::*;
use tcr_challenge::Challenge;
use tcr_types::Address;

proptest! {
    #[test]
    fn voter_rewards_never_exceed_pool(
        stake in 1u128..1_000_000_000,
        pct in 0u128..=100,
        voters in prop::collection::vec(1u128..1_000_000, 1..20),
    ) {
        let mut challenge = Challenge::new(Address::new("challenger"), stake, pct).unwrap();
        challenge.resolved = true;
        challenge.total_tokens = voters.iter().sum();

        let paid: u128 = voters
            .iter()
            .map(|tokens| challenge.voter_reward(*tokens).unwrap())
            .sum();
        prop_assert!(paid <= challenge.reward_pool);
    }

    #[test]
    fn winner_and_pool_account_for_both_stakes(stake in 0u128..1_000_000_000, pct in 0u128..=100) {
        let challenge = Challenge::new(Address::new("challenger"), stake, pct).unwrap();
        let winner = challenge.winner_reward(1).unwrap();
        prop_assert_eq!(winner + challenge.reward_pool, stake * 2);
        prop_assert_eq!(challenge.winner_reward(0).unwrap(), stake * 2);
    }

    #[test]
    fn reward_pool_never_exceeds_stake(stake in 0u128..u64::MAX as u128, pct in 0u128..=100) {
        let challenge = Challenge::new(Address::new("challenger"), stake, pct).unwrap();
        prop_assert!(challenge.reward_pool <= stake);
    }
}
