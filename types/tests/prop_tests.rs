use proptest::prelude::*;

use tcr_types::{ListingHash, Param, Timestamp, VoteOption};

proptest! {
    /// ListingHash::is_zero is true only for all-zero bytes.
    #[test]
    fn listing_hash_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        let hash = ListingHash::new(bytes);
        prop_assert_eq!(hash.is_zero(), bytes == [0u8; 32]);
        prop_assert_eq!(hash.as_bytes(), &bytes);
    }

    /// Checked deadline arithmetic never wraps.
    #[test]
    fn checked_add_never_wraps(start in 0u64..u64::MAX, secs in 0u128..(u128::from(u64::MAX) * 2)) {
        let t = Timestamp::new(start);
        match t.checked_add_secs(secs) {
            Some(end) => {
                prop_assert!(end >= t);
                prop_assert_eq!(u128::from(end.as_secs()), u128::from(start) + secs);
            }
            None => prop_assert!(u128::from(start) + secs > u128::from(u64::MAX)),
        }
    }

    /// Percentage parameters accept exactly 0..=100.
    #[test]
    fn percentage_bounds(value in 0u128..1_000) {
        for param in Param::ALL.iter().filter(|p| p.is_percentage()) {
            prop_assert_eq!(param.validate(value).is_ok(), value <= 100);
        }
    }

    /// Vote options survive their wire encoding.
    #[test]
    fn vote_option_wire_value(raw in 0u8..4) {
        match VoteOption::try_from(raw) {
            Ok(option) => prop_assert_eq!(option.as_u8(), raw),
            Err(_) => prop_assert!(raw > 1),
        }
    }
}
