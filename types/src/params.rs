//! Governable parameters and their genesis values.
//!
//! Every parameter can be changed through a reparameterization proposal, including
//! the `p`-prefixed ones that govern the parameterizer itself.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every numeric parameter held by the parameterizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Param {
    // Registry
    MinDeposit,
    ApplyStageLength,
    CommitStageLength,
    RevealStageLength,
    DispensationPct,
    VoteQuorum,
    ExitTimeDelay,
    ExitPeriodLen,

    // Parameterizer (self-governing)
    PMinDeposit,
    PApplyStageLength,
    PCommitStageLength,
    PRevealStageLength,
    PDispensationPct,
    PVoteQuorum,
}

impl Param {
    pub const ALL: [Param; 14] = [
        Param::MinDeposit,
        Param::ApplyStageLength,
        Param::CommitStageLength,
        Param::RevealStageLength,
        Param::DispensationPct,
        Param::VoteQuorum,
        Param::ExitTimeDelay,
        Param::ExitPeriodLen,
        Param::PMinDeposit,
        Param::PApplyStageLength,
        Param::PCommitStageLength,
        Param::PRevealStageLength,
        Param::PDispensationPct,
        Param::PVoteQuorum,
    ];

    /// Canonical name of this parameter.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MinDeposit => "minDeposit",
            Self::ApplyStageLength => "applyStageLength",
            Self::CommitStageLength => "commitStageLength",
            Self::RevealStageLength => "revealStageLength",
            Self::DispensationPct => "dispensationPct",
            Self::VoteQuorum => "voteQuorum",
            Self::ExitTimeDelay => "exitTimeDelay",
            Self::ExitPeriodLen => "exitPeriodLen",
            Self::PMinDeposit => "pMinDeposit",
            Self::PApplyStageLength => "pApplyStageLength",
            Self::PCommitStageLength => "pCommitStageLength",
            Self::PRevealStageLength => "pRevealStageLength",
            Self::PDispensationPct => "pDispensationPct",
            Self::PVoteQuorum => "pVoteQuorum",
        }
    }

    /// Percentages may never exceed 100.
    pub fn is_percentage(&self) -> bool {
        matches!(
            self,
            Self::DispensationPct | Self::PDispensationPct | Self::VoteQuorum | Self::PVoteQuorum
        )
    }

    /// Check a candidate value against the parameter's static bounds.
    pub fn validate(&self, value: u128) -> Result<(), TypesError> {
        if self.is_percentage() && value > 100 {
            return Err(TypesError::ParamOutOfRange {
                name: self.name(),
                value,
                max: 100,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Param {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Param::ALL
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| TypesError::UnknownParam(s.to_string()))
    }
}

/// Genesis values for every parameter.
///
/// Keys serialize under the canonical parameter names so a configuration file reads
/// the same way proposals name parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParamDefaults {
    /// Minimum deposit (token units) to apply for a listing.
    #[serde(with = "wide")]
    pub min_deposit: u128,
    /// Seconds an application waits before it can be whitelisted.
    #[serde(with = "wide")]
    pub apply_stage_length: u128,
    /// Seconds of the commit window of a listing challenge.
    #[serde(with = "wide")]
    pub commit_stage_length: u128,
    /// Seconds of the reveal window of a listing challenge.
    #[serde(with = "wide")]
    pub reveal_stage_length: u128,
    /// Percentage of the loser's stake paid to the winning party (0-100).
    #[serde(with = "wide")]
    pub dispensation_pct: u128,
    /// Percentage of revealed tokens that must vote for a listing to keep it (0-100).
    #[serde(with = "wide")]
    pub vote_quorum: u128,
    /// Seconds between `init_exit` and the opening of the exit window.
    #[serde(with = "wide")]
    pub exit_time_delay: u128,
    /// Seconds the exit window stays open.
    #[serde(with = "wide")]
    pub exit_period_len: u128,

    /// Deposit (token units) to propose a reparameterization.
    #[serde(with = "wide")]
    pub p_min_deposit: u128,
    #[serde(with = "wide")]
    pub p_apply_stage_length: u128,
    #[serde(with = "wide")]
    pub p_commit_stage_length: u128,
    #[serde(with = "wide")]
    pub p_reveal_stage_length: u128,
    #[serde(with = "wide")]
    pub p_dispensation_pct: u128,
    #[serde(with = "wide")]
    pub p_vote_quorum: u128,
}

impl ParamDefaults {
    /// Value configured for a parameter.
    pub fn value(&self, param: Param) -> u128 {
        match param {
            Param::MinDeposit => self.min_deposit,
            Param::ApplyStageLength => self.apply_stage_length,
            Param::CommitStageLength => self.commit_stage_length,
            Param::RevealStageLength => self.reveal_stage_length,
            Param::DispensationPct => self.dispensation_pct,
            Param::VoteQuorum => self.vote_quorum,
            Param::ExitTimeDelay => self.exit_time_delay,
            Param::ExitPeriodLen => self.exit_period_len,
            Param::PMinDeposit => self.p_min_deposit,
            Param::PApplyStageLength => self.p_apply_stage_length,
            Param::PCommitStageLength => self.p_commit_stage_length,
            Param::PRevealStageLength => self.p_reveal_stage_length,
            Param::PDispensationPct => self.p_dispensation_pct,
            Param::PVoteQuorum => self.p_vote_quorum,
        }
    }

    /// All `(param, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Param, u128)> + '_ {
        Param::ALL.iter().map(move |p| (*p, self.value(*p)))
    }

    /// Reject genesis values no proposal could ever have produced.
    pub fn validate(&self) -> Result<(), TypesError> {
        for (param, value) in self.iter() {
            param.validate(value)?;
        }
        if self.p_min_deposit == 0 {
            return Err(TypesError::ParamZero(Param::PMinDeposit.name()));
        }
        Ok(())
    }
}

impl Default for ParamDefaults {
    fn default() -> Self {
        Self {
            min_deposit: 10,
            apply_stage_length: 600,
            commit_stage_length: 600,
            reveal_stage_length: 600,
            dispensation_pct: 50,
            vote_quorum: 50,
            exit_time_delay: 600,
            exit_period_len: 600,

            p_min_deposit: 100,
            p_apply_stage_length: 1200,
            p_commit_stage_length: 1200,
            p_reveal_stage_length: 1200,
            p_dispensation_pct: 50,
            p_vote_quorum: 50,
        }
    }
}

/// `u128` values as plain integers when they fit in 64 bits, decimal strings
/// beyond that. TOML integers are 64-bit.
mod wide {
    use serde::{de, Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        match u64::try_from(*value) {
            Ok(small) => serializer.serialize_u64(small),
            Err(_) => serializer.serialize_str(&value.to_string()),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        struct WideVisitor;

        impl de::Visitor<'_> for WideVisitor {
            type Value = u128;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a non-negative integer or a decimal string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
                Ok(u128::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
                u128::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> Result<u128, E> {
                Ok(v)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
                v.trim()
                    .parse()
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(WideVisitor)
    }
}
