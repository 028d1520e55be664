//! The live parameter values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tcr_types::{Param, ParamDefaults, TypesError};

/// Current value of every parameter.
///
/// Each accepted write bumps `version`, so a reader can tell whether the
/// configuration it last saw is still current.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamStore {
    values: BTreeMap<Param, u128>,
    version: u64,
}

impl ParamStore {
    pub fn new(defaults: &ParamDefaults) -> Self {
        Self {
            values: defaults.iter().collect(),
            version: 0,
        }
    }

    pub fn get(&self, param: Param) -> u128 {
        self.values.get(&param).copied().unwrap_or(0)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Store `value` and return the new version.
    pub fn set(&mut self, param: Param, value: u128) -> Result<u64, TypesError> {
        param.validate(value)?;
        self.values.insert(param, value);
        self.version += 1;
        Ok(self.version)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Param, u128)> + '_ {
        self.values.iter().map(|(p, v)| (*p, *v))
    }

    pub fn min_deposit(&self) -> u128 {
        self.get(Param::MinDeposit)
    }

    pub fn p_min_deposit(&self) -> u128 {
        self.get(Param::PMinDeposit)
    }
}

impl Default for ParamStore {
    fn default() -> Self {
        Self::new(&ParamDefaults::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_from_defaults() {
        let store = ParamStore::default();
        assert_eq!(store.version(), 0);
        assert_eq!(store.min_deposit(), 10);
        assert_eq!(store.p_min_deposit(), 100);
        assert_eq!(store.get(Param::PApplyStageLength), 1200);
        assert_eq!(store.iter().count(), Param::ALL.len());
    }

    #[test]
    fn set_bumps_version() {
        let mut store = ParamStore::default();
        assert_eq!(store.set(Param::VoteQuorum, 51).unwrap(), 1);
        assert_eq!(store.get(Param::VoteQuorum), 51);
        assert_eq!(store.set(Param::MinDeposit, 50).unwrap(), 2);
    }

    #[test]
    fn percentages_are_bounded() {
        let mut store = ParamStore::default();
        assert!(matches!(
            store.set(Param::PDispensationPct, 101),
            Err(TypesError::ParamOutOfRange { max: 100, .. })
        ));
        assert_eq!(store.version(), 0);
        assert_eq!(store.get(Param::PDispensationPct), 50);
    }
}
