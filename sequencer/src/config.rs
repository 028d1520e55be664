//! Registry configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tcr_parameterizer::PROCESS_BY_BUFFER;
use tcr_types::{Address, ParamDefaults};
use tcr_voting::QuorumRule;

use crate::logging::LogFormat;
use crate::TcrError;

/// Configuration for one registry deployment.
///
/// Can be loaded from a TOML file via [`TcrConfig::from_toml_file`] or built
/// programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcrConfig {
    /// Human-readable registry name.
    #[serde(default = "default_registry_name")]
    pub registry_name: String,

    /// Account holding listing deposits and challenge stakes.
    #[serde(default = "default_registry_escrow")]
    pub registry_escrow: Address,

    /// Account holding proposal deposits and challenge stakes.
    #[serde(default = "default_parameterizer_escrow")]
    pub parameterizer_escrow: Address,

    /// Account holding voting rights.
    #[serde(default = "default_voting_escrow")]
    pub voting_escrow: Address,

    #[serde(default)]
    pub quorum_rule: QuorumRule,

    /// Seconds after a proposal's reveal period during which it may still be processed.
    #[serde(default = "default_process_by_buffer")]
    pub process_by_buffer_secs: u64,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Initial parameter values, keyed by parameter name.
    #[serde(default)]
    pub params: ParamDefaults,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_registry_name() -> String {
    "tcr".to_string()
}

fn default_registry_escrow() -> Address {
    Address::new("tcr:registry")
}

fn default_parameterizer_escrow() -> Address {
    Address::new("tcr:parameterizer")
}

fn default_voting_escrow() -> Address {
    Address::new("tcr:voting")
}

fn default_process_by_buffer() -> u64 {
    PROCESS_BY_BUFFER as u64
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl TcrConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, TcrError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| TcrError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, TcrError> {
        toml::from_str(s).map_err(|e| TcrError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, TcrError> {
        toml::to_string_pretty(self).map_err(|e| TcrError::Config(e.to_string()))
    }

    /// Reject configurations no registry could run with.
    pub fn validate(&self) -> Result<(), TcrError> {
        self.params.validate()?;
        let escrows = [
            &self.registry_escrow,
            &self.parameterizer_escrow,
            &self.voting_escrow,
        ];
        if let Some(bad) = escrows.iter().find(|a| !a.is_valid()) {
            return Err(TcrError::Config(format!("invalid escrow address {bad:?}")));
        }
        if escrows[0] == escrows[1] || escrows[0] == escrows[2] || escrows[1] == escrows[2] {
            return Err(TcrError::Config(
                "registry, parameterizer and voting escrows must be distinct".into(),
            ));
        }
        if self.registry_name.trim().is_empty() {
            return Err(TcrError::Config("registry_name must not be empty".into()));
        }
        Ok(())
    }
}

impl Default for TcrConfig {
    fn default() -> Self {
        Self {
            registry_name: default_registry_name(),
            registry_escrow: default_registry_escrow(),
            parameterizer_escrow: default_parameterizer_escrow(),
            voting_escrow: default_voting_escrow(),
            quorum_rule: QuorumRule::default(),
            process_by_buffer_secs: default_process_by_buffer(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            params: ParamDefaults::default(),
        }
    }
}
