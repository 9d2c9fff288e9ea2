// ⚙️ Ledger Configuration - Defaults plus environment overrides
//
// LEDGER_ALLOW_NEGATIVE  "true" / "false"   (default false)
// LEDGER_FUNDING_POLICY  "split" / "single" (default split)
// LEDGER_LOG             tracing filter     (default "info")

use crate::entities::FundingPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

pub const ENV_ALLOW_NEGATIVE: &str = "LEDGER_ALLOW_NEGATIVE";
pub const ENV_FUNDING_POLICY: &str = "LEDGER_FUNDING_POLICY";
pub const ENV_LOG: &str = "LEDGER_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Negative-balance policy for banks created without an explicit one
    pub default_allow_negative: bool,

    /// How a bank picks payer accounts during `send`
    pub funding_policy: FundingPolicy,

    /// Filter directive handed to tracing-subscriber by the binary
    pub log_filter: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            default_allow_negative: false,
            funding_policy: FundingPolicy::Split,
            log_filter: "info".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Load configuration from process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key → value source
    ///
    /// Unparseable values keep the default and log a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LedgerConfig::default();

        if let Some(raw) = lookup(ENV_ALLOW_NEGATIVE) {
            match raw.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" => config.default_allow_negative = true,
                "false" | "0" | "no" => config.default_allow_negative = false,
                other => warn!(key = ENV_ALLOW_NEGATIVE, value = other, "ignoring invalid boolean"),
            }
        }

        if let Some(raw) = lookup(ENV_FUNDING_POLICY) {
            match raw.parse::<FundingPolicy>() {
                Ok(policy) => config.funding_policy = policy,
                Err(e) => warn!(key = ENV_FUNDING_POLICY, error = %e, "ignoring invalid funding policy"),
            }
        }

        if let Some(raw) = lookup(ENV_LOG) {
            if !raw.trim().is_empty() {
                config.log_filter = raw;
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, LedgerConfig::default());
        assert!(!config.default_allow_negative);
        assert_eq!(config.funding_policy, FundingPolicy::Split);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_overrides() {
        let config = LedgerConfig::from_lookup(lookup_from(&[
            (ENV_ALLOW_NEGATIVE, "TRUE"),
            (ENV_FUNDING_POLICY, "single"),
            (ENV_LOG, "multi_bank_ledger=debug"),
        ]));
        assert!(config.default_allow_negative);
        assert_eq!(config.funding_policy, FundingPolicy::SingleAccount);
        assert_eq!(config.log_filter, "multi_bank_ledger=debug");
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = LedgerConfig::from_lookup(lookup_from(&[
            (ENV_ALLOW_NEGATIVE, "maybe"),
            (ENV_FUNDING_POLICY, "round-robin"),
            (ENV_LOG, "  "),
        ]));
        assert_eq!(config, LedgerConfig::default());
    }
}
