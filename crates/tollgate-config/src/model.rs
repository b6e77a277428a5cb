// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Tollgate.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup. Every section is optional and defaults to
//! sensible values, so Tollgate runs without any config file at all.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level Tollgate configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides via the `TOLLGATE_` prefix.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TollgateConfig {
    /// Budget, estimation, and confirmation settings.
    #[serde(default)]
    pub cost: CostConfig,

    /// Response cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Activity ledger settings.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Model routing settings.
    #[serde(default)]
    pub routing: RoutingConfig,
}

/// Budget and confirmation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CostConfig {
    /// Daily spending limit in USD. Zero or negative disables enforcement.
    #[serde(default)]
    pub daily_budget_usd: f64,

    /// Output-token count assumed for pre-call estimates. The recorded cost
    /// always uses the real usage reported by the backend.
    #[serde(default = "default_estimated_output_tokens")]
    pub estimated_output_tokens: u32,

    /// Skip the interactive confirmation gate. The original model is always
    /// used when confirmation is skipped.
    #[serde(default)]
    pub skip_confirmation: bool,

    /// Estimated cost above which confirmation is requested, in USD.
    #[serde(default = "default_confirm_threshold_usd")]
    pub confirm_threshold_usd: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            daily_budget_usd: 0.0,
            estimated_output_tokens: default_estimated_output_tokens(),
            skip_confirmation: false,
            confirm_threshold_usd: default_confirm_threshold_usd(),
        }
    }
}

fn default_estimated_output_tokens() -> u32 {
    500
}

fn default_confirm_threshold_usd() -> f64 {
    0.01
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Enable the response cache.
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// Cache directory. `None` resolves under the XDG cache dir.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Entry time-to-live in hours.
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            dir: None,
            ttl_hours: default_ttl_hours(),
        }
    }
}

impl CacheConfig {
    /// Resolve the cache directory, falling back to the XDG cache dir.
    pub fn resolve_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from(".cache"))
                .join("tollgate")
                .join("responses")
        })
    }
}

fn default_cache_enabled() -> bool {
    true
}

fn default_ttl_hours() -> u64 {
    24
}

/// Activity ledger configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    /// Ledger database path. `None` resolves under the XDG data dir.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl LedgerConfig {
    /// Resolve the ledger path, falling back to the XDG data dir.
    pub fn resolve_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from(".local/share"))
                .join("tollgate")
                .join("activity.db")
        })
    }
}

/// Model routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Enable routing suggestions. When false, the caller's model is always used.
    #[serde(default = "default_routing_enabled")]
    pub enabled: bool,

    /// Model identifier for the cheap tier.
    #[serde(default = "default_cheap_model")]
    pub cheap_model: String,

    /// Model identifier for the standard tier.
    #[serde(default = "default_standard_model")]
    pub standard_model: String,

    /// Model identifier for the premium tier.
    #[serde(default = "default_premium_model")]
    pub premium_model: String,

    /// Inputs at or below this token count drop one tier.
    #[serde(default = "default_small_input_tokens")]
    pub small_input_tokens: u32,

    /// Inputs at or above this token count climb one tier.
    #[serde(default = "default_large_input_tokens")]
    pub large_input_tokens: u32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            enabled: default_routing_enabled(),
            cheap_model: default_cheap_model(),
            standard_model: default_standard_model(),
            premium_model: default_premium_model(),
            small_input_tokens: default_small_input_tokens(),
            large_input_tokens: default_large_input_tokens(),
        }
    }
}

fn default_routing_enabled() -> bool {
    true
}

fn default_cheap_model() -> String {
    "claude-haiku-4-5-20250901".to_string()
}

fn default_standard_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_premium_model() -> String {
    "claude-opus-4-20250514".to_string()
}

fn default_small_input_tokens() -> u32 {
    1_500
}

fn default_large_input_tokens() -> u32 {
    30_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_disable_budget_enforcement() {
        let config = TollgateConfig::default();
        assert!(config.cost.daily_budget_usd <= 0.0);
        assert!(!config.cost.skip_confirmation);
        assert_eq!(config.cost.estimated_output_tokens, 500);
    }

    #[test]
    fn cache_dir_falls_back_under_xdg() {
        let config = CacheConfig::default();
        let dir = config.resolve_dir();
        assert!(dir.ends_with("tollgate/responses"), "got {dir:?}");
    }

    #[test]
    fn explicit_paths_win_over_xdg() {
        let cache = CacheConfig {
            dir: Some(PathBuf::from("/tmp/c")),
            ..CacheConfig::default()
        };
        assert_eq!(cache.resolve_dir(), PathBuf::from("/tmp/c"));

        let ledger = LedgerConfig {
            path: Some(PathBuf::from("/tmp/l.db")),
        };
        assert_eq!(ledger.resolve_path(), PathBuf::from("/tmp/l.db"));
    }

    #[test]
    fn routing_tiers_are_ordered_by_price() {
        let r = RoutingConfig::default();
        assert!(r.enabled);
        assert!(r.small_input_tokens < r.large_input_tokens);
        assert_ne!(r.cheap_model, r.premium_model);
    }
}
