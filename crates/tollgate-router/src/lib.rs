// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic model routing: (command, input size) → a possibly cheaper or
//! better model, with a rationale.
//!
//! Pure and table-driven: no I/O, no network, deterministic for every input
//! including commands it has never seen. Thresholds and tier models are
//! configuration data (`RoutingConfig`).

use tracing::debug;

use tollgate_config::RoutingConfig;

/// Model tiers ordered by price and capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Tier {
    Cheap,
    Standard,
    Premium,
}

/// Baseline tier per command.
///
/// Short mechanical outputs (commit subjects) are well served by the cheap
/// tier; prose-heavy commands start at standard. Unknown commands default
/// to standard, keeping the function total.
fn base_tier(command: &str) -> Tier {
    match command {
        "commit" | "suggest" => Tier::Cheap,
        "summarize" | "pr" | "issue" => Tier::Standard,
        _ => Tier::Standard,
    }
}

fn bump_up(tier: Tier) -> Tier {
    match tier {
        Tier::Cheap => Tier::Standard,
        Tier::Standard | Tier::Premium => Tier::Premium,
    }
}

fn bump_down(tier: Tier) -> Tier {
    match tier {
        Tier::Premium => Tier::Standard,
        Tier::Standard | Tier::Cheap => Tier::Cheap,
    }
}

/// Table-driven model suggestion heuristic.
pub struct ModelRouter {
    config: RoutingConfig,
}

impl ModelRouter {
    /// Create a router with the given tier models and size thresholds.
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    /// Suggest a model for a command and input size.
    ///
    /// Total and deterministic: unknown commands take the standard baseline,
    /// very large inputs climb one tier, very small inputs drop one.
    pub fn select_model(&self, command: &str, input_tokens: u32) -> String {
        let mut tier = base_tier(command);
        if input_tokens >= self.config.large_input_tokens {
            tier = bump_up(tier);
        } else if input_tokens <= self.config.small_input_tokens {
            tier = bump_down(tier);
        }
        let model = self.model_for(tier);
        debug!(command, input_tokens, tier = ?tier, model = %model, "model routed");
        model
    }

    /// Message-catalog key explaining why `suggested` was picked for
    /// `command`. Never panics, defined for arbitrary strings.
    pub fn rationale(&self, command: &str, suggested: &str) -> &'static str {
        match self.tier_of(suggested) {
            Tier::Cheap if matches!(base_tier(command), Tier::Cheap) => {
                "router.rationale.routine_command"
            }
            Tier::Cheap => "router.rationale.small_input",
            Tier::Premium => "router.rationale.large_context",
            Tier::Standard => "router.rationale.balanced",
        }
    }

    fn model_for(&self, tier: Tier) -> String {
        match tier {
            Tier::Cheap => self.config.cheap_model.clone(),
            Tier::Standard => self.config.standard_model.clone(),
            Tier::Premium => self.config.premium_model.clone(),
        }
    }

    fn tier_of(&self, model: &str) -> Tier {
        if model == self.config.cheap_model {
            Tier::Cheap
        } else if model == self.config.premium_model {
            Tier::Premium
        } else {
            Tier::Standard
        }
    }
}
