// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily budget enforcement over the activity ledger.
//!
//! The guard recomputes today's spend from the ledger on every check, so two
//! Tollgate components (or a restart) always agree on the numbers. Threshold
//! alerts fire fresh on each call at 50%, 75%, and 90% of the budget. The
//! hard stop rejects a call only when the projected total strictly exceeds
//! the budget: landing exactly on the limit passes.
//!
//! There is no cross-process locking; two concurrent CLI invocations can
//! jointly exceed the budget. Accepted limitation for a single-user tool.

use tracing::{error, info, warn};

use tollgate_config::CostConfig;
use tollgate_core::TollgateError;

use crate::ledger::ActivityLedger;

/// Budget figures derived from the ledger for one check. Never persisted.
#[derive(Debug, Clone, Copy, Default)]
pub struct BudgetStatus {
    /// Spend recorded today, in USD.
    pub today_total_usd: f64,
    /// Today's spend as a percentage of the budget (0 when disabled).
    pub percent_used: f64,
    /// Percentage after the estimated call is added (0 when disabled).
    pub projected_percent: f64,
}

/// Threshold alerting and hard-stop logic for the daily budget.
pub struct BudgetGuard {
    daily_budget_usd: f64,
    ledger: ActivityLedger,
}

impl BudgetGuard {
    /// Create a guard over the given ledger. A budget of zero or less
    /// disables enforcement entirely.
    pub fn new(config: &CostConfig, ledger: ActivityLedger) -> Self {
        Self {
            daily_budget_usd: config.daily_budget_usd,
            ledger,
        }
    }

    /// Check whether an estimated call fits in today's budget.
    ///
    /// Returns `BudgetExceeded` when `today + estimated` strictly exceeds
    /// the budget; the caller must abort before invoking the paid backend.
    pub async fn check(&self, estimated_cost: f64) -> Result<BudgetStatus, TollgateError> {
        if self.daily_budget_usd <= 0.0 {
            return Ok(BudgetStatus::default());
        }

        let budget = self.daily_budget_usd;
        let today = self.ledger.daily_total().await?;
        let total = today + estimated_cost;
        let percent_used = today / budget * 100.0;
        let projected_percent = total / budget * 100.0;

        if projected_percent > 100.0 {
            let overage = total - budget;
            error!(
                spent_today = today,
                estimated = estimated_cost,
                total,
                limit = budget,
                overage,
                "daily budget exceeded, refusing call"
            );
            return Err(TollgateError::BudgetExceeded {
                spent_today: today,
                estimated: estimated_cost,
                total,
                limit: budget,
                overage,
            });
        }

        if percent_used >= 90.0 {
            warn!(
                spent_today = today,
                limit = budget,
                percent_used,
                "daily budget nearly exhausted"
            );
        } else if percent_used >= 75.0 {
            warn!(
                spent_today = today,
                limit = budget,
                percent_used,
                "over three quarters of the daily budget used"
            );
        } else if percent_used >= 50.0 {
            info!(
                spent_today = today,
                limit = budget,
                percent_used,
                "over half of the daily budget used"
            );
        }

        Ok(BudgetStatus {
            today_total_usd: today,
            percent_used,
            projected_percent,
        })
    }
}
