// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pricing, spend ledger, and budget enforcement for Tollgate.
//!
//! This crate provides:
//! - **Price book**: provider/model price tables and cost estimation
//! - **Activity ledger**: append-only SQLite record of every generation
//!   attempt, with daily/monthly totals, per-command breakdowns, forecasts,
//!   and cache statistics
//! - **Budget guard**: threshold alerting and hard-stop enforcement of a
//!   daily spending limit

pub mod budget;
pub mod ledger;
pub mod pricing;

pub use budget::{BudgetGuard, BudgetStatus};
pub use ledger::{ActivityLedger, ActivityRecord, CacheStats, CommandStats, LedgerBreakdown};
pub use pricing::{PriceBook, PricingEntry};
