// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tollgate` subcommand implementations.
//!
//! These handlers operate on the ledger and cache directly: reporting needs
//! no backend, no pricing, and no confirmation gate. Output is plain text
//! on stdout; diagnostics go through `tracing` to stderr.

use std::time::Duration;

use clap::{Parser, Subcommand};

use tollgate_cache::ResponseCache;
use tollgate_config::TollgateConfig;
use tollgate_core::TollgateError;
use tollgate_cost::ActivityLedger;

/// Cost guard for developer CLIs calling metered LLM backends.
#[derive(Parser, Debug)]
#[command(name = "tollgate", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show spend totals and a per-command breakdown.
    Stats,
    /// Project this month's spend from the pace so far.
    Forecast,
    /// List recorded activity, oldest first.
    History {
        /// Only show the most recent N records.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Manage the response cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Delete expired cache entries.
    Sweep,
    /// Delete the entire cache.
    Clear,
}

/// Dispatch a parsed command line against the loaded configuration.
pub async fn run(cli: Cli, config: &TollgateConfig) -> Result<(), TollgateError> {
    match cli.command {
        Commands::Stats => run_stats(config).await,
        Commands::Forecast => run_forecast(config).await,
        Commands::History { limit } => run_history(config, limit).await,
        Commands::Cache { action } => run_cache(config, action).await,
    }
}

async fn open_ledger(config: &TollgateConfig) -> Result<ActivityLedger, TollgateError> {
    ActivityLedger::open(&config.ledger.resolve_path()).await
}

async fn open_cache(config: &TollgateConfig) -> Result<ResponseCache, TollgateError> {
    let ttl = Duration::from_secs(config.cache.ttl_hours * 3600);
    ResponseCache::open(config.cache.resolve_dir(), ttl).await
}

async fn run_stats(config: &TollgateConfig) -> Result<(), TollgateError> {
    let ledger = open_ledger(config).await?;

    let daily = ledger.daily_total().await?;
    let monthly = ledger.monthly_total().await?;
    let breakdown = ledger.breakdown_by_command().await?;
    let cache = ledger.cache_stats().await?;

    println!("today:      ${daily:.4}");
    if config.cost.daily_budget_usd > 0.0 {
        let pct = daily / config.cost.daily_budget_usd * 100.0;
        println!(
            "budget:     ${:.4} ({pct:.0}% used)",
            config.cost.daily_budget_usd
        );
    }
    println!("this month: ${monthly:.4}");
    println!();

    if breakdown.commands.is_empty() {
        println!("no activity recorded yet");
        return Ok(());
    }

    println!(
        "{:<16} {:>8} {:>12} {:>12} {:>10}",
        "command", "calls", "total", "avg", "hit rate"
    );
    for stats in &breakdown.commands {
        println!(
            "{:<16} {:>8} {:>11.4}$ {:>11.4}$ {:>9.0}%",
            stats.command,
            stats.calls,
            stats.total_cost_usd,
            stats.avg_cost_usd,
            stats.cache_hit_rate * 100.0,
        );
    }
    println!(
        "{:<16} {:>8} {:>11.4}$",
        "total", breakdown.total_calls, breakdown.total_cost_usd
    );
    println!();
    println!(
        "cache: {} hits / {} records ({:.0}%), ~${:.4} saved",
        cache.cache_hits,
        cache.total_records,
        cache.hit_rate * 100.0,
        cache.estimated_saved_usd,
    );
    Ok(())
}

async fn run_forecast(config: &TollgateConfig) -> Result<(), TollgateError> {
    let ledger = open_ledger(config).await?;
    let monthly = ledger.monthly_total().await?;
    let projected = ledger.forecast().await?;
    println!("spent so far this month: ${monthly:.4}");
    println!("projected month total:   ${projected:.4}");
    Ok(())
}

async fn run_history(
    config: &TollgateConfig,
    limit: Option<usize>,
) -> Result<(), TollgateError> {
    let ledger = open_ledger(config).await?;
    let mut records = ledger.history().await?;

    if let Some(limit) = limit {
        let skip = records.len().saturating_sub(limit);
        records.drain(..skip);
    }

    if records.is_empty() {
        println!("no activity recorded yet");
        return Ok(());
    }

    for record in &records {
        let origin = if record.cache_hit {
            "cache"
        } else {
            record.model.as_str()
        };
        println!(
            "{}  {:<12} {:<28} in:{:<7} out:{:<7} ${:.4}  {}ms",
            record.created_at,
            record.command,
            origin,
            record.input_tokens,
            record.output_tokens,
            record.cost_usd,
            record.duration_ms,
        );
    }
    Ok(())
}

async fn run_cache(
    config: &TollgateConfig,
    action: CacheAction,
) -> Result<(), TollgateError> {
    let cache = open_cache(config).await?;
    match action {
        CacheAction::Sweep => {
            cache.clean_expired().await?;
            println!("expired cache entries removed");
        }
        CacheAction::Clear => {
            cache.clean().await?;
            println!("cache cleared");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn history_limit_parses() {
        let cli = Cli::try_parse_from(["tollgate", "history", "--limit", "10"]).unwrap();
        match cli.command {
            Commands::History { limit } => assert_eq!(limit, Some(10)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cache_subcommands_parse() {
        let cli = Cli::try_parse_from(["tollgate", "cache", "sweep"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Cache {
                action: CacheAction::Sweep
            }
        ));

        let cli = Cli::try_parse_from(["tollgate", "cache", "clear"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Cache {
                action: CacheAction::Clear
            }
        ));
    }
}
