// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only activity ledger backed by SQLite.
//!
//! Every generation attempt is recorded, cache hits included (cost 0).
//! Rows are only ever inserted; the ordered sequence is the ledger of
//! record. All aggregates are recomputed from the table at call time, using
//! the local calendar for "today" and "this month".
//!
//! A missing database file is a valid, empty ledger: the table is created
//! on the first write. A corrupt file makes every read fail with
//! `CorruptHistory` and is never silently treated as empty.

use std::collections::HashMap;
use std::path::Path;

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use tollgate_core::{TokenUsage, TollgateError};

/// One ledger row: a single completed generation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Unique record identifier (UUID v4).
    pub id: String,
    /// CLI command that triggered the call.
    pub command: String,
    /// Provider identifier (e.g. "anthropic").
    pub provider: String,
    /// Model identifier actually used.
    pub model: String,
    /// Input tokens reported by the backend.
    pub input_tokens: u32,
    /// Output tokens reported by the backend.
    pub output_tokens: u32,
    /// Real cost in USD (0 for cache hits).
    pub cost_usd: f64,
    /// End-to-end duration of the attempt.
    pub duration_ms: u64,
    /// Whether the attempt was served from the response cache.
    pub cache_hit: bool,
    /// Fingerprint of the request content.
    pub content_hash: String,
    /// Local-offset RFC 3339 timestamp; the date prefix drives calendar math.
    pub created_at: String,
}

impl ActivityRecord {
    /// Create a record for a completed attempt, stamped with the local time.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        command: &str,
        provider: &str,
        model: &str,
        usage: &TokenUsage,
        cost_usd: f64,
        duration_ms: u64,
        cache_hit: bool,
        content_hash: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            command: command.to_string(),
            provider: provider.to_string(),
            model: model.to_string(),
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            cost_usd,
            duration_ms,
            cache_hit,
            content_hash: content_hash.to_string(),
            created_at: local_timestamp(),
        }
    }
}

/// Local wall-clock timestamp with offset, e.g. `2026-08-23T14:03:07.512+02:00`.
fn local_timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string()
}

/// Per-command aggregate derived from the ledger.
#[derive(Debug, Clone)]
pub struct CommandStats {
    pub command: String,
    pub calls: u64,
    pub total_cost_usd: f64,
    pub avg_cost_usd: f64,
    pub cache_hit_rate: f64,
}

/// Breakdown of the whole ledger by command, plus overall totals.
#[derive(Debug, Clone, Default)]
pub struct LedgerBreakdown {
    pub commands: Vec<CommandStats>,
    pub total_calls: u64,
    pub total_cost_usd: f64,
}

/// Cache effectiveness over the whole ledger.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub total_records: u64,
    pub cache_hits: u64,
    pub hit_rate: f64,
    /// Heuristic: each hit is credited with the most recent preceding
    /// non-hit cost recorded for the same command.
    pub estimated_saved_usd: f64,
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS activity_log (
    id TEXT PRIMARY KEY NOT NULL,
    command TEXT NOT NULL,
    provider TEXT NOT NULL,
    model TEXT NOT NULL,
    input_tokens INTEGER NOT NULL DEFAULT 0,
    output_tokens INTEGER NOT NULL DEFAULT 0,
    cost_usd REAL NOT NULL DEFAULT 0.0,
    duration_ms INTEGER NOT NULL DEFAULT 0,
    cache_hit INTEGER NOT NULL DEFAULT 0,
    content_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_activity_log_created ON activity_log(created_at);
CREATE INDEX IF NOT EXISTS idx_activity_log_command ON activity_log(command);";

/// Check for the ledger table without touching it (creating it on a read
/// path would turn "missing file" into a write).
fn table_exists(conn: &rusqlite::Connection) -> Result<bool, rusqlite::Error> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'activity_log'",
        [],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Persistent, append-only spend ledger.
///
/// All operations go through the single tokio-rusqlite background thread.
#[derive(Clone)]
pub struct ActivityLedger {
    conn: tokio_rusqlite::Connection,
    path: String,
}

impl ActivityLedger {
    /// Open (or create) the ledger database at `path`.
    ///
    /// The schema is not touched here: a fresh file stays empty until the
    /// first write, and a corrupt file is only detected when read.
    pub async fn open(path: &Path) -> Result<Self, TollgateError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(TollgateError::storage)?;
            }
        }
        let display = path.display().to_string();
        let conn = tokio_rusqlite::Connection::open(path.to_path_buf())
            .await
            .map_err(TollgateError::storage)?;
        Ok(Self {
            conn,
            path: display,
        })
    }

    /// In-memory ledger for tests.
    pub async fn open_in_memory() -> Result<Self, TollgateError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(TollgateError::storage)?;
        Ok(Self {
            conn,
            path: ":memory:".to_string(),
        })
    }

    fn write_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> TollgateError {
        TollgateError::Storage {
            source: Box::new(e),
        }
    }

    fn read_err(&self, e: tokio_rusqlite::Error<rusqlite::Error>) -> TollgateError {
        TollgateError::CorruptHistory {
            path: self.path.clone(),
            detail: e.to_string(),
        }
    }

    /// Append one record. Creates the table on first use.
    pub async fn record(&self, record: &ActivityRecord) -> Result<(), TollgateError> {
        let rec = record.clone();
        self.conn
            .call(move |conn| {
                conn.execute_batch(SCHEMA)?;
                conn.execute(
                    "INSERT INTO activity_log (id, command, provider, model, \
                     input_tokens, output_tokens, cost_usd, duration_ms, \
                     cache_hit, content_hash, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                    rusqlite::params![
                        rec.id,
                        rec.command,
                        rec.provider,
                        rec.model,
                        i64::from(rec.input_tokens),
                        i64::from(rec.output_tokens),
                        rec.cost_usd,
                        rec.duration_ms as i64,
                        rec.cache_hit,
                        rec.content_hash,
                        rec.created_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Self::write_err)?;

        info!(
            command = %record.command,
            model = %record.model,
            input_tokens = record.input_tokens,
            output_tokens = record.output_tokens,
            cost_usd = record.cost_usd,
            cache_hit = record.cache_hit,
            "activity recorded"
        );
        Ok(())
    }

    /// Full ledger in insertion order.
    pub async fn history(&self) -> Result<Vec<ActivityRecord>, TollgateError> {
        self.conn
            .call(|conn| {
                if !table_exists(conn)? {
                    return Ok(Vec::new());
                }
                let mut stmt = conn.prepare(
                    "SELECT id, command, provider, model, input_tokens, \
                     output_tokens, cost_usd, duration_ms, cache_hit, \
                     content_hash, created_at FROM activity_log ORDER BY rowid",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok(ActivityRecord {
                        id: row.get(0)?,
                        command: row.get(1)?,
                        provider: row.get(2)?,
                        model: row.get(3)?,
                        input_tokens: row.get::<_, i64>(4)? as u32,
                        output_tokens: row.get::<_, i64>(5)? as u32,
                        cost_usd: row.get(6)?,
                        duration_ms: row.get::<_, i64>(7)? as u64,
                        cache_hit: row.get(8)?,
                        content_hash: row.get(9)?,
                        created_at: row.get(10)?,
                    })
                })?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await
            .map_err(|e| self.read_err(e))
    }

    /// Sum of `cost_usd` over records from today's local calendar day.
    pub async fn daily_total(&self) -> Result<f64, TollgateError> {
        self.prefix_total(Local::now().format("%Y-%m-%d").to_string())
            .await
    }

    /// Sum of `cost_usd` over records from this local calendar month.
    pub async fn monthly_total(&self) -> Result<f64, TollgateError> {
        self.prefix_total(Local::now().format("%Y-%m").to_string())
            .await
    }

    async fn prefix_total(&self, prefix: String) -> Result<f64, TollgateError> {
        let pattern = format!("{prefix}%");
        self.conn
            .call(move |conn| {
                if !table_exists(conn)? {
                    return Ok(0.0);
                }
                conn.query_row(
                    "SELECT COALESCE(SUM(cost_usd), 0.0) FROM activity_log \
                     WHERE created_at LIKE ?1",
                    rusqlite::params![pattern],
                    |row| row.get(0),
                )
            })
            .await
            .map_err(|e| self.read_err(e))
    }

    /// Per-command call counts, spend, and cache-hit rates, most expensive
    /// command first, plus overall totals.
    pub async fn breakdown_by_command(&self) -> Result<LedgerBreakdown, TollgateError> {
        let commands = self
            .conn
            .call(|conn| {
                if !table_exists(conn)? {
                    return Ok(Vec::new());
                }
                let mut stmt = conn.prepare(
                    "SELECT command, COUNT(*), SUM(cost_usd), AVG(cost_usd), \
                     AVG(cache_hit) FROM activity_log GROUP BY command \
                     ORDER BY SUM(cost_usd) DESC",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok(CommandStats {
                        command: row.get(0)?,
                        calls: row.get::<_, i64>(1)? as u64,
                        total_cost_usd: row.get(2)?,
                        avg_cost_usd: row.get(3)?,
                        cache_hit_rate: row.get(4)?,
                    })
                })?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await
            .map_err(|e| self.read_err(e))?;

        let total_calls = commands.iter().map(|c| c.calls).sum();
        let total_cost_usd = commands.iter().map(|c| c.total_cost_usd).sum();
        Ok(LedgerBreakdown {
            commands,
            total_calls,
            total_cost_usd,
        })
    }

    /// Constant-daily-average spend projection for the current month:
    /// `(month_to_date / days_elapsed) * days_in_month`.
    pub async fn forecast(&self) -> Result<f64, TollgateError> {
        let month_to_date = self.monthly_total().await?;
        let now = Local::now();
        let days_elapsed = f64::from(now.day());
        let days_in_month = f64::from(days_in_month(now.year(), now.month()));
        Ok(month_to_date / days_elapsed * days_in_month)
    }

    /// Cache hit rate and estimated dollars saved over the whole ledger.
    ///
    /// There is no principled cost for a hit (none was ever paid), so each
    /// hit is credited with the most recent preceding non-hit cost for the
    /// same command; hits with no precedent credit nothing.
    pub async fn cache_stats(&self) -> Result<CacheStats, TollgateError> {
        let history = self.history().await?;
        let mut last_paid: HashMap<String, f64> = HashMap::new();
        let mut hits: u64 = 0;
        let mut saved = 0.0;
        for record in &history {
            if record.cache_hit {
                hits += 1;
                saved += last_paid.get(&record.command).copied().unwrap_or(0.0);
            } else {
                last_paid.insert(record.command.clone(), record.cost_usd);
            }
        }
        let total = history.len() as u64;
        Ok(CacheStats {
            total_records: total,
            cache_hits: hits,
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
            estimated_saved_usd: saved,
        })
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => 30,
    }
}
