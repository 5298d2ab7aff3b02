//! Versioned schema for the document store.
//!
//! Each step runs once, in its own transaction, and leaves a row in
//! `schema_migrations`.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};

struct SchemaStep {
    version: u32,
    label: &'static str,
    sql: &'static str,
}

const STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    label: "kv_entries",
    sql: include_str!("migrations/001_kv_entries.sql"),
}];

const LEDGER_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    label TEXT NOT NULL,
    applied_at TEXT NOT NULL
)";

/// Applies every step not yet recorded. Returns how many ran.
pub fn run_migrations(conn: &Connection) -> Result<usize> {
    conn.execute_batch(LEDGER_TABLE)
        .context("Failed to create schema_migrations table")?;

    let applied = applied_versions(conn)?;
    let mut ran = 0;
    for step in STEPS.iter().filter(|s| !applied.contains(&s.version)) {
        apply_step(conn, step)?;
        ran += 1;
    }

    if ran == 0 {
        tracing::debug!("Store schema current at version {}", schema_version(conn)?);
    }
    Ok(ran)
}

/// Highest applied step, or 0 on a fresh database.
pub fn schema_version(conn: &Connection) -> Result<u32> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

fn applied_versions(conn: &Connection) -> Result<BTreeSet<u32>> {
    let mut stmt = conn.prepare("SELECT version FROM schema_migrations")?;
    let versions = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<BTreeSet<u32>>>()?;
    Ok(versions)
}

fn apply_step(conn: &Connection, step: &SchemaStep) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(step.sql)
        .with_context(|| format!("Schema step {} ({}) failed", step.version, step.label))?;
    tx.execute(
        "INSERT INTO schema_migrations (version, label, applied_at) VALUES (?1, ?2, ?3)",
        params![step.version, step.label, Utc::now().to_rfc3339()],
    )?;
    tx.commit()?;

    tracing::info!("Store schema at version {} ({})", step.version, step.label);
    Ok(())
}
