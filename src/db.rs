use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One upstream lookup, kept as an audit trail
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LookupEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    /// cep | cnpj | banks | taxas
    pub resource: String,
    /// Document digits, or empty for list endpoints
    pub key: String,
    /// "success" or an error code such as NOT_FOUND
    pub outcome: String,
    pub duration_ms: i64,
}

impl LookupEvent {
    pub fn new(resource: &str, key: &str, outcome: &str, duration_ms: i64) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            resource: resource.to_string(),
            key: key.to_string(),
            outcome: outcome.to_string(),
            duration_ms,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.outcome == "success"
    }
}

/// Per-resource counters over the audit trail
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct LookupStat {
    pub resource: String,
    pub total: i64,
    pub failures: i64,
    pub last_at: Option<DateTime<Utc>>,
}

/// Open (or create) the database file and make sure the schema exists
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Key-value store (search history lives here as JSON arrays)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Lookup events (audit trail of upstream calls)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS lookup_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            resource TEXT NOT NULL,
            lookup_key TEXT NOT NULL,
            outcome TEXT NOT NULL,
            duration_ms INTEGER NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_lookup_resource ON lookup_events(resource)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_lookup_timestamp ON lookup_events(timestamp)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// KEY-VALUE STORE
// ============================================================================

pub fn kv_get(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("Failed to read key {}", key))?;

    Ok(value)
}

/// Insert or replace
pub fn kv_put(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, Utc::now().to_rfc3339()],
    )
    .with_context(|| format!("Failed to write key {}", key))?;

    Ok(())
}

/// Returns true if the key existed
pub fn kv_delete(conn: &Connection, key: &str) -> Result<bool> {
    let removed = conn
        .execute("DELETE FROM kv_store WHERE key = ?1", params![key])
        .with_context(|| format!("Failed to delete key {}", key))?;

    Ok(removed > 0)
}

// ============================================================================
// LOOKUP EVENTS
// ============================================================================

pub fn insert_lookup_event(conn: &Connection, event: &LookupEvent) -> Result<()> {
    conn.execute(
        "INSERT INTO lookup_events (
            event_id, timestamp, resource, lookup_key, outcome, duration_ms
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.resource,
            event.key,
            event.outcome,
            event.duration_ms,
        ],
    )?;

    Ok(())
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Most recent events first, optionally for a single resource
pub fn recent_lookup_events(
    conn: &Connection,
    resource: Option<&str>,
    limit: usize,
) -> Result<Vec<LookupEvent>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, resource, lookup_key, outcome, duration_ms
         FROM lookup_events
         WHERE ?1 IS NULL OR resource = ?1
         ORDER BY timestamp DESC, id DESC
         LIMIT ?2",
    )?;

    let events = stmt
        .query_map(params![resource, limit as i64], |row| {
            let timestamp_str: String = row.get(1)?;

            Ok(LookupEvent {
                event_id: row.get(0)?,
                timestamp: parse_timestamp(1, &timestamp_str)?,
                resource: row.get(2)?,
                key: row.get(3)?,
                outcome: row.get(4)?,
                duration_ms: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

pub fn lookup_stats(conn: &Connection) -> Result<Vec<LookupStat>> {
    let mut stmt = conn.prepare(
        "SELECT resource,
                COUNT(*) as total,
                SUM(CASE WHEN outcome = 'success' THEN 0 ELSE 1 END) as failures,
                MAX(timestamp) as last_at
         FROM lookup_events
         GROUP BY resource
         ORDER BY resource",
    )?;

    let stats = stmt
        .query_map([], |row| {
            let last_at: Option<String> = row.get(3)?;
            Ok(LookupStat {
                resource: row.get(0)?,
                total: row.get(1)?,
                failures: row.get(2)?,
                last_at: last_at.map(|raw| parse_timestamp(3, &raw)).transpose()?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_kv_round_trip() {
        let conn = memory_db();

        assert_eq!(kv_get(&conn, "cep-history").unwrap(), None);

        kv_put(&conn, "cep-history", "[]").unwrap();
        kv_put(&conn, "cep-history", "[\"01310100\"]").unwrap();
        assert_eq!(
            kv_get(&conn, "cep-history").unwrap().as_deref(),
            Some("[\"01310100\"]")
        );

        assert!(kv_delete(&conn, "cep-history").unwrap());
        assert!(!kv_delete(&conn, "cep-history").unwrap());
        assert_eq!(kv_get(&conn, "cep-history").unwrap(), None);
    }

    #[test]
    fn test_setup_is_idempotent() {
        let conn = memory_db();
        setup_database(&conn).unwrap();
        kv_put(&conn, "k", "v").unwrap();
        assert_eq!(kv_get(&conn, "k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_open_database_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.db");

        {
            let conn = open_database(&path).unwrap();
            kv_put(&conn, "cnpj-history", "[\"11222333000181\"]").unwrap();
        }

        let conn = open_database(&path).unwrap();
        assert_eq!(
            kv_get(&conn, "cnpj-history").unwrap().as_deref(),
            Some("[\"11222333000181\"]")
        );
    }

    #[test]
    fn test_lookup_event_log() {
        let conn = memory_db();

        insert_lookup_event(&conn, &LookupEvent::new("cep", "01310100", "success", 120)).unwrap();
        insert_lookup_event(&conn, &LookupEvent::new("cep", "99999999", "NOT_FOUND", 80)).unwrap();
        insert_lookup_event(&conn, &LookupEvent::new("banks", "", "success", 300)).unwrap();

        let cep_events = recent_lookup_events(&conn, Some("cep"), 10).unwrap();
        assert_eq!(cep_events.len(), 2);
        assert_eq!(cep_events[0].key, "99999999");
        assert!(!cep_events[0].succeeded());

        let all = recent_lookup_events(&conn, None, 2).unwrap();
        assert_eq!(all.len(), 2);

        let stats = lookup_stats(&conn).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].resource, "banks");
        assert_eq!(stats[0].failures, 0);
        assert_eq!(stats[1].resource, "cep");
        assert_eq!(stats[1].total, 2);
        assert_eq!(stats[1].failures, 1);
        assert!(stats[1].last_at.is_some());
    }
}
