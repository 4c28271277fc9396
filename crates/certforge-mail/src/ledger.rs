// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Delivery ledger backed by SQLite.
//
// The ledger stores delivery metadata only: who, which event, which file, the
// image digest, and how far the send got. PDF bytes are never persisted.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use tracing::{debug, info, instrument};

use certforge_core::error::{CertError, Result};
use certforge_core::types::{DeliveryId, DeliveryRecord, DeliveryStatus};

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS deliveries (
        id TEXT PRIMARY KEY,
        recipient TEXT NOT NULL,
        event TEXT NOT NULL,
        file_name TEXT NOT NULL,
        document_digest TEXT NOT NULL,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        error_message TEXT
    )
"#;

const SELECT_COLUMNS: &str = "SELECT id, recipient, event, file_name, document_digest, \
     status, created_at, updated_at, error_message FROM deliveries";

/// Persistent record of email deliveries.
///
/// Synchronous, like everything built on `rusqlite`. The delivery worker
/// holds it behind a mutex and never across an await point.
pub struct DeliveryLedger {
    conn: Connection,
}

impl DeliveryLedger {
    /// Open (or create) the ledger database at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| CertError::Database(format!("open: {e}")))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| CertError::Database(format!("WAL pragma: {e}")))?;

        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| CertError::Database(format!("create table: {e}")))?;

        info!("delivery ledger opened");
        Ok(Self { conn })
    }

    /// Open an in-memory ledger. Nothing survives a restart.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CertError::Database(format!("open in-memory: {e}")))?;

        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| CertError::Database(format!("create table: {e}")))?;

        debug!("in-memory delivery ledger opened");
        Ok(Self { conn })
    }

    #[instrument(skip(self, record), fields(delivery_id = %record.id))]
    pub fn insert(&self, record: &DeliveryRecord) -> Result<()> {
        let status_json = serde_json::to_string(&record.status)
            .map_err(|e| CertError::Database(format!("serialize status: {e}")))?;

        self.conn
            .execute(
                "INSERT INTO deliveries (id, recipient, event, file_name, document_digest,
                 status, created_at, updated_at, error_message)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.id.to_string(),
                    record.recipient,
                    record.event,
                    record.file_name,
                    record.document_digest,
                    status_json,
                    record.created_at.to_rfc3339(),
                    record.updated_at.to_rfc3339(),
                    record.error_message,
                ],
            )
            .map_err(|e| CertError::Database(format!("insert delivery: {e}")))?;

        debug!("delivery recorded");
        Ok(())
    }

    /// Move a delivery to `status`, bumping `updated_at`.
    #[instrument(skip(self), fields(delivery_id = %id))]
    pub fn update_status(
        &self,
        id: &DeliveryId,
        status: DeliveryStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let status_json = serde_json::to_string(&status)
            .map_err(|e| CertError::Database(format!("serialize status: {e}")))?;
        let now = Utc::now().to_rfc3339();

        let rows = self
            .conn
            .execute(
                "UPDATE deliveries SET status = ?1, updated_at = ?2, error_message = ?3
                 WHERE id = ?4",
                params![status_json, now, error_message, id.to_string()],
            )
            .map_err(|e| CertError::Database(format!("update status: {e}")))?;

        if rows == 0 {
            return Err(CertError::Database(format!("delivery {id} not found")));
        }

        debug!(status = ?status, "delivery status updated");
        Ok(())
    }

    /// Look up one delivery.
    pub fn get(&self, id: &DeliveryId) -> Result<Option<DeliveryRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .map_err(|e| CertError::Database(format!("prepare get: {e}")))?;

        let mut rows = stmt
            .query_map(params![id.to_string()], row_to_record)
            .map_err(|e| CertError::Database(format!("query get: {e}")))?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(CertError::Database(format!("row parse: {e}"))),
            None => Ok(None),
        }
    }

    /// Most recent deliveries first, at most `limit`.
    pub fn recent(&self, limit: usize) -> Result<Vec<DeliveryRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY created_at DESC LIMIT ?1"))
            .map_err(|e| CertError::Database(format!("prepare recent: {e}")))?;

        let records = stmt
            .query_map(params![limit as i64], row_to_record)
            .map_err(|e| CertError::Database(format!("query recent: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| CertError::Database(format!("collect rows: {e}")))?;

        Ok(records)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<DeliveryRecord> {
    let id_str: String = row.get(0)?;
    let status_json: String = row.get(5)?;
    let created_at_str: String = row.get(6)?;
    let updated_at_str: String = row.get(7)?;

    let conversion = |column: usize, e: Box<dyn std::error::Error + Send + Sync>| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, e)
    };

    let id: DeliveryId = id_str.parse().map_err(|e| conversion(0, Box::new(e)))?;
    let status: DeliveryStatus =
        serde_json::from_str(&status_json).map_err(|e| conversion(5, Box::new(e)))?;
    let created_at = parse_timestamp(&created_at_str).map_err(|e| conversion(6, Box::new(e)))?;
    let updated_at = parse_timestamp(&updated_at_str).map_err(|e| conversion(7, Box::new(e)))?;

    Ok(DeliveryRecord {
        id,
        recipient: row.get(1)?,
        event: row.get(2)?,
        file_name: row.get(3)?,
        document_digest: row.get(4)?,
        status,
        created_at,
        updated_at,
        error_message: row.get(8)?,
    })
}

fn parse_timestamp(value: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}
