// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery queue operations.
//!
//! Backlog order is `created_at`; retries only move `last_attempt_at`.

use chrono::{DateTime, Utc};
use fedlink_core::time::format_ts;
use fedlink_core::types::QueueItem;
use fedlink_core::{ContactId, FedlinkError, QueueItemId};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::{NewQueueItem, QUEUE_COLUMNS, QueueRow, convert_all};

/// Largest exponent used for the retry backoff, keeping the shift in range.
const MAX_BACKOFF_EXPONENT: u32 = 30;

/// Pending items for `contact`. The node's own identity counts zero; contacts
/// missing from the directory are counted like any other.
pub async fn count_pending(db: &Database, contact: ContactId) -> Result<u64, FedlinkError> {
    db.connection()
        .call(move |conn| -> Result<u64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM delivery_queue q
                 WHERE q.contact_id = ?1
                   AND NOT EXISTS (SELECT 1 FROM contact c
                                   WHERE c.id = q.contact_id AND c.is_self = 1)",
                params![contact.0],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a new item with `last_attempt_at = created_at`.
pub async fn insert(db: &Database, item: NewQueueItem) -> Result<QueueItemId, FedlinkError> {
    let network = item.network.to_string();
    let created_at = format_ts(item.created_at);
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.execute(
                "INSERT INTO delivery_queue
                     (contact_id, network, payload, is_batch, created_at, last_attempt_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![item.contact_id.0, network, item.payload, item.is_batch, created_at],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
        .map(QueueItemId)
}

pub async fn get(db: &Database, id: QueueItemId) -> Result<Option<QueueItem>, FedlinkError> {
    let row = db
        .connection()
        .call(move |conn| -> Result<Option<QueueRow>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {QUEUE_COLUMNS} FROM delivery_queue WHERE id = ?1"),
                params![id.0],
                QueueRow::from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    row.map(QueueRow::into_item).transpose()
}

/// Record a retry: bump `attempts` and set `last_attempt_at`.
pub async fn touch(db: &Database, id: QueueItemId, at: DateTime<Utc>) -> Result<(), FedlinkError> {
    let at = format_ts(at);
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE delivery_queue
                 SET last_attempt_at = ?1, attempts = attempts + 1
                 WHERE id = ?2",
                params![at, id.0],
            )
        })
        .await
        .map_err(map_tr_err)?;
    require_row(changed, id)
}

pub async fn delete(db: &Database, id: QueueItemId) -> Result<(), FedlinkError> {
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute("DELETE FROM delivery_queue WHERE id = ?1", params![id.0])
        })
        .await
        .map_err(map_tr_err)?;
    require_row(changed, id)
}

/// Whether any item for `contact` was attempted at or after `since`.
pub async fn attempted_since(
    db: &Database,
    contact: ContactId,
    since: DateTime<Utc>,
) -> Result<bool, FedlinkError> {
    let since = format_ts(since);
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM delivery_queue
                               WHERE contact_id = ?1 AND last_attempt_at >= ?2)",
                params![contact.0, since],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Items whose backoff `min(2^attempts, cap_mins)` minutes has elapsed, oldest first.
pub async fn due(
    db: &Database,
    now: DateTime<Utc>,
    cap_mins: u32,
    limit: u32,
) -> Result<Vec<QueueItem>, FedlinkError> {
    let now = format_ts(now);
    let rows = db
        .connection()
        .call(move |conn| -> Result<Vec<QueueRow>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {QUEUE_COLUMNS} FROM delivery_queue
                 WHERE attempts = 0
                    OR strftime('%Y-%m-%dT%H:%M:%fZ', last_attempt_at,
                                '+' || min(1 << min(attempts, ?3), ?2) || ' minutes') <= ?1
                 ORDER BY created_at, id
                 LIMIT ?4"
            ))?;
            let rows = stmt.query_map(
                params![now, cap_mins, MAX_BACKOFF_EXPONENT, limit],
                QueueRow::from_row,
            )?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)?;
    convert_all(rows, QueueRow::into_item)
}

/// Backlog of `contact`, oldest first.
pub async fn list_for_contact(
    db: &Database,
    contact: ContactId,
) -> Result<Vec<QueueItem>, FedlinkError> {
    let rows = db
        .connection()
        .call(move |conn| -> Result<Vec<QueueRow>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {QUEUE_COLUMNS} FROM delivery_queue
                 WHERE contact_id = ?1
                 ORDER BY created_at, id"
            ))?;
            let rows = stmt.query_map(params![contact.0], QueueRow::from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)?;
    convert_all(rows, QueueRow::into_item)
}

fn require_row(changed: usize, id: QueueItemId) -> Result<(), FedlinkError> {
    if changed == 0 {
        return Err(FedlinkError::NotFound {
            kind: "queue item",
            id: id.0,
        });
    }
    Ok(())
}
