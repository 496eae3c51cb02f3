// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery counter operations.
//!
//! Every increment is a single `UPDATE ... SET c = c + n` statement so
//! concurrent workers never lose updates. Increments do not create rows.

use fedlink_core::types::{DeliveryState, DeliveryStateFields};
use fedlink_core::{FedlinkError, ItemId, Protocol};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

const STATE_COLUMNS: &str =
    "item_id, queued, done, failed, activitypub, dfrn, legacy_dfrn, diaspora, ostatus";

/// Column holding the per-protocol success counter.
fn protocol_column(protocol: Protocol) -> &'static str {
    match protocol {
        Protocol::ActivityPub => "activitypub",
        Protocol::Dfrn => "dfrn",
        Protocol::LegacyDfrn => "legacy_dfrn",
        Protocol::Diaspora => "diaspora",
        Protocol::OStatus => "ostatus",
    }
}

fn require_set(item: ItemId) -> Result<(), FedlinkError> {
    if item.is_unset() {
        return Err(FedlinkError::InvalidArgument(
            "delivery item id must be set".to_string(),
        ));
    }
    Ok(())
}

pub async fn get(db: &Database, item: ItemId) -> Result<Option<DeliveryState>, FedlinkError> {
    db.connection()
        .call(move |conn| -> Result<Option<DeliveryState>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {STATE_COLUMNS} FROM delivery_state WHERE item_id = ?1"),
                params![item.0],
                |row| {
                    Ok(DeliveryState {
                        item_id: ItemId(row.get(0)?),
                        queued: row.get(1)?,
                        done: row.get(2)?,
                        failed: row.get(3)?,
                        activitypub: row.get(4)?,
                        dfrn: row.get(5)?,
                        legacy_dfrn: row.get(6)?,
                        diaspora: row.get(7)?,
                        ostatus: row.get(8)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Create the counters for `item`. Fails if a row already exists.
pub async fn insert(
    db: &Database,
    item: ItemId,
    fields: DeliveryStateFields,
) -> Result<(), FedlinkError> {
    require_set(item)?;
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO delivery_state (item_id, queued, done, failed)
                 VALUES (?1, ?2, ?3, ?4)",
                params![item.0, fields.queued, fields.done, fields.failed],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Create the counters for `item` or overwrite the aggregate ones.
pub async fn upsert(
    db: &Database,
    item: ItemId,
    fields: DeliveryStateFields,
) -> Result<(), FedlinkError> {
    require_set(item)?;
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO delivery_state (item_id, queued, done, failed)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(item_id) DO UPDATE SET
                     queued = excluded.queued,
                     done = excluded.done,
                     failed = excluded.failed",
                params![item.0, fields.queued, fields.done, fields.failed],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn delete(db: &Database, item: ItemId) -> Result<(), FedlinkError> {
    require_set(item)?;
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "DELETE FROM delivery_state WHERE item_id = ?1",
                params![item.0],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(FedlinkError::NotFound {
            kind: "delivery state",
            id: item.0,
        });
    }
    Ok(())
}

/// Bump `done` and the counter of `protocol` together. Returns false if no row exists.
pub async fn increment_done(
    db: &Database,
    item: ItemId,
    protocol: Protocol,
) -> Result<bool, FedlinkError> {
    let column = protocol_column(protocol);
    increment(
        db,
        item,
        format!(
            "UPDATE delivery_state SET done = done + 1, {column} = {column} + 1
             WHERE item_id = ?1"
        ),
        None,
    )
    .await
}

pub async fn increment_failed(db: &Database, item: ItemId) -> Result<bool, FedlinkError> {
    increment(
        db,
        item,
        "UPDATE delivery_state SET failed = failed + 1 WHERE item_id = ?1".to_string(),
        None,
    )
    .await
}

pub async fn increment_queued(db: &Database, item: ItemId, delta: u32) -> Result<bool, FedlinkError> {
    increment(
        db,
        item,
        "UPDATE delivery_state SET queued = queued + ?2 WHERE item_id = ?1".to_string(),
        Some(i64::from(delta)),
    )
    .await
}

async fn increment(
    db: &Database,
    item: ItemId,
    sql: String,
    delta: Option<i64>,
) -> Result<bool, FedlinkError> {
    require_set(item)?;
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = match delta {
                Some(delta) => conn.execute(&sql, params![item.0, delta])?,
                None => conn.execute(&sql, params![item.0])?,
            };
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}
