// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relation edge store.
//!
//! An edge `(subject, object)` means `object` follows `subject` (when
//! `follows` is set) or interacted with `subject` (when `last_interaction` is
//! set). The follower crawl of a contact therefore writes edges where the
//! crawled contact is the subject; its following crawl writes edges where it
//! is the object.

use chrono::{DateTime, Utc};
use fedlink_core::time::format_ts;
use fedlink_core::types::RelationEdge;
use fedlink_core::{ContactId, FedlinkError};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::{EDGE_COLUMNS, EdgeRow, convert_all};

/// What a reconciliation pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub followers: usize,
    pub following: usize,
    pub pruned: usize,
}

/// Upsert `last_interaction` on `(subject, object)`. Self-interactions are ignored.
pub async fn record_interaction(
    db: &Database,
    subject: ContactId,
    object: ContactId,
    at: DateTime<Utc>,
) -> Result<bool, FedlinkError> {
    if subject == object {
        return Ok(false);
    }
    let at = format_ts(at);
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "INSERT INTO relation_edge (subject_id, object_id, last_interaction)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(subject_id, object_id)
                 DO UPDATE SET last_interaction = excluded.last_interaction",
                params![subject.0, object.0, at],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Merge a crawl of `contact` into the edge store in one transaction.
///
/// A non-empty `followers` set replaces the stored follower set: existing
/// follower edges are cleared, the crawled ones upserted, and cleared edges
/// without interaction history deleted. `following` edges are only upserted.
pub async fn reconcile(
    db: &Database,
    contact: ContactId,
    followers: Vec<ContactId>,
    following: Vec<ContactId>,
    at: DateTime<Utc>,
) -> Result<ReconcileSummary, FedlinkError> {
    let at = format_ts(at);
    db.connection()
        .call(move |conn| -> Result<ReconcileSummary, rusqlite::Error> {
            let tx = conn.transaction()?;
            let mut summary = ReconcileSummary::default();

            if !followers.is_empty() {
                tx.execute(
                    "UPDATE relation_edge SET follows = 0 WHERE subject_id = ?1",
                    params![contact.0],
                )?;
            }

            {
                let mut upsert = tx.prepare(
                    "INSERT INTO relation_edge (subject_id, object_id, follows, follow_updated)
                     VALUES (?1, ?2, 1, ?3)
                     ON CONFLICT(subject_id, object_id)
                     DO UPDATE SET follows = 1, follow_updated = excluded.follow_updated",
                )?;
                for follower in followers.iter().filter(|id| **id != contact) {
                    upsert.execute(params![contact.0, follower.0, at])?;
                    summary.followers += 1;
                }
                for followed in following.iter().filter(|id| **id != contact) {
                    upsert.execute(params![followed.0, contact.0, at])?;
                    summary.following += 1;
                }
            }

            summary.pruned = tx.execute(
                "DELETE FROM relation_edge
                 WHERE subject_id = ?1 AND follows = 0 AND last_interaction IS NULL",
                params![contact.0],
            )?;

            tx.commit()?;
            Ok(summary)
        })
        .await
        .map_err(map_tr_err)
}

/// Whether `contact` ever interacted with content of another contact.
pub async fn has_interactions(db: &Database, contact: ContactId) -> Result<bool, FedlinkError> {
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM relation_edge
                               WHERE object_id = ?1 AND last_interaction IS NOT NULL)",
                params![contact.0],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a single edge.
pub async fn get_edge(
    db: &Database,
    subject: ContactId,
    object: ContactId,
) -> Result<Option<RelationEdge>, FedlinkError> {
    let row = db
        .connection()
        .call(move |conn| -> Result<Option<EdgeRow>, rusqlite::Error> {
            conn.query_row(
                &format!(
                    "SELECT {EDGE_COLUMNS} FROM relation_edge
                     WHERE subject_id = ?1 AND object_id = ?2"
                ),
                params![subject.0, object.0],
                EdgeRow::from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    row.map(EdgeRow::into_edge).transpose()
}

/// Every edge `contact` takes part in, ordered by `(subject, object)`.
pub async fn edges_of(db: &Database, contact: ContactId) -> Result<Vec<RelationEdge>, FedlinkError> {
    let rows = db
        .connection()
        .call(move |conn| -> Result<Vec<EdgeRow>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EDGE_COLUMNS} FROM relation_edge
                 WHERE subject_id = ?1 OR object_id = ?1
                 ORDER BY subject_id, object_id"
            ))?;
            let rows = stmt.query_map(params![contact.0], EdgeRow::from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)?;
    convert_all(rows, EdgeRow::into_edge)
}

// --- Graph read queries ---

const FOLLOWERS_SQL: &str =
    "SELECT object_id FROM relation_edge WHERE subject_id = ?1 AND follows = 1";
const FOLLOWING_SQL: &str =
    "SELECT subject_id FROM relation_edge WHERE object_id = ?1 AND follows = 1";

/// Contacts that follow `contact`.
pub async fn count_followers(db: &Database, contact: ContactId) -> Result<u64, FedlinkError> {
    count_ids(db, FOLLOWERS_SQL.to_string(), vec![contact.0]).await
}

pub async fn list_followers(
    db: &Database,
    contact: ContactId,
    limit: u32,
    offset: u32,
) -> Result<Vec<ContactId>, FedlinkError> {
    list_ids(db, FOLLOWERS_SQL.to_string(), vec![contact.0], limit, offset).await
}

/// Contacts `contact` follows.
pub async fn count_following(db: &Database, contact: ContactId) -> Result<u64, FedlinkError> {
    count_ids(db, FOLLOWING_SQL.to_string(), vec![contact.0]).await
}

pub async fn list_following(
    db: &Database,
    contact: ContactId,
    limit: u32,
    offset: u32,
) -> Result<Vec<ContactId>, FedlinkError> {
    list_ids(db, FOLLOWING_SQL.to_string(), vec![contact.0], limit, offset).await
}

/// Contacts that follow `contact` and are followed back.
pub async fn count_mutuals(db: &Database, contact: ContactId) -> Result<u64, FedlinkError> {
    count_ids(db, mutuals_sql(), vec![contact.0]).await
}

pub async fn list_mutuals(
    db: &Database,
    contact: ContactId,
    limit: u32,
    offset: u32,
) -> Result<Vec<ContactId>, FedlinkError> {
    list_ids(db, mutuals_sql(), vec![contact.0], limit, offset).await
}

/// Contacts related to `contact` by a follow in either direction.
pub async fn count_all(db: &Database, contact: ContactId) -> Result<u64, FedlinkError> {
    count_ids(db, all_sql(), vec![contact.0]).await
}

pub async fn list_all(
    db: &Database,
    contact: ContactId,
    limit: u32,
    offset: u32,
) -> Result<Vec<ContactId>, FedlinkError> {
    list_ids(db, all_sql(), vec![contact.0], limit, offset).await
}

/// Contacts having any edge with both `a` and `b`.
pub async fn count_common_interactions(
    db: &Database,
    a: ContactId,
    b: ContactId,
) -> Result<u64, FedlinkError> {
    count_ids(db, common_interactions_sql(), vec![a.0, b.0]).await
}

pub async fn list_common_interactions(
    db: &Database,
    a: ContactId,
    b: ContactId,
    limit: u32,
    offset: u32,
) -> Result<Vec<ContactId>, FedlinkError> {
    list_ids(db, common_interactions_sql(), vec![a.0, b.0], limit, offset).await
}

/// Contacts following both `a` and `b`.
pub async fn count_common_followers(
    db: &Database,
    a: ContactId,
    b: ContactId,
) -> Result<u64, FedlinkError> {
    count_ids(db, common_sql(FOLLOWERS_SQL), vec![a.0, b.0]).await
}

pub async fn list_common_followers(
    db: &Database,
    a: ContactId,
    b: ContactId,
    limit: u32,
    offset: u32,
) -> Result<Vec<ContactId>, FedlinkError> {
    list_ids(db, common_sql(FOLLOWERS_SQL), vec![a.0, b.0], limit, offset).await
}

/// Contacts followed by both `a` and `b`.
pub async fn count_common_following(
    db: &Database,
    a: ContactId,
    b: ContactId,
) -> Result<u64, FedlinkError> {
    count_ids(db, common_sql(FOLLOWING_SQL), vec![a.0, b.0]).await
}

pub async fn list_common_following(
    db: &Database,
    a: ContactId,
    b: ContactId,
    limit: u32,
    offset: u32,
) -> Result<Vec<ContactId>, FedlinkError> {
    list_ids(db, common_sql(FOLLOWING_SQL), vec![a.0, b.0], limit, offset).await
}

fn all_sql() -> String {
    format!("{FOLLOWERS_SQL} UNION {FOLLOWING_SQL}")
}

/// Ids `sql` yields for both `?1` and `?2`.
fn common_sql(sql: &str) -> String {
    format!("{sql} INTERSECT {}", sql.replace("?1", "?2"))
}

fn common_interactions_sql() -> String {
    let any_edge = |p: &str| {
        format!(
            "SELECT object_id FROM relation_edge WHERE subject_id = {p}
             UNION SELECT subject_id FROM relation_edge WHERE object_id = {p}"
        )
    };
    format!(
        "SELECT * FROM ({}) INTERSECT SELECT * FROM ({})",
        any_edge("?1"),
        any_edge("?2")
    )
}

fn mutuals_sql() -> String {
    format!("{FOLLOWERS_SQL} INTERSECT {FOLLOWING_SQL}")
}

async fn count_ids(db: &Database, ids_sql: String, args: Vec<i64>) -> Result<u64, FedlinkError> {
    db.connection()
        .call(move |conn| -> Result<u64, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT COUNT(*) FROM ({ids_sql})"),
                rusqlite::params_from_iter(args),
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

async fn list_ids(
    db: &Database,
    ids_sql: String,
    args: Vec<i64>,
    limit: u32,
    offset: u32,
) -> Result<Vec<ContactId>, FedlinkError> {
    db.connection()
        .call(move |conn| -> Result<Vec<ContactId>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT * FROM ({ids_sql}) ORDER BY 1 LIMIT {limit} OFFSET {offset}"
            ))?;
            let rows = stmt.query_map(rusqlite::params_from_iter(args), |row| {
                row.get::<_, i64>(0).map(ContactId)
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
