// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for storage entities.
//!
//! The canonical records live in `fedlink-core::types`. Rows are read inside
//! the connection thread with raw text timestamps and converted afterwards,
//! since timestamp parsing reports `FedlinkError` rather than `rusqlite::Error`.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use fedlink_core::time::parse_ts;
use fedlink_core::types::{QueueItem, RelationEdge};
use fedlink_core::{ContactId, ContactRecord, FedlinkError, Network, QueueItemId};

pub use fedlink_core::types::{DeliveryState, DeliveryStateFields};

/// Values for a new contact row.
#[derive(Debug, Clone)]
pub struct NewContact {
    pub url: String,
    pub network: Network,
    pub created_at: DateTime<Utc>,
    pub is_local: bool,
    pub is_self: bool,
}

impl NewContact {
    /// A remote, non-local contact first seen now.
    pub fn remote(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            network: Network::Unknown,
            created_at: fedlink_core::time::now(),
            is_local: false,
            is_self: false,
        }
    }
}

/// Values for a new delivery queue row.
#[derive(Debug, Clone)]
pub struct NewQueueItem {
    pub contact_id: ContactId,
    pub network: Network,
    pub payload: String,
    pub is_batch: bool,
    pub created_at: DateTime<Utc>,
}

/// Selected column list matching [`ContactRow::from_row`].
pub(crate) const CONTACT_COLUMNS: &str = "id, url, network, created_at, last_discovery_at, \
     is_local, is_self, term_date, archived";

#[derive(Debug)]
pub(crate) struct ContactRow {
    id: i64,
    url: String,
    network: String,
    created_at: String,
    last_discovery_at: Option<String>,
    is_local: bool,
    is_self: bool,
    term_date: Option<String>,
    archived: bool,
}

impl ContactRow {
    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(0)?,
            url: row.get(1)?,
            network: row.get(2)?,
            created_at: row.get(3)?,
            last_discovery_at: row.get(4)?,
            is_local: row.get(5)?,
            is_self: row.get(6)?,
            term_date: row.get(7)?,
            archived: row.get(8)?,
        })
    }

    pub(crate) fn into_record(self) -> Result<ContactRecord, FedlinkError> {
        Ok(ContactRecord {
            id: ContactId(self.id),
            url: self.url,
            network: parse_network(&self.network),
            created_at: parse_ts(&self.created_at)?,
            last_discovery_at: parse_opt_ts(self.last_discovery_at.as_deref())?,
            is_local: self.is_local,
            is_self: self.is_self,
            term_date: parse_opt_ts(self.term_date.as_deref())?,
            archived: self.archived,
        })
    }
}

pub(crate) const EDGE_COLUMNS: &str =
    "subject_id, object_id, follows, last_interaction, follow_updated";

#[derive(Debug)]
pub(crate) struct EdgeRow {
    subject_id: i64,
    object_id: i64,
    follows: bool,
    last_interaction: Option<String>,
    follow_updated: Option<String>,
}

impl EdgeRow {
    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            subject_id: row.get(0)?,
            object_id: row.get(1)?,
            follows: row.get(2)?,
            last_interaction: row.get(3)?,
            follow_updated: row.get(4)?,
        })
    }

    pub(crate) fn into_edge(self) -> Result<RelationEdge, FedlinkError> {
        Ok(RelationEdge {
            subject_id: ContactId(self.subject_id),
            object_id: ContactId(self.object_id),
            follows: self.follows,
            last_interaction: parse_opt_ts(self.last_interaction.as_deref())?,
            follow_updated: parse_opt_ts(self.follow_updated.as_deref())?,
        })
    }
}

pub(crate) const QUEUE_COLUMNS: &str =
    "id, contact_id, network, payload, is_batch, attempts, created_at, last_attempt_at";

#[derive(Debug)]
pub(crate) struct QueueRow {
    id: i64,
    contact_id: i64,
    network: String,
    payload: String,
    is_batch: bool,
    attempts: u32,
    created_at: String,
    last_attempt_at: String,
}

impl QueueRow {
    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(0)?,
            contact_id: row.get(1)?,
            network: row.get(2)?,
            payload: row.get(3)?,
            is_batch: row.get(4)?,
            attempts: row.get(5)?,
            created_at: row.get(6)?,
            last_attempt_at: row.get(7)?,
        })
    }

    pub(crate) fn into_item(self) -> Result<QueueItem, FedlinkError> {
        Ok(QueueItem {
            id: QueueItemId(self.id),
            contact_id: ContactId(self.contact_id),
            network: parse_network(&self.network),
            payload: self.payload,
            is_batch: self.is_batch,
            attempts: self.attempts,
            created_at: parse_ts(&self.created_at)?,
            last_attempt_at: parse_ts(&self.last_attempt_at)?,
        })
    }
}

fn parse_opt_ts(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, FedlinkError> {
    raw.map(parse_ts).transpose()
}

// Rows written by older builds may carry codes this build does not know.
fn parse_network(raw: &str) -> Network {
    Network::from_str(raw).unwrap_or(Network::Unknown)
}

/// Convert a batch of rows, failing on the first malformed one.
pub(crate) fn convert_all<R, T>(
    rows: Vec<R>,
    convert: impl Fn(R) -> Result<T, FedlinkError>,
) -> Result<Vec<T>, FedlinkError> {
    rows.into_iter().map(convert).collect()
}
