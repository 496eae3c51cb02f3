// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the storage, discovery, and delivery crates.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of a public contact in the contact directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContactId(pub i64);

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a pending entry in the delivery queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueueItemId(pub i64);

impl fmt::Display for QueueItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a logical outbound item (a post) whose delivery is tracked.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ItemId(pub i64);

impl ItemId {
    /// Zero is the "unset" identifier and is rejected by every mutation.
    pub fn is_unset(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter behind a [`crate::PluginAdapter`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Fetcher,
}

/// Delivery protocol a successful attempt is attributed to.
///
/// Each variant owns one protocol-specific counter in the delivery state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    ActivityPub,
    Dfrn,
    LegacyDfrn,
    Diaspora,
    #[strum(serialize = "ostatus")]
    #[serde(rename = "ostatus")]
    OStatus,
}

impl Protocol {
    /// All protocols, in counter column order.
    pub const ALL: [Protocol; 5] = [
        Protocol::ActivityPub,
        Protocol::Dfrn,
        Protocol::LegacyDfrn,
        Protocol::Diaspora,
        Protocol::OStatus,
    ];
}

/// Federation network a contact or queued message belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum Network {
    #[strum(serialize = "apub")]
    #[serde(rename = "apub")]
    ActivityPub,
    #[strum(serialize = "dfrn")]
    #[serde(rename = "dfrn")]
    Dfrn,
    #[strum(serialize = "dspr")]
    #[serde(rename = "dspr")]
    Diaspora,
    #[strum(serialize = "stat")]
    #[serde(rename = "stat")]
    OStatus,
    #[strum(serialize = "feed")]
    #[serde(rename = "feed")]
    Feed,
    #[strum(serialize = "mail")]
    #[serde(rename = "mail")]
    Mail,
    #[strum(serialize = "unkn")]
    #[serde(rename = "unkn")]
    Unknown,
}

/// Global gate deciding which contacts may have their follower collections crawled.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryPolicy {
    /// Never crawl.
    None,
    /// Crawl contacts that have a relationship with a local user.
    LocalOnly,
    /// Crawl local contacts and contacts that interacted with content on this node.
    #[default]
    LocalOrInteractor,
    /// Crawl everything except contacts created within the grace period.
    All,
}

/// Directory record of a public contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub id: ContactId,
    /// Normalized profile URL.
    pub url: String,
    pub network: Network,
    pub created_at: DateTime<Utc>,
    pub last_discovery_at: Option<DateTime<Utc>>,
    /// A local user follows or is followed by this contact.
    pub is_local: bool,
    /// This contact is the node's own identity.
    pub is_self: bool,
    /// Start of the current communication failure, if any.
    pub term_date: Option<DateTime<Utc>>,
    pub archived: bool,
}

/// Directed edge between two public contacts.
///
/// `object` follows (or interacted with) `subject`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationEdge {
    pub subject_id: ContactId,
    pub object_id: ContactId,
    pub follows: bool,
    pub last_interaction: Option<DateTime<Utc>>,
    pub follow_updated: Option<DateTime<Utc>>,
}

/// A pending outbound message for one contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: QueueItemId,
    pub contact_id: ContactId,
    pub network: Network,
    pub payload: String,
    pub is_batch: bool,
    /// Number of retries recorded through `touch`.
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub last_attempt_at: DateTime<Utc>,
}

/// Delivery counters for one logical outbound item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryState {
    pub item_id: ItemId,
    pub queued: i64,
    pub done: i64,
    pub failed: i64,
    pub activitypub: i64,
    pub dfrn: i64,
    pub legacy_dfrn: i64,
    pub diaspora: i64,
    pub ostatus: i64,
}

impl DeliveryState {
    /// Successful deliveries attributed to `protocol`.
    pub fn done_via(&self, protocol: Protocol) -> i64 {
        match protocol {
            Protocol::ActivityPub => self.activitypub,
            Protocol::Dfrn => self.dfrn,
            Protocol::LegacyDfrn => self.legacy_dfrn,
            Protocol::Diaspora => self.diaspora,
            Protocol::OStatus => self.ostatus,
        }
    }

    /// Sum of all protocol-specific counters.
    pub fn done_by_protocol(&self) -> i64 {
        Protocol::ALL.iter().map(|p| self.done_via(*p)).sum()
    }
}

/// Caller-supplied counters for `insert`/`upsert` of a delivery state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStateFields {
    pub queued: i64,
    pub done: i64,
    pub failed: i64,
}

/// Collection endpoints advertised by a remote actor document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorCollections {
    pub followers: Option<String>,
    pub following: Option<String>,
}

/// One member of a remote followers/following collection.
///
/// Collections list either bare actor URLs or embedded actor records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CollectionMember {
    Url(String),
    Record {
        #[serde(default)]
        url: Option<String>,
    },
}

impl CollectionMember {
    /// The member's actor URL, if it carries one.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Url(url) => Some(url.as_str()),
            Self::Record { url } => url.as_deref(),
        }
    }
}
