// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact directory contract consumed by discovery and delivery.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::FedlinkError;
use crate::types::{ContactId, ContactRecord};

/// Resolves profile URLs to public contacts and owns per-contact bookkeeping.
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    /// Look up a contact by profile URL. `Ok(None)` when unknown.
    async fn resolve(&self, url: &str) -> Result<Option<ContactId>, FedlinkError>;

    /// Create a contact for `url`, returning the existing id if one already exists.
    async fn create(&self, url: &str) -> Result<ContactId, FedlinkError>;

    /// Fetch a contact record by id. `Ok(None)` when unknown.
    async fn get(&self, id: ContactId) -> Result<Option<ContactRecord>, FedlinkError>;

    /// Record a completed follower crawl.
    async fn mark_discovered(&self, id: ContactId, at: DateTime<Utc>) -> Result<(), FedlinkError>;

    /// Update the communication-failure bookkeeping of a contact.
    async fn set_liveness(
        &self,
        id: ContactId,
        term_date: Option<DateTime<Utc>>,
        archived: bool,
    ) -> Result<(), FedlinkError>;

    /// Resolve `url`, creating the contact when it is not known yet.
    async fn resolve_or_create(&self, url: &str) -> Result<ContactId, FedlinkError> {
        match self.resolve(url).await? {
            Some(id) => Ok(id),
            None => self.create(url).await,
        }
    }
}
