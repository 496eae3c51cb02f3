// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relation discovery engine.
//!
//! A crawl runs in this order: resolve the contact, claim it, gate it, fetch
//! the actor and both collections (each bounded by the fetch timeout),
//! resolve member URLs to contacts, then reconcile in one transaction and
//! stamp `last_discovery_at`. Edges are only written by the reconcile step,
//! so a cancelled or failed crawl never leaves a half-merged edge set.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use fedlink_config::DiscoveryConfig;
use fedlink_core::types::{ActorCollections, CollectionMember};
use fedlink_core::{ContactDirectory, ContactId, FedlinkError, RemoteCollectionFetcher};
use fedlink_storage::Database;
use fedlink_storage::queries::relations::{self, ReconcileSummary};
use tracing::{debug, info, warn};

use crate::members::member_urls;
use crate::policy::{DiscoveryGate, SkipReason};

/// Result of a discovery request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    /// The crawl ran and its result was reconciled.
    Completed(ReconcileSummary),
    /// Nothing was crawled or written.
    Skipped(SkipReason),
}

impl DiscoveryOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Follow counts of one contact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelationCounts {
    pub followers: u64,
    pub following: u64,
    pub mutuals: u64,
    pub all: u64,
}

/// Crawls remote follower/following collections into the edge store.
pub struct RelationDiscoveryEngine {
    gate: DiscoveryGate,
    fetch_timeout: Duration,
    db: Database,
    directory: Arc<dyn ContactDirectory>,
    fetcher: Arc<dyn RemoteCollectionFetcher>,
    /// Contacts with a crawl in progress in this process.
    in_flight: DashMap<ContactId, ()>,
}

/// Releases a contact claim when dropped, including on cancellation.
struct Claim<'a> {
    in_flight: &'a DashMap<ContactId, ()>,
    contact: ContactId,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.contact);
    }
}

impl RelationDiscoveryEngine {
    pub fn new(
        config: &DiscoveryConfig,
        db: Database,
        directory: Arc<dyn ContactDirectory>,
        fetcher: Arc<dyn RemoteCollectionFetcher>,
    ) -> Self {
        Self {
            gate: DiscoveryGate::from_config(config),
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            db,
            directory,
            fetcher,
            in_flight: DashMap::new(),
        }
    }

    /// Refresh the followers and following of the contact behind `profile_url`.
    ///
    /// Policy rejections and remote failures are outcomes, not errors; only
    /// storage failures are returned as `Err`.
    pub async fn discover(&self, profile_url: &str) -> Result<DiscoveryOutcome, FedlinkError> {
        let Some(contact) = self.directory.resolve(profile_url).await? else {
            debug!(url = profile_url, "discovery skipped: unknown contact");
            return Ok(DiscoveryOutcome::Skipped(SkipReason::UnknownContact));
        };

        let Some(_claim) = self.claim(contact) else {
            debug!(%contact, "discovery skipped: crawl already running");
            return Ok(DiscoveryOutcome::Skipped(SkipReason::AlreadyRunning));
        };

        let Some(record) = self.directory.get(contact).await? else {
            return Ok(DiscoveryOutcome::Skipped(SkipReason::UnknownContact));
        };

        let has_interacted = if self.gate.needs_interaction_lookup(&record) {
            relations::has_interactions(&self.db, contact).await?
        } else {
            false
        };
        if let Err(reason) = self.gate.evaluate(&record, has_interacted, Utc::now()) {
            info!(%contact, policy = %self.gate.policy(), %reason, "discovery rejected");
            return Ok(DiscoveryOutcome::Skipped(reason));
        }

        let (followers, following) = self.fetch_collections(&record.url).await;
        if followers.is_empty() && following.is_empty() {
            info!(%contact, "discovery found no collection members");
            return Ok(DiscoveryOutcome::Skipped(SkipReason::NothingFetched));
        }

        let followers = self.resolve_all(&followers).await;
        let following = self.resolve_all(&following).await;

        let now = fedlink_core::time::now();
        let summary = relations::reconcile(&self.db, contact, followers, following, now).await?;
        self.directory.mark_discovered(contact, now).await?;

        info!(
            %contact,
            followers = summary.followers,
            following = summary.following,
            pruned = summary.pruned,
            "discovery completed"
        );
        Ok(DiscoveryOutcome::Completed(summary))
    }

    /// Record that `object` interacted with content of `subject`.
    ///
    /// Self-interactions are ignored.
    pub async fn record_interaction(
        &self,
        subject: ContactId,
        object: ContactId,
        at: DateTime<Utc>,
    ) -> Result<(), FedlinkError> {
        if !relations::record_interaction(&self.db, subject, object, at).await? {
            debug!(%subject, "self-interaction ignored");
        }
        Ok(())
    }

    pub async fn relation_counts(&self, contact: ContactId) -> Result<RelationCounts, FedlinkError> {
        Ok(RelationCounts {
            followers: relations::count_followers(&self.db, contact).await?,
            following: relations::count_following(&self.db, contact).await?,
            mutuals: relations::count_mutuals(&self.db, contact).await?,
            all: relations::count_all(&self.db, contact).await?,
        })
    }

    fn claim(&self, contact: ContactId) -> Option<Claim<'_>> {
        use dashmap::mapref::entry::Entry;

        match self.in_flight.entry(contact) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(Claim {
                    in_flight: &self.in_flight,
                    contact,
                })
            }
        }
    }

    /// Follower and following member URLs. Any failure degrades to an empty set.
    async fn fetch_collections(&self, profile_url: &str) -> (Vec<String>, Vec<String>) {
        let actor = match self.bounded(profile_url, self.fetcher.fetch_actor(profile_url)).await {
            Ok(Some(actor)) => actor,
            Ok(None) => {
                debug!(url = profile_url, "remote actor exposes no document");
                return (Vec::new(), Vec::new());
            }
            Err(e) => {
                warn!(url = profile_url, error = %e, "actor fetch failed");
                return (Vec::new(), Vec::new());
            }
        };

        let ActorCollections {
            followers,
            following,
        } = actor;
        let (followers, following) = tokio::join!(
            self.fetch_members(followers.as_deref()),
            self.fetch_members(following.as_deref())
        );
        (member_urls(&followers), member_urls(&following))
    }

    async fn fetch_members(&self, collection_url: Option<&str>) -> Vec<CollectionMember> {
        let Some(url) = collection_url else {
            return Vec::new();
        };
        match self.bounded(url, self.fetcher.fetch_collection_members(url)).await {
            Ok(members) => members,
            Err(e) => {
                warn!(url, error = %e, "collection fetch failed, treating as empty");
                Vec::new()
            }
        }
    }

    async fn bounded<T>(
        &self,
        url: &str,
        fetch: impl Future<Output = Result<T, FedlinkError>>,
    ) -> Result<T, FedlinkError> {
        match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(result) => result,
            Err(_) => {
                debug!(url, timeout = ?self.fetch_timeout, "remote fetch timed out");
                Err(FedlinkError::Timeout {
                    duration: self.fetch_timeout,
                })
            }
        }
    }

    async fn resolve_all(&self, urls: &[String]) -> Vec<ContactId> {
        let mut ids = Vec::with_capacity(urls.len());
        for url in urls {
            match self.directory.resolve_or_create(url).await {
                Ok(id) => ids.push(id),
                Err(e) => warn!(url = %url, error = %e, "skipping unresolvable member"),
            }
        }
        ids
    }
}
