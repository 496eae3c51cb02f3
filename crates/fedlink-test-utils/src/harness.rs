// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for integration testing.
//!
//! `TestHarness` opens a temporary SQLite database through the storage
//! adapter and wires the contact directory, a [`MockFetcher`], both engines
//! and the delivery state tracker on top of it.

use std::sync::Arc;

use chrono::Duration;
use fedlink_config::{DeliveryConfig, DiscoveryConfig, FedlinkConfig, StorageConfig};
use fedlink_core::types::RelationEdge;
use fedlink_core::{ContactId, DiscoveryPolicy, FedlinkError, StorageAdapter};
use fedlink_delivery::{DeliveryEngine, DeliveryStateTracker};
use fedlink_discovery::RelationDiscoveryEngine;
use fedlink_storage::queries::relations;
use fedlink_storage::{Database, NewContact, SqliteContactDirectory, SqliteStorage};

use crate::mock_fetcher::MockFetcher;

/// Age given to contacts created through [`TestHarness::contact`], past any grace period.
const SETTLED_AGE_DAYS: i64 = 400;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    discovery: DiscoveryConfig,
    delivery: DeliveryConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            discovery: DiscoveryConfig::default(),
            delivery: DeliveryConfig::default(),
        }
    }

    pub fn with_policy(mut self, policy: DiscoveryPolicy) -> Self {
        self.discovery.policy = policy;
        self
    }

    pub fn with_fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.discovery.fetch_timeout_secs = secs;
        self
    }

    pub fn with_delivery(mut self, delivery: DeliveryConfig) -> Self {
        self.delivery = delivery;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, FedlinkError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| FedlinkError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let config = FedlinkConfig {
            storage: StorageConfig {
                database_path: db_path.to_string_lossy().to_string(),
                wal_mode: true,
            },
            discovery: self.discovery,
            delivery: self.delivery,
            ..FedlinkConfig::default()
        };

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        let db = storage.database()?.clone();
        let directory = Arc::new(storage.directory()?);
        let fetcher = Arc::new(MockFetcher::new());

        let discovery = RelationDiscoveryEngine::new(
            &config.discovery,
            db.clone(),
            directory.clone(),
            fetcher.clone(),
        );
        let delivery = DeliveryEngine::new(&config.delivery, db.clone(), directory.clone());
        let state = DeliveryStateTracker::new(db.clone());

        Ok(TestHarness {
            storage,
            db,
            directory,
            fetcher,
            discovery,
            delivery,
            state,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment over a temp database.
pub struct TestHarness {
    /// Storage adapter owning the temp database.
    pub storage: SqliteStorage,
    pub db: Database,
    pub directory: Arc<SqliteContactDirectory>,
    pub fetcher: Arc<MockFetcher>,
    pub discovery: RelationDiscoveryEngine,
    pub delivery: DeliveryEngine,
    pub state: DeliveryStateTracker,
    pub config: FedlinkConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A remote contact old enough to pass the new-contact grace period.
    pub async fn contact(&self, url: &str) -> Result<ContactId, FedlinkError> {
        self.contact_aged(url, Duration::days(SETTLED_AGE_DAYS)).await
    }

    /// A remote contact created `age` ago.
    pub async fn contact_aged(&self, url: &str, age: Duration) -> Result<ContactId, FedlinkError> {
        let mut new = NewContact::remote(url);
        new.created_at -= age;
        self.directory.create_with(new).await
    }

    /// A settled contact with a relationship to a local user.
    pub async fn local_contact(&self, url: &str) -> Result<ContactId, FedlinkError> {
        let id = self.contact(url).await?;
        self.directory.set_local(id, true).await?;
        Ok(id)
    }

    /// Every stored edge touching `contact`, ordered by (subject, object).
    pub async fn edges(&self, contact: ContactId) -> Result<Vec<RelationEdge>, FedlinkError> {
        relations::edges_of(&self.db, contact).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedlink_core::ContactDirectory;

    #[tokio::test]
    async fn harness_builds_with_defaults() {
        let harness = TestHarness::builder().build().await.unwrap();
        assert_eq!(harness.config.discovery.policy, DiscoveryPolicy::LocalOrInteractor);
        assert_eq!(harness.delivery.ceiling(false), 500);
        assert_eq!(harness.fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn builder_overrides_reach_the_config() {
        let harness = TestHarness::builder()
            .with_policy(DiscoveryPolicy::All)
            .with_fetch_timeout_secs(1)
            .with_delivery(DeliveryConfig {
                batch_queue_ceiling: 7,
                ..Default::default()
            })
            .build()
            .await
            .unwrap();
        assert_eq!(harness.config.discovery.policy, DiscoveryPolicy::All);
        assert_eq!(harness.config.discovery.fetch_timeout_secs, 1);
        assert_eq!(harness.delivery.ceiling(true), 7);
    }

    #[tokio::test]
    async fn contacts_are_settled_unless_aged() {
        let harness = TestHarness::builder().build().await.unwrap();
        let settled = harness.local_contact("https://a.example/u/1").await.unwrap();
        let young = harness
            .contact_aged("https://a.example/u/2", Duration::hours(1))
            .await
            .unwrap();

        let settled = harness.directory.get(settled).await.unwrap().unwrap();
        let young = harness.directory.get(young).await.unwrap().unwrap();
        assert!(settled.is_local);
        assert!(!young.is_local);
        assert!(settled.created_at < young.created_at - Duration::days(300));
    }

    #[tokio::test]
    async fn temp_db_is_unique_per_harness() {
        let h1 = TestHarness::builder().build().await.unwrap();
        let h2 = TestHarness::builder().build().await.unwrap();

        h1.contact("https://a.example/u/1").await.unwrap();
        assert!(h1.directory.resolve("https://a.example/u/1").await.unwrap().is_some());
        assert!(h2.directory.resolve("https://a.example/u/1").await.unwrap().is_none());
    }
}
