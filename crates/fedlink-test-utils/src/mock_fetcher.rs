// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted remote collection fetcher for deterministic testing.
//!
//! `MockFetcher` serves actor documents and collections registered up front.
//! Individual URLs can be made to fail or to stall, and every fetch is counted.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use fedlink_core::types::{ActorCollections, AdapterType, CollectionMember, HealthStatus};
use fedlink_core::{FedlinkError, PluginAdapter, RemoteCollectionFetcher};

/// A fetcher answering from in-memory maps.
///
/// Unknown actors resolve to `Ok(None)` and unknown collections to an empty
/// member list.
#[derive(Default)]
pub struct MockFetcher {
    actors: Mutex<HashMap<String, ActorCollections>>,
    collections: Mutex<HashMap<String, Vec<CollectionMember>>>,
    failing: Mutex<HashSet<String>>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `profile_url` with `<profile>/followers` and `<profile>/following`
    /// collections listing the given member URLs.
    pub async fn serve_actor(&self, profile_url: &str, followers: &[&str], following: &[&str]) {
        let followers_url = format!("{profile_url}/followers");
        let following_url = format!("{profile_url}/following");
        self.set_collection(&followers_url, url_members(followers)).await;
        self.set_collection(&following_url, url_members(following)).await;
        self.set_actor(
            profile_url,
            ActorCollections {
                followers: Some(followers_url),
                following: Some(following_url),
            },
        )
        .await;
    }

    pub async fn set_actor(&self, profile_url: &str, actor: ActorCollections) {
        self.actors.lock().await.insert(profile_url.to_string(), actor);
    }

    pub async fn set_collection(&self, collection_url: &str, members: Vec<CollectionMember>) {
        self.collections
            .lock()
            .await
            .insert(collection_url.to_string(), members);
    }

    /// Make every fetch of `url` fail with a `Fetch` error.
    pub async fn fail(&self, url: &str) {
        self.failing.lock().await.insert(url.to_string());
    }

    /// Stall every fetch of `url` by `delay` before answering.
    pub async fn delay(&self, url: &str, delay: Duration) {
        self.delays.lock().await.insert(url.to_string(), delay);
    }

    /// Number of fetches served so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn before_fetch(&self, url: &str) -> Result<(), FedlinkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delays.lock().await.get(url).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().await.contains(url) {
            return Err(FedlinkError::Fetch {
                url: url.to_string(),
                message: "mock fetch failure".to_string(),
            });
        }
        Ok(())
    }
}

fn url_members(urls: &[&str]) -> Vec<CollectionMember> {
    urls.iter()
        .map(|url| CollectionMember::Url((*url).to_string()))
        .collect()
}

#[async_trait]
impl PluginAdapter for MockFetcher {
    fn name(&self) -> &str {
        "mock-fetcher"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Fetcher
    }

    async fn health_check(&self) -> Result<HealthStatus, FedlinkError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), FedlinkError> {
        Ok(())
    }
}

#[async_trait]
impl RemoteCollectionFetcher for MockFetcher {
    async fn fetch_actor(
        &self,
        profile_url: &str,
    ) -> Result<Option<ActorCollections>, FedlinkError> {
        self.before_fetch(profile_url).await?;
        Ok(self.actors.lock().await.get(profile_url).cloned())
    }

    async fn fetch_collection_members(
        &self,
        collection_url: &str,
    ) -> Result<Vec<CollectionMember>, FedlinkError> {
        self.before_fetch(collection_url).await?;
        Ok(self
            .collections
            .lock()
            .await
            .get(collection_url)
            .cloned()
            .unwrap_or_default())
    }
}
