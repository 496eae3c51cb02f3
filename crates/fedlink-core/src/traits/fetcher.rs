// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote collection fetcher contract.
//!
//! Implementations live outside this workspace (they speak the federation
//! wire protocol and sign requests). Errors returned here are treated as
//! transient by the discovery engine and never abort a caller.

use async_trait::async_trait;

use crate::error::FedlinkError;
use crate::types::{ActorCollections, CollectionMember};

/// Fetches remote actor documents and their follower/following collections.
#[async_trait]
pub trait RemoteCollectionFetcher: Send + Sync {
    /// Fetch the actor document behind `profile_url`.
    ///
    /// `Ok(None)` means the profile does not expose an actor document.
    async fn fetch_actor(&self, profile_url: &str)
    -> Result<Option<ActorCollections>, FedlinkError>;

    /// Fetch every member of the collection at `collection_url`, following pagination.
    async fn fetch_collection_members(
        &self,
        collection_url: &str,
    ) -> Result<Vec<CollectionMember>, FedlinkError>;
}
