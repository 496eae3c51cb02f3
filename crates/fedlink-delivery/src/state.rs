// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-item delivery counters.

use fedlink_core::types::{DeliveryState, DeliveryStateFields};
use fedlink_core::{FedlinkError, ItemId, Protocol};
use fedlink_storage::Database;
use fedlink_storage::queries::delivery_state;
use tracing::debug;

/// Success/failure counters of outbound items.
///
/// Safe to share between workers: increments are applied in place by the
/// database, never read back and rewritten.
#[derive(Clone)]
pub struct DeliveryStateTracker {
    db: Database,
}

impl DeliveryStateTracker {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn get(&self, item: ItemId) -> Result<Option<DeliveryState>, FedlinkError> {
        delivery_state::get(&self.db, item).await
    }

    /// Start tracking `item`. Fails with `InvalidArgument` for an unset id.
    pub async fn insert(&self, item: ItemId, fields: DeliveryStateFields) -> Result<(), FedlinkError> {
        delivery_state::insert(&self.db, item, fields).await
    }

    /// Create or overwrite the aggregate counters of `item`.
    ///
    /// This is the one path that may lower `queued`, `done` or `failed`;
    /// every other update only increments. Per-protocol counts are kept.
    pub async fn upsert(&self, item: ItemId, fields: DeliveryStateFields) -> Result<(), FedlinkError> {
        delivery_state::upsert(&self.db, item, fields).await
    }

    pub async fn delete(&self, item: ItemId) -> Result<(), FedlinkError> {
        delivery_state::delete(&self.db, item).await
    }

    /// Count one successful delivery via `protocol`. False if `item` is not tracked.
    pub async fn increment_done(&self, item: ItemId, protocol: Protocol) -> Result<bool, FedlinkError> {
        let updated = delivery_state::increment_done(&self.db, item, protocol).await?;
        untracked(item, updated);
        Ok(updated)
    }

    pub async fn increment_failed(&self, item: ItemId) -> Result<bool, FedlinkError> {
        let updated = delivery_state::increment_failed(&self.db, item).await?;
        untracked(item, updated);
        Ok(updated)
    }

    /// Add `delta` fan-out recipients to the queued count.
    pub async fn increment_queued(&self, item: ItemId, delta: u32) -> Result<bool, FedlinkError> {
        let updated = delivery_state::increment_queued(&self.db, item, delta).await?;
        untracked(item, updated);
        Ok(updated)
    }
}

fn untracked(item: ItemId, updated: bool) {
    if !updated {
        debug!(%item, "delivery counter update for untracked item");
    }
}
