// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound delivery queue.

use std::sync::Arc;

use fedlink_config::DeliveryConfig;
use fedlink_core::types::QueueItem;
use fedlink_core::{ContactDirectory, ContactId, FedlinkError, Network, QueueItemId};
use fedlink_storage::queries::delivery_queue;
use fedlink_storage::{Database, NewQueueItem};
use tracing::{debug, info, warn};

use crate::breaker::{DeliveryCircuitBreaker, Liveness};

/// Result of [`DeliveryEngine::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued(QueueItemId),
    /// The contact's backlog was at its ceiling; the message was discarded.
    Dropped { pending: u64, ceiling: u32 },
}

impl EnqueueOutcome {
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued(_))
    }
}

/// Result of [`DeliveryEngine::requeue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequeueOutcome {
    /// The item stays queued and backs off before its next attempt.
    Retrying,
    /// The contact is dead; the item was removed.
    Abandoned,
}

pub struct DeliveryEngine {
    db: Database,
    breaker: DeliveryCircuitBreaker,
    direct_ceiling: u32,
    batch_ceiling: u32,
    ignore_dead_contacts: bool,
    backoff_cap_mins: u32,
}

impl DeliveryEngine {
    pub fn new(config: &DeliveryConfig, db: Database, directory: Arc<dyn ContactDirectory>) -> Self {
        Self {
            breaker: DeliveryCircuitBreaker::new(config, db.clone(), directory),
            db,
            direct_ceiling: config.direct_queue_ceiling,
            batch_ceiling: config.batch_queue_ceiling,
            ignore_dead_contacts: config.ignore_dead_contacts,
            backoff_cap_mins: config.backoff_cap_mins,
        }
    }

    pub fn breaker(&self) -> &DeliveryCircuitBreaker {
        &self.breaker
    }

    /// Ceiling that applies to direct or batch messages.
    pub fn ceiling(&self, is_batch: bool) -> u32 {
        if is_batch {
            self.batch_ceiling
        } else {
            self.direct_ceiling
        }
    }

    /// Queue `payload` for `contact` unless its backlog is at the ceiling.
    ///
    /// The count and the insert are separate statements, so concurrent callers
    /// may overshoot the ceiling slightly.
    pub async fn enqueue(
        &self,
        contact: ContactId,
        network: Network,
        payload: impl Into<String>,
        is_batch: bool,
    ) -> Result<EnqueueOutcome, FedlinkError> {
        let ceiling = self.ceiling(is_batch);
        let pending = delivery_queue::count_pending(&self.db, contact).await?;
        if pending >= u64::from(ceiling) {
            warn!(%contact, pending, ceiling, is_batch, "delivery backlog full, message dropped");
            return Ok(EnqueueOutcome::Dropped { pending, ceiling });
        }

        let id = delivery_queue::insert(
            &self.db,
            NewQueueItem {
                contact_id: contact,
                network,
                payload: payload.into(),
                is_batch,
                created_at: fedlink_core::time::now(),
            },
        )
        .await?;
        debug!(%contact, item = %id, %network, is_batch, "message queued");
        Ok(EnqueueOutcome::Queued(id))
    }

    pub async fn was_recently_delayed(&self, contact: ContactId) -> Result<bool, FedlinkError> {
        self.breaker.was_recently_delayed(contact).await
    }

    /// Record a retry attempt of `item` now. Backlog order is unchanged.
    pub async fn touch(&self, item: QueueItemId) -> Result<(), FedlinkError> {
        delivery_queue::touch(&self.db, item, fedlink_core::time::now()).await?;
        debug!(%item, "queue item touched");
        Ok(())
    }

    /// Delete `item`. Fails with `NotFound` for an unknown id.
    pub async fn remove(&self, item: QueueItemId) -> Result<(), FedlinkError> {
        delivery_queue::delete(&self.db, item).await
    }

    /// Confirmed delivery: drop the item and clear any failure countdown.
    pub async fn complete(&self, item: QueueItemId) -> Result<(), FedlinkError> {
        let queued = self.require(item).await?;
        delivery_queue::delete(&self.db, item).await?;
        self.breaker.record_success(queued.contact_id).await
    }

    /// Transient failure: advance the contact's countdown and either keep the
    /// item for a later attempt or abandon it if the contact is now dead.
    pub async fn requeue(&self, item: QueueItemId) -> Result<RequeueOutcome, FedlinkError> {
        let queued = self.require(item).await?;
        let liveness = self.breaker.record_failure(queued.contact_id).await?;

        if liveness == Liveness::Archived && !self.ignore_dead_contacts {
            delivery_queue::delete(&self.db, item).await?;
            info!(%item, contact = %queued.contact_id, "queue item abandoned, contact is dead");
            return Ok(RequeueOutcome::Abandoned);
        }

        self.touch(item).await?;
        Ok(RequeueOutcome::Retrying)
    }

    /// Items whose retry backoff has elapsed, oldest first.
    pub async fn due_items(&self, limit: u32) -> Result<Vec<QueueItem>, FedlinkError> {
        delivery_queue::due(
            &self.db,
            fedlink_core::time::now(),
            self.backoff_cap_mins,
            limit,
        )
        .await
    }

    pub async fn backlog(&self, contact: ContactId) -> Result<Vec<QueueItem>, FedlinkError> {
        delivery_queue::list_for_contact(&self.db, contact).await
    }

    async fn require(&self, item: QueueItemId) -> Result<QueueItem, FedlinkError> {
        delivery_queue::get(&self.db, item)
            .await?
            .ok_or(FedlinkError::NotFound {
                kind: "queue item",
                id: item.0,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use fedlink_storage::SqliteContactDirectory;

    async fn setup(config: DeliveryConfig) -> (DeliveryEngine, Arc<SqliteContactDirectory>, ContactId) {
        let db = Database::open_in_memory().await.unwrap();
        let directory = Arc::new(SqliteContactDirectory::new(db.clone()));
        let contact = directory.create("https://peer.example/u/1").await.unwrap();
        let engine = DeliveryEngine::new(&config, db, directory.clone());
        (engine, directory, contact)
    }

    fn small_ceilings() -> DeliveryConfig {
        DeliveryConfig {
            direct_queue_ceiling: 2,
            batch_queue_ceiling: 3,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn drops_at_direct_ceiling() {
        let (engine, _, contact) = setup(small_ceilings()).await;
        for _ in 0..2 {
            let outcome = engine.enqueue(contact, Network::ActivityPub, "{}", false).await.unwrap();
            assert!(outcome.is_queued());
        }
        let dropped = engine.enqueue(contact, Network::ActivityPub, "{}", false).await.unwrap();
        assert_eq!(dropped, EnqueueOutcome::Dropped { pending: 2, ceiling: 2 });
        assert_eq!(engine.backlog(contact).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn batch_messages_use_their_own_ceiling() {
        let (engine, _, contact) = setup(small_ceilings()).await;
        for _ in 0..2 {
            engine.enqueue(contact, Network::Diaspora, "{}", false).await.unwrap();
        }
        // Backlog is shared; only the ceiling differs.
        assert!(engine.enqueue(contact, Network::Diaspora, "{}", true).await.unwrap().is_queued());
        assert!(!engine.enqueue(contact, Network::Diaspora, "{}", true).await.unwrap().is_queued());
    }

    #[tokio::test]
    async fn self_contact_backlog_is_never_counted() {
        let (engine, directory, contact) = setup(small_ceilings()).await;
        directory.set_self(contact, true).await.unwrap();
        for _ in 0..5 {
            assert!(engine.enqueue(contact, Network::Dfrn, "{}", false).await.unwrap().is_queued());
        }
    }

    #[tokio::test]
    async fn touch_marks_contact_delayed() {
        let (engine, _, contact) = setup(DeliveryConfig::default()).await;
        let EnqueueOutcome::Queued(item) =
            engine.enqueue(contact, Network::ActivityPub, "{}", false).await.unwrap()
        else {
            panic!("expected queued");
        };
        assert!(engine.was_recently_delayed(contact).await.unwrap());

        engine.touch(item).await.unwrap();
        assert_eq!(engine.backlog(contact).await.unwrap()[0].attempts, 1);
        assert!(engine.was_recently_delayed(contact).await.unwrap());
    }

    #[tokio::test]
    async fn failing_contact_is_not_reported_delayed() {
        let (engine, directory, contact) = setup(DeliveryConfig::default()).await;
        engine.enqueue(contact, Network::ActivityPub, "{}", false).await.unwrap();
        directory.set_liveness(contact, Some(Utc::now()), false).await.unwrap();
        assert!(!engine.was_recently_delayed(contact).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_item_operations_fail() {
        let (engine, _, _) = setup(DeliveryConfig::default()).await;
        for result in [
            engine.touch(QueueItemId(99)).await,
            engine.remove(QueueItemId(99)).await,
            engine.complete(QueueItemId(99)).await,
        ] {
            assert!(matches!(result, Err(FedlinkError::NotFound { kind: "queue item", id: 99 })));
        }
        assert!(engine.requeue(QueueItemId(99)).await.is_err());
    }

    #[tokio::test]
    async fn requeue_backs_off_then_complete_clears_countdown() {
        let (engine, _, contact) = setup(DeliveryConfig::default()).await;
        let EnqueueOutcome::Queued(item) =
            engine.enqueue(contact, Network::ActivityPub, "{}", false).await.unwrap()
        else {
            panic!("expected queued");
        };
        assert_eq!(engine.due_items(10).await.unwrap().len(), 1);

        assert_eq!(engine.requeue(item).await.unwrap(), RequeueOutcome::Retrying);
        assert!(engine.due_items(10).await.unwrap().is_empty());
        assert!(matches!(
            engine.breaker().liveness(contact).await.unwrap(),
            Liveness::Failing { .. }
        ));

        engine.complete(item).await.unwrap();
        assert!(engine.backlog(contact).await.unwrap().is_empty());
        assert_eq!(engine.breaker().liveness(contact).await.unwrap(), Liveness::Healthy);
    }

    #[tokio::test]
    async fn requeue_abandons_items_of_dead_contacts() {
        let (engine, directory, contact) = setup(DeliveryConfig::default()).await;
        let long_ago = Utc::now() - Duration::days(40);
        directory.set_liveness(contact, Some(long_ago), false).await.unwrap();
        let EnqueueOutcome::Queued(item) =
            engine.enqueue(contact, Network::ActivityPub, "{}", false).await.unwrap()
        else {
            panic!("expected queued");
        };

        assert_eq!(engine.requeue(item).await.unwrap(), RequeueOutcome::Abandoned);
        assert!(engine.backlog(contact).await.unwrap().is_empty());
        assert!(engine.breaker().is_dead(contact).await.unwrap());
    }

    #[tokio::test]
    async fn ignore_dead_contacts_keeps_retrying() {
        let config = DeliveryConfig {
            ignore_dead_contacts: true,
            ..Default::default()
        };
        let (engine, directory, contact) = setup(config).await;
        directory.set_liveness(contact, Some(Utc::now()), true).await.unwrap();
        let EnqueueOutcome::Queued(item) =
            engine.enqueue(contact, Network::ActivityPub, "{}", false).await.unwrap()
        else {
            panic!("expected queued");
        };
        assert_eq!(engine.requeue(item).await.unwrap(), RequeueOutcome::Retrying);
    }
}
