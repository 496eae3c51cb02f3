// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-contact delivery circuit breaker.
//!
//! Two signals are derived here:
//! - "recently delayed": the contact had a queue attempt inside the delay
//!   window and is not already known to be failing. Callers use it to prefer
//!   queued delivery over a blocking send.
//! - the archival countdown: the first failure stamps `term_date`, and a
//!   contact still failing `archive_after_days` later is archived (dead).
//!   Any success clears both.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use fedlink_config::DeliveryConfig;
use fedlink_core::{ContactDirectory, ContactId, ContactRecord, FedlinkError};
use fedlink_storage::Database;
use fedlink_storage::queries::delivery_queue;
use tracing::{debug, info, warn};

/// Communication state of a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Healthy,
    /// Failing since the given time, not archived yet.
    Failing { since: DateTime<Utc> },
    Archived,
}

pub struct DeliveryCircuitBreaker {
    db: Database,
    directory: Arc<dyn ContactDirectory>,
    delay_window: Duration,
    archive_after: Duration,
}

impl DeliveryCircuitBreaker {
    pub fn new(config: &DeliveryConfig, db: Database, directory: Arc<dyn ContactDirectory>) -> Self {
        Self {
            db,
            directory,
            delay_window: Duration::minutes(i64::from(config.delay_window_mins)),
            archive_after: Duration::days(i64::from(config.archive_after_days)),
        }
    }

    /// True if a queue item for `contact` was attempted within the delay window
    /// and the contact has no failure countdown running.
    pub async fn was_recently_delayed(&self, contact: ContactId) -> Result<bool, FedlinkError> {
        if let Some(record) = self.directory.get(contact).await?
            && record.term_date.is_some()
        {
            return Ok(false);
        }
        let since = Utc::now()
            .checked_sub_signed(self.delay_window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        delivery_queue::attempted_since(&self.db, contact, since).await
    }

    /// Advance the archival countdown after a failed delivery.
    pub async fn record_failure(&self, contact: ContactId) -> Result<Liveness, FedlinkError> {
        let Some(record) = self.directory.get(contact).await? else {
            debug!(%contact, "failure for unknown contact ignored");
            return Ok(Liveness::Healthy);
        };
        if record.is_self {
            return Ok(Liveness::Healthy);
        }
        if record.archived {
            return Ok(Liveness::Archived);
        }

        let now = fedlink_core::time::now();
        match record.term_date {
            None => {
                self.directory.set_liveness(contact, Some(now), false).await?;
                debug!(%contact, "delivery failing, archival countdown started");
                Ok(Liveness::Failing { since: now })
            }
            Some(since) if countdown_expired(since, self.archive_after, now) => {
                self.directory.set_liveness(contact, Some(since), true).await?;
                warn!(%contact, failing_since = %since, "contact archived after sustained delivery failure");
                Ok(Liveness::Archived)
            }
            Some(since) => Ok(Liveness::Failing { since }),
        }
    }

    /// Clear the countdown (and archival) after a successful delivery.
    pub async fn record_success(&self, contact: ContactId) -> Result<(), FedlinkError> {
        let Some(record) = self.directory.get(contact).await? else {
            return Ok(());
        };
        if record.term_date.is_some() || record.archived {
            self.directory.set_liveness(contact, None, false).await?;
            info!(%contact, "contact reachable again");
        }
        Ok(())
    }

    pub async fn liveness(&self, contact: ContactId) -> Result<Liveness, FedlinkError> {
        Ok(self
            .directory
            .get(contact)
            .await?
            .as_ref()
            .map_or(Liveness::Healthy, liveness_of))
    }

    /// Archived contacts are dead; unknown contacts are not.
    pub async fn is_dead(&self, contact: ContactId) -> Result<bool, FedlinkError> {
        Ok(self.liveness(contact).await? == Liveness::Archived)
    }
}

/// A countdown ending past the latest representable time never expires.
fn countdown_expired(since: DateTime<Utc>, archive_after: Duration, now: DateTime<Utc>) -> bool {
    since
        .checked_add_signed(archive_after)
        .is_some_and(|deadline| deadline < now)
}

fn liveness_of(record: &ContactRecord) -> Liveness {
    match (record.archived, record.term_date) {
        (true, _) => Liveness::Archived,
        (false, Some(since)) => Liveness::Failing { since },
        (false, None) => Liveness::Healthy,
    }
}
