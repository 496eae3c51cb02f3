// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Crawl gating: freshness and discovery policy.
//!
//! The gate is a pure decision over a contact record. The only input it
//! cannot derive from the record, whether the contact ever interacted with
//! content here, is looked up by the caller when
//! [`DiscoveryGate::needs_interaction_lookup`] says so.

use chrono::{DateTime, Duration, Utc};
use fedlink_config::DiscoveryConfig;
use fedlink_core::{ContactRecord, DiscoveryPolicy};
use strum::Display;

/// Why a discovery request did not crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    /// The profile URL does not resolve to a known contact.
    UnknownContact,
    /// Discovery is disabled by policy.
    Disabled,
    /// The contact was crawled within the refresh interval.
    RecentlyDiscovered,
    /// The contact has no relationship with a local user.
    NotLocal,
    /// The contact is neither local nor a known interactor.
    NotLocalOrInteractor,
    /// The contact was created within the grace period.
    TooNew,
    /// Another crawl of the same contact is in progress in this process.
    AlreadyRunning,
    /// The remote actor advertised no collections, or both came back empty.
    NothingFetched,
}

/// Freshness plus policy gate, built from the discovery configuration.
#[derive(Debug, Clone)]
pub struct DiscoveryGate {
    policy: DiscoveryPolicy,
    refresh_interval: Duration,
    new_contact_grace: Duration,
}

impl DiscoveryGate {
    pub fn new(
        policy: DiscoveryPolicy,
        refresh_interval: Duration,
        new_contact_grace: Duration,
    ) -> Self {
        Self {
            policy,
            refresh_interval,
            new_contact_grace,
        }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self::new(
            config.policy,
            Duration::days(i64::from(config.refresh_interval_days)),
            Duration::hours(i64::from(config.new_contact_grace_hours)),
        )
    }

    pub fn policy(&self) -> DiscoveryPolicy {
        self.policy
    }

    /// Whether [`evaluate`](Self::evaluate) depends on the interaction history.
    pub fn needs_interaction_lookup(&self, contact: &ContactRecord) -> bool {
        self.policy == DiscoveryPolicy::LocalOrInteractor && !contact.is_local
    }

    /// Decide whether `contact` may be crawled at `now`.
    pub fn evaluate(
        &self,
        contact: &ContactRecord,
        has_interacted: bool,
        now: DateTime<Utc>,
    ) -> Result<(), SkipReason> {
        if self.policy == DiscoveryPolicy::None {
            return Err(SkipReason::Disabled);
        }

        if let Some(last) = contact.last_discovery_at
            && within(last, now, self.refresh_interval)
        {
            return Err(SkipReason::RecentlyDiscovered);
        }

        match self.policy {
            DiscoveryPolicy::None => Err(SkipReason::Disabled),
            DiscoveryPolicy::LocalOnly if !contact.is_local => Err(SkipReason::NotLocal),
            DiscoveryPolicy::LocalOrInteractor if !contact.is_local && !has_interacted => {
                Err(SkipReason::NotLocalOrInteractor)
            }
            DiscoveryPolicy::All if within(contact.created_at, now, self.new_contact_grace) => {
                Err(SkipReason::TooNew)
            }
            _ => Ok(()),
        }
    }
}

/// Whether `at` lies after `now - window`. A window reaching past the
/// earliest representable time covers everything.
fn within(at: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    now.checked_sub_signed(window).is_none_or(|cutoff| at > cutoff)
}
