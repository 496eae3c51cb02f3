// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Follower/following discovery for the Fedlink federation subsystem.
//!
//! [`RelationDiscoveryEngine`] crawls the followers and following collections
//! of a remote actor and merges them into the relation edge store. Crawls
//! are gated by [`DiscoveryGate`] so that remote activity cannot trigger
//! unbounded fan-out.

pub mod engine;
pub mod members;
pub mod policy;

pub use engine::{DiscoveryOutcome, RelationCounts, RelationDiscoveryEngine};
pub use members::member_urls;
pub use policy::{DiscoveryGate, SkipReason};
