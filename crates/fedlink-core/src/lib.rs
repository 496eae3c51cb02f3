// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Fedlink federation subsystem.
//!
//! This crate provides the error type, identifier newtypes, shared records,
//! and the collaborator traits (contact directory, remote fetcher, storage)
//! that the discovery and delivery engines are written against.

pub mod error;
pub mod time;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::FedlinkError;
pub use types::{
    AdapterType, ContactId, ContactRecord, DiscoveryPolicy, HealthStatus, ItemId, Network,
    Protocol, QueueItemId,
};

pub use traits::{ContactDirectory, PluginAdapter, RemoteCollectionFetcher, StorageAdapter};
