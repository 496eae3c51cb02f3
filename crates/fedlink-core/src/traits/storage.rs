// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends.

use async_trait::async_trait;

use crate::error::FedlinkError;
use crate::traits::adapter::PluginAdapter;

/// Adapter for the persistent store holding relation edges, the delivery
/// queue and delivery counters.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection setup).
    async fn initialize(&self) -> Result<(), FedlinkError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), FedlinkError>;
}
