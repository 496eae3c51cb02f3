// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the engines and their collaborators.
//!
//! Async traits use `#[async_trait]` so they can be held as `Arc<dyn ...>`.

pub mod adapter;
pub mod directory;
pub mod fetcher;
pub mod storage;

pub use adapter::PluginAdapter;
pub use directory::ContactDirectory;
pub use fetcher::RemoteCollectionFetcher;
pub use storage::StorageAdapter;
