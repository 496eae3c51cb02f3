// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Fedlink integration tests.
//!
//! Provides a scripted remote fetcher and a harness wiring a temporary
//! database to the discovery and delivery engines, so integration tests run
//! without network access.
//!
//! # Components
//!
//! - [`MockFetcher`] - Remote collection fetcher with scripted actors, failures and delays
//! - [`TestHarness`] - Temp SQLite database plus directory, engines and tracker

pub mod harness;
pub mod mock_fetcher;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_fetcher::MockFetcher;
