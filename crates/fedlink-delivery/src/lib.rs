// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound delivery for the Fedlink federation subsystem.
//!
//! - [`DeliveryEngine`] gates and queues messages per contact with separate
//!   direct and batch backlog ceilings, and hands out due retries.
//! - [`DeliveryCircuitBreaker`] tracks whether a contact is currently failing
//!   and archives it after a sustained outage.
//! - [`DeliveryStateTracker`] keeps per-item counters that concurrent workers
//!   update with single-statement increments.

pub mod breaker;
pub mod engine;
pub mod state;

pub use breaker::{DeliveryCircuitBreaker, Liveness};
pub use engine::{DeliveryEngine, EnqueueOutcome, RequeueOutcome};
pub use state::DeliveryStateTracker;
