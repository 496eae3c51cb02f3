// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules, one per table.

pub mod contacts;
pub mod delivery_queue;
pub mod delivery_state;
pub mod relations;
