// Copyright (c) 2026 servermgr contributors
// SPDX-License-Identifier: MIT

//! Application layer: adapter registry and the server manager orchestrator.

pub mod registry;
pub mod server_manager;

pub use registry::AdapterRegistry;
pub use server_manager::{ManagerError, ServerManager};
