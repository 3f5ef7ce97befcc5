// Copyright (c) 2026 servermgr contributors
// SPDX-License-Identifier: MIT

//! Domain layer: the server model, the host adapter contract, property
//! binding, and configuration shapes.

pub mod config;
pub mod host;
pub mod properties;
pub mod provider;
pub mod server;

pub use config::{HostAdapterConfig, ManagerConfig, ManagerSettings, ServerInfoProviderConfig};
pub use host::{HostContext, HostError, ServerHostAdapter, ServerLogs};
pub use properties::{BindProperties, PropertyMap};
pub use provider::{ProviderError, ServerInfoProvider};
pub use server::{ServerInfo, ServerStatus};
