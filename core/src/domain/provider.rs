// Copyright (c) 2026 servermgr contributors
// SPDX-License-Identifier: MIT

//! Server descriptor providers.
//!
//! The directory is assembled from an ordered list of providers; each one
//! returns a `name -> ServerInfo` map from its own source of truth (static
//! configuration, a labelled ConfigMap query, ...). Interfaces live in the
//! domain layer, implementations in `crate::infrastructure::providers`.

use crate::domain::server::ServerInfo;
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// A descriptor document failed to parse.
    #[error("failed to parse server descriptor `{name}`: {reason}")]
    Parse { name: String, reason: String },

    /// The provider's backing source could not be queried.
    #[error("descriptor source unavailable: {0}")]
    Source(String),
}

/// One source of server descriptors.
///
/// Providers are queried in registration order on every directory refresh;
/// a later provider's entry overwrites an earlier one for the same name.
#[async_trait]
pub trait ServerInfoProvider: Send + Sync {
    /// Short identifier used in logs and error messages.
    fn name(&self) -> &str;

    async fn server_info(&self) -> Result<HashMap<String, ServerInfo>, ProviderError>;
}
