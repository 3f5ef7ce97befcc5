// Copyright (c) 2026 servermgr contributors
// SPDX-License-Identifier: MIT

//! Server host orchestration for externally hosted game and service
//! workloads.
//!
//! The crate assembles a directory of named servers from pluggable
//! [`ServerInfoProvider`]s, caches it with a TTL, and drives each server's
//! lifecycle through the [`ServerHostAdapter`] resolved from its
//! descriptor. Bare processes, Docker Compose projects, and Kubernetes
//! workloads are supported out of the box.
//!
//! # Architecture
//!
//! - `domain` — the server model, the adapter contract, property binding,
//!   and configuration shapes.
//! - `application` — the [`AdapterRegistry`] and the [`ServerManager`]
//!   orchestrator.
//! - `infrastructure` — the concrete adapters and providers, plus the
//!   process, command, and Kubernetes seams they are built on.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{AdapterRegistry, ManagerError, ServerManager};
pub use domain::*;
