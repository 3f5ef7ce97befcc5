// Copyright (c) 2026 servermgr contributors
// SPDX-License-Identifier: MIT

//! Binding of raw, per-server property maps to typed adapter schemas.
//!
//! Server descriptors carry adapter configuration as an opaque
//! `name -> string` map. Immediately before an adapter operation executes,
//! the map is bound against the adapter's property structure; a missing
//! required field or malformed value aborts the operation before any
//! backend call. The binding step is deliberately schema-driven and free of
//! any serialization library: adding a fourth backend means one more
//! property struct and one more [`BindProperties`] impl, nothing else.

use crate::domain::host::HostError;
use std::collections::HashMap;

/// Read-only view over a raw property map with validated accessors.
pub struct PropertyMap<'a> {
    raw: &'a HashMap<String, String>,
}

impl<'a> PropertyMap<'a> {
    pub fn new(raw: &'a HashMap<String, String>) -> Self {
        Self { raw }
    }

    /// Fetch a required property, failing with a [`HostError::Configuration`]
    /// that names the field when it is absent or blank.
    pub fn required(&self, field: &str) -> Result<&'a str, HostError> {
        match self.optional(field) {
            Some(value) => Ok(value),
            None => Err(HostError::missing_property(field)),
        }
    }

    /// Fetch an optional property; absent and blank values read as `None`.
    pub fn optional(&self, field: &str) -> Option<&'a str> {
        self.raw
            .get(field)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }
}

/// A typed per-adapter property structure, produced fresh on every
/// invocation from the descriptor's raw map.
pub trait BindProperties: Sized {
    fn bind(props: &PropertyMap<'_>) -> Result<Self, HostError>;
}
