//! Shared text buffer capability.
//!
//! The host page's copy control writes the full prompt into a single,
//! process-wide text slot (the clipboard). The engine reads it back from
//! there and restores the previous content afterwards. [`ExternalChannel`]
//! is that slot plus the ability to press a copy control, so the
//! snapshot/restore protocol can run against [`MemoryChannel`] in tests and
//! against the browser clipboard in production.

mod memory;

pub use memory::MemoryChannel;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Opaque handle to a copy control inside the live feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControlId(pub String);

impl ControlId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("Permission denied: {0}")]
    Denied(String),

    #[error("Copy control not found: {0}")]
    ControlMissing(ControlId),

    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),
}

/// Single-slot shared text buffer with a copy trigger.
#[async_trait]
pub trait ExternalChannel: Send + Sync {
    /// Read the buffer without side effects. Used for the access check and
    /// for the pre-trigger snapshot.
    async fn peek(&self) -> Result<String, ChannelError>;

    /// Press the copy control identified by `control`.
    async fn trigger(&self, control: &ControlId) -> Result<(), ChannelError>;

    /// Read the buffer after a trigger.
    async fn read(&self) -> Result<String, ChannelError>;

    /// Overwrite the buffer.
    async fn write(&self, text: &str) -> Result<(), ChannelError>;
}
