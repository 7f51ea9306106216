use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChannelError, ControlId, ExternalChannel};

/// In-memory shared buffer.
///
/// Copy controls are registered with the text they put into the buffer.
/// Individual operations can be made to fail to exercise degraded paths.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    buffer: String,
    controls: HashMap<ControlId, String>,
    deny_access: bool,
    fail_read: bool,
    fail_write: bool,
    triggers: Vec<ControlId>,
    writes: Vec<String>,
}

impl MemoryChannel {
    pub fn new(initial: impl Into<String>) -> Self {
        let channel = Self::default();
        channel.lock().buffer = initial.into();
        channel
    }

    /// Register a copy control that writes `text` into the buffer.
    pub fn with_control(self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.lock().controls.insert(ControlId::new(id), text.into());
        self
    }

    pub fn deny_access(self) -> Self {
        self.lock().deny_access = true;
        self
    }

    pub fn fail_reads(self) -> Self {
        self.lock().fail_read = true;
        self
    }

    pub fn fail_writes(self) -> Self {
        self.lock().fail_write = true;
        self
    }

    /// Current buffer content, bypassing failure injection.
    pub fn contents(&self) -> String {
        self.lock().buffer.clone()
    }

    /// Controls pressed so far, in order.
    pub fn triggered(&self) -> Vec<ControlId> {
        self.lock().triggers.clone()
    }

    /// Explicit writes made through [`ExternalChannel::write`].
    pub fn writes(&self) -> Vec<String> {
        self.lock().writes.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means another test thread panicked mid-update.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn checked_read(&self) -> Result<String, ChannelError> {
        let inner = self.lock();
        if inner.deny_access {
            return Err(ChannelError::Denied("read access not granted".into()));
        }
        if inner.fail_read {
            return Err(ChannelError::Unavailable("read failed".into()));
        }
        Ok(inner.buffer.clone())
    }
}

#[async_trait]
impl ExternalChannel for MemoryChannel {
    async fn peek(&self) -> Result<String, ChannelError> {
        let inner = self.lock();
        if inner.deny_access {
            return Err(ChannelError::Denied("read access not granted".into()));
        }
        Ok(inner.buffer.clone())
    }

    async fn trigger(&self, control: &ControlId) -> Result<(), ChannelError> {
        let mut inner = self.lock();
        let text = inner
            .controls
            .get(control)
            .cloned()
            .ok_or_else(|| ChannelError::ControlMissing(control.clone()))?;
        inner.triggers.push(control.clone());
        inner.buffer = text;
        Ok(())
    }

    async fn read(&self) -> Result<String, ChannelError> {
        self.checked_read()
    }

    async fn write(&self, text: &str) -> Result<(), ChannelError> {
        let mut inner = self.lock();
        if inner.fail_write {
            return Err(ChannelError::Unavailable("write failed".into()));
        }
        inner.writes.push(text.to_string());
        inner.buffer = text.to_string();
        Ok(())
    }
}
