//! In-process channel backed by shared bytes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::persistence::{ChannelError, PersistenceChannel};

#[derive(Debug, Default)]
struct Inner {
    contents: Mutex<Option<Vec<u8>>>,
    writes: AtomicUsize,
}

/// Cloneable handle to a shared byte buffer. Clones see the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryChannel {
    inner: Arc<Inner>,
}

impl MemoryChannel {
    /// An empty channel (nothing persisted).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(bytes: impl Into<Vec<u8>>) -> Self {
        let channel = Self::new();
        channel.set_contents(bytes);
        channel
    }

    /// Replace the stored bytes without counting as a store write.
    pub fn set_contents(&self, bytes: impl Into<Vec<u8>>) {
        *self.lock() = Some(bytes.into());
    }

    pub fn contents(&self) -> Option<Vec<u8>> {
        self.lock().clone()
    }

    /// Number of writes performed through [`PersistenceChannel::write`].
    pub fn writes(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Vec<u8>>> {
        self.inner
            .contents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PersistenceChannel for MemoryChannel {
    fn exists(&self) -> Result<bool, ChannelError> {
        Ok(self.lock().is_some())
    }

    fn read(&self) -> Result<Vec<u8>, ChannelError> {
        self.lock().clone().ok_or(ChannelError::NotFound)
    }

    fn write(&self, bytes: &[u8]) -> Result<(), ChannelError> {
        *self.lock() = Some(bytes.to_vec());
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
