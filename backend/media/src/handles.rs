//! In-memory registry behind display handles.
//!
//! A handle's URL stays resolvable until it is revoked; after that the media
//! server answers 404 for it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use bytes::Bytes;
use tracing::{debug, warn};
use uuid::Uuid;

use flatframe_core::{DisplayHandle, DisplayHandles, VideoPayload};

/// Media registered under a handle.
#[derive(Debug, Clone)]
pub struct StoredMedia {
    pub data: Bytes,
    pub content_type: String,
}

pub struct HandleRegistry {
    base_path: String,
    entries: RwLock<HashMap<Uuid, StoredMedia>>,
    created: AtomicU64,
    revoked: AtomicU64,
}

impl HandleRegistry {
    /// `base_path` is the URL prefix the media router is mounted at, e.g. `/media`.
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into().trim_end_matches('/').to_string(),
            entries: RwLock::new(HashMap::new()),
            created: AtomicU64::new(0),
            revoked: AtomicU64::new(0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, StoredMedia>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, StoredMedia>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, id: &Uuid) -> Option<StoredMedia> {
        self.read().get(id).cloned()
    }

    pub fn is_live(&self, id: &Uuid) -> bool {
        self.read().contains_key(id)
    }

    /// Handles created and not yet revoked.
    pub fn live_count(&self) -> usize {
        self.read().len()
    }

    pub fn created_count(&self) -> u64 {
        self.created.load(Ordering::SeqCst)
    }

    pub fn revoked_count(&self) -> u64 {
        self.revoked.load(Ordering::SeqCst)
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new("/media")
    }
}

impl DisplayHandles for HandleRegistry {
    fn create(&self, data: Bytes, content_type: &str) -> DisplayHandle {
        let id = Uuid::new_v4();
        let size = data.len();
        self.write().insert(
            id,
            StoredMedia {
                data,
                content_type: content_type.to_string(),
            },
        );
        self.created.fetch_add(1, Ordering::SeqCst);
        debug!(handle = %id, bytes = size, content_type, "Created display handle");
        DisplayHandle::new(id, format!("{}/{}", self.base_path, id))
    }

    fn resolve(&self, handle: &DisplayHandle) -> Option<VideoPayload> {
        self.get(&handle.id()).map(|media| VideoPayload {
            bytes: media.data,
            content_type: media.content_type,
        })
    }

    fn revoke(&self, handle: DisplayHandle) {
        let id = handle.id();
        if self.write().remove(&id).is_some() {
            self.revoked.fetch_add(1, Ordering::SeqCst);
            debug!(handle = %id, "Revoked display handle");
        } else {
            warn!(handle = %id, "Revoked a handle this registry does not know");
        }
    }
}
