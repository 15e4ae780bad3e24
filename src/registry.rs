//! Session registry: the bidirectional identity map between caller
//! request ids, engine content hashes, and live session handles.
//!
//! Both indexes live under one mutex, so no caller can observe a state
//! where one index reflects an entry and the other does not. Entries
//! are never mutated in place; replacement is remove-then-insert.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::engine::SessionHandle;
use crate::error::RegistryError;

#[derive(Debug, Clone)]
struct Entry {
    content_hash: String,
    handle: SessionHandle,
}

#[derive(Debug, Default)]
struct Indexes {
    /// request id -> (content hash, handle)
    by_request: HashMap<String, Entry>,
    /// content hash -> request id
    by_hash: HashMap<String, String>,
}

/// Concurrency-safe registry of live transfer sessions.
///
/// An entry exists exactly while its handle is valid in the engine:
/// installed after successful session creation, dropped on cleanup,
/// terminal event, or shutdown.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    indexes: Mutex<Indexes>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Indexes> {
        // A poisoned lock means a panic mid-critical-section; the maps
        // are only ever updated together, so the state is still usable.
        self.indexes.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Install both index entries for a new session atomically.
    ///
    /// Nothing is written unless both keys are free.
    pub fn insert(
        &self,
        request_id: &str,
        content_hash: &str,
        handle: SessionHandle,
    ) -> Result<(), RegistryError> {
        let mut idx = self.lock();
        if idx.by_request.contains_key(request_id) {
            return Err(RegistryError::DuplicateRequest(request_id.to_string()));
        }
        if idx.by_hash.contains_key(content_hash) {
            return Err(RegistryError::DuplicateHash(content_hash.to_string()));
        }
        idx.by_request.insert(
            request_id.to_string(),
            Entry {
                content_hash: content_hash.to_string(),
                handle,
            },
        );
        idx.by_hash.insert(content_hash.to_string(), request_id.to_string());
        Ok(())
    }

    /// Resolve a request id to its session handle.
    pub fn lookup_by_request(&self, request_id: &str) -> Option<SessionHandle> {
        self.lock().by_request.get(request_id).map(|e| e.handle.clone())
    }

    /// Resolve a content hash to its request id.
    pub fn lookup_by_hash(&self, content_hash: &str) -> Option<String> {
        self.lock().by_hash.get(content_hash).cloned()
    }

    /// Remove an entry by request id, dropping both indexes together.
    pub fn remove(&self, request_id: &str) -> Option<SessionHandle> {
        let mut idx = self.lock();
        let entry = idx.by_request.remove(request_id)?;
        idx.by_hash.remove(&entry.content_hash);
        Some(entry.handle)
    }

    /// Remove an entry by content hash, dropping both indexes together.
    ///
    /// Returns the request id alongside the handle: the router has only
    /// the hash but needs the id for the outbound notification.
    pub fn remove_by_hash(&self, content_hash: &str) -> Option<(String, SessionHandle)> {
        let mut idx = self.lock();
        let request_id = idx.by_hash.remove(content_hash)?;
        let entry = idx.by_request.remove(&request_id)?;
        Some((request_id, entry.handle))
    }

    /// Drain every entry, returning the handles that were live.
    pub fn clear(&self) -> Vec<SessionHandle> {
        let mut idx = self.lock();
        idx.by_hash.clear();
        idx.by_request.drain().map(|(_, e)| e.handle).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().by_request.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
