//! Keyed resource persistence backing the `/users` API.
//!
//! The store is a JSON document `{"next_id": n, "users": {"<id>": {...}}}`
//! reloaded and rewritten wholesale on every operation. All access goes
//! through [`UserStore`], which serializes each read-modify-write behind a
//! single writer lock so concurrent requests cannot race on `next_id` or
//! interleave file writes.

pub mod file;

pub use file::JsonFileStore;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

/// A resource object as stored: opaque fields plus the server-stamped `id`.
pub type Resource = Map<String, Value>;

/// The persisted store document.
///
/// Invariant: `next_id` is strictly greater than every id ever issued, and
/// every key in `users` is the decimal form of an issued id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreState {
    pub next_id: u64,
    pub users: Map<String, Value>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            next_id: 1,
            users: Map::new(),
        }
    }
}

/// Durable storage for a [`StoreState`]: full-document load and atomic
/// full-document save.
pub trait StoreBackend: Send + Sync {
    fn load(&self) -> Result<StoreState>;
    fn save(&self, state: &StoreState) -> Result<()>;
}

/// Shared handle to the resource store.
///
/// Every operation holds the lock across its whole load-modify-save cycle.
pub struct UserStore {
    backend: Box<dyn StoreBackend>,
    lock: Mutex<()>,
}

impl UserStore {
    pub fn new(backend: impl StoreBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            lock: Mutex::new(()),
        }
    }

    /// Returns all resources in store iteration order.
    pub async fn list(&self) -> Result<Vec<Value>> {
        let _guard = self.lock.lock().await;
        let state = self.backend.load()?;
        Ok(state.users.values().cloned().collect())
    }

    /// Inserts a new resource, stamping it with the next auto-increment id.
    pub async fn insert(&self, mut resource: Resource) -> Result<Value> {
        let _guard = self.lock.lock().await;
        let mut state = self.backend.load()?;

        let id = state.next_id;
        state.next_id += 1;
        resource.insert("id".to_string(), Value::from(id));

        let value = Value::Object(resource);
        state.users.insert(id.to_string(), value.clone());
        self.backend.save(&state)?;

        Ok(value)
    }

    /// Replaces the resource with the given id wholesale, re-stamping `id`.
    ///
    /// Returns `None` (and writes nothing) if the id is unknown.
    pub async fn replace(&self, id: u64, mut resource: Resource) -> Result<Option<Value>> {
        let _guard = self.lock.lock().await;
        let mut state = self.backend.load()?;

        let key = id.to_string();
        if !state.users.contains_key(&key) {
            return Ok(None);
        }

        resource.insert("id".to_string(), Value::from(id));
        let value = Value::Object(resource);
        state.users.insert(key, value.clone());
        self.backend.save(&state)?;

        Ok(Some(value))
    }

    /// Merges the patch fields into the resource with the given id.
    ///
    /// An `id` field in the patch is ignored; the stored id never changes.
    /// Returns the merged resource, or `None` if the id is unknown.
    pub async fn merge(&self, id: u64, patch: Resource) -> Result<Option<Value>> {
        let _guard = self.lock.lock().await;
        let mut state = self.backend.load()?;

        let Some(existing) = state.users.get_mut(&id.to_string()) else {
            return Ok(None);
        };
        let fields = existing
            .as_object_mut()
            .ok_or_else(|| anyhow::anyhow!("stored resource {id} is not an object"))?;

        for (key, value) in patch {
            if key != "id" {
                fields.insert(key, value);
            }
        }
        let merged = Value::Object(fields.clone());
        self.backend.save(&state)?;

        Ok(Some(merged))
    }

    /// Removes and returns the resource with the given id.
    ///
    /// Iteration order of the remaining resources is preserved.
    pub async fn remove(&self, id: u64) -> Result<Option<Value>> {
        let _guard = self.lock.lock().await;
        let mut state = self.backend.load()?;

        match state.users.shift_remove(&id.to_string()) {
            Some(value) => {
                self.backend.save(&state)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}
