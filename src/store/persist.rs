//! Persistence adapter shared by the cart and wishlist stores.
//!
//! Slots hold a versioned envelope, `{"state": ..., "version": N}`. A missing,
//! unparseable or foreign-version slot yields the default state. Storage
//! failures are logged and otherwise ignored: the in-memory state stays
//! authoritative and the store keeps working without persistence.

use std::sync::Arc;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::store::storage::StorageBackend;

/// Envelope version written by this build.
pub const STORE_VERSION: u32 = 0;

#[derive(Serialize)]
struct EnvelopeRef<'a, S> {
    state: &'a S,
    version: u32,
}

#[derive(Deserialize)]
struct Envelope<S> {
    state: S,
    version: u32,
}

/// State that can live in a storage slot.
pub trait StoreState: Serialize + DeserializeOwned + Default {
    /// Restore the state's invariants after it was read from a slot.
    fn normalize(&mut self) {}
}

#[derive(Debug)]
pub struct PersistedStore<S> {
    key: &'static str,
    state: S,
    storage: Option<Arc<dyn StorageBackend>>,
    hydrated: bool,
}

impl<S: StoreState> PersistedStore<S> {
    /// Build the store and load its slot right away.
    pub fn open(key: &'static str, storage: Option<Arc<dyn StorageBackend>>) -> Self {
        let mut store = Self::detached(key, storage);
        store.rehydrate();
        store
    }

    /// Build the store with the default state and leave the slot unread.
    ///
    /// Until [`rehydrate`](Self::rehydrate) runs nothing is written back, so
    /// an early action cannot clobber the persisted state with a partial one.
    pub fn detached(key: &'static str, storage: Option<Arc<dyn StorageBackend>>) -> Self {
        Self {
            key,
            state: S::default(),
            storage,
            hydrated: false,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn is_persistent(&self) -> bool {
        self.storage.is_some()
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Apply an action to the state, then write the result to the slot.
    pub fn update<R>(&mut self, action: impl FnOnce(&mut S) -> R) -> R {
        let out = action(&mut self.state);
        self.flush();
        out
    }

    /// Mutable access without a write-back; the caller must [`flush`](Self::flush).
    pub(crate) fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Replace the in-memory state with whatever the slot holds.
    pub fn rehydrate(&mut self) {
        self.state = self.load();
        self.hydrated = true;
    }

    /// Restore the default state and persist it.
    pub fn reset(&mut self) {
        self.state = S::default();
        self.flush();
    }

    /// Serialize the current state into the slot format.
    pub fn snapshot(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&EnvelopeRef {
            state: &self.state,
            version: STORE_VERSION,
        })
    }

    pub fn flush(&self) {
        let Some(storage) = &self.storage else {
            return;
        };
        if !self.hydrated {
            tracing::debug!(key = self.key, "skipping write before hydration");
            return;
        }

        let payload = match self.snapshot() {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(key = self.key, error = %err, "failed to serialize store");
                return;
            }
        };
        if let Err(err) = storage.set(self.key, &payload) {
            tracing::warn!(key = self.key, error = %err, "failed to persist store");
        }
    }

    fn load(&self) -> S {
        let Some(storage) = &self.storage else {
            return S::default();
        };

        let raw = match storage.get(self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return S::default(),
            Err(err) => {
                tracing::warn!(key = self.key, error = %err, "storage unavailable, using memory only");
                return S::default();
            }
        };

        match serde_json::from_str::<Envelope<S>>(&raw) {
            Ok(envelope) if envelope.version == STORE_VERSION => {
                let mut state = envelope.state;
                state.normalize();
                state
            }
            Ok(envelope) => {
                tracing::warn!(
                    key = self.key,
                    version = envelope.version,
                    "discarding store written by another version"
                );
                S::default()
            }
            Err(err) => {
                tracing::warn!(key = self.key, error = %err, "discarding corrupt store slot");
                S::default()
            }
        }
    }
}
