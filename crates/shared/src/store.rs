use std::collections::HashMap;

use thiserror::Error;

use crate::models::PinRecord;

/// Key under which the pin collection lives unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "StoredAnnotations";

#[derive(Debug, Error)]
#[error("{0}")]
pub struct SlotError(pub String);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("stored pins are corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("failed to encode pins: {0}")]
    Serialization(String),

    #[error("storage backend error: {0}")]
    Slot(#[from] SlotError),
}

/// A persistent string-valued key-value store.
pub trait KeyValueSlot {
    fn get(&self, key: &str) -> Result<Option<String>, SlotError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), SlotError>;
    fn remove(&mut self, key: &str) -> Result<(), SlotError>;
}

/// Process-local slot. Nothing survives a restart.
#[derive(Debug, Default, Clone)]
pub struct MemorySlot {
    values: HashMap<String, String>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueSlot for MemorySlot {
    fn get(&self, key: &str) -> Result<Option<String>, SlotError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SlotError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), SlotError> {
        self.values.remove(key);
        Ok(())
    }
}

/// The pin collection, serialized as one JSON array under a fixed key.
///
/// Mutation takes `&mut self`: whoever owns the store is its only writer.
pub struct PinStore<S> {
    slot: S,
    key: String,
}

impl<S: KeyValueSlot> PinStore<S> {
    pub fn new(slot: S) -> Self {
        Self::with_key(slot, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(slot: S, key: impl Into<String>) -> Self {
        PinStore {
            slot,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    /// All stored pins in insertion order. An absent value is an empty list.
    pub fn load(&self) -> Result<Vec<PinRecord>, StoreError> {
        match self.slot.get(&self.key)? {
            Some(raw) => serde_json::from_str(&raw).map_err(StoreError::Corrupt),
            None => Ok(Vec::new()),
        }
    }

    /// Like [`load`](Self::load), but any failure is logged and reads as "no pins".
    pub fn load_or_empty(&self) -> Vec<PinRecord> {
        match self.load() {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Ignoring unreadable pin store");
                Vec::new()
            }
        }
    }

    /// Read-modify-write append. An unreadable stored value is treated as an
    /// empty list and replaced; on any other error the stored value is untouched.
    pub fn append(&mut self, record: PinRecord) -> Result<(), StoreError> {
        if !record.coordinate().is_valid() {
            return Err(StoreError::Serialization(format!(
                "coordinate ({}, {}) is out of range",
                record.latitude, record.longitude
            )));
        }
        let mut records = match self.load() {
            Ok(records) => records,
            Err(StoreError::Corrupt(e)) => {
                tracing::warn!(key = %self.key, error = %e, "Replacing unreadable pin store");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        records.push(record);
        let json =
            serde_json::to_string(&records).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.slot.set(&self.key, &json)?;
        Ok(())
    }

    /// Drop the whole collection.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.slot.remove(&self.key)?;
        Ok(())
    }
}
