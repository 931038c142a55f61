use pinmap_shared::store::{KeyValueSlot, SlotError};

/// Key-value slot backed by the browser's `localStorage`.
///
/// Private browsing modes may refuse storage entirely; reads then behave as
/// "nothing stored" and writes fail.
pub struct LocalStorageSlot {
    storage: Option<web_sys::Storage>,
}

impl LocalStorageSlot {
    pub fn open() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if storage.is_none() {
            tracing::warn!("localStorage unavailable, pins will not persist");
        }
        LocalStorageSlot { storage }
    }

    fn storage(&self) -> Result<&web_sys::Storage, SlotError> {
        self.storage
            .as_ref()
            .ok_or_else(|| SlotError("localStorage unavailable".to_string()))
    }
}

impl KeyValueSlot for LocalStorageSlot {
    fn get(&self, key: &str) -> Result<Option<String>, SlotError> {
        match &self.storage {
            Some(storage) => storage
                .get_item(key)
                .map_err(|e| SlotError(format!("localStorage read failed: {e:?}"))),
            None => Ok(None),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SlotError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| SlotError(format!("localStorage write failed: {e:?}")))
    }

    fn remove(&mut self, key: &str) -> Result<(), SlotError> {
        self.storage()?
            .remove_item(key)
            .map_err(|e| SlotError(format!("localStorage remove failed: {e:?}")))
    }
}
