use crate::storage::{ LocalStore, StorageError, INSTALL_DISMISSED_KEY };
use chrono::{ DateTime, Utc };

/// How long a dismissed install hint stays hidden, in milliseconds.
pub const DISMISS_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

pub struct InstallPrompt<'a> {
    store: &'a dyn LocalStore,
}

impl<'a> InstallPrompt<'a> {
    pub fn new(store: &'a dyn LocalStore) -> Self {
        Self { store }
    }

    pub fn should_show(&self, now: DateTime<Utc>) -> bool {
        let dismissed_at = self.store
            .get(INSTALL_DISMISSED_KEY)
            .ok()
            .flatten()
            .and_then(|raw| raw.parse::<i64>().ok())
            .and_then(DateTime::<Utc>::from_timestamp_millis);
        match dismissed_at {
            Some(at) => (now - at).num_milliseconds() >= DISMISS_WINDOW_MS,
            None => true,
        }
    }

    pub fn dismiss(&self, now: DateTime<Utc>) -> Result<(), StorageError> {
        self.store.set(INSTALL_DISMISSED_KEY, &now.timestamp_millis().to_string())
    }
}
