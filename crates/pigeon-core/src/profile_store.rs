// Typed view over the device's key/value store.
// Each slice owns its own keys, so writers never step on each other.
use std::sync::Arc;

use pigeon_store::KeyValueStore;
use serde::Serialize;
use tracing::warn;

use crate::models::{HistoryEntry, Session};
use crate::Result;

pub const KEY_AUTHENTICATED: &str = "isAuthenticated";
pub const KEY_EMAIL: &str = "userEmail";
pub const KEY_NAME: &str = "userName";
pub const KEY_INTERESTS: &str = "userInterests";
pub const KEY_HISTORY: &str = "searchHistory";

#[derive(Clone)]
pub struct ProfileStore {
    backend: Arc<dyn KeyValueStore>,
}

impl ProfileStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// `None` unless the authenticated flag is set
    pub fn session(&self) -> Result<Option<Session>> {
        let authenticated = self.backend.get(KEY_AUTHENTICATED)?.as_deref() == Some("true");
        if !authenticated {
            return Ok(None);
        }

        Ok(Some(Session {
            authenticated,
            display_name: self.backend.get(KEY_NAME)?.unwrap_or_default(),
            email: self.backend.get(KEY_EMAIL)?.unwrap_or_default(),
        }))
    }

    pub fn set_session(&self, session: &Session) -> Result<()> {
        if !session.authenticated {
            return self.clear_session();
        }

        self.backend.set(KEY_AUTHENTICATED, "true")?;
        self.backend.set(KEY_EMAIL, &session.email)?;
        if session.display_name.is_empty() {
            self.backend.remove(KEY_NAME)?;
        } else {
            self.backend.set(KEY_NAME, &session.display_name)?;
        }
        Ok(())
    }

    pub fn clear_session(&self) -> Result<()> {
        self.backend.remove(KEY_AUTHENTICATED)?;
        self.backend.remove(KEY_NAME)?;
        self.backend.remove(KEY_EMAIL)?;
        Ok(())
    }

    /// Saved interests in selection order. An empty list reads as `None`:
    /// both mean the user still has to pick.
    pub fn interests(&self) -> Result<Option<Vec<String>>> {
        let interests: Option<Vec<String>> = self.read_json(KEY_INTERESTS)?;
        Ok(interests.filter(|list| !list.is_empty()))
    }

    pub fn set_interests(&self, interests: &[String]) -> Result<()> {
        self.write_json(KEY_INTERESTS, &interests)
    }

    pub fn clear_interests(&self) -> Result<()> {
        self.backend.remove(KEY_INTERESTS)?;
        Ok(())
    }

    /// Newest first, exactly as last written
    pub fn history(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.read_json(KEY_HISTORY)?.unwrap_or_default())
    }

    pub fn set_history<'a, I>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a HistoryEntry>,
    {
        let entries: Vec<&HistoryEntry> = entries.into_iter().collect();
        self.write_json(KEY_HISTORY, &entries)
    }

    pub fn clear_history(&self) -> Result<()> {
        self.backend.remove(KEY_HISTORY)?;
        Ok(())
    }

    /// Unreadable JSON is treated like a missing key rather than an error;
    /// the next write replaces it.
    fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.backend.get(key)? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Ignoring unreadable value for {}: {}", key, e);
                Ok(None)
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.backend.set(key, &raw)?;
        Ok(())
    }
}
