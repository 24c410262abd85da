//! Remembers the logged in user between runs.

use crate::{Error, key_value::KeyValueStore, user::UserIdentity};

const AUTH_KEY: &str = "finance-tracker-auth";

/// Persists the current [UserIdentity] as a JSON blob in a [KeyValueStore].
#[derive(Debug, Clone)]
pub struct SessionStore<S> {
    store: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Create a session store on top of `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The user saved by the last log in, if any.
    ///
    /// A blob that cannot be read is logged and treated as no session.
    ///
    /// # Errors
    /// Returns the key-value store's error.
    pub fn get_user(&self) -> Result<Option<UserIdentity>, Error> {
        let Some(json) = self.store.get(AUTH_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str(&json) {
            Ok(user) => Ok(Some(user)),
            Err(error) => {
                tracing::warn!("Ignoring unreadable session blob: {error}");
                Ok(None)
            }
        }
    }

    /// Remember `user` as the logged in user.
    ///
    /// # Errors
    /// Returns the key-value store's error.
    pub fn save_user(&self, user: &UserIdentity) -> Result<(), Error> {
        let json = serde_json::to_string(user)?;

        self.store.set(AUTH_KEY, &json)
    }

    /// Forget the logged in user.
    ///
    /// # Errors
    /// Returns the key-value store's error.
    pub fn remove_user(&self) -> Result<(), Error> {
        self.store.remove(AUTH_KEY)
    }
}
