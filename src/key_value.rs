//! A persistent string-keyed blob store used for the category mapping and
//! the session blob.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use rusqlite::{Connection, OptionalExtension};

use crate::{
    Error,
    db::{Database, lock},
};

/// Gets and sets string values by string keys.
pub trait KeyValueStore {
    /// Get the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Store `value` under `key`, replacing any existing value.
    fn set(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Remove the value under `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), Error>;
}

/// Stores blobs in the `key_value` table of the local database.
#[derive(Debug, Clone)]
pub struct SQLiteKeyValueStore {
    database: Arc<Database>,
}

impl SQLiteKeyValueStore {
    /// Create a key-value store backed by `database`.
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }
}

impl KeyValueStore for SQLiteKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let handle = self.database.open()?;
        let connection = lock(&handle)?;

        let mut statement = connection.prepare("SELECT value FROM key_value WHERE key = ?1")?;
        let value = statement.query_row([key], |row| row.get(0)).optional()?;

        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let handle = self.database.open()?;
        let connection = lock(&handle)?;

        connection.execute(
            "INSERT INTO key_value (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            (key, value),
        )?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let handle = self.database.open()?;
        let connection = lock(&handle)?;

        connection.execute("DELETE FROM key_value WHERE key = ?1", [key])?;

        Ok(())
    }
}

/// Keeps blobs in process memory. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKeyValueStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let values = self.values.lock().map_err(|_| Error::DatabaseLockError)?;

        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut values = self.values.lock().map_err(|_| Error::DatabaseLockError)?;
        values.insert(key.to_owned(), value.to_owned());

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let mut values = self.values.lock().map_err(|_| Error::DatabaseLockError)?;
        values.remove(key);

        Ok(())
    }
}

/// Create the key-value table.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_key_value_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS key_value (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

#[cfg(test)]
mod key_value_tests {
    use std::sync::Arc;

    use crate::db::{Database, DatabaseLocation};

    use super::{KeyValueStore, MemoryKeyValueStore, SQLiteKeyValueStore};

    fn get_sqlite_store() -> SQLiteKeyValueStore {
        SQLiteKeyValueStore::new(Arc::new(Database::new(DatabaseLocation::Memory)))
    }

    fn check_set_get_remove(store: &impl KeyValueStore) {
        assert_eq!(store.get("missing"), Ok(None));

        store.set("greeting", "hello").unwrap();
        assert_eq!(store.get("greeting"), Ok(Some("hello".to_owned())));

        store.set("greeting", "hallo").unwrap();
        assert_eq!(store.get("greeting"), Ok(Some("hallo".to_owned())));

        store.remove("greeting").unwrap();
        assert_eq!(store.get("greeting"), Ok(None));

        store.remove("greeting").expect("Removing a missing key should succeed");
    }

    #[test]
    fn sqlite_store_set_get_remove() {
        check_set_get_remove(&get_sqlite_store());
    }

    #[test]
    fn memory_store_set_get_remove() {
        check_set_get_remove(&MemoryKeyValueStore::new());
    }

    #[test]
    fn sqlite_store_keys_are_independent() {
        let store = get_sqlite_store();

        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.remove("a").unwrap();

        assert_eq!(store.get("b"), Ok(Some("2".to_owned())));
    }
}
