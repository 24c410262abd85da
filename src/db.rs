//! Opening the local database and creating/upgrading its schema.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
};

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{Error, key_value::create_key_value_table, transaction::create_transaction_table};

/// The schema version written to `PRAGMA user_version` after an upgrade.
pub const SCHEMA_VERSION: i32 = 1;

/// A shared connection to an opened and initialized database.
pub type DatabaseHandle = Arc<Mutex<Connection>>;

/// Where the local database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// A SQLite database file, created if it does not exist.
    File(PathBuf),
    /// A private in-memory database that lives as long as its handle.
    Memory,
}

/// Lazily opens the database at a [DatabaseLocation] and hands out the
/// shared connection.
///
/// Opening is idempotent: the first successful call creates or upgrades the
/// schema and later calls reuse the same handle. A failed open is not
/// remembered, so the next call tries again.
#[derive(Debug)]
pub struct Database {
    location: DatabaseLocation,
    handle: Mutex<Option<DatabaseHandle>>,
}

impl Database {
    /// Create a database that will be opened on first use.
    pub fn new(location: DatabaseLocation) -> Self {
        Self {
            location,
            handle: Mutex::new(None),
        }
    }

    /// Open the database, creating or upgrading its schema on first use.
    ///
    /// # Errors
    /// Returns a:
    /// - [Error::StorageUnavailable] if the database could not be opened or initialized,
    /// - or [Error::DatabaseLockError] if the handle cache is poisoned.
    pub fn open(&self) -> Result<DatabaseHandle, Error> {
        let mut cached = self.handle.lock().map_err(|_| Error::DatabaseLockError)?;

        if let Some(handle) = cached.as_ref() {
            return Ok(handle.clone());
        }

        let handle = open_database(&self.location)?;
        *cached = Some(handle.clone());

        Ok(handle)
    }
}

/// Open a connection to the database at `location` and initialize it.
///
/// # Errors
/// Returns an [Error::StorageUnavailable] if SQLite cannot open the database
/// or the schema cannot be created.
pub fn open_database(location: &DatabaseLocation) -> Result<DatabaseHandle, Error> {
    let connection = match location {
        DatabaseLocation::File(path) => Connection::open(path),
        DatabaseLocation::Memory => Connection::open_in_memory(),
    }
    .map_err(|error| {
        tracing::error!("Could not open the database at {location:?}: {error}");
        Error::StorageUnavailable(error.to_string())
    })?;

    initialize(&connection).map_err(|error| {
        tracing::error!("Could not initialize the database at {location:?}: {error}");
        Error::StorageUnavailable(error.to_string())
    })?;

    tracing::debug!("Opened database at {location:?}");

    Ok(Arc::new(Mutex::new(connection)))
}

/// Create the tables for the stores if the schema is older than
/// [SCHEMA_VERSION].
///
/// Safe to call on an already initialized database.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    let version = schema_version(&transaction)?;

    if version < SCHEMA_VERSION {
        upgrade(&transaction, version)?;
        transaction.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    } else if version > SCHEMA_VERSION {
        tracing::warn!(
            "Database schema version {version} is newer than the supported version {SCHEMA_VERSION}"
        );
    }

    transaction.commit()?;

    Ok(())
}

/// Read the schema version stored in the database.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn schema_version(connection: &Connection) -> Result<i32, rusqlite::Error> {
    connection.query_row("PRAGMA user_version", [], |row| row.get(0))
}

fn upgrade(connection: &Connection, from_version: i32) -> Result<(), rusqlite::Error> {
    tracing::info!("Upgrading database schema from version {from_version} to {SCHEMA_VERSION}");

    create_transaction_table(connection)?;
    create_key_value_table(connection)?;

    Ok(())
}

/// Lock the shared connection.
///
/// # Errors
/// Returns an [Error::DatabaseLockError] if the mutex is poisoned.
pub(crate) fn lock(handle: &DatabaseHandle) -> Result<MutexGuard<'_, Connection>, Error> {
    handle.lock().map_err(|_| Error::DatabaseLockError)
}
