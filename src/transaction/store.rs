//! The record store: per-user load and replace-save of transaction records.

use std::sync::Arc;

use crate::{
    Error,
    db::{Database, DatabaseHandle, lock},
    transaction::{TransactionRecord, get_transactions_by_user, replace_transactions},
    user::UserId,
};

/// Durable per-user storage of transaction records in the local database.
///
/// The blocking SQLite work runs on the tokio blocking pool; callers suspend
/// until the database reports completion or an error. The store keeps no
/// copy of the records.
#[derive(Debug, Clone)]
pub struct RecordStore {
    database: Arc<Database>,
}

impl RecordStore {
    /// Create a record store for `database`.
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Open the database, creating or upgrading the schema on first use.
    ///
    /// # Errors
    /// Returns an [Error::StorageUnavailable] if the database cannot be opened.
    pub async fn open_database(&self) -> Result<DatabaseHandle, Error> {
        let database = self.database.clone();

        tokio::task::spawn_blocking(move || database.open()).await?
    }

    /// Load all records owned by `user_id`, in no particular order.
    ///
    /// Returns an empty vector if `user_id` is empty. Failures are logged and
    /// also produce an empty vector.
    pub async fn load_transactions(&self, user_id: &UserId) -> Vec<TransactionRecord> {
        if user_id.is_empty() {
            return Vec::new();
        }

        let database = self.database.clone();
        let owner = user_id.clone();

        let result = tokio::task::spawn_blocking(move || {
            let handle = database.open()?;
            let connection = lock(&handle)?;

            get_transactions_by_user(&owner, &connection)
        })
        .await
        .map_err(Error::from)
        .and_then(|result| result);

        match result {
            Ok(records) => {
                tracing::debug!("Loaded {} transactions for user {user_id}", records.len());
                records
            }
            Err(error) => {
                tracing::error!("Could not load transactions for user {user_id}: {error}");
                Vec::new()
            }
        }
    }

    /// Replace every stored record owned by `user_id` with `records`.
    ///
    /// Records without a `user_id` are stamped with `user_id`. The deletes and
    /// inserts happen in one unit of work that either fully lands or is rolled
    /// back. Returns `Ok(false)` without touching the database if `user_id` is
    /// empty.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::AmountSignMismatch] if a record's amount contradicts its type (nothing is written),
    /// - [Error::ForeignRecord] if a record is owned by another user (nothing is written),
    /// - [Error::StorageUnavailable] if the database cannot be opened,
    /// - [Error::TransactionAborted] if the unit of work failed and was rolled back,
    /// - or [Error::DatabaseLockError]/[Error::TaskJoinError] if the blocking task could not run.
    pub async fn save_transactions(
        &self,
        records: Vec<TransactionRecord>,
        user_id: &UserId,
    ) -> Result<bool, Error> {
        if user_id.is_empty() {
            return Ok(false);
        }

        if let Some(record) = records.iter().find(|record| !record.has_consistent_sign()) {
            return Err(Error::AmountSignMismatch(record.id.clone()));
        }

        if let Some(record) = records
            .iter()
            .find(|record| record.user_id.as_ref().is_some_and(|owner| owner != user_id))
        {
            return Err(Error::ForeignRecord(record.id.clone()));
        }

        let database = self.database.clone();
        let owner = user_id.clone();

        tokio::task::spawn_blocking(move || {
            let handle = database.open()?;
            let mut connection = lock(&handle)?;

            replace_transactions(&records, &owner, &mut connection)
        })
        .await?
        .inspect_err(|error| {
            tracing::error!("Could not save transactions for user {user_id}: {error}")
        })?;

        Ok(true)
    }
}
