//! Database operations for transaction records.

use rusqlite::{Connection, Row, TransactionBehavior};

use crate::{
    Error,
    transaction::TransactionRecord,
    user::UserId,
};

/// Create the transaction table and the index on the owning user.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('expense', 'income')),
            amount REAL NOT NULL,
            category TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            date TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_user_id ON \"transaction\"(user_id);",
    )?;

    Ok(())
}

/// Retrieve all transactions owned by `user_id`, in no particular order.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_transactions_by_user(
    user_id: &UserId,
    connection: &Connection,
) -> Result<Vec<TransactionRecord>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, type, amount, category, description, date
             FROM \"transaction\" WHERE user_id = :user_id",
        )?
        .query_map(&[(":user_id", user_id)], map_transaction_row)?
        .map(|maybe_record| maybe_record.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the IDs of all transactions owned by `user_id`.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn get_transaction_ids_by_user(
    user_id: &UserId,
    connection: &Connection,
) -> Result<Vec<String>, rusqlite::Error> {
    connection
        .prepare("SELECT id FROM \"transaction\" WHERE user_id = ?1")?
        .query_map([user_id], |row| row.get(0))?
        .collect()
}

/// Replace all transactions owned by `user_id` with `records` in a single
/// SQL transaction.
///
/// The existing rows are deleted before any new row is inserted, so records
/// may reuse the IDs of the rows they replace. Every row is written with
/// `user_id` as its owner, whatever the record's `user_id` says. Either every
/// delete and insert lands, or none do.
///
/// # Errors
/// Returns an [Error::TransactionAborted] if any statement fails. The SQL
/// transaction is rolled back before returning.
pub fn replace_transactions(
    records: &[TransactionRecord],
    user_id: &UserId,
    connection: &mut Connection,
) -> Result<(), Error> {
    let transaction = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(abort)?;

    let keys_to_delete = get_transaction_ids_by_user(user_id, &transaction).map_err(abort)?;

    {
        let mut delete = transaction
            .prepare("DELETE FROM \"transaction\" WHERE id = ?1")
            .map_err(abort)?;

        for key in &keys_to_delete {
            delete.execute([key]).map_err(abort)?;
        }

        let mut insert = transaction
            .prepare(
                "INSERT INTO \"transaction\" (id, user_id, type, amount, category, description, date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .map_err(abort)?;

        for record in records {
            insert
                .execute((
                    &record.id,
                    user_id,
                    record.kind,
                    record.amount,
                    &record.category,
                    &record.description,
                    record.date,
                ))
                .map_err(abort)?;
        }
    }

    transaction.commit().map_err(abort)?;

    tracing::debug!(
        "Replaced {} transactions with {} for user {user_id}",
        keys_to_delete.len(),
        records.len()
    );

    Ok(())
}

fn abort(error: rusqlite::Error) -> Error {
    tracing::error!("Rolling back transaction save: {error}");
    Error::TransactionAborted(error.to_string())
}

/// Map a database row to a [TransactionRecord].
pub fn map_transaction_row(row: &Row) -> Result<TransactionRecord, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = row.get(1)?;
    let kind = row.get(2)?;
    let amount = row.get(3)?;
    let category = row.get(4)?;
    let description = row.get(5)?;
    let date = row.get(6)?;

    Ok(TransactionRecord {
        id,
        user_id: Some(user_id),
        kind,
        amount,
        category,
        description,
        date,
    })
}
