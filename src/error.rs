//! Defines the app level error type.

use crate::transaction::TransactionType;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The local database could not be opened or its schema could not be
    /// created/upgraded.
    ///
    /// Nothing is cached after this error, so the next store operation will
    /// try to open the database again.
    #[error("the local database is unavailable: {0}")]
    StorageUnavailable(String),

    /// The delete-then-insert unit of work of a save failed and was rolled back.
    ///
    /// The in-memory transactions of the caller no longer match what is
    /// stored. Callers should reload the transactions to resynchronize.
    #[error("the unit of work was aborted and rolled back: {0}")]
    TransactionAborted(String),

    /// The user provided an invalid combination of email and password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The email or the password was left empty.
    #[error("email and password must both be filled in")]
    MissingCredentials,

    /// A transaction record has an amount whose sign contradicts its type,
    /// e.g. an expense with a positive amount.
    ///
    /// Callers should pass in the ID of the offending record.
    #[error("the amount of transaction \"{0}\" does not match its type")]
    AmountSignMismatch(String),

    /// A record passed to a save is owned by a different user than the one
    /// the records are saved for.
    ///
    /// Callers should pass in the ID of the offending record.
    #[error("transaction \"{0}\" belongs to another user")]
    ForeignRecord(String),

    /// A transaction used a category the user does not have for its type.
    #[error("\"{name}\" is not one of your {kind} categories")]
    UnknownCategory {
        /// Whether the transaction was an expense or income.
        kind: TransactionType,
        /// The category that was used.
        name: String,
    },

    /// The amount of a new transaction was not a finite number.
    #[error("the amount must be a finite number")]
    InvalidAmount,

    /// An empty string was used as a category name.
    #[error("category name cannot be empty")]
    EmptyCategoryName,

    /// The category already exists in the partition it was added to.
    #[error("the category \"{0}\" already exists")]
    DuplicateCategory(String),

    /// The operation needs a logged in user but there is no active session.
    #[error("no user is logged in")]
    NotLoggedIn,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while serializing or deserializing a stored JSON blob.
    #[error("could not (de)serialize JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// A blocking database task panicked or was cancelled before finishing.
    #[error("the database task did not complete: {0}")]
    TaskJoinError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::JSONSerializationError(value.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Error::TaskJoinError(value.to_string())
    }
}
