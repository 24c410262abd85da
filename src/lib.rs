//! Spare Shark keeps track of your expenses and income.
//!
//! This library is the local persistence layer of the app: a record store
//! for each user's transactions, backed by SQLite, and a category store for
//! each user's expense and income categories, backed by a key-value store.
//! [App] ties them to a logged in user.

#![warn(missing_docs)]

mod app;
mod auth;
mod breakdown;
mod category;
mod currency;
mod db;
mod error;
mod key_value;
mod logging;
mod session;
mod transaction;
mod user;

pub use app::{App, Session};
pub use auth::{
    Authenticator, Credentials, DEMO_EMAIL, DEMO_PASSWORD, RegistrationProfile,
    SimulatedAuthenticator,
};
pub use breakdown::{CategoryTotal, ExpenseBreakdown, available_years, expense_breakdown};
pub use category::{
    Categories, CategoryName, CategoryStore, DEFAULT_EXPENSE_CATEGORIES, DEFAULT_INCOME_CATEGORIES,
    category_key,
};
pub use currency::{CURRENCY_CODE, format_currency};
pub use db::{
    Database, DatabaseHandle, DatabaseLocation, SCHEMA_VERSION, initialize as initialize_db,
    schema_version,
};
pub use error::Error;
pub use key_value::{KeyValueStore, MemoryKeyValueStore, SQLiteKeyValueStore};
pub use logging::setup_logging;
pub use session::SessionStore;
pub use transaction::{RecordStore, TransactionBuilder, TransactionRecord, TransactionType, new_record_id};
pub use user::{UserId, UserIdentity};
