//! Transaction records and the record store that persists them per user.
//!
//! This module contains:
//! - The `TransactionRecord` model and `TransactionBuilder` for creating records
//! - Database functions for the transaction table and the replace-on-save unit of work
//! - The async `RecordStore` used by the application

mod db;
mod record;
mod store;

pub use db::{
    create_transaction_table, get_transaction_ids_by_user, get_transactions_by_user,
    replace_transactions,
};
pub use record::{TransactionBuilder, TransactionRecord, TransactionType, new_record_id};
pub use store::RecordStore;
