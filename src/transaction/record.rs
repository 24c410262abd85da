//! Defines the transaction record and the builder used to create new records.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::{Error, user::UserId};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was spent or earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money spent. Stored with a negative amount.
    Expense,
    /// Money earned. Stored with a positive amount.
    Income,
}

impl TransactionType {
    /// The lowercase name used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Expense => "expense",
            TransactionType::Income => "income",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expense" => Ok(TransactionType::Expense),
            "income" => Ok(TransactionType::Income),
            other => Err(format!("\"{other}\" is not a transaction type")),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|_| FromSqlError::InvalidType)
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new record, use [TransactionRecord::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Unique ID assigned when the record is created.
    pub id: String,
    /// The owner of the record. Stamped by the record store on save if missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// Whether this is an expense or an income.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Negative for expenses, positive for income.
    pub amount: f64,
    /// The name of one of the user's categories for `kind`.
    pub category: String,
    /// A free text description, may be empty.
    #[serde(default)]
    pub description: String,
    /// When the transaction happened.
    pub date: Date,
}

impl TransactionRecord {
    /// Create a new transaction record.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(kind: TransactionType, amount: f64, category: &str, date: Date) -> TransactionBuilder {
        TransactionBuilder {
            kind,
            amount,
            category: category.to_owned(),
            description: String::new(),
            date,
        }
    }

    /// Whether the sign of the amount agrees with the type. Zero agrees with both.
    pub fn has_consistent_sign(&self) -> bool {
        match self.kind {
            TransactionType::Expense => self.amount <= 0.0,
            TransactionType::Income => self.amount >= 0.0,
        }
    }
}

/// A builder for creating [TransactionRecord] instances, the way the entry
/// form does.
///
/// The amount is entered as a magnitude and its sign is derived from the type
/// when the builder is finalised.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// Expense or income.
    pub kind: TransactionType,
    /// The amount of money. Only the magnitude is used.
    pub amount: f64,
    /// The category name.
    pub category: String,
    /// A free text description.
    pub description: String,
    /// When the transaction happened.
    pub date: Date,
}

impl TransactionBuilder {
    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Create the record with `id`, owned by `user_id`.
    ///
    /// # Errors
    /// Returns an [Error::InvalidAmount] if the amount is NaN or infinite.
    pub fn finalise(self, id: String, user_id: UserId) -> Result<TransactionRecord, Error> {
        if !self.amount.is_finite() {
            return Err(Error::InvalidAmount);
        }

        let amount = match self.kind {
            TransactionType::Expense => -self.amount.abs(),
            TransactionType::Income => self.amount.abs(),
        };

        Ok(TransactionRecord {
            id,
            user_id: Some(user_id),
            kind: self.kind,
            amount,
            category: self.category,
            description: self.description,
            date: self.date,
        })
    }
}

/// Generate a fresh, unique record ID.
pub fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}
