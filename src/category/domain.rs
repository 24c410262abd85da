//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, transaction::TransactionType};

/// The expense categories every user starts with.
pub const DEFAULT_EXPENSE_CATEGORIES: [&str; 6] = [
    "lebensmittel",
    "wohnen",
    "transport",
    "unterhaltung",
    "gesundheit",
    "sonstiges",
];

/// The income categories every user starts with.
pub const DEFAULT_INCOME_CATEGORIES: [&str; 5] =
    ["gehalt", "bonus", "geschenk", "zinsen", "sonstiges"];

/// A validated, non-empty, lowercase category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name from user input.
    ///
    /// Surrounding whitespace is removed and the name is lowercased.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_lowercase()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty and already lowercase.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the invariants are violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user's category names, one ordered list per transaction type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Categories {
    /// Categories for expenses.
    pub expense: Vec<String>,
    /// Categories for income.
    pub income: Vec<String>,
}

impl Categories {
    /// A fresh copy of the default categories.
    pub fn default_seed() -> Self {
        Self {
            expense: DEFAULT_EXPENSE_CATEGORIES.map(String::from).to_vec(),
            income: DEFAULT_INCOME_CATEGORIES.map(String::from).to_vec(),
        }
    }

    /// The category names for `kind`.
    pub fn names(&self, kind: TransactionType) -> &[String] {
        match kind {
            TransactionType::Expense => &self.expense,
            TransactionType::Income => &self.income,
        }
    }

    fn names_mut(&mut self, kind: TransactionType) -> &mut Vec<String> {
        match kind {
            TransactionType::Expense => &mut self.expense,
            TransactionType::Income => &mut self.income,
        }
    }

    /// Whether `name` is one of the categories for `kind`, compared exactly.
    pub fn contains(&self, kind: TransactionType, name: &str) -> bool {
        self.names(kind).iter().any(|existing| existing == name)
    }

    /// Append `name` to the categories for `kind` unless it is already there.
    ///
    /// Returns whether the name was added.
    pub fn insert(&mut self, kind: TransactionType, name: &str) -> bool {
        if self.contains(kind, name) {
            return false;
        }

        self.names_mut(kind).push(name.to_owned());
        true
    }

    /// Remove every entry equal to `name` from the categories for `kind`.
    pub fn remove(&mut self, kind: TransactionType, name: &str) {
        self.names_mut(kind).retain(|existing| existing != name);
    }
}


#[cfg(test)]
mod categories_tests {
    use crate::{category::Categories, transaction::TransactionType};

    #[test]
    fn default_seed_has_expected_names() {
        let categories = Categories::default_seed();

        assert_eq!(
            categories.expense,
            ["lebensmittel", "wohnen", "transport", "unterhaltung", "gesundheit", "sonstiges"]
        );
        assert_eq!(
            categories.income,
            ["gehalt", "bonus", "geschenk", "zinsen", "sonstiges"]
        );
    }

    #[test]
    fn insert_appends_once() {
        let mut categories = Categories::default_seed();

        assert!(categories.insert(TransactionType::Expense, "hobby"));
        assert!(!categories.insert(TransactionType::Expense, "hobby"));

        assert_eq!(categories.expense.last().map(String::as_str), Some("hobby"));
        assert_eq!(
            categories.expense.iter().filter(|name| *name == "hobby").count(),
            1
        );
    }

    #[test]
    fn partitions_are_independent() {
        let mut categories = Categories::default_seed();

        categories.remove(TransactionType::Income, "sonstiges");

        assert!(categories.contains(TransactionType::Expense, "sonstiges"));
        assert!(!categories.contains(TransactionType::Income, "sonstiges"));
    }
}
