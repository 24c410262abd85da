//! Aggregates expenses by category for the spending chart.

use std::collections::{BTreeSet, HashMap};

use time::Month;

use crate::transaction::TransactionRecord;

/// The total spent in one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    /// The category name.
    pub name: String,
    /// The absolute amount spent.
    pub value: f64,
}

/// Spending in a month grouped by category.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExpenseBreakdown {
    /// One entry per category, in the order the categories first appear.
    pub slices: Vec<CategoryTotal>,
    /// The sum of all slices.
    pub total: f64,
}

impl ExpenseBreakdown {
    /// The fraction of the total spent in `slice`, between 0 and 1.
    pub fn share(&self, slice: &CategoryTotal) -> f64 {
        if self.total == 0.0 {
            0.0
        } else {
            slice.value / self.total
        }
    }

    /// Whether there were no expenses in the month.
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

/// Group the expenses dated in `month` of `year` by category and sum their
/// absolute amounts.
///
/// Only records with a negative amount count as expenses.
pub fn expense_breakdown(records: &[TransactionRecord], year: i32, month: Month) -> ExpenseBreakdown {
    let mut slices: Vec<CategoryTotal> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    let expenses = records.iter().filter(|record| {
        record.date.year() == year && record.date.month() == month && record.amount < 0.0
    });

    for record in expenses {
        let amount = record.amount.abs();

        match positions.get(record.category.as_str()) {
            Some(&position) => slices[position].value += amount,
            None => {
                positions.insert(&record.category, slices.len());
                slices.push(CategoryTotal {
                    name: record.category.clone(),
                    value: amount,
                });
            }
        }
    }

    let total = slices.iter().map(|slice| slice.value).sum();

    ExpenseBreakdown { slices, total }
}

/// The distinct years that have transactions, newest first.
///
/// Falls back to `current_year` when there are no transactions.
pub fn available_years(records: &[TransactionRecord], current_year: i32) -> Vec<i32> {
    if records.is_empty() {
        return vec![current_year];
    }

    let years: BTreeSet<i32> = records.iter().map(|record| record.date.year()).collect();

    years.into_iter().rev().collect()
}
