//! Per-user category names for expenses and income.

mod domain;
mod store;

pub use domain::{
    Categories, CategoryName, DEFAULT_EXPENSE_CATEGORIES, DEFAULT_INCOME_CATEGORIES,
};
pub use store::{CategoryStore, category_key};
