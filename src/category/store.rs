//! The category store: per-user category lists persisted as one JSON blob.

use crate::{
    Error,
    category::Categories,
    key_value::KeyValueStore,
    transaction::TransactionType,
    user::UserId,
};

const CATEGORY_KEY: &str = "finance-tracker-categories";

/// The key-value key holding the categories of `user_id`.
pub fn category_key(user_id: &UserId) -> String {
    format!("{CATEGORY_KEY}-{user_id}")
}

/// Loads and persists each user's [Categories] through a [KeyValueStore].
///
/// Nothing is cached; every operation reads the stored blob again.
#[derive(Debug, Clone)]
pub struct CategoryStore<S> {
    store: S,
}

impl<S: KeyValueStore> CategoryStore<S> {
    /// Create a category store on top of `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load the categories of `user_id`, or a fresh copy of the defaults if
    /// the user has none stored.
    ///
    /// # Errors
    /// Returns the key-value store's error, or an [Error::JSONSerializationError]
    /// if the stored blob is not valid.
    pub fn load_categories(&self, user_id: &UserId) -> Result<Categories, Error> {
        match self.store.get(&category_key(user_id))? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Categories::default_seed()),
        }
    }

    /// Persist `categories` as the categories of `user_id`.
    ///
    /// # Errors
    /// Returns the key-value store's error.
    pub fn save_categories(&self, categories: &Categories, user_id: &UserId) -> Result<(), Error> {
        let json = serde_json::to_string(categories)?;

        self.store.set(&category_key(user_id), &json)
    }

    /// Add `name` to the `kind` categories of `user_id` unless it already exists.
    ///
    /// `name` is compared exactly, so callers should lowercase it first.
    /// The whole mapping is persisted and returned.
    ///
    /// # Errors
    /// Returns the key-value store's error.
    pub fn add_category(
        &self,
        user_id: &UserId,
        kind: TransactionType,
        name: &str,
    ) -> Result<Categories, Error> {
        let mut categories = self.load_categories(user_id)?;

        if categories.insert(kind, name) {
            tracing::debug!("Added {kind} category \"{name}\" for user {user_id}");
        }

        self.save_categories(&categories, user_id)?;

        Ok(categories)
    }

    /// Remove every `kind` category of `user_id` equal to `name`.
    ///
    /// Removing a name that does not exist is not an error; the mapping is
    /// persisted either way and returned.
    ///
    /// # Errors
    /// Returns the key-value store's error.
    pub fn delete_category(
        &self,
        user_id: &UserId,
        kind: TransactionType,
        name: &str,
    ) -> Result<Categories, Error> {
        let mut categories = self.load_categories(user_id)?;
        categories.remove(kind, name);

        self.save_categories(&categories, user_id)?;

        Ok(categories)
    }
}

#[cfg(test)]
mod category_store_tests {
    use std::sync::Arc;

    use crate::{
        Error,
        category::{Categories, CategoryStore, category_key},
        db::{Database, DatabaseLocation},
        key_value::{KeyValueStore, MemoryKeyValueStore, SQLiteKeyValueStore},
        transaction::TransactionType,
        user::UserId,
    };

    fn get_test_store() -> CategoryStore<MemoryKeyValueStore> {
        CategoryStore::new(MemoryKeyValueStore::new())
    }

    #[test]
    fn load_returns_defaults_for_new_user() {
        let store = get_test_store();

        let categories = store.load_categories(&UserId::new("u1"));

        assert_eq!(categories, Ok(Categories::default_seed()));
    }

    #[test]
    fn defaults_are_not_shared_between_loads() {
        let store = get_test_store();
        let user_id = UserId::new("new-user");

        let mut first = store.load_categories(&user_id).unwrap();
        first.expense.clear();
        first.income.push("lotto".to_owned());
        let second = store.load_categories(&user_id).unwrap();

        assert_eq!(second, Categories::default_seed());
    }

    #[test]
    fn add_appends_to_partition_and_persists() {
        let store = get_test_store();
        let user_id = UserId::new("u1");

        let returned = store
            .add_category(&user_id, TransactionType::Expense, "hobby")
            .unwrap();
        let loaded = store.load_categories(&user_id).unwrap();

        assert_eq!(returned, loaded);
        assert_eq!(loaded.expense.last().map(String::as_str), Some("hobby"));
        assert_eq!(loaded.income, Categories::default_seed().income);
    }

    #[test]
    fn add_twice_keeps_one_entry() {
        let store = get_test_store();
        let user_id = UserId::new("u1");

        store.add_category(&user_id, TransactionType::Expense, "food").unwrap();
        store.add_category(&user_id, TransactionType::Expense, "food").unwrap();
        let loaded = store.load_categories(&user_id).unwrap();

        assert_eq!(loaded.expense.iter().filter(|name| *name == "food").count(), 1);
    }

    #[test]
    fn delete_removes_name() {
        let store = get_test_store();
        let user_id = UserId::new("u1");

        let returned = store
            .delete_category(&user_id, TransactionType::Income, "bonus")
            .unwrap();

        assert!(!returned.income.contains(&"bonus".to_owned()));
        assert_eq!(store.load_categories(&user_id), Ok(returned));
    }

    #[test]
    fn delete_missing_name_is_a_no_op() {
        let store = get_test_store();
        let user_id = UserId::new("u1");
        let before = store.load_categories(&user_id).unwrap();

        let after = store.delete_category(&user_id, TransactionType::Expense, "yachts");

        assert_eq!(after, Ok(before));
    }

    #[test]
    fn users_have_separate_categories() {
        let store = get_test_store();

        store
            .add_category(&UserId::new("u1"), TransactionType::Expense, "hobby")
            .unwrap();

        assert_eq!(
            store.load_categories(&UserId::new("u2")),
            Ok(Categories::default_seed())
        );
    }

    #[test]
    fn corrupt_blob_is_reported() {
        let kv = MemoryKeyValueStore::new();
        let user_id = UserId::new("u1");
        kv.set(&category_key(&user_id), "not json").unwrap();
        let store = CategoryStore::new(kv);

        let result = store.load_categories(&user_id);

        assert!(
            matches!(result, Err(Error::JSONSerializationError(_))),
            "want JSONSerializationError, got {result:?}"
        );
    }

    #[test]
    fn sqlite_backed_store_persists_categories() {
        let database = Arc::new(Database::new(DatabaseLocation::Memory));
        let store = CategoryStore::new(SQLiteKeyValueStore::new(database.clone()));
        let user_id = UserId::new("u1");

        store.add_category(&user_id, TransactionType::Income, "dividenden").unwrap();
        let reloaded = CategoryStore::new(SQLiteKeyValueStore::new(database))
            .load_categories(&user_id)
            .unwrap();

        assert_eq!(reloaded.income.last().map(String::as_str), Some("dividenden"));
    }

    #[test]
    fn stored_blob_uses_partition_keys() {
        let kv = MemoryKeyValueStore::new();
        let store = CategoryStore::new(kv.clone());
        let user_id = UserId::new("u1");

        store.add_category(&user_id, TransactionType::Expense, "hobby").unwrap();
        let blob = kv.get("finance-tracker-categories-u1").unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&blob).unwrap();

        assert!(json["expense"].is_array());
        assert!(json["income"].is_array());
    }
}
