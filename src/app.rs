//! The session controller that ties authentication, the stores and the
//! in-memory transactions together.

use std::sync::Arc;

use time::{Month, OffsetDateTime};

use crate::{
    Error,
    auth::{Authenticator, Credentials, RegistrationProfile},
    breakdown::{ExpenseBreakdown, available_years, expense_breakdown},
    category::{Categories, CategoryName, CategoryStore},
    db::{Database, DatabaseLocation},
    key_value::{KeyValueStore, SQLiteKeyValueStore},
    session::SessionStore,
    transaction::{RecordStore, TransactionBuilder, TransactionRecord, TransactionType, new_record_id},
    user::UserIdentity,
};

/// The logged in user and their transactions as last loaded or edited.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Who is logged in.
    pub user: UserIdentity,
    /// The user's transactions, in the order they were loaded or added.
    pub transactions: Vec<TransactionRecord>,
}

/// Owns the stores and the current [Session].
///
/// Call [App::start] once to restore a saved session, then use the other
/// methods for each user action.
#[derive(Debug)]
pub struct App<A, S> {
    authenticator: A,
    records: RecordStore,
    categories: CategoryStore<S>,
    sessions: SessionStore<S>,
    session: Option<Session>,
}

impl<A: Authenticator> App<A, SQLiteKeyValueStore> {
    /// Create an app where records, categories and the session all live in
    /// the database at `location`.
    pub fn open(authenticator: A, location: DatabaseLocation) -> Self {
        let database = Arc::new(Database::new(location));
        let key_value = SQLiteKeyValueStore::new(database.clone());

        Self::new(authenticator, RecordStore::new(database), key_value)
    }
}

impl<A: Authenticator, S: KeyValueStore + Clone> App<A, S> {
    /// Create an app with no active session.
    pub fn new(authenticator: A, records: RecordStore, key_value: S) -> Self {
        Self {
            authenticator,
            records,
            categories: CategoryStore::new(key_value.clone()),
            sessions: SessionStore::new(key_value),
            session: None,
        }
    }

    /// Restore the session saved by the last log in, if there is one, and
    /// load its transactions.
    ///
    /// # Errors
    /// Returns the key-value store's error if the session cannot be read.
    pub async fn start(&mut self) -> Result<Option<UserIdentity>, Error> {
        match self.sessions.get_user()? {
            Some(user) => {
                tracing::info!("Restoring session of {}", user.email);
                self.hydrate(user.clone()).await;
                Ok(Some(user))
            }
            None => {
                self.session = None;
                Ok(None)
            }
        }
    }

    /// The active session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The logged in user.
    ///
    /// # Errors
    /// Returns an [Error::NotLoggedIn] if there is no active session.
    pub fn current_user(&self) -> Result<&UserIdentity, Error> {
        self.active_session().map(|session| &session.user)
    }

    /// The logged in user's transactions.
    ///
    /// # Errors
    /// Returns an [Error::NotLoggedIn] if there is no active session.
    pub fn transactions(&self) -> Result<&[TransactionRecord], Error> {
        self.active_session()
            .map(|session| session.transactions.as_slice())
    }

    /// Register a new user and log them in.
    ///
    /// # Errors
    /// Returns the authenticator's error, or the key-value store's error if
    /// the session cannot be saved.
    pub async fn register(&mut self, profile: &RegistrationProfile) -> Result<UserIdentity, Error> {
        let user = self.authenticator.register_user(profile).await?;

        self.begin_session(user).await
    }

    /// Log in an existing user.
    ///
    /// # Errors
    /// Returns the authenticator's error, or the key-value store's error if
    /// the session cannot be saved.
    pub async fn log_in(&mut self, credentials: &Credentials) -> Result<UserIdentity, Error> {
        let user = self.authenticator.log_in(credentials).await?;

        self.begin_session(user).await
    }

    /// Forget the saved session and drop the in-memory transactions.
    ///
    /// # Errors
    /// Returns the key-value store's error if the saved session cannot be removed.
    pub fn log_out(&mut self) -> Result<(), Error> {
        self.sessions.remove_user()?;

        if let Some(session) = self.session.take() {
            tracing::info!("Logged out {}", session.user.email);
        }

        Ok(())
    }

    /// Create a transaction from `builder`, append it and save all transactions.
    ///
    /// The in-memory list keeps the new record even if saving fails; call
    /// [App::resync] to get back to what is stored.
    ///
    /// # Errors
    /// Returns an [Error::NotLoggedIn] if there is no active session,
    /// an [Error::UnknownCategory] if the category is not one of the user's
    /// categories for the transaction type,
    /// an [Error::InvalidAmount] if the amount is not finite,
    /// or any error from [RecordStore::save_transactions].
    pub async fn add_transaction(
        &mut self,
        builder: TransactionBuilder,
    ) -> Result<TransactionRecord, Error> {
        let session = self.session.as_mut().ok_or(Error::NotLoggedIn)?;

        let categories = self.categories.load_categories(&session.user.id)?;
        if !categories.contains(builder.kind, &builder.category) {
            return Err(Error::UnknownCategory {
                kind: builder.kind,
                name: builder.category,
            });
        }

        let record = builder.finalise(new_record_id(), session.user.id.clone())?;
        session.transactions.push(record.clone());

        self.records
            .save_transactions(session.transactions.clone(), &session.user.id)
            .await?;

        Ok(record)
    }

    /// Remove the transaction with `id` and save the rest.
    ///
    /// # Errors
    /// Returns an [Error::NotLoggedIn] if there is no active session,
    /// an [Error::NotFound] if no transaction has `id`,
    /// or any error from [RecordStore::save_transactions].
    pub async fn delete_transaction(&mut self, id: &str) -> Result<(), Error> {
        let session = self.session.as_mut().ok_or(Error::NotLoggedIn)?;

        let position = session
            .transactions
            .iter()
            .position(|record| record.id == id)
            .ok_or(Error::NotFound)?;
        session.transactions.remove(position);

        self.records
            .save_transactions(session.transactions.clone(), &session.user.id)
            .await?;

        Ok(())
    }

    /// Reload the transactions from storage, discarding unsaved changes.
    ///
    /// # Errors
    /// Returns an [Error::NotLoggedIn] if there is no active session.
    pub async fn resync(&mut self) -> Result<(), Error> {
        let session = self.session.as_mut().ok_or(Error::NotLoggedIn)?;

        session.transactions = self.records.load_transactions(&session.user.id).await;

        Ok(())
    }

    /// The logged in user's categories.
    ///
    /// # Errors
    /// Returns an [Error::NotLoggedIn] if there is no active session, or any
    /// error from [CategoryStore::load_categories].
    pub fn categories(&self) -> Result<Categories, Error> {
        let user = self.current_user()?;

        self.categories.load_categories(&user.id)
    }

    /// Add a category typed in by the user.
    ///
    /// # Errors
    /// Returns an:
    /// - [Error::NotLoggedIn] if there is no active session,
    /// - [Error::EmptyCategoryName] if `raw_name` is blank,
    /// - [Error::DuplicateCategory] if the name already exists for `kind`,
    /// - or any error from the category store.
    pub fn add_category(&self, kind: TransactionType, raw_name: &str) -> Result<Categories, Error> {
        let user = self.current_user()?;
        let name = CategoryName::new(raw_name)?;

        let existing = self.categories.load_categories(&user.id)?;
        if existing.contains(kind, name.as_ref()) {
            return Err(Error::DuplicateCategory(name.to_string()));
        }

        self.categories.add_category(&user.id, kind, name.as_ref())
    }

    /// Remove a category. Removing a name that does not exist is not an error.
    ///
    /// # Errors
    /// Returns an [Error::NotLoggedIn] if there is no active session, or any
    /// error from the category store.
    pub fn delete_category(&self, kind: TransactionType, name: &str) -> Result<Categories, Error> {
        let user = self.current_user()?;

        self.categories.delete_category(&user.id, kind, name)
    }

    /// The logged in user's spending in `month` of `year` by category.
    ///
    /// # Errors
    /// Returns an [Error::NotLoggedIn] if there is no active session.
    pub fn expense_breakdown(&self, year: i32, month: Month) -> Result<ExpenseBreakdown, Error> {
        Ok(expense_breakdown(self.transactions()?, year, month))
    }

    /// The years the logged in user has transactions in, newest first.
    ///
    /// # Errors
    /// Returns an [Error::NotLoggedIn] if there is no active session.
    pub fn available_years(&self) -> Result<Vec<i32>, Error> {
        let current_year = OffsetDateTime::now_utc().year();

        Ok(available_years(self.transactions()?, current_year))
    }

    fn active_session(&self) -> Result<&Session, Error> {
        self.session.as_ref().ok_or(Error::NotLoggedIn)
    }

    async fn begin_session(&mut self, user: UserIdentity) -> Result<UserIdentity, Error> {
        self.sessions.save_user(&user)?;
        tracing::info!("Logged in {}", user.email);

        self.hydrate(user.clone()).await;

        Ok(user)
    }

    async fn hydrate(&mut self, user: UserIdentity) {
        let transactions = self.records.load_transactions(&user.id).await;

        self.session = Some(Session { user, transactions });
    }
}

#[cfg(test)]
mod app_tests {
    use std::sync::Arc;

    use time::{Month, macros::date};

    use crate::{
        Error,
        app::App,
        auth::{Credentials, DEMO_EMAIL, DEMO_PASSWORD, RegistrationProfile, SimulatedAuthenticator},
        category::Categories,
        db::{Database, DatabaseLocation},
        key_value::MemoryKeyValueStore,
        transaction::{RecordStore, TransactionRecord, TransactionType},
        user::UserId,
    };

    type TestApp = App<SimulatedAuthenticator, MemoryKeyValueStore>;

    fn get_test_app() -> TestApp {
        let records = RecordStore::new(Arc::new(Database::new(DatabaseLocation::Memory)));

        App::new(SimulatedAuthenticator::new(), records, MemoryKeyValueStore::new())
    }

    fn demo_credentials() -> Credentials {
        Credentials {
            email: DEMO_EMAIL.to_owned(),
            password: DEMO_PASSWORD.to_owned(),
        }
    }

    async fn get_logged_in_app() -> TestApp {
        let mut app = get_test_app();
        app.log_in(&demo_credentials()).await.expect("Could not log in");
        app
    }

    #[tokio::test]
    async fn start_without_saved_session_is_logged_out() {
        let mut app = get_test_app();

        let user = app.start().await;

        assert_eq!(user, Ok(None));
        assert_eq!(app.current_user(), Err(Error::NotLoggedIn));
    }

    #[tokio::test]
    async fn operations_need_a_session() {
        let mut app = get_test_app();

        let builder = TransactionRecord::build(TransactionType::Expense, 1.0, "hobby", date!(2024 - 01 - 05));

        assert_eq!(app.add_transaction(builder).await, Err(Error::NotLoggedIn));
        assert_eq!(app.delete_transaction("1").await, Err(Error::NotLoggedIn));
        assert_eq!(app.categories(), Err(Error::NotLoggedIn));
        assert_eq!(app.transactions(), Err(Error::NotLoggedIn));
    }

    #[tokio::test]
    async fn log_in_starts_session_with_stored_transactions() {
        let mut app = get_logged_in_app().await;

        assert_eq!(app.current_user().map(|user| user.id.clone()), Ok(UserId::new("123456")));
        assert_eq!(app.transactions().map(<[_]>::len), Ok(0));

        app.log_out().unwrap();
        assert!(app.session().is_none());
    }

    #[tokio::test]
    async fn start_restores_saved_session() {
        let database = Arc::new(Database::new(DatabaseLocation::Memory));
        let key_value = MemoryKeyValueStore::new();
        let mut first = App::new(
            SimulatedAuthenticator::new(),
            RecordStore::new(database.clone()),
            key_value.clone(),
        );
        first.log_in(&demo_credentials()).await.unwrap();
        let record = first
            .add_transaction(TransactionRecord::build(
                TransactionType::Income,
                3000.0,
                "gehalt",
                date!(2024 - 01 - 25),
            ))
            .await
            .unwrap();

        let mut second = App::new(SimulatedAuthenticator::new(), RecordStore::new(database), key_value);
        let user = second.start().await.unwrap();

        assert_eq!(user.map(|user| user.id), Some(UserId::new("123456")));
        assert_eq!(second.transactions(), Ok([record].as_slice()));
    }

    #[tokio::test]
    async fn log_out_forgets_saved_session() {
        let mut app = get_logged_in_app().await;

        app.log_out().unwrap();

        assert_eq!(app.start().await, Ok(None));
    }

    #[tokio::test]
    async fn register_logs_in_new_user() {
        let mut app = get_test_app();
        let profile = RegistrationProfile {
            username: "Ferris".to_owned(),
            email: "ferris@example.com".to_owned(),
            password: "crab rave".to_owned(),
        };

        let user = app.register(&profile).await.unwrap();

        assert_eq!(app.current_user(), Ok(&user));
        assert_eq!(app.categories(), Ok(Categories::default_seed()));
    }

    #[tokio::test]
    async fn rejected_log_in_leaves_no_session() {
        let mut app = get_test_app();
        let credentials = Credentials {
            email: DEMO_EMAIL.to_owned(),
            password: "wrong".to_owned(),
        };

        let result = app.log_in(&credentials).await;

        assert_eq!(result, Err(Error::InvalidCredentials));
        assert!(app.session().is_none());
    }

    #[tokio::test]
    async fn new_user_scenario() {
        let database = Arc::new(Database::new(DatabaseLocation::Memory));
        let records = RecordStore::new(database);
        let mut app = App::new(SimulatedAuthenticator::new(), records.clone(), MemoryKeyValueStore::new());
        let profile = RegistrationProfile {
            username: "u1".to_owned(),
            email: "u1@example.com".to_owned(),
            password: "secret".to_owned(),
        };
        let user = app.register(&profile).await.unwrap();

        assert_eq!(app.categories(), Ok(Categories::default_seed()));

        let categories = app.add_category(TransactionType::Expense, "hobby").unwrap();
        assert_eq!(categories.expense.last().map(String::as_str), Some("hobby"));
        assert_eq!(categories.income, Categories::default_seed().income);

        let builder = TransactionRecord::build(TransactionType::Expense, 20.0, "hobby", date!(2024 - 01 - 05))
            .description("Pinsel");
        let added = app.add_transaction(builder).await.unwrap();

        let loaded = records.load_transactions(&user.id).await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], added);
        assert_eq!(loaded[0].amount, -20.0);
        assert_eq!(loaded[0].user_id, Some(user.id));
    }

    #[tokio::test]
    async fn delete_transaction_removes_and_saves() {
        let mut app = get_logged_in_app().await;
        let kept = app
            .add_transaction(TransactionRecord::build(TransactionType::Expense, 1.0, "wohnen", date!(2024 - 01 - 01)))
            .await
            .unwrap();
        let deleted = app
            .add_transaction(TransactionRecord::build(TransactionType::Expense, 2.0, "wohnen", date!(2024 - 01 - 02)))
            .await
            .unwrap();

        app.delete_transaction(&deleted.id).await.unwrap();
        app.resync().await.unwrap();

        assert_eq!(app.transactions(), Ok([kept].as_slice()));
    }

    #[tokio::test]
    async fn add_transaction_rejects_unknown_category() {
        let mut app = get_logged_in_app().await;

        let result = app
            .add_transaction(TransactionRecord::build(TransactionType::Income, 5.0, "wohnen", date!(2024 - 01 - 01)))
            .await;

        assert_eq!(
            result,
            Err(Error::UnknownCategory {
                kind: TransactionType::Income,
                name: "wohnen".to_owned()
            })
        );
        assert_eq!(app.transactions().map(<[_]>::len), Ok(0));
    }

    #[tokio::test]
    async fn delete_unknown_transaction_is_not_found() {
        let mut app = get_logged_in_app().await;

        assert_eq!(app.delete_transaction("nope").await, Err(Error::NotFound));
    }

    #[tokio::test]
    async fn failed_save_keeps_in_memory_change_until_resync() {
        let dir = tempfile::tempdir().unwrap();
        let location = DatabaseLocation::File(dir.path().join("missing").join("finance.db"));
        let records = RecordStore::new(Arc::new(Database::new(location)));
        let mut app = App::new(SimulatedAuthenticator::new(), records, MemoryKeyValueStore::new());
        app.log_in(&demo_credentials()).await.unwrap();

        let result = app
            .add_transaction(TransactionRecord::build(TransactionType::Expense, 1.0, "wohnen", date!(2024 - 01 - 01)))
            .await;

        assert!(
            matches!(result, Err(Error::StorageUnavailable(_))),
            "want StorageUnavailable, got {result:?}"
        );
        assert_eq!(app.transactions().map(<[_]>::len), Ok(1));

        app.resync().await.unwrap();
        assert_eq!(app.transactions().map(<[_]>::len), Ok(0));
    }

    #[tokio::test]
    async fn add_category_validates_name() {
        let app = get_logged_in_app().await;

        assert_eq!(
            app.add_category(TransactionType::Expense, "   "),
            Err(Error::EmptyCategoryName)
        );
        assert_eq!(
            app.add_category(TransactionType::Expense, " Wohnen "),
            Err(Error::DuplicateCategory("wohnen".to_owned()))
        );

        let categories = app.add_category(TransactionType::Income, " Dividenden ").unwrap();
        assert!(categories.contains(TransactionType::Income, "dividenden"));
    }

    #[tokio::test]
    async fn delete_category_persists() {
        let app = get_logged_in_app().await;

        app.delete_category(TransactionType::Income, "bonus").unwrap();

        let categories = app.categories().unwrap();
        assert!(!categories.contains(TransactionType::Income, "bonus"));
    }

    #[tokio::test]
    async fn breakdown_uses_session_transactions() {
        let mut app = get_logged_in_app().await;
        for (amount, category) in [(20.0, "wohnen"), (5.0, "transport"), (10.0, "wohnen")] {
            app.add_transaction(TransactionRecord::build(
                TransactionType::Expense,
                amount,
                category,
                date!(2023 - 06 - 15),
            ))
            .await
            .unwrap();
        }

        let breakdown = app.expense_breakdown(2023, Month::June).unwrap();

        assert_eq!(breakdown.total, 35.0);
        assert_eq!(breakdown.slices[0].name, "wohnen");
        assert_eq!(breakdown.slices[0].value, 30.0);
        assert_eq!(app.available_years(), Ok(vec![2023]));
    }
}
