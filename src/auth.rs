//! The authentication collaborator.
//!
//! The stores never look at credentials. They only receive the [UserId] of
//! the identity returned here.
//!
//! [UserId]: crate::user::UserId

use std::{future::Future, time::Duration};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    Error,
    user::{UserId, UserIdentity},
};

/// The details a new user signs up with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationProfile {
    /// The display name.
    pub username: String,
    /// The email address.
    pub email: String,
    /// The chosen password.
    pub password: String,
}

/// An email and password pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    /// The email address.
    pub email: String,
    /// The password.
    pub password: String,
}

impl Credentials {
    /// Check that neither field is blank.
    ///
    /// # Errors
    /// Returns an [Error::MissingCredentials] if the email or password is empty.
    pub fn validate(&self) -> Result<(), Error> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            Err(Error::MissingCredentials)
        } else {
            Ok(())
        }
    }
}

/// Registers and logs in users, producing a [UserIdentity].
pub trait Authenticator {
    /// Register a new user.
    fn register_user(
        &self,
        profile: &RegistrationProfile,
    ) -> impl Future<Output = Result<UserIdentity, Error>> + Send;

    /// Log in an existing user.
    ///
    /// Implementations return [Error::InvalidCredentials] if the email and
    /// password do not match a user.
    fn log_in(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<UserIdentity, Error>> + Send;
}

/// The email of the only account [SimulatedAuthenticator] accepts.
pub const DEMO_EMAIL: &str = "test@example.com";
/// The password of the only account [SimulatedAuthenticator] accepts.
pub const DEMO_PASSWORD: &str = "password123";
const DEMO_USER_ID: &str = "123456";
const DEMO_USERNAME: &str = "Testbenutzer";

/// A stand-in for a real authentication service.
///
/// Registration always succeeds and makes up a new identity. Logging in only
/// works for [DEMO_EMAIL] with [DEMO_PASSWORD].
#[derive(Debug, Clone, Default)]
pub struct SimulatedAuthenticator {
    latency: Duration,
}

impl SimulatedAuthenticator {
    /// Create an authenticator that answers immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for `latency` before answering, like a round trip to a server would.
    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }

    async fn simulate_round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl Authenticator for SimulatedAuthenticator {
    async fn register_user(&self, profile: &RegistrationProfile) -> Result<UserIdentity, Error> {
        if profile.username.trim().is_empty() {
            return Err(Error::MissingCredentials);
        }

        Credentials {
            email: profile.email.clone(),
            password: profile.password.clone(),
        }
        .validate()?;

        self.simulate_round_trip().await;

        let user = UserIdentity {
            id: UserId::new(Uuid::new_v4().to_string()),
            username: profile.username.trim().to_owned(),
            email: profile.email.trim().to_owned(),
            created_at: Some(OffsetDateTime::now_utc()),
        };

        tracing::info!("Registered user {} ({})", user.username, user.id);

        Ok(user)
    }

    async fn log_in(&self, credentials: &Credentials) -> Result<UserIdentity, Error> {
        credentials.validate()?;

        self.simulate_round_trip().await;

        if credentials.email != DEMO_EMAIL || credentials.password != DEMO_PASSWORD {
            tracing::info!("Rejected log in attempt for {}", credentials.email);
            return Err(Error::InvalidCredentials);
        }

        Ok(UserIdentity {
            id: UserId::new(DEMO_USER_ID),
            username: DEMO_USERNAME.to_owned(),
            email: credentials.email.clone(),
            created_at: None,
        })
    }
}
