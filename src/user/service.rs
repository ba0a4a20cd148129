//! Identity service: registration, credential checks, session tokens and
//! profile edits.
//!
//! Every business rule on users lives here. Stores only persist.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::crypto::{CryptoError, PasswordManager, generate_token};
use crate::user::{StoreError, UNASSIGNED_ID, User, UserStatus, UserStore};

type Result<T> = std::result::Result<T, IdentityError>;

/// Failures of identity operations.
///
/// None of them leave a partial write behind.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Uniqueness violation.
    #[error("{0}")]
    Conflict(String),
    /// No user with such identifier.
    #[error("{0}")]
    NotFound(String),
    /// Unknown user on login, or session already closed.
    #[error("{0}")]
    Forbidden(String),
    /// Wrong password, or missing/invalid token.
    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl From<StoreError> for IdentityError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } => IdentityError::Conflict(format!(
                "{err}. Therefore, the user could not be saved!"
            )),
            StoreError::NotFound(_) => IdentityError::NotFound(err.to_string()),
            err => IdentityError::Store(err),
        }
    }
}

/// Username and password pair, for registration and login.
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Proof of session ownership.
#[derive(Debug, Clone, Default)]
pub struct SessionRequest {
    pub id: i64,
    pub token: String,
}

/// Authorized profile modification.
#[derive(Debug, Clone, Default)]
pub struct ProfileEdit {
    pub id: i64,
    pub token: String,
    /// Current username is kept when `None`.
    pub username: Option<String>,
    /// Replaces the stored birthday, `None` clears it.
    pub birthday: Option<NaiveDate>,
}

/// One async mutex per user identifier.
#[derive(Debug, Default)]
struct KeyedLocks {
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    async fn lock(&self, id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Drop entries nobody holds nor waits for.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(id).or_default())
        };

        lock.lock_owned().await
    }
}

/// User manager.
///
/// Mutations of a same user are serialized; mutations of different users,
/// registrations included, run concurrently.
pub struct IdentityService {
    store: Arc<dyn UserStore>,
    passwords: PasswordManager,
    locks: KeyedLocks,
}

impl IdentityService {
    /// Create a new [`IdentityService`] over `store`.
    pub fn new(store: Arc<dyn UserStore>, passwords: PasswordManager) -> Self {
        Self {
            store,
            passwords,
            locks: KeyedLocks::default(),
        }
    }

    /// Every user, in store order.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.store.find_all().await?)
    }

    /// Create a new online user with a fresh session token.
    ///
    /// Concurrent registrations of a same username are settled by the store
    /// uniqueness check, the loser gets a `Conflict`.
    pub async fn register(&self, candidate: Credentials) -> Result<User> {
        if self
            .store
            .find_by_username(&candidate.username)
            .await?
            .is_some()
        {
            return Err(IdentityError::Conflict(
                "The username provided is not unique. Therefore, the user could not be created!"
                    .into(),
            ));
        }

        let user = User {
            id: UNASSIGNED_ID,
            username: candidate.username,
            password: self.passwords.hash_password(&candidate.password)?,
            token: Some(generate_token()),
            status: UserStatus::Online,
            birthday: None,
            creation_date: Utc::now(),
        };

        let user = self.store.save(user).await?;
        tracing::info!(user_id = user.id, "user created");

        Ok(user)
    }

    /// Find a user using `id` field.
    pub async fn find_by_id(&self, id: i64) -> Result<User> {
        self.store.find_by_id(id).await?.ok_or_else(|| {
            IdentityError::NotFound(format!("user with ID {id} was not found"))
        })
    }

    /// Find a user using `username` field (exact match).
    pub async fn find_by_username(&self, username: &str) -> Result<User> {
        self.store.find_by_username(username).await?.ok_or_else(|| {
            IdentityError::NotFound(format!(
                "user with username {username} was not found"
            ))
        })
    }

    /// Check credentials then open a new session.
    ///
    /// The previous token, if any, stops being valid.
    pub async fn login(&self, credentials: Credentials) -> Result<User> {
        let user_does_not_exist =
            || IdentityError::Forbidden("user does not exist".into());

        let found = self
            .store
            .find_by_username(&credentials.username)
            .await?
            .ok_or_else(user_does_not_exist)?;

        let _guard = self.locks.lock(found.id).await;
        // Re-read under the lock, a rename may have happened meanwhile.
        let mut user = self
            .store
            .find_by_id(found.id)
            .await?
            .filter(|user| user.username == credentials.username)
            .ok_or_else(user_does_not_exist)?;

        if !self
            .passwords
            .verify_password(&credentials.password, &user.password)?
        {
            return Err(IdentityError::Unauthorized("wrong password".into()));
        }

        user.status = UserStatus::Online;
        user.token = Some(generate_token());

        let user = self.store.save(user).await?;
        tracing::info!(user_id = user.id, "user logged in");

        Ok(user)
    }

    /// Close the session held by `request.token`.
    pub async fn logout(&self, request: SessionRequest) -> Result<User> {
        let _guard = self.locks.lock(request.id).await;
        let mut user = self.find_by_id(request.id).await?;

        if user.status == UserStatus::Offline {
            return Err(IdentityError::Forbidden("user already logged out".into()));
        }

        if !user.holds_token(&request.token) {
            return Err(IdentityError::Unauthorized("unauthorized access".into()));
        }

        user.status = UserStatus::Offline;
        user.token = None;

        let user = self.store.save(user).await?;
        tracing::info!(user_id = user.id, "user logged out");

        Ok(user)
    }

    /// Replace username and birthday of the session owner.
    pub async fn edit_profile(&self, request: ProfileEdit) -> Result<User> {
        let _guard = self.locks.lock(request.id).await;
        let mut user = self.find_by_id(request.id).await?;

        if !user.holds_token(&request.token) {
            return Err(IdentityError::Unauthorized("unauthorized access".into()));
        }

        let username = request.username.unwrap_or_else(|| user.username.clone());
        if username != user.username
            && self.store.find_by_username(&username).await?.is_some()
        {
            return Err(IdentityError::Conflict(
                "The username provided is not unique. Therefore, the user could not be edited!"
                    .into(),
            ));
        }

        user.username = username;
        user.birthday = request.birthday;

        let user = self.store.save(user).await?;
        tracing::info!(user_id = user.id, "user profile edited");

        Ok(user)
    }
}
