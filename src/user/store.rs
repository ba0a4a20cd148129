//! Persistence port for users.

use async_trait::async_trait;

use crate::user::User;

/// Errors raised by a [`UserStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("the {field} provided is not unique")]
    Conflict { field: &'static str },
    #[error("user with ID {0} was not found")]
    NotFound(i64),
    #[error("stored record is corrupted: {0}")]
    Corrupted(String),
    #[error("SQL request failed: {0}")]
    Sql(#[from] sqlx::Error),
}

/// Durable keyed storage of [`User`] records.
///
/// Every write must be visible to reads issued after it returns.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user without identifier (assigning one), or update an
    /// existing one.
    ///
    /// Fails with [`StoreError::Conflict`] when the username, or a present
    /// token, already belongs to another record.
    async fn save(&self, user: User) -> Result<User, StoreError>;

    /// Every user, ordered by identifier.
    async fn find_all(&self) -> Result<Vec<User>, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Remove every record. Reset and tests only.
    async fn delete_all(&self) -> Result<(), StoreError>;
}
