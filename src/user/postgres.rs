//! Handle database requests.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Pool, Postgres};

use crate::user::{StoreError, UNASSIGNED_ID, User, UserStore};

const COLUMNS: &str =
    "id, username, password, token, status, birthday, creation_date";
const TOKEN_CONSTRAINT: &str = "users_token_key";

/// Row of the `users` table.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password: String,
    token: Option<String>,
    status: String,
    birthday: Option<NaiveDate>,
    creation_date: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|err| {
                StoreError::Corrupted(format!("user {}: {err}", row.id))
            })?;

        Ok(User {
            id: row.id,
            username: row.username,
            password: row.password,
            token: row.token,
            status,
            birthday: row.birthday,
            creation_date: row.creation_date,
        })
    }
}

/// Translate unique violations into [`StoreError::Conflict`].
fn map_error(err: sqlx::Error) -> StoreError {
    if let Some(db) = err.as_database_error() {
        if db.is_unique_violation() {
            let field = match db.constraint() {
                Some(TOKEN_CONSTRAINT) => "token",
                _ => "username",
            };
            return StoreError::Conflict { field };
        }
    }

    StoreError::Sql(err)
}

/// PostgreSQL-backed [`UserStore`].
///
/// Uniqueness of `username` and of non-null `token` is enforced by the
/// schema (see `migrations/`).
#[derive(Clone)]
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Create a new [`PostgresStore`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn insert(&self, user: &User) -> Result<UserRow, StoreError> {
        let query = format!(
            r#"INSERT INTO users (username, password, token, status, birthday, creation_date)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING {COLUMNS}"#
        );

        sqlx::query_as::<_, UserRow>(&query)
            .bind(&user.username)
            .bind(&user.password)
            .bind(&user.token)
            .bind(user.status.as_str())
            .bind(user.birthday)
            .bind(user.creation_date)
            .fetch_one(&self.pool)
            .await
            .map_err(map_error)
    }

    /// `id`, `password` and `creation_date` are never rewritten.
    async fn update(&self, user: &User) -> Result<UserRow, StoreError> {
        let query = format!(
            r#"UPDATE users
                SET username = $1, token = $2, status = $3, birthday = $4
                WHERE id = $5
                RETURNING {COLUMNS}"#
        );

        sqlx::query_as::<_, UserRow>(&query)
            .bind(&user.username)
            .bind(&user.token)
            .bind(user.status.as_str())
            .bind(user.birthday)
            .bind(user.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_error)?
            .ok_or(StoreError::NotFound(user.id))
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn save(&self, user: User) -> Result<User, StoreError> {
        let row = if user.id == UNASSIGNED_ID {
            self.insert(&user).await?
        } else {
            self.update(&user).await?
        };

        row.try_into()
    }

    async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM users ORDER BY id");

        sqlx::query_as::<_, UserRow>(&query)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let query = select_by(Field::Id);

        sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, StoreError> {
        let query = select_by(Field::Username);

        sqlx::query_as::<_, UserRow>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Id,
    Username,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Field::Id => write!(f, "id"),
            Field::Username => write!(f, "username"),
        }
    }
}

fn select_by(field: Field) -> String {
    format!("SELECT {COLUMNS} FROM users WHERE {field} = $1")
}
