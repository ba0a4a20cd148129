//! User lifecycle: entity, persistence port and session state machine.
mod memory;
mod postgres;
mod service;
mod store;

pub use memory::*;
pub use postgres::*;
pub use service::*;
pub use store::*;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a [`User`] that has never been saved.
pub const UNASSIGNED_ID: i64 = 0;

/// Session marker of a [`User`].
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserStatus {
    Online,
    #[default]
    Offline,
}

impl UserStatus {
    /// Textual form, as persisted and sent over the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Online => "ONLINE",
            UserStatus::Offline => "OFFLINE",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is neither `ONLINE` nor `OFFLINE`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown user status `{0}`")]
pub struct UnknownStatus(pub String);

impl FromStr for UserStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ONLINE" => Ok(UserStatus::Online),
            "OFFLINE" => Ok(UserStatus::Offline),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// User as saved on the store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Assigned by the store on first save, [`UNASSIGNED_ID`] before.
    pub id: i64,
    pub username: String,
    /// Argon2id PHC string.
    #[serde(skip)]
    pub password: String,
    pub token: Option<String>,
    pub status: UserStatus,
    pub birthday: Option<NaiveDate>,
    pub creation_date: DateTime<Utc>,
}

impl User {
    /// Whether the store already assigned an identifier.
    pub fn is_persisted(&self) -> bool {
        self.id != UNASSIGNED_ID
    }

    /// Whether `token` is the current session token of this user.
    ///
    /// A user without a session never matches.
    pub fn holds_token(&self, token: &str) -> bool {
        self.token.as_deref().is_some_and(|current| current == token)
    }
}
