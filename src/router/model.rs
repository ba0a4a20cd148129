//! Wire representations of a user.

use serde::{Deserialize, Serialize};

use crate::router::DATE_FORMAT;
use crate::user::{User, UserStatus};

/// Entry of `GET /users`.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub status: UserStatus,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            status: user.status,
        }
    }
}

/// Answer to a registration.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct CreatedUser {
    pub id: i64,
    pub username: String,
    pub token: Option<String>,
    pub status: UserStatus,
}

impl From<User> for CreatedUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            token: user.token,
            status: user.status,
        }
    }
}

/// Full profile, dates as `dd.MM.yyyy`.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: i64,
    pub username: String,
    pub token: Option<String>,
    pub creation_date: String,
    pub birthday: Option<String>,
    pub status: UserStatus,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            token: user.token,
            creation_date: user.creation_date.format(DATE_FORMAT).to_string(),
            birthday: user
                .birthday
                .map(|date| date.format(DATE_FORMAT).to_string()),
            status: user.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;

    #[test]
    fn test_profile_dates() {
        let user = User {
            id: 7,
            username: "alice".into(),
            password: "$argon2id$secret".into(),
            token: Some("t".into()),
            status: UserStatus::Online,
            birthday: NaiveDate::from_ymd_opt(1990, 5, 7),
            creation_date: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        };

        let json = serde_json::to_value(Profile::from(user)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 7,
                "username": "alice",
                "token": "t",
                "creationDate": "01.03.2024",
                "birthday": "07.05.1990",
                "status": "ONLINE",
            })
        );
    }

    #[test]
    fn test_summary_hides_secrets() {
        let user = User {
            id: 1,
            username: "bob".into(),
            password: "$argon2id$secret".into(),
            token: Some("t".into()),
            status: UserStatus::Offline,
            ..Default::default()
        };

        let json = serde_json::to_value(UserSummary::from(user)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "id": 1, "username": "bob", "status": "OFFLINE" })
        );
    }
}
