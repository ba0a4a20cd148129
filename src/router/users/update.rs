//! Update username and birthday of the session owner.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::router::{Valid, parse_date};
use crate::user::ProfileEdit;
use crate::{AppState, ServerError};

#[derive(Debug, Validate, Serialize, Deserialize)]
pub struct Body {
    /// Must match the path when present.
    id: Option<i64>,
    token: String,
    /// Current username is kept when missing.
    #[validate(length(max = 255, message = "Username must be at most 255 characters."))]
    username: Option<String>,
    /// `dd.MM.yyyy`, `null` clears it.
    birthday: Option<String>,
}

pub async fn handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Valid(body): Valid<Body>,
) -> Result<StatusCode, ServerError> {
    if body.id.is_some_and(|id| id != user_id) {
        let mut errors = ValidationErrors::new();
        errors.add(
            "id",
            ValidationError::new("id")
                .with_message("ID does not match the path.".into()),
        );
        return Err(errors.into());
    }

    let birthday = body
        .birthday
        .as_deref()
        .map(|date| parse_date("birthday", date))
        .transpose()?;

    state
        .identity
        .edit_profile(ProfileEdit {
            id: user_id,
            token: body.token,
            username: body.username,
            birthday,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use crate::user::{Credentials, User};
    use crate::*;

    async fn setup() -> (AppState, axum::Router, User, User) {
        let state = router::state();
        let app = app(state.clone());
        let alice = state
            .identity
            .register(Credentials::new("alice", "pw1"))
            .await
            .unwrap();
        let bob = state
            .identity
            .register(Credentials::new("bob", "x"))
            .await
            .unwrap();

        (state, app, alice, bob)
    }

    #[tokio::test]
    async fn test_update_handler() {
        let (state, app, alice, _) = setup().await;

        let response = make_request(
            app,
            Method::PUT,
            &format!("/users/{}", alice.id),
            json!({
                "id": alice.id,
                "token": alice.token,
                "username": "alicia",
                "birthday": "17.05.1990",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let stored = state.identity.find_by_id(alice.id).await.unwrap();
        assert_eq!(stored.username, "alicia");
        assert_eq!(stored.birthday, NaiveDate::from_ymd_opt(1990, 5, 17));
        assert_eq!(stored.token, alice.token);
    }

    #[tokio::test]
    async fn test_update_keeps_username() {
        let (state, app, alice, _) = setup().await;

        let response = make_request(
            app,
            Method::PUT,
            &format!("/users/{}", alice.id),
            json!({ "token": alice.token, "birthday": "01.01.2000" })
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let stored = state.identity.find_by_id(alice.id).await.unwrap();
        assert_eq!(stored.username, "alice");
        assert_eq!(stored.birthday, NaiveDate::from_ymd_opt(2000, 1, 1));
    }

    #[tokio::test]
    async fn test_update_clears_birthday() {
        let (state, app, alice, _) = setup().await;
        let path = format!("/users/{}", alice.id);

        let response = make_request(
            app.clone(),
            Method::PUT,
            &path,
            json!({ "token": alice.token, "birthday": "17.05.1990" })
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = make_request(
            app.clone(),
            Method::PUT,
            &path,
            json!({ "token": alice.token, "birthday": null }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let stored = state.identity.find_by_id(alice.id).await.unwrap();
        assert_eq!(stored.birthday, None);

        // A missing birthday clears it as well.
        make_request(
            app.clone(),
            Method::PUT,
            &path,
            json!({ "token": alice.token, "birthday": "01.01.2000" })
                .to_string(),
        )
        .await;
        let response = make_request(
            app,
            Method::PUT,
            &path,
            json!({ "token": alice.token }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let stored = state.identity.find_by_id(alice.id).await.unwrap();
        assert_eq!(stored.birthday, None);
    }

    #[tokio::test]
    async fn test_update_failures() {
        let (state, app, alice, bob) = setup().await;
        let path = format!("/users/{}", alice.id);

        // Foreign token.
        let response = make_request(
            app.clone(),
            Method::PUT,
            &path,
            json!({ "token": bob.token, "username": "mallory" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // Taken username.
        let response = make_request(
            app.clone(),
            Method::PUT,
            &path,
            json!({ "token": alice.token, "username": "bob" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        // Malformed birthday.
        let response = make_request(
            app.clone(),
            Method::PUT,
            &path,
            json!({ "token": alice.token, "birthday": "1990-05-17" })
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Body and path disagree.
        let response = make_request(
            app.clone(),
            Method::PUT,
            &path,
            json!({ "id": bob.id, "token": alice.token }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Unknown user.
        let response = make_request(
            app,
            Method::PUT,
            &format!("/users/{}", bob.id + 1),
            json!({ "token": "t", "username": "ghost" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        assert_eq!(state.identity.find_by_id(alice.id).await.unwrap(), alice);
    }
}
