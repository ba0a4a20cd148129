use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::Valid;
use crate::router::model::Profile;
use crate::user::Credentials;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(length(max = 255))]
    pub username: String,
    #[validate(length(max = 255))]
    pub password: String,
}

/// Handler to log in a user, issuing a new token.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Profile>> {
    let user = state
        .identity
        .login(Credentials::new(body.username, body.password))
        .await?;

    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::UserStatus;
    use crate::*;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_login_handler() {
        let state = router::state();
        let app = app(state.clone());
        let user = state
            .identity
            .register(Credentials::new("alice", "pw1"))
            .await
            .unwrap();

        let response = make_request(
            app,
            Method::POST,
            "/login",
            json!({ "username": "alice", "password": "pw1" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Profile = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.id, user.id);
        assert_eq!(body.status, UserStatus::Online);
        assert!(body.token.is_some());
        assert_ne!(body.token, user.token);
    }

    #[tokio::test]
    async fn test_login_failures() {
        let state = router::state();
        let app = app(state.clone());
        state
            .identity
            .register(Credentials::new("alice", "pw1"))
            .await
            .unwrap();

        let response = make_request(
            app.clone(),
            Method::POST,
            "/login",
            json!({ "username": "carol", "password": "pw1" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = make_request(
            app,
            Method::POST,
            "/login",
            json!({ "username": "alice", "password": "pw2" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
