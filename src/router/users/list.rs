use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::error::Result;
use crate::router::model::UserSummary;

pub async fn handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserSummary>>> {
    let users = state.identity.list_users().await?;

    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::{Credentials, UserStatus};
    use crate::*;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_list_handler() {
        let state = router::state();
        let app = app(state.clone());

        let response =
            make_request(app.clone(), Method::GET, "/users", String::default())
                .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"[]");

        for name in ["alice", "bob"] {
            state
                .identity
                .register(Credentials::new(name, "pw"))
                .await
                .unwrap();
        }

        let response =
            make_request(app, Method::GET, "/users", String::default()).await;
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Vec<UserSummary> = serde_json::from_slice(&body).unwrap();

        assert_eq!(
            body.iter().map(|u| u.username.as_str()).collect::<Vec<_>>(),
            vec!["alice", "bob"]
        );
        assert!(body.iter().all(|u| u.status == UserStatus::Online));
    }
}
