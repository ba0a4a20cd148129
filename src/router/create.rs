use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::Valid;
use crate::router::model::CreatedUser;
use crate::user::Credentials;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(length(max = 255, message = "Username must be at most 255 characters."))]
    pub username: String,
    #[validate(length(max = 255, message = "Password must be at most 255 characters."))]
    pub password: String,
}

/// Handler to create user.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<CreatedUser>)> {
    let user = state
        .identity
        .register(Credentials::new(body.username, body.password))
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}
