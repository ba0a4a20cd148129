use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::Valid;
use crate::user::SessionRequest;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    pub id: i64,
    pub token: String,
}

/// Handler to close the session of a user.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<StatusCode> {
    state
        .identity
        .logout(SessionRequest {
            id: body.id,
            token: body.token,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
