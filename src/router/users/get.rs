//! Get a user profile.

use axum::Json;
use axum::extract::{Path, State};

use crate::AppState;
use crate::error::Result;
use crate::router::model::Profile;

/// Any caller may look up any profile.
pub async fn handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Profile>> {
    let user = state.identity.find_by_id(user_id).await?;

    Ok(Json(user.into()))
}
