//! Users-related HTTP API.
mod get;
mod list;
mod update;

use axum::Router;
use axum::routing::get;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // `GET /users` goes to `list`, `POST /users` goes to `create`.
        .route(
            "/users",
            get(list::handler).post(crate::router::create::handler),
        )
        // `GET /users/:ID` goes to `get`.
        // `PUT /users/:ID` goes to `update`. Session token required.
        .route("/users/{user_id}", get(get::handler).put(update::handler))
}
