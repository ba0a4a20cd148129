//! Public status page for front-end identification.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::config::Configuration;

/// Structured status.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Status {
    version: String,
    name: String,
}

/// Public server status.
pub async fn status(State(config): State<Arc<Configuration>>) -> Json<Status> {
    Json(Status {
        version: config.version.clone(),
        name: config.name.clone(),
    })
}
