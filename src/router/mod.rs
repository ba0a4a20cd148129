//! HTTP transport over the identity service.
pub mod create;
pub mod login;
pub mod logout;
pub mod model;
pub mod status;
pub mod users;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::ServerError;

/// Wire format of dates, such as `17.05.1990`.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// JSON body checked with [`Validate`] before reaching the handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Valid<T>(pub T);

impl<S, T> FromRequest<S> for Valid<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ServerError;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Valid(value))
    }
}

/// Parse a `dd.MM.yyyy` date coming from `field`.
pub fn parse_date(
    field: &'static str,
    date: &str,
) -> Result<NaiveDate, ValidationErrors> {
    NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|_| {
        let mut errors = ValidationErrors::new();
        errors.add(
            field,
            ValidationError::new("date")
                .with_message("Date must be formatted as dd.MM.yyyy.".into()),
        );
        errors
    })
}

/// Application state backed by a memory store and cheap hashing.
#[cfg(test)]
pub fn state() -> crate::AppState {
    use std::sync::Arc;

    use crate::crypto::PasswordManager;
    use crate::crypto::tests::light_config;
    use crate::user::{IdentityService, MemoryStore};

    let passwords = PasswordManager::new(Some(light_config()))
        .expect("light argon2 parameters");
    let identity =
        IdentityService::new(Arc::new(MemoryStore::new()), passwords);

    crate::AppState {
        config: Arc::new(crate::config::Configuration::default()),
        identity: Arc::new(identity),
        metrics: None,
    }
}
