//! Cryptogragic logics.

use argon2::password_hash::{
    Error as PasswordHashError, PasswordHash, PasswordHasher,
    PasswordVerifier, SaltString,
};
use argon2::{Argon2, Params, Version};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::config::Argon2 as ArgonConfig;

/// Random bytes behind a session token, hex-encoded afterwards.
pub const TOKEN_LENGTH: usize = 32;

type Result<T> = std::result::Result<T, CryptoError>;

#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    #[error("argon2 error: {0}")]
    Argon2(String),
}

/// Generate a new opaque session token from the OS RNG.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_LENGTH];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Password manager that uses Argon2id and PHC string format for hashing and
/// verification.
#[derive(Debug, Clone)]
pub struct PasswordManager {
    params: Params,
}

impl PasswordManager {
    /// Create a new [`PasswordManager`].
    pub fn new(config: Option<ArgonConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();

        let params = Params::new(
            config.memory_cost,
            config.iterations,
            config.parallelism,
            Some(config.hash_length),
        )
        .map_err(|err| CryptoError::Argon2(err.to_string()))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(
            argon2::Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        )
    }

    /// Hash password using Argon2id and a fresh random salt.
    pub fn hash_password(&self, password: impl AsRef<[u8]>) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_ref(), &salt)
            .map_err(|e| CryptoError::Argon2(e.to_string()))?;

        Ok(hash.to_string())
    }

    /// Verify password against a PHC.
    ///
    /// Returns `Ok(false)` on mismatch and `Err` when the stored PHC string
    /// cannot be parsed.
    pub fn verify_password(
        &self,
        password: impl AsRef<[u8]>,
        phc_hash: &str,
    ) -> Result<bool> {
        let parsed = PasswordHash::new(phc_hash)
            .map_err(|e| CryptoError::Argon2(e.to_string()))?;

        match self.argon2().verify_password(password.as_ref(), &parsed) {
            Ok(()) => Ok(true),
            Err(PasswordHashError::Password) => Ok(false),
            Err(err) => Err(CryptoError::Argon2(err.to_string())),
        }
    }
}
