//! Configuration manager for identa.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::FromRef;
use serde::{Deserialize, Serialize};

use crate::AppState;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_ADDRESS: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Instance name.
    pub name: String,
    /// Listening address.
    pub address: String,
    /// Listening port. `PORT` environment variable takes precedence.
    pub port: u16,
    #[serde(skip_deserializing)]
    pub version: String,
    #[serde(skip)]
    path: PathBuf,
    /// Related to PostgreSQL configuration.
    /// Users are kept in memory when missing.
    #[serde(skip_serializing)]
    pub postgres: Option<Postgres>,
    /// Related to Argon2 configuration.
    #[serde(skip_serializing)]
    pub argon2: Option<Argon2>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_owned(),
            address: DEFAULT_ADDRESS.to_owned(),
            port: DEFAULT_PORT,
            version: VERSION.to_owned(),
            path: PathBuf::default(),
            postgres: None,
            argon2: None,
        }
    }
}

/// PostgreSQL configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Postgres {
    /// Hostname:(?port) for PostgreSQL instance.
    pub address: String,
    /// Database name.
    pub database: Option<String>,
    /// Username credential to connect.
    pub username: Option<String>,
    /// Password credential to connect.
    pub password: Option<String>,
    /// Maximum pool connections.
    pub pool_size: Option<u32>,
}

/// Argon2 configuration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Argon2 {
    /// Memory used while hashing, in KiB.
    pub memory_cost: u32,
    /// Iterations of hash.
    pub iterations: u32,
    /// Parallelism degree.
    pub parallelism: u32,
    /// Output hash length.
    pub hash_length: usize,
}

impl Default for Argon2 {
    fn default() -> Self {
        Self {
            memory_cost: 1024 * 64, // 64 MiB.
            iterations: 4,
            parallelism: 2,
            hash_length: 32,
        }
    }
}

impl FromRef<AppState> for Arc<Configuration> {
    fn from_ref(state: &AppState) -> Arc<Configuration> {
        Arc::clone(&state.config)
    }
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    pub fn read(self) -> Arc<Self> {
        let file_path = if self.path.is_file() {
            self.path.clone()
        } else {
            Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        };

        let mut config = match File::open(&file_path) {
            Ok(file) => match serde_yaml::from_reader::<_, Configuration>(file)
            {
                Ok(config) => config,
                Err(err) => self.error(err),
            },
            Err(err) => self.error(err),
        };

        // set app version.
        config.version = VERSION.to_owned();
        config.path = file_path;

        if let Some(port) =
            std::env::var("PORT").ok().and_then(|p| p.parse().ok())
        {
            config.port = port;
        }

        Arc::new(config)
    }

    /// Return a default configuration as fallback.
    fn error(&self, err: impl std::error::Error) -> Self {
        tracing::error!(
            error = %err,
            path = ?self.path,
            "`config.yaml` file not usable, using defaults"
        );
        Self::default()
    }
}
