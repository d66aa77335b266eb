//! Implements a struct that holds the state of the REST server.

use std::sync::Arc;

use jsonwebtoken::{DecodingKey, EncodingKey};
use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::{AppConfig, Error, db::initialize};

/// The keys for signing and verifying bearer tokens.
#[derive(Clone)]
pub struct JwtKeys {
    /// The key for signing new tokens.
    pub encoding_key: EncodingKey,
    /// The key for verifying tokens presented by clients.
    pub decoding_key: DecodingKey,
}

impl JwtKeys {
    /// Create signing and verification keys from a shared `secret`.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JwtKeys { .. }")
    }
}

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The keys for signing and verifying bearer tokens.
    pub jwt_keys: JwtKeys,

    /// Token lifetime, lock timeout and password hashing settings.
    pub config: AppConfig,

    /// The database connection.
    ///
    /// Use [crate::acquire_connection] to lock it with a bounded wait.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for
    /// the domain models, and sets the SQLite busy timeout to the lock timeout
    /// in `config`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        jwt_secret: &str,
        config: AppConfig,
    ) -> Result<Self, Error> {
        db_connection.busy_timeout(config.lock_timeout)?;
        initialize(&db_connection)?;

        Ok(Self {
            jwt_keys: JwtKeys::new(jwt_secret),
            config,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}
