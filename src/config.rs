//! Tunable settings for the server.

use std::time::Duration as StdDuration;

use time::Duration;

use crate::PasswordHash;

/// The default lifetime of a bearer token.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::minutes(15);

/// The default time to wait for the database before giving up on a request.
pub const DEFAULT_LOCK_TIMEOUT: StdDuration = StdDuration::from_secs(5);

/// Settings that control authentication and database contention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppConfig {
    /// How long a bearer token is valid for after it is issued.
    pub token_duration: Duration,

    /// The longest a request may wait for exclusive access to the database.
    ///
    /// Requests that wait longer fail with a conflict and may be retried.
    pub lock_timeout: StdDuration,

    /// The bcrypt cost used when hashing new passwords.
    pub password_cost: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            token_duration: DEFAULT_TOKEN_DURATION,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            password_cost: PasswordHash::DEFAULT_COST,
        }
    }
}
