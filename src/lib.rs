//! Ledger is a banking API for managing accounts and moving money between them.
//!
//! Users register and log in to receive a bearer token, open accounts, and
//! then deposit into, withdraw from, and transfer between the accounts they
//! own. Every balance change is recorded in an append-only ledger of
//! transactions, and each change is applied atomically together with its
//! ledger entry.
//!
//! This library provides a JSON REST API backed by SQLite.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod account;
mod app_state;
mod auth;
mod authorization;
mod config;
mod database_id;
mod db;
pub mod endpoints;
mod logging;
mod money;
mod routing;
mod timestamp;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use account::{Account, AccountId};
pub use app_state::AppState;
pub use auth::{PasswordHash, User, UserID, ValidatedPassword};
pub use config::AppConfig;
pub use db::{acquire_connection, initialize as initialize_db};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use money::{Amount, Balance};
pub use routing::build_router;
pub use timestamp::Timestamp;
pub use transaction::{
    Transaction, TransactionFilter, TransactionId, TransactionRequest, TransactionType,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request was malformed, was missing a required field, or contained
    /// a value that is not allowed (e.g., a negative amount).
    ///
    /// The string is shown to the client and should say how to fix the request.
    #[error("{0}")]
    Validation(String),

    /// The caller does not own an account referenced by the request.
    ///
    /// The string is shown to the client.
    #[error("{0}")]
    Forbidden(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A withdrawal or transfer asked for more money than the account holds.
    #[error("Insufficient funds for {0}")]
    InsufficientFunds(String),

    /// The specified account number already exists in the database.
    #[error("the account number \"{0}\" is already in use")]
    DuplicateAccountNumber(String),

    /// The username is already taken by another user.
    #[error("the username is already taken")]
    DuplicateUsername,

    /// The email address is already registered to another user.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// The database could not be locked within the configured timeout.
    ///
    /// The client may retry the request.
    #[error("the ledger is busy, try again")]
    LockTimeout,

    /// The email and password combination did not match a registered user.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The bearer token was missing, malformed, forged or has expired.
    #[error("Missing or invalid token")]
    InvalidToken,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A bearer token could not be created.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, _)
                if matches!(
                    sql_error.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                ) =>
            {
                tracing::warn!("the database is busy: {sql_error}");
                Error::LockTimeout
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::InsufficientFunds(_) | Error::TooWeak(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::InvalidCredentials | Error::InvalidToken => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::DuplicateAccountNumber(_)
            | Error::DuplicateUsername
            | Error::DuplicateEmail
            | Error::LockTimeout => StatusCode::CONFLICT,
            Error::HashingError(_) | Error::TokenCreation(_) | Error::SqlError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal errors are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "Internal server error".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
