//! Defines the endpoint for registering a new user.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::{
    AppConfig, AppState, Error, PasswordHash, ValidatedPassword,
    app_state::JwtKeys,
    auth::{
        User, create_user,
        user::{validate_email, validate_username},
    },
    db::acquire_connection,
};

/// The state needed by the user endpoints.
#[derive(Debug, Clone)]
pub struct UserState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The keys for signing bearer tokens.
    pub jwt_keys: JwtKeys,
    /// Token lifetime, lock timeout and password hashing settings.
    pub config: AppConfig,
}

impl FromRef<AppState> for UserState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            jwt_keys: state.jwt_keys.clone(),
            config: state.config,
        }
    }
}

/// The data for registering a new user.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    /// The unique name for the user.
    pub username: String,
    /// The email address the user will log in with.
    pub email: String,
    /// The user's password.
    pub password: String,
}

/// A route handler for registering a new user.
///
/// Responds with 201 and the new user's profile.
pub async fn register_user(
    State(state): State<UserState>,
    payload: Result<Json<RegisterForm>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), Error> {
    let Json(form) = payload?;

    let username = validate_username(&form.username)?;
    let email = validate_email(&form.email)?;
    let password = ValidatedPassword::new(&form.password, &[username.as_str(), email.as_str()])?;
    // Hashing is slow, keep it outside the lock.
    let password_hash = PasswordHash::new(password, state.config.password_cost)?;

    let connection = acquire_connection(&state.db_connection, state.config.lock_timeout).await?;
    let user = create_user(&username, &email, password_hash, &connection)?;

    tracing::info!("Registered user {}", user.id);

    Ok((StatusCode::CREATED, Json(user)))
}
