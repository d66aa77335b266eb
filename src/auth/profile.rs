//! Endpoints for reading and changing the logged-in user's details.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;

use crate::{
    Error, PasswordHash, ValidatedPassword,
    auth::{
        User, UserChanges, UserID, get_user_by_id,
        register::UserState,
        update_user,
        user::{validate_email, validate_username},
    },
    db::acquire_connection,
};

/// Get the profile of the user making the request.
pub async fn get_profile(
    State(state): State<UserState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<User>, Error> {
    let connection = acquire_connection(&state.db_connection, state.config.lock_timeout).await?;

    get_user_by_id(user_id, &connection).map(Json)
}

/// The fields of a profile that may be changed.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileChanges {
    /// The new username.
    pub username: Option<String>,
    /// The new email address.
    pub email: Option<String>,
    /// The new password.
    pub password: Option<String>,
}

/// Update the profile of the user making the request.
///
/// New values are checked the same way as when registering.
pub async fn update_profile(
    State(state): State<UserState>,
    Extension(user_id): Extension<UserID>,
    payload: Result<Json<ProfileChanges>, JsonRejection>,
) -> Result<Json<User>, Error> {
    let Json(form) = payload?;

    let username = form.username.as_deref().map(validate_username).transpose()?;
    let email = form.email.as_deref().map(validate_email).transpose()?;

    let password_hash = match form.password {
        Some(password) => {
            let user_inputs: Vec<&str> = [username.as_deref(), email.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            let password = ValidatedPassword::new(&password, &user_inputs)?;
            Some(PasswordHash::new(password, state.config.password_cost)?)
        }
        None => None,
    };

    let connection = acquire_connection(&state.db_connection, state.config.lock_timeout).await?;
    let user = update_user(
        user_id,
        UserChanges {
            username,
            email,
            password_hash,
        },
        &connection,
    )?;

    tracing::info!("Updated profile of user {user_id}");

    Ok(Json(user))
}
