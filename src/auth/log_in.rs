//! Defines the endpoint that exchanges an email and password for a bearer token.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::{get_user_by_email, register::UserState, token::encode_token},
    db::acquire_connection,
};

/// The credentials entered during log-in.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    /// Email entered during log-in.
    pub email: Option<String>,
    /// Password entered during log-in.
    pub password: Option<String>,
}

/// The response to a successful log-in.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The bearer token to send in the `Authorization` header.
    pub access_token: String,
    /// Always "Bearer".
    pub token_type: String,
    /// The number of seconds until the token expires.
    pub expires_in: i64,
}

/// Handler for log-in requests.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The email or password is missing.
/// - The email does not belong to a registered user.
/// - The password is not correct.
/// - An internal error occurred when verifying the password.
pub async fn post_log_in(
    State(state): State<UserState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<TokenResponse>, Error> {
    let Json(credentials) = payload?;

    let (Some(email), Some(password)) = (credentials.email, credentials.password) else {
        return Err(Error::Validation(
            "Email and password are required".to_owned(),
        ));
    };

    let user = {
        let connection =
            acquire_connection(&state.db_connection, state.config.lock_timeout).await?;

        get_user_by_email(&email, &connection).map_err(|error| match error {
            Error::NotFound => Error::InvalidCredentials,
            error => error,
        })?
    };

    let is_password_correct = user.password_hash.verify(&password).map_err(|error| {
        tracing::error!("Error verifying password: {error}");
        Error::HashingError(error.to_string())
    })?;

    if !is_password_correct {
        return Err(Error::InvalidCredentials);
    }

    let access_token = encode_token(
        user.id,
        state.config.token_duration,
        &state.jwt_keys.encoding_key,
    )?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "Bearer".to_owned(),
        expires_in: state.config.token_duration.whole_seconds(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::{Json, extract::State};

    use crate::{
        Error, PasswordHash, ValidatedPassword,
        auth::{
            create_user,
            log_in::{Credentials, post_log_in},
            token::decode_token,
        },
        test_utils::get_test_user_state,
    };

    const PASSWORD: &str = "averysecretpassphrase!";

    async fn get_state_with_user() -> crate::auth::register::UserState {
        let state = get_test_user_state();
        let password_hash =
            PasswordHash::new(ValidatedPassword::new(PASSWORD, &[]).unwrap(), 4).unwrap();
        let connection = state.db_connection.lock().await;
        create_user("alice", "alice@example.com", password_hash, &connection).unwrap();
        drop(connection);
        state
    }

    fn credentials(email: Option<&str>, password: Option<&str>) -> Credentials {
        Credentials {
            email: email.map(str::to_owned),
            password: password.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn log_in_returns_token_for_user() {
        let state = get_state_with_user().await;

        let Json(response) = post_log_in(
            State(state.clone()),
            Ok(Json(credentials(Some("alice@example.com"), Some(PASSWORD)))),
        )
        .await
        .unwrap();

        let claims = decode_token(&response.access_token, &state.jwt_keys.decoding_key).unwrap();
        assert_eq!(claims.user_id.as_i64(), 1);
        assert_eq!(response.token_type, "Bearer");
    }

    #[tokio::test]
    async fn log_in_fails_with_wrong_password() {
        let state = get_state_with_user().await;

        let result = post_log_in(
            State(state),
            Ok(Json(credentials(Some("alice@example.com"), Some("hunter2")))),
        )
        .await;

        assert_eq!(result.unwrap_err(), Error::InvalidCredentials);
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_email() {
        let state = get_state_with_user().await;

        let result = post_log_in(
            State(state),
            Ok(Json(credentials(Some("bob@example.com"), Some(PASSWORD)))),
        )
        .await;

        assert_eq!(result.unwrap_err(), Error::InvalidCredentials);
    }

    #[tokio::test]
    async fn log_in_requires_email_and_password() {
        let state = get_state_with_user().await;

        let result = post_log_in(
            State(state),
            Ok(Json(credentials(Some("alice@example.com"), None))),
        )
        .await;

        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
