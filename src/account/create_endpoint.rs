//! Defines the endpoint for opening a new account.
use std::{sync::Arc, time::Duration};

use axum::{
    Extension, Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::{
    AppState, Error, account::Account, account::core::create_account, auth::UserID,
    db::acquire_connection,
};

/// The state needed to create an account.
#[derive(Debug, Clone)]
pub struct CreateAccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
    /// How long to wait for the database connection.
    pub lock_timeout: Duration,
}

impl FromRef<AppState> for CreateAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            lock_timeout: state.config.lock_timeout,
        }
    }
}

/// The request body for creating an account.
#[derive(Debug, Deserialize)]
pub struct AccountForm {
    /// The owner of the new account. Defaults to the caller and, if given,
    /// must be the caller.
    pub user_id: Option<i64>,
    /// The kind of account, e.g. "checking".
    pub account_type: String,
    /// The account number, unique across all users.
    pub account_number: String,
}

/// A route handler for opening a new account, responds with the new account.
pub async fn create_account_endpoint(
    State(state): State<CreateAccountState>,
    Extension(user_id): Extension<UserID>,
    payload: Result<Json<AccountForm>, JsonRejection>,
) -> Result<(StatusCode, Json<Account>), Error> {
    let Json(form) = payload?;

    if let Some(owner_id) = form.user_id.filter(|&owner_id| owner_id != user_id.as_i64()) {
        tracing::warn!("User {user_id} tried to open an account for user {owner_id}");
        return Err(Error::Forbidden(
            "You can only open accounts for yourself".to_owned(),
        ));
    }

    let connection = acquire_connection(&state.db_connection, state.lock_timeout).await?;
    let account = create_account(user_id, &form.account_type, &form.account_number, &connection)?;

    tracing::info!("User {user_id} opened account {}", account.id);

    Ok((StatusCode::CREATED, Json(account)))
}

#[cfg(test)]
mod tests {
    use axum::{Extension, Json, extract::State, http::StatusCode};

    use crate::{
        Error,
        account::{
            create_account_endpoint,
            create_endpoint::{AccountForm, CreateAccountState},
            get_account,
        },
        money::Balance,
        test_utils::{create_test_user, get_test_app_state},
    };

    #[tokio::test]
    async fn can_create_account() {
        let app_state = get_test_app_state();
        let user = create_test_user("alice", &*app_state.db_connection.lock().await);
        let state = CreateAccountState {
            db_connection: app_state.db_connection.clone(),
            lock_timeout: app_state.config.lock_timeout,
        };
        let form = AccountForm {
            user_id: Some(user.id.as_i64()),
            account_type: "checking".to_owned(),
            account_number: "ACC-001".to_owned(),
        };

        let (status, Json(account)) =
            create_account_endpoint(State(state.clone()), Extension(user.id), Ok(Json(form)))
                .await
                .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(account.balance, Balance::zero());
        let connection = state.db_connection.lock().await;
        assert_eq!(get_account(account.id, &connection), Ok(account));
    }

    #[tokio::test]
    async fn rejects_account_for_other_user() {
        let app_state = get_test_app_state();
        let (alice, bob) = {
            let connection = app_state.db_connection.lock().await;
            (
                create_test_user("alice", &connection),
                create_test_user("bob", &connection),
            )
        };
        let state = CreateAccountState {
            db_connection: app_state.db_connection.clone(),
            lock_timeout: app_state.config.lock_timeout,
        };
        let form = AccountForm {
            user_id: Some(bob.id.as_i64()),
            account_type: "checking".to_owned(),
            account_number: "ACC-001".to_owned(),
        };

        let result =
            create_account_endpoint(State(state), Extension(alice.id), Ok(Json(form))).await;

        assert!(matches!(result, Err(Error::Forbidden(_))));
    }
}
