//! Defines the endpoint for deleting an account.

use std::{sync::Arc, time::Duration};

use axum::{
    Extension,
    extract::{FromRef, Path, State, rejection::PathRejection},
    http::StatusCode,
};
use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::{
    AppState, Error,
    account::core::{delete_account, hide_foreign_account},
    auth::UserID,
    database_id::AccountId,
    db::acquire_connection,
};

/// The state needed to delete an account.
#[derive(Debug, Clone)]
pub struct DeleteAccountState {
    /// The database connection for managing accounts.
    db_connection: Arc<Mutex<Connection>>,
    lock_timeout: Duration,
}

impl FromRef<AppState> for DeleteAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            lock_timeout: state.config.lock_timeout,
        }
    }
}

/// A route handler for deleting one of the caller's accounts, responds with
/// 204 No Content on success.
pub async fn delete_account_endpoint(
    State(state): State<DeleteAccountState>,
    Extension(user_id): Extension<UserID>,
    path: Result<Path<AccountId>, PathRejection>,
) -> Result<StatusCode, Error> {
    let Path(account_id) = path?;
    let connection = acquire_connection(&state.db_connection, state.lock_timeout).await?;

    delete_account(account_id, user_id, &connection).map_err(hide_foreign_account)?;

    tracing::info!("User {user_id} deleted account {account_id}");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };

    use crate::{
        AppState, Error,
        account::{
            create_account,
            delete_endpoint::{DeleteAccountState, delete_account_endpoint},
            get_account,
        },
        test_utils::{create_test_user, get_test_app_state},
    };

    fn get_state(app_state: &AppState) -> DeleteAccountState {
        DeleteAccountState {
            db_connection: app_state.db_connection.clone(),
            lock_timeout: app_state.config.lock_timeout,
        }
    }

    #[tokio::test]
    async fn deletes_account() {
        let app_state = get_test_app_state();
        let (alice, account) = {
            let connection = app_state.db_connection.lock().await;
            let alice = create_test_user("alice", &connection);
            let account = create_account(alice.id, "checking", "A-1", &connection).unwrap();
            (alice, account)
        };

        let status = delete_account_endpoint(
            State(get_state(&app_state)),
            Extension(alice.id),
            Ok(Path(account.id)),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::NO_CONTENT);
        let connection = app_state.db_connection.lock().await;
        assert_eq!(get_account(account.id, &connection), Err(Error::NotFound));
    }

    #[tokio::test]
    async fn other_users_account_is_not_found() {
        let app_state = get_test_app_state();
        let (bob, account) = {
            let connection = app_state.db_connection.lock().await;
            let alice = create_test_user("alice", &connection);
            let bob = create_test_user("bob", &connection);
            let account = create_account(alice.id, "checking", "A-1", &connection).unwrap();
            (bob, account)
        };

        let result = delete_account_endpoint(
            State(get_state(&app_state)),
            Extension(bob.id),
            Ok(Path(account.id)),
        )
        .await;

        assert_eq!(result, Err(Error::NotFound));
        let connection = app_state.db_connection.lock().await;
        assert_eq!(get_account(account.id, &connection), Ok(account));
    }
}
