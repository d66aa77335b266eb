//! Defines the endpoints for reading the caller's accounts.
use std::{sync::Arc, time::Duration};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State, rejection::PathRejection},
};
use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::{
    AppState, Error,
    account::{
        Account,
        core::{hide_foreign_account, list_accounts},
    },
    auth::UserID,
    authorization::get_owned_account,
    database_id::AccountId,
    db::acquire_connection,
};

/// The state needed to read accounts.
#[derive(Debug, Clone)]
pub struct GetAccountState {
    /// The database connection for reading accounts.
    pub db_connection: Arc<Mutex<Connection>>,
    /// How long to wait for the database connection.
    pub lock_timeout: Duration,
}

impl FromRef<AppState> for GetAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            lock_timeout: state.config.lock_timeout,
        }
    }
}

/// A route handler that lists the caller's open accounts.
pub async fn list_accounts_endpoint(
    State(state): State<GetAccountState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Account>>, Error> {
    let connection = acquire_connection(&state.db_connection, state.lock_timeout).await?;

    list_accounts(user_id, &connection).map(Json)
}

/// A route handler that gets one of the caller's accounts.
///
/// Accounts owned by other users are reported as not found.
pub async fn get_account_endpoint(
    State(state): State<GetAccountState>,
    Extension(user_id): Extension<UserID>,
    path: Result<Path<AccountId>, PathRejection>,
) -> Result<Json<Account>, Error> {
    let Path(account_id) = path?;
    let connection = acquire_connection(&state.db_connection, state.lock_timeout).await?;

    get_owned_account(account_id, user_id, &connection)
        .map(Json)
        .map_err(hide_foreign_account)
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension, Json,
        extract::{Path, State},
    };

    use crate::{
        Error,
        account::{
            create_account,
            get_endpoint::{GetAccountState, get_account_endpoint, list_accounts_endpoint},
        },
        test_utils::{create_test_user, get_test_app_state},
    };

    #[tokio::test]
    async fn lists_only_callers_accounts() {
        let app_state = get_test_app_state();
        let (alice, account) = {
            let connection = app_state.db_connection.lock().await;
            let alice = create_test_user("alice", &connection);
            let bob = create_test_user("bob", &connection);
            let account = create_account(alice.id, "checking", "A-1", &connection).unwrap();
            create_account(bob.id, "checking", "B-1", &connection).unwrap();
            (alice, account)
        };
        let state = GetAccountState {
            db_connection: app_state.db_connection.clone(),
            lock_timeout: app_state.config.lock_timeout,
        };

        let Json(accounts) = list_accounts_endpoint(State(state), Extension(alice.id))
            .await
            .unwrap();

        assert_eq!(accounts, vec![account]);
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
        let state = GetAccountState {
            db_connection: app_state.db_connection.clone(),
            lock_timeout: app_state.config.lock_timeout,
        };

        let result =
            get_account_endpoint(State(state), Extension(bob.id), Ok(Path(account.id))).await;

        assert_eq!(result.unwrap_err(), Error::NotFound);
    }
}
