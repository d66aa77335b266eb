//! Defines the endpoint for updating an account's details.
use std::{sync::Arc, time::Duration};

use axum::{
    Extension, Json,
    extract::{
        FromRef, Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use rusqlite::Connection;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::{
    AppState, Error,
    account::{
        Account,
        core::{AccountChanges, hide_foreign_account, update_account},
    },
    auth::UserID,
    database_id::AccountId,
    db::acquire_connection,
};

/// The state needed to edit an account.
#[derive(Debug, Clone)]
pub struct EditAccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
    /// How long to wait for the database connection.
    pub lock_timeout: Duration,
}

impl FromRef<AppState> for EditAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            lock_timeout: state.config.lock_timeout,
        }
    }
}

/// The request body for editing an account. The balance cannot be edited.
#[derive(Debug, Deserialize)]
pub struct EditAccountForm {
    account_type: Option<String>,
    account_number: Option<String>,
}

/// A route handler for updating one of the caller's accounts.
pub async fn edit_account_endpoint(
    State(state): State<EditAccountState>,
    Extension(user_id): Extension<UserID>,
    path: Result<Path<AccountId>, PathRejection>,
    payload: Result<Json<EditAccountForm>, JsonRejection>,
) -> Result<Json<Account>, Error> {
    let Path(account_id) = path?;
    let Json(form) = payload?;
    let changes = AccountChanges {
        account_type: form.account_type,
        account_number: form.account_number,
    };

    let connection = acquire_connection(&state.db_connection, state.lock_timeout).await?;
    let account =
        update_account(account_id, user_id, changes, &connection).map_err(hide_foreign_account)?;

    tracing::info!("User {user_id} updated account {account_id}");

    Ok(Json(account))
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
            create_account, edit_account_endpoint,
            edit_endpoint::{EditAccountForm, EditAccountState},
            get_account,
        },
        test_utils::{create_test_user, get_test_app_state},
    };

    #[tokio::test]
    async fn can_update_account() {
        let app_state = get_test_app_state();
        let (alice, account) = {
            let connection = app_state.db_connection.lock().await;
            let alice = create_test_user("alice", &connection);
            let account = create_account(alice.id, "checking", "A-1", &connection).unwrap();
            (alice, account)
        };
        let state = EditAccountState {
            db_connection: app_state.db_connection.clone(),
            lock_timeout: app_state.config.lock_timeout,
        };
        let form = EditAccountForm {
            account_type: None,
            account_number: Some("A-2".to_owned()),
        };

        let Json(updated) = edit_account_endpoint(
            State(state.clone()),
            Extension(alice.id),
            Ok(Path(account.id)),
            Ok(Json(form)),
        )
        .await
        .unwrap();

        assert_eq!(updated.account_number, "A-2");
        assert_eq!(updated.account_type, "checking");
        let connection = state.db_connection.lock().await;
        assert_eq!(get_account(account.id, &connection), Ok(updated));
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
        let state = EditAccountState {
            db_connection: app_state.db_connection.clone(),
            lock_timeout: app_state.config.lock_timeout,
        };
        let form = EditAccountForm {
            account_type: Some("savings".to_owned()),
            account_number: None,
        };

        let result = edit_account_endpoint(
            State(state.clone()),
            Extension(bob.id),
            Ok(Path(account.id)),
            Ok(Json(form)),
        )
        .await;

        assert_eq!(result.unwrap_err(), Error::NotFound);
        let connection = state.db_connection.lock().await;
        assert_eq!(get_account(account.id, &connection), Ok(account));
    }
}
