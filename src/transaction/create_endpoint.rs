//! Defines the endpoint for applying a deposit, withdrawal or transfer.

use std::{sync::Arc, time::Duration};

use axum::{
    Extension, Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
};
use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::{
    AppState, Error,
    auth::UserID,
    db::acquire_connection,
    transaction::{
        core::Transaction,
        engine::{TransactionRequest, apply_transaction},
    },
};

/// The state needed to apply a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// How long to wait for the database connection.
    pub lock_timeout: Duration,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            lock_timeout: state.config.lock_timeout,
        }
    }
}

/// A route handler for applying a transaction, responds with the recorded transaction.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    payload: Result<Json<TransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let Json(request) = payload?;

    let connection = acquire_connection(&state.db_connection, state.lock_timeout).await?;
    let transaction = apply_transaction(user_id, request, &connection)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension, Json,
        extract::State,
        http::StatusCode,
        response::IntoResponse,
    };
    use serde_json::json;

    use crate::{
        AppState, Error,
        account::get_account,
        money::Balance,
        test_utils::{create_test_account, create_test_user, get_json_body, get_test_app_state},
        transaction::{
            TransactionRequest, create_transaction_endpoint,
            create_endpoint::CreateTransactionState,
        },
    };

    fn get_state(app_state: &AppState) -> CreateTransactionState {
        CreateTransactionState {
            db_connection: app_state.db_connection.clone(),
            lock_timeout: app_state.config.lock_timeout,
        }
    }

    fn withdrawal(account_id: i64, amount: &str) -> TransactionRequest {
        TransactionRequest {
            from_account_id: Some(json!(account_id)),
            transaction_type: Some(json!("withdrawal")),
            amount: Some(json!(amount)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn responds_with_created_transaction() {
        let app_state = get_test_app_state();
        let (user, account) = {
            let connection = app_state.db_connection.lock().await;
            let user = create_test_user("alice", &connection);
            let account = create_test_account(user.id, "A-1", 100_00, &connection);
            (user, account)
        };

        let response = create_transaction_endpoint(
            State(get_state(&app_state)),
            Extension(user.id),
            Ok(Json(withdrawal(account.id, "25.50"))),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = get_json_body(response).await;
        assert_eq!(body["type"], "withdrawal");
        assert_eq!(body["amount"], "25.50");
        assert_eq!(body["from_account_id"], account.id);
        assert_eq!(body["to_account_id"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn times_out_when_ledger_is_busy() {
        let app_state = get_test_app_state();
        let (user, account) = {
            let connection = app_state.db_connection.lock().await;
            let user = create_test_user("alice", &connection);
            let account = create_test_account(user.id, "A-1", 100_00, &connection);
            (user, account)
        };
        let _held = app_state.db_connection.lock().await;

        let result = create_transaction_endpoint(
            State(get_state(&app_state)),
            Extension(user.id),
            Ok(Json(withdrawal(account.id, "1.00"))),
        )
        .await;

        assert!(matches!(result, Err(Error::LockTimeout)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_withdrawals_never_overdraw() {
        let app_state = get_test_app_state();
        let (user, account) = {
            let connection = app_state.db_connection.lock().await;
            let user = create_test_user("alice", &connection);
            let account = create_test_account(user.id, "A-1", 100_00, &connection);
            (user, account)
        };

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let state = get_state(&app_state);
                tokio::spawn(async move {
                    create_transaction_endpoint(
                        State(state),
                        Extension(user.id),
                        Ok(Json(withdrawal(account.id, "30.00"))),
                    )
                    .await
                })
            })
            .collect();

        let mut successes = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => successes += 1,
                Err(Error::InsufficientFunds(_)) => {}
                Err(error) => panic!("unexpected error: {error}"),
            }
        }

        assert_eq!(successes, 3);
        let connection = app_state.db_connection.lock().await;
        assert_eq!(
            get_account(account.id, &connection).unwrap().balance,
            Balance::from_cents(10_00).unwrap()
        );
    }
}
