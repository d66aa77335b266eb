//! Defines the endpoints for reading the caller's ledger.

use std::{sync::Arc, time::Duration};

use axum::{
    Extension, Json,
    extract::{
        FromRef, Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
};
use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::{
    AppState, Error,
    auth::UserID,
    database_id::TransactionId,
    db::acquire_connection,
    transaction::{
        core::Transaction,
        query::{TransactionFilter, get_transaction_for_user, list_transactions},
    },
};

/// The state needed to read transactions.
#[derive(Debug, Clone)]
pub struct GetTransactionState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// How long to wait for the database connection.
    pub lock_timeout: Duration,
}

impl FromRef<AppState> for GetTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            lock_timeout: state.config.lock_timeout,
        }
    }
}

/// A route handler that lists the caller's transactions, optionally filtered
/// by `account_id`, `start_date` and `end_date` query parameters.
pub async fn list_transactions_endpoint(
    State(state): State<GetTransactionState>,
    Extension(user_id): Extension<UserID>,
    query: Result<Query<TransactionFilter>, QueryRejection>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let Query(filter) = query?;

    let connection = acquire_connection(&state.db_connection, state.lock_timeout).await?;

    list_transactions(user_id, &filter, &connection).map(Json)
}

/// A route handler that gets a single transaction touching one of the caller's accounts.
pub async fn get_transaction_endpoint(
    State(state): State<GetTransactionState>,
    Extension(user_id): Extension<UserID>,
    path: Result<Path<TransactionId>, PathRejection>,
) -> Result<Json<Transaction>, Error> {
    let Path(transaction_id) = path?;
    let connection = acquire_connection(&state.db_connection, state.lock_timeout).await?;

    get_transaction_for_user(transaction_id, user_id, &connection).map(Json)
}
