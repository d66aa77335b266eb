//! Database initialization and access to the shared connection.

use std::time::Duration;

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use tokio::sync::{Mutex, MutexGuard};

use crate::{
    Error, account::create_account_table, auth::create_user_table,
    transaction::create_transaction_table,
};

/// Create the tables for the domain models if they do not already exist.
///
/// Also turns on foreign key enforcement for `connection`.
///
/// # Errors
///
/// Returns an [Error::SqlError] if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Has no effect inside a transaction, so it must be set first.
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_account_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Lock the shared database connection, waiting at most `timeout`.
///
/// The lock is released when the returned guard is dropped.
///
/// # Errors
///
/// Returns [Error::LockTimeout] if the connection is still held by another
/// request once `timeout` has passed.
pub async fn acquire_connection(
    connection: &Mutex<Connection>,
    timeout: Duration,
) -> Result<MutexGuard<'_, Connection>, Error> {
    tokio::time::timeout(timeout, connection.lock())
        .await
        .map_err(|_| {
            tracing::warn!("Timed out after {timeout:?} waiting for the database lock");
            Error::LockTimeout
        })
}
