//! Defines the core data models and database queries for ledger transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::{AccountId, TransactionId},
    money::Amount,
    timestamp::Timestamp,
};

// ============================================================================
// MODELS
// ============================================================================

/// The kind of money movement a transaction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money paid into an account.
    Deposit,
    /// Money taken out of an account.
    Withdrawal,
    /// Money moved from one account to another.
    Transfer,
}

impl TransactionType {
    fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Transfer => "transfer",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransactionType::Deposit),
            "withdrawal" => Ok(TransactionType::Withdrawal),
            "transfer" => Ok(TransactionType::Transfer),
            other => Err(Error::Validation(format!(
                "Invalid transaction type \"{other}\", expected one of deposit, withdrawal or transfer"
            ))),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A recorded movement of money. Transactions are never changed once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The account the money was deposited into, withdrawn from or transferred from.
    pub from_account_id: AccountId,
    /// The account the money was transferred to. Only set for transfers.
    pub to_account_id: Option<AccountId>,
    /// The amount of money moved.
    pub amount: Amount,
    /// What kind of movement this was.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
    /// When the transaction was applied.
    pub created_at: Timestamp,
}

/// A transaction that has been checked by the engine and is ready to be recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The account the money was deposited into, withdrawn from or transferred from.
    pub from_account_id: AccountId,
    /// The account the money was transferred to.
    pub to_account_id: Option<AccountId>,
    /// The amount of money moved.
    pub amount: Amount,
    /// What kind of movement this was.
    pub transaction_type: TransactionType,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
    /// When the transaction was applied.
    pub created_at: Timestamp,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Record `transaction` in the ledger.
///
/// The caller is responsible for updating the account balances in the same
/// SQL transaction.
///
/// # Errors
/// This function will return an [Error::SqlError] if the row violates one of
/// the table constraints or there is some other SQL error.
pub fn insert_transaction(
    transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (from_account_id, to_account_id, amount, type, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, from_account_id, to_account_id, amount, type, description, created_at",
        )?
        .query_row(
            (
                transaction.from_account_id,
                transaction.to_account_id,
                transaction.amount,
                transaction.transaction_type,
                transaction.description,
                transaction.created_at,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`, without checking
/// who may see it.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, from_account_id, to_account_id, amount, type, description, created_at
            FROM \"transaction\" WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Create the transaction table in the database.
///
/// The table is append-only: triggers abort any attempt to update or delete a row.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                from_account_id INTEGER NOT NULL,
                to_account_id INTEGER,
                amount INTEGER NOT NULL CHECK (amount > 0),
                type TEXT NOT NULL CHECK (type IN ('deposit', 'withdrawal', 'transfer')),
                description TEXT,
                created_at TEXT NOT NULL,
                CHECK ((type = 'transfer') = (to_account_id IS NOT NULL)),
                FOREIGN KEY(from_account_id) REFERENCES account(id) ON UPDATE RESTRICT ON DELETE RESTRICT,
                FOREIGN KEY(to_account_id) REFERENCES account(id) ON UPDATE RESTRICT ON DELETE RESTRICT
                )",
        (),
    )?;

    connection.execute(
        "CREATE TRIGGER IF NOT EXISTS transaction_no_update
        BEFORE UPDATE ON \"transaction\"
        BEGIN
            SELECT RAISE(ABORT, 'transactions cannot be changed');
        END",
        (),
    )?;

    connection.execute(
        "CREATE TRIGGER IF NOT EXISTS transaction_no_delete
        BEFORE DELETE ON \"transaction\"
        BEGIN
            SELECT RAISE(ABORT, 'transactions cannot be deleted');
        END",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_from_account ON \"transaction\"(from_account_id, created_at);",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_to_account ON \"transaction\"(to_account_id, created_at);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        from_account_id: row.get(1)?,
        to_account_id: row.get(2)?,
        amount: row.get(3)?,
        transaction_type: row.get(4)?,
        description: row.get(5)?,
        created_at: row.get(6)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
