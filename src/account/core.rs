use rusqlite::{Connection, Row, params};
use serde::Serialize;

use crate::{
    Error,
    auth::UserID,
    authorization::get_owned_account,
    database_id::AccountId,
    money::Balance,
    timestamp::Timestamp,
};

/// The longest account type or account number that will be stored.
const MAX_FIELD_LENGTH: usize = 255;

/// A bank account owned by a single user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The user that owns the account.
    pub user_id: UserID,
    /// The kind of account, e.g. "checking" or "savings".
    pub account_type: String,
    /// The account number, unique across all users.
    pub account_number: String,
    /// The money held by the account.
    pub balance: Balance,
    /// When the account was opened.
    pub created_at: Timestamp,
    /// When the account's details or balance last changed.
    pub updated_at: Timestamp,
}

/// Changes to an account's details. Fields set to `None` are left as they are.
#[derive(Debug, Default, Clone)]
pub struct AccountChanges {
    /// The new account type.
    pub account_type: Option<String>,
    /// The new account number.
    pub account_number: Option<String>,
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            account_type TEXT NOT NULL,
            account_number TEXT NOT NULL UNIQUE,
            balance INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted_at TEXT,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE RESTRICT
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_account_user_id ON account(user_id)",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        account_type: row.get(2)?,
        account_number: row.get(3)?,
        balance: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Check an account type or number, returning it trimmed.
fn validate_field(field_name: &str, value: &str) -> Result<String, Error> {
    let value = value.trim();

    if value.is_empty() {
        return Err(Error::Validation(format!("{field_name} cannot be empty")));
    }

    if value.chars().count() > MAX_FIELD_LENGTH {
        return Err(Error::Validation(format!(
            "{field_name} cannot be longer than {MAX_FIELD_LENGTH} characters"
        )));
    }

    Ok(value.to_owned())
}

fn map_duplicate_number(error: rusqlite::Error, account_number: &str) -> Error {
    match error {
        // Code 2067 occurs when a UNIQUE constraint failed.
        rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
            if sql_error.extended_code == 2067 && desc.ends_with("account.account_number") =>
        {
            Error::DuplicateAccountNumber(account_number.to_owned())
        }
        error => error.into(),
    }
}

/// Open a new account for `user_id` with a zero balance.
///
/// # Errors
///
/// Returns an:
/// - [Error::Validation] if `account_type` or `account_number` is empty or too long,
/// - [Error::DuplicateAccountNumber] if the account number is already in use,
///   including by a deleted account,
/// - [Error::SqlError] if some other SQL related error occurred.
pub fn create_account(
    user_id: UserID,
    account_type: &str,
    account_number: &str,
    connection: &Connection,
) -> Result<Account, Error> {
    let account_type = validate_field("Account type", account_type)?;
    let account_number = validate_field("Account number", account_number)?;
    let now = Timestamp::now();
    let balance = Balance::zero();

    connection
        .execute(
            "INSERT INTO account (user_id, account_type, account_number, balance, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![user_id.as_i64(), account_type, account_number, balance, now],
        )
        .map_err(|error| map_duplicate_number(error, &account_number))?;

    Ok(Account {
        id: connection.last_insert_rowid(),
        user_id,
        account_type,
        account_number,
        balance,
        created_at: now,
        updated_at: now,
    })
}

/// Get the open account with `id`, whoever owns it.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no account with `id` or it has been deleted.
pub fn get_account(id: AccountId, connection: &Connection) -> Result<Account, Error> {
    connection
        .query_one(
            "SELECT id, user_id, account_type, account_number, balance, created_at, updated_at
            FROM account WHERE id = ?1 AND deleted_at IS NULL",
            params![id],
            map_row_to_account,
        )
        .map_err(Error::from)
}

/// Get the account with `id`, even if it has been deleted.
///
/// Used when checking access to the ledger history of an account.
pub fn get_account_including_deleted(
    id: AccountId,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .query_one(
            "SELECT id, user_id, account_type, account_number, balance, created_at, updated_at
            FROM account WHERE id = ?1",
            params![id],
            map_row_to_account,
        )
        .map_err(Error::from)
}

/// Get the open accounts owned by `user_id`, ordered by id.
pub fn list_accounts(user_id: UserID, connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, account_type, account_number, balance, created_at, updated_at
            FROM account WHERE user_id = ?1 AND deleted_at IS NULL
            ORDER BY id ASC",
        )?
        .query_map(params![user_id.as_i64()], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

/// Apply `changes` to the account `id` owned by `user_id`.
///
/// # Errors
///
/// Returns an:
/// - [Error::NotFound] if the account does not exist or has been deleted,
/// - [Error::Forbidden] if the account belongs to another user,
/// - [Error::Validation] if a new value is empty or too long,
/// - [Error::DuplicateAccountNumber] if the new account number is in use.
pub fn update_account(
    id: AccountId,
    user_id: UserID,
    changes: AccountChanges,
    connection: &Connection,
) -> Result<Account, Error> {
    let mut account = get_owned_account(id, user_id, connection)?;

    if let Some(account_type) = changes.account_type {
        account.account_type = validate_field("Account type", &account_type)?;
    }

    if let Some(account_number) = changes.account_number {
        account.account_number = validate_field("Account number", &account_number)?;
    }

    account.updated_at = Timestamp::now();

    connection
        .execute(
            "UPDATE account SET account_type = ?1, account_number = ?2, updated_at = ?3
            WHERE id = ?4",
            params![
                account.account_type,
                account.account_number,
                account.updated_at,
                account.id
            ],
        )
        .map_err(|error| map_duplicate_number(error, &account.account_number))?;

    Ok(account)
}

/// Close the account `id` owned by `user_id`.
///
/// The row is kept so that the transactions recorded against the account
/// stay intact, and its account number stays reserved.
///
/// # Errors
///
/// Returns an:
/// - [Error::NotFound] if the account does not exist or was already deleted,
/// - [Error::Forbidden] if the account belongs to another user,
/// - [Error::Validation] if the account still holds money.
pub fn delete_account(id: AccountId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let account = get_owned_account(id, user_id, connection)?;

    if account.balance != Balance::zero() {
        return Err(Error::Validation(format!(
            "Account {id} still holds {} and cannot be deleted",
            account.balance
        )));
    }

    let now = Timestamp::now();
    connection.execute(
        "UPDATE account SET deleted_at = ?1, updated_at = ?1 WHERE id = ?2",
        params![now, id],
    )?;

    Ok(())
}

/// Overwrite the balance of account `id`.
///
/// Only the transaction engine should call this, inside the same SQL
/// transaction that records the matching ledger entry.
pub fn set_balance(
    id: AccountId,
    balance: Balance,
    updated_at: Timestamp,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE account SET balance = ?1, updated_at = ?2 WHERE id = ?3 AND deleted_at IS NULL",
        params![balance, updated_at, id],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Report an account owned by another user as missing so that its existence
/// is not revealed to the caller.
pub fn hide_foreign_account(error: Error) -> Error {
    match error {
        Error::Forbidden(_) => Error::NotFound,
        error => error,
    }
}
