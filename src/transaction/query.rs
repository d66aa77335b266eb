//! Read-side queries over the ledger, scoped to the accounts a user owns.

use rusqlite::{Connection, params};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    account::get_account_including_deleted,
    auth::UserID,
    authorization::authorize_account,
    database_id::{AccountId, TransactionId},
    timestamp::{DATE_FORMAT, format_date_bound},
    transaction::core::{Transaction, get_transaction, map_transaction_row},
};

/// Filters for listing transactions, read from the query string.
///
/// Dates are written as `YYYY-MM-DD` and both bounds are inclusive.
/// Empty parameters, e.g. `?account_id=`, are treated as absent.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TransactionFilter {
    /// Only include transactions to or from this account.
    pub account_id: Option<String>,
    /// Only include transactions created on or after this day.
    pub start_date: Option<String>,
    /// Only include transactions created on or before this day.
    pub end_date: Option<String>,
}

fn parse_account_id(text: Option<&str>) -> Result<Option<AccountId>, Error> {
    match text.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text.parse().map(Some).map_err(|_| {
            Error::Validation(format!("Invalid account_id \"{text}\", expected an integer"))
        }),
    }
}

fn parse_date(field_name: &str, text: Option<&str>) -> Result<Option<Date>, Error> {
    match text.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => Date::parse(text, DATE_FORMAT).map(Some).map_err(|_| {
            Error::Validation(format!("Invalid {field_name} \"{text}\", expected YYYY-MM-DD"))
        }),
    }
}

/// Get the transactions to or from any account `user_id` owns, including
/// accounts that have since been deleted.
///
/// Transactions are ordered by when they were created, oldest first.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if a date is malformed or the start date is after the end date,
/// - [Error::NotFound] if the account filter names an account that does not exist,
/// - [Error::Forbidden] if the account filter names another user's account,
/// - [Error::SqlError] if there is some other SQL error.
pub fn list_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let account_id = parse_account_id(filter.account_id.as_deref())?;
    let start_date = parse_date("start_date", filter.start_date.as_deref())?;
    let end_date = parse_date("end_date", filter.end_date.as_deref())?;

    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(Error::Validation(format!(
                "start_date {start} is after end_date {end}"
            )));
        }
    }

    if let Some(account_id) = account_id {
        let account = get_account_including_deleted(account_id, connection)?;
        authorize_account(&account, user_id)?;
    }

    let start_bound = start_date.map(format_date_bound);
    // Every timestamp on the end date sorts before the start of the next day.
    let end_bound = end_date.and_then(Date::next_day).map(format_date_bound);

    connection
        .prepare(
            "SELECT id, from_account_id, to_account_id, amount, type, description, created_at
            FROM \"transaction\"
            WHERE (from_account_id IN (SELECT id FROM account WHERE user_id = ?1)
                OR to_account_id IN (SELECT id FROM account WHERE user_id = ?1))
            AND (?2 IS NULL OR from_account_id = ?2 OR to_account_id = ?2)
            AND (?3 IS NULL OR created_at >= ?3)
            AND (?4 IS NULL OR created_at < ?4)
            ORDER BY created_at ASC, id ASC",
        )?
        .query_map(
            params![user_id.as_i64(), account_id, start_bound, end_bound],
            map_transaction_row,
        )?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}

/// Get the transaction `id` if it moved money to or from an account `user_id` owns.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction,
/// - [Error::Forbidden] if none of the transaction's accounts belong to `user_id`,
/// - [Error::SqlError] if there is some other SQL error.
pub fn get_transaction_for_user(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = get_transaction(id, connection)?;

    let from_account = get_account_including_deleted(transaction.from_account_id, connection)?;
    let authorized = match (authorize_account(&from_account, user_id), transaction.to_account_id) {
        (Ok(()), _) => Ok(()),
        (Err(_), Some(to_account_id)) => {
            let to_account = get_account_including_deleted(to_account_id, connection)?;
            authorize_account(&to_account, user_id)
        }
        (Err(error), None) => Err(error),
    };

    authorized.map(|_| transaction)
}
