//! The transaction engine: checks a request to move money and applies it to
//! the account balances and the ledger in one SQL transaction.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    Error,
    account::{Account, set_balance},
    auth::UserID,
    authorization::get_owned_account,
    database_id::AccountId,
    money::{Amount, Balance},
    timestamp::Timestamp,
    transaction::core::{NewTransaction, Transaction, TransactionType, insert_transaction},
};

/// The longest description that will be stored.
const MAX_DESCRIPTION_LENGTH: usize = 255;

/// A request to move money, as sent by the client.
///
/// IDs and amounts are kept as raw JSON values so that both numbers and
/// numeric strings are accepted and bad values can be reported by field name.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TransactionRequest {
    /// The account to deposit into, withdraw from or transfer from.
    pub from_account_id: Option<Value>,
    /// One of "deposit", "withdrawal" or "transfer".
    #[serde(rename = "type")]
    pub transaction_type: Option<Value>,
    /// The amount of money to move, e.g. `150.00` or `"150.00"`.
    pub amount: Option<Value>,
    /// The account to transfer to. Required for transfers only.
    pub to_account_id: Option<Value>,
    /// A note about what the transaction is for.
    pub description: Option<String>,
}

/// A [TransactionRequest] whose fields have been parsed.
struct ParsedRequest {
    from_account_id: AccountId,
    transaction_type: String,
    amount: Amount,
    to_account_id: Option<AccountId>,
    description: Option<String>,
}

fn parse_account_id(field_name: &str, value: &Value) -> Result<AccountId, Error> {
    let id = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };

    id.ok_or_else(|| Error::Validation(format!("Invalid {field_name} format")))
}

fn parse_amount(value: &Value) -> Result<Amount, Error> {
    match value {
        Value::Number(number) => number.to_string().parse(),
        Value::String(text) => text.parse(),
        _ => Err(Error::Validation("Invalid amount format".to_owned())),
    }
}

fn parse_request(request: TransactionRequest) -> Result<ParsedRequest, Error> {
    let missing_fields: Vec<&str> = [
        ("from_account_id", request.from_account_id.is_none()),
        ("type", request.transaction_type.is_none()),
        ("amount", request.amount.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, is_missing)| is_missing.then_some(name))
    .collect();

    let (Some(from_account_id), Some(transaction_type), Some(amount)) = (
        request.from_account_id,
        request.transaction_type,
        request.amount,
    ) else {
        return Err(Error::Validation(format!(
            "Missing required fields: {}",
            missing_fields.join(", ")
        )));
    };

    let from_account_id = parse_account_id("from_account_id", &from_account_id)?;
    let amount = parse_amount(&amount)?;
    let to_account_id = request
        .to_account_id
        .as_ref()
        .map(|value| parse_account_id("to_account_id", value))
        .transpose()?;

    let transaction_type = match transaction_type {
        Value::String(text) => text,
        other => other.to_string(),
    };

    let description = request.description.filter(|text| !text.is_empty());
    if description
        .as_ref()
        .is_some_and(|text| text.chars().count() > MAX_DESCRIPTION_LENGTH)
    {
        return Err(Error::Validation(format!(
            "Description cannot be longer than {MAX_DESCRIPTION_LENGTH} characters"
        )));
    }

    Ok(ParsedRequest {
        from_account_id,
        transaction_type,
        amount,
        to_account_id,
        description,
    })
}

/// Load an account the caller is moving money with. Missing and foreign
/// accounts are both refused.
fn load_account(
    field_name: &str,
    id: AccountId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Account, Error> {
    get_owned_account(id, user_id, connection).map_err(|error| match error {
        Error::NotFound | Error::Forbidden(_) => {
            Error::Forbidden(format!("Unauthorized transaction: Invalid {field_name}"))
        }
        error => error,
    })
}

fn withdraw(account: &Account, amount: Amount, kind: TransactionType) -> Result<Balance, Error> {
    account
        .balance
        .withdraw(amount)
        .ok_or_else(|| Error::InsufficientFunds(kind.to_string()))
}

fn reject_to_account(
    transaction_type: TransactionType,
    to_account_id: Option<AccountId>,
) -> Result<(), Error> {
    match to_account_id {
        Some(_) => Err(Error::Validation(format!(
            "to_account_id is only allowed for transfers, not for a {transaction_type}"
        ))),
        None => Ok(()),
    }
}

fn deposit(account: &Account, amount: Amount) -> Result<Balance, Error> {
    account.balance.deposit(amount).ok_or_else(|| {
        Error::Validation(format!(
            "Depositing {amount} would exceed the largest balance account {} can hold",
            account.id
        ))
    })
}

/// Check `request` on behalf of `user_id` and apply it.
///
/// The balance changes and the new ledger entry are written in a single
/// `IMMEDIATE` SQL transaction on `connection`, so either all of them are
/// stored or none are.
///
/// # Errors
///
/// Returns an:
/// - [Error::Validation] if a field is missing or malformed, the amount is not
///   positive or has more than two decimal places, or the type is not supported,
/// - [Error::Forbidden] if an account does not exist or belongs to another user,
/// - [Error::InsufficientFunds] if a withdrawal or transfer exceeds the balance,
/// - [Error::LockTimeout] if the database stays busy,
/// - [Error::SqlError] if some other SQL error occurred.
pub fn apply_transaction(
    user_id: UserID,
    request: TransactionRequest,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let request = parse_request(request)?;

    let sql_transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;
    let now = Timestamp::now();

    let from_account = load_account(
        "from_account_id",
        request.from_account_id,
        user_id,
        &sql_transaction,
    )?;

    let transaction_type: TransactionType = request.transaction_type.parse()?;

    let to_account_id = match transaction_type {
        TransactionType::Deposit => {
            reject_to_account(transaction_type, request.to_account_id)?;
            let balance = deposit(&from_account, request.amount)?;
            set_balance(from_account.id, balance, now, &sql_transaction)?;
            None
        }
        TransactionType::Withdrawal => {
            reject_to_account(transaction_type, request.to_account_id)?;
            let balance = withdraw(&from_account, request.amount, transaction_type)?;
            set_balance(from_account.id, balance, now, &sql_transaction)?;
            None
        }
        TransactionType::Transfer => {
            let to_account_id = request.to_account_id.ok_or_else(|| {
                Error::Validation("Missing to_account_id for transfer".to_owned())
            })?;

            if to_account_id == from_account.id {
                return Err(Error::Validation(
                    "Cannot transfer to the same account".to_owned(),
                ));
            }

            let to_account =
                load_account("to_account_id", to_account_id, user_id, &sql_transaction)?;
            let from_balance = withdraw(&from_account, request.amount, transaction_type)?;
            let to_balance = deposit(&to_account, request.amount)?;
            set_balance(from_account.id, from_balance, now, &sql_transaction)?;
            set_balance(to_account.id, to_balance, now, &sql_transaction)?;
            Some(to_account.id)
        }
    };

    let transaction = insert_transaction(
        NewTransaction {
            from_account_id: from_account.id,
            to_account_id,
            amount: request.amount,
            transaction_type,
            description: request.description,
            created_at: now,
        },
        &sql_transaction,
    )?;

    sql_transaction.commit()?;

    tracing::info!(
        "User {user_id} applied {} {} of {} from account {}",
        transaction.transaction_type,
        transaction.id,
        transaction.amount,
        transaction.from_account_id
    );

    Ok(transaction)
}
