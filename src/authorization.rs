//! The ownership check shared by every operation that touches an account.

use rusqlite::Connection;

use crate::{
    Error,
    account::{Account, get_account},
    auth::UserID,
    database_id::AccountId,
};

/// Check that `account` belongs to `user_id`.
///
/// # Errors
///
/// Returns [Error::Forbidden] if the account belongs to another user.
pub fn authorize_account(account: &Account, user_id: UserID) -> Result<(), Error> {
    if account.user_id == user_id {
        Ok(())
    } else {
        tracing::warn!(
            "User {user_id} tried to access account {} owned by user {}",
            account.id,
            account.user_id
        );
        Err(Error::Forbidden(format!(
            "You do not have access to account {}",
            account.id
        )))
    }
}

/// Get the open account `id` if it belongs to `user_id`.
///
/// # Errors
///
/// Returns an:
/// - [Error::NotFound] if the account does not exist or has been deleted,
/// - [Error::Forbidden] if the account belongs to another user.
pub fn get_owned_account(
    id: AccountId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Account, Error> {
    let account = get_account(id, connection)?;
    authorize_account(&account, user_id)?;

    Ok(account)
}
