mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod get_endpoint;

pub use crate::database_id::AccountId;
pub use core::{
    Account, create_account_table, get_account, get_account_including_deleted, set_balance,
};
pub use create_endpoint::create_account_endpoint;
pub use delete_endpoint::delete_account_endpoint;
pub use edit_endpoint::edit_account_endpoint;
pub use get_endpoint::{get_account_endpoint, list_accounts_endpoint};

#[cfg(test)]
pub use core::{create_account, delete_account};
