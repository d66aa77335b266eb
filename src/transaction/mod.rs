//! The ledger of money movements.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the append-only transaction table
//! - The engine that applies deposits, withdrawals and transfers atomically
//! - Queries for reading a user's ledger
//! - The HTTP handlers for the above

mod core;
mod create_endpoint;
mod engine;
mod get_endpoint;
mod query;

pub use crate::database_id::TransactionId;
pub use core::{Transaction, TransactionType, create_transaction_table};
pub use create_endpoint::create_transaction_endpoint;
pub use engine::TransactionRequest;
pub use get_endpoint::{get_transaction_endpoint, list_transactions_endpoint};
pub use query::TransactionFilter;
