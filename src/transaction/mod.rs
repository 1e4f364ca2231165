//! Transactions recorded against the account.
//!
//! This module contains:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing and querying transaction rows
//! - Route handlers for the transaction API
//!
//! Changes that must keep the balance in sync go through [crate::ledger].

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod query_endpoint;

pub use core::{
    Transaction, TransactionBuilder, TransactionType, create_transaction_table,
    delete_transaction_row, existing_transaction_ids, get_transaction, get_transactions,
    insert_transaction, reconcile_transaction_sequence, update_transaction_row,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use query_endpoint::{get_transaction_endpoint, get_transactions_endpoint};

#[cfg(test)]
pub use core::count_transactions;
