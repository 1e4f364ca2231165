//! The account that holds the balance, and the endpoint for reading it.

mod balance_endpoint;
mod core;

pub use balance_endpoint::{BalanceResponse, get_balance_endpoint};
pub use core::{
    Account, create_account_table, ensure_account, get_account, get_balance, save_balance,
};
