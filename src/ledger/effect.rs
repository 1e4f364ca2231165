//! The signed effect of a transaction on the account balance.

use crate::{Error, account::Account, money::Money, transaction::TransactionType};

/// The balance after a transaction of `kind` and `amount` is applied.
///
/// # Errors
/// Returns [Error::InvalidInput] if the new balance is too large to represent.
pub fn apply_effect(balance: Money, kind: TransactionType, amount: Money) -> Result<Money, Error> {
    match kind {
        TransactionType::Deposit => balance.checked_add(amount),
        TransactionType::Expense => balance.checked_sub(amount),
    }
    .ok_or_else(|| out_of_range(balance, amount))
}

/// The balance after a transaction of `kind` and `amount` is taken back out.
///
/// This is the exact inverse of [apply_effect].
///
/// # Errors
/// Returns [Error::InvalidInput] if the new balance is too large to represent.
pub fn reverse_effect(
    balance: Money,
    kind: TransactionType,
    amount: Money,
) -> Result<Money, Error> {
    match kind {
        TransactionType::Deposit => balance.checked_sub(amount),
        TransactionType::Expense => balance.checked_add(amount),
    }
    .ok_or_else(|| out_of_range(balance, amount))
}

/// Whether applying the transaction to `balance` would take it below zero.
///
/// Only expenses are checked, a deposit can always go ahead.
pub fn would_overdraw(balance: Money, kind: TransactionType, amount: Money) -> Result<bool, Error> {
    if kind == TransactionType::Deposit {
        return Ok(false);
    }

    apply_effect(balance, kind, amount).map(|balance| balance.is_negative())
}

/// Add the net change of a batch to `balance`.
///
/// # Errors
/// Returns [Error::InvalidInput] if the new balance is too large to represent.
pub fn apply_net_change(balance: Money, net_change: Money) -> Result<Money, Error> {
    balance
        .checked_add(net_change)
        .ok_or_else(|| out_of_range(balance, net_change))
}

fn out_of_range(balance: Money, amount: Money) -> Error {
    Error::InvalidInput(format!("amount {amount} is out of range for a balance of {balance}"))
}

impl Account {
    /// Apply a transaction to the in-memory balance.
    pub fn apply(&mut self, kind: TransactionType, amount: Money) -> Result<(), Error> {
        self.balance = apply_effect(self.balance, kind, amount)?;
        Ok(())
    }

    /// Take a transaction back out of the in-memory balance.
    pub fn reverse(&mut self, kind: TransactionType, amount: Money) -> Result<(), Error> {
        self.balance = reverse_effect(self.balance, kind, amount)?;
        Ok(())
    }
}
