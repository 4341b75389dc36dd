//! In-process stand-ins for the PSP22 ledger and borrower contracts.
//!
//! The off-chain environment cannot dispatch cross-contract calls, so under
//! `cfg(any(test, fuzzing))` the pool routes its collaborator calls here.
use std::cell::RefCell;
use std::collections::HashMap;

use ink::prelude::string::ToString;
use ink::primitives::AccountId;
use traits::psp22::PSP22Error;
use traits::PoolError;

/// Which guarded message a reentering borrower tries to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reentry {
    FlashLoan,
    ProvideLiquidity,
    WithdrawLiquidity,
}

/// Scripted behaviour of a flash loan receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Borrower {
    /// Sends back principal, fee and `surplus`, reports success.
    Repay { surplus: u128 },
    /// Sends back the principal only.
    RepayPrincipal,
    /// Keeps the loan and still reports success.
    Keep,
    /// Sends back principal and fee but reports failure.
    Refuse,
    /// Calls back into the pool with the loan amount, then repays in full.
    Reenter(Reentry),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Ledger {
    /// (token, holder) -> balance
    balances: HashMap<(AccountId, AccountId), u128>,
    fail_next_transfer: bool,
}

thread_local! {
    static LEDGER: RefCell<Ledger> = RefCell::new(Ledger::default());
    static BORROWERS: RefCell<HashMap<AccountId, Borrower>> = RefCell::new(HashMap::new());
    static REENTRIES: RefCell<Vec<Result<(), PoolError>>> = RefCell::new(Vec::new());
}

pub fn reset() {
    LEDGER.with(|l| *l.borrow_mut() = Ledger::default());
    BORROWERS.with(|b| b.borrow_mut().clear());
    REENTRIES.with(|r| r.borrow_mut().clear());
}

pub fn mint(token: AccountId, holder: AccountId, value: u128) {
    LEDGER.with(|l| {
        let mut ledger = l.borrow_mut();
        let balance = ledger.balances.entry((token, holder)).or_insert(0);
        *balance = balance.saturating_add(value);
    });
}

pub fn balance_of(token: AccountId, holder: AccountId) -> u128 {
    LEDGER.with(|l| l.borrow().balances.get(&(token, holder)).copied().unwrap_or(0))
}

/// Makes the next `transfer` or `transfer_from` report failure.
pub fn fail_next_transfer() {
    LEDGER.with(|l| l.borrow_mut().fail_next_transfer = true);
}

pub fn transfer(token: AccountId, from: AccountId, to: AccountId, value: u128) -> Result<(), PSP22Error> {
    LEDGER.with(|l| {
        let mut ledger = l.borrow_mut();
        if ledger.fail_next_transfer {
            ledger.fail_next_transfer = false;
            return Err(PSP22Error::Custom("transfer rejected".to_string()));
        }
        let from_balance = ledger.balances.get(&(token, from)).copied().unwrap_or(0);
        let new_from_balance = from_balance.checked_sub(value).ok_or(PSP22Error::InsufficientBalance)?;
        if from != to {
            let to_balance = ledger.balances.get(&(token, to)).copied().unwrap_or(0);
            ledger.balances.insert((token, from), new_from_balance);
            ledger.balances.insert((token, to), to_balance.saturating_add(value));
        }
        Ok(())
    })
}

pub fn snapshot() -> Ledger {
    LEDGER.with(|l| l.borrow().clone())
}

pub fn restore(ledger: Ledger) {
    LEDGER.with(|l| *l.borrow_mut() = ledger);
}

pub fn set_borrower(account: AccountId, borrower: Borrower) {
    BORROWERS.with(|b| {
        b.borrow_mut().insert(account, borrower);
    });
}

pub fn borrower(account: AccountId) -> Option<Borrower> {
    BORROWERS.with(|b| b.borrow().get(&account).copied())
}

pub fn record_reentry(result: Result<(), PoolError>) {
    REENTRIES.with(|r| r.borrow_mut().push(result));
}

/// Results of every nested call attempted by reentering borrowers, oldest first.
pub fn reentries() -> Vec<Result<(), PoolError>> {
    REENTRIES.with(|r| r.borrow().clone())
}
