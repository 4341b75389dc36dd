#![cfg_attr(not(feature = "std"), no_std, no_main)]

pub mod errors;
pub mod psp22;

use ink::primitives::AccountId;
use ink::prelude::vec::Vec;
pub use errors::PoolError;

#[ink::trait_definition]
pub trait FlashLoanReceiver {
    /// Called by the pool after `amount` of `asset` has been sent to the receiver.
    /// Before returning, the receiver must have moved at least `amount + fee`
    /// of `asset` back into the pool's custody.
    #[ink(message)]
    fn execute_operation(&mut self, asset: AccountId, amount: u128, fee: u128, params: Vec<u8>) -> bool;
}

#[ink::trait_definition]
pub trait Ownable {
    #[ink(message)]
    fn owner(&self) -> AccountId;
    /// Hands every admin capability over to `new_owner`
    #[ink(message)]
    fn transfer_ownership(&mut self, new_owner: AccountId) -> Result<(), PoolError>;
}
