#![cfg_attr(not(feature = "std"), no_std, no_main)]

pub mod logic;
pub mod structs;

#[cfg(any(test, fuzzing))]
pub mod mock;


pub use self::flashpool::FlashPoolRef;
#[cfg(not(feature = "ink-as-dependency"))]
pub use self::flashpool::FlashPool;

#[ink::contract]
mod flashpool {
    use ink::prelude::vec::Vec;
    use ink::storage::{Lazy, Mapping, StorageVec};
    use traits::{Ownable, PoolError};
    use traits::psp22::PSP22Error;
    #[cfg(not(any(test, fuzzing)))]
    use traits::psp22::PSP22;
    #[cfg(not(any(test, fuzzing)))]
    use traits::FlashLoanReceiver;
    use crate::logic::{bps_of, is_null, require};
    use crate::structs::{ContractInfo, DEFAULT_FLASH_LOAN_FEE_BPS, MAX_FLASH_LOAN_FEE_BPS};

    #[ink(event)]
    pub struct FlashLoanExecuted {
        #[ink(topic)]
        pub borrower: AccountId,
        #[ink(topic)]
        pub asset: AccountId,
        pub receiver: AccountId,
        pub amount: u128,
        pub fee: u128,
        pub timestamp: Timestamp,
    }

    #[ink(event)]
    pub struct LiquidityDeposited {
        #[ink(topic)]
        pub provider: AccountId,
        #[ink(topic)]
        pub asset: AccountId,
        pub amount: u128,
        pub timestamp: Timestamp,
    }

    #[ink(event)]
    pub struct LiquidityWithdrawn {
        #[ink(topic)]
        pub provider: AccountId,
        #[ink(topic)]
        pub asset: AccountId,
        pub amount: u128,
        pub timestamp: Timestamp,
    }

    #[ink(event)]
    pub struct EmergencyWithdrawn {
        #[ink(topic)]
        pub owner: AccountId,
        #[ink(topic)]
        pub asset: AccountId,
        pub amount: u128,
        pub timestamp: Timestamp,
    }

    #[ink(event)]
    pub struct OwnershipTransferred {
        #[ink(topic)]
        pub previous_owner: AccountId,
        #[ink(topic)]
        pub new_owner: AccountId,
    }

    #[ink(storage)]
    pub struct FlashPool {
        pub owner: AccountId,
        pub flash_loan_fee_bps: u32,

        pub supported: Mapping<AccountId, bool>,
        // insertion order, removal swaps the last asset into the gap
        pub assets: StorageVec<AccountId>,

        // what the pool believes it custodies, per asset
        pub pool_balance: Mapping<AccountId, u128>,
        // (depositor, asset) -> withdrawable claim
        pub deposits: Mapping<(AccountId, AccountId), u128>,

        // kept out of the root struct so a nested call sees it immediately
        locked: Lazy<bool>,
    }

    impl FlashPool {
        #[ink(constructor)]
        pub fn new() -> Self {
            Self {
                owner: Self::env().caller(),
                flash_loan_fee_bps: DEFAULT_FLASH_LOAN_FEE_BPS,
                supported: Mapping::new(),
                assets: StorageVec::new(),
                pool_balance: Mapping::new(),
                deposits: Mapping::new(),
                locked: Lazy::new(),
            }
        }

        #[ink(constructor)]
        pub fn with_assets(assets: Vec<AccountId>) -> Self {
            let mut pool = Self::new();
            for asset in assets {
                pool.list_asset(asset);
            }
            pool
        }

        /// Lends `amount` of `asset` to `receiver` for the duration of its
        /// `execute_operation` callback.
        ///
        /// The loan is accepted only if, once the callback returns, the pool's
        /// real balance of `asset` grew by at least the fee. Pool storage is
        /// written only after that check, so a failed loan leaves it untouched.
        #[ink(message)]
        pub fn execute_flash_loan(&mut self, asset: AccountId, amount: u128, receiver: AccountId, params: Vec<u8>) -> Result<(), PoolError> {
            self.non_reentrant(|pool| pool.flash_loan(asset, amount, receiver, params))
        }

        #[ink(message)]
        pub fn provide_liquidity(&mut self, asset: AccountId, amount: u128) -> Result<(), PoolError> {
            self.non_reentrant(|pool| pool.deposit(asset, amount))
        }

        #[ink(message)]
        pub fn withdraw_liquidity(&mut self, asset: AccountId, amount: u128) -> Result<(), PoolError> {
            self.non_reentrant(|pool| pool.withdraw(asset, amount))
        }

        #[ink(message)]
        pub fn add_supported_asset(&mut self, asset: AccountId) -> Result<(), PoolError> {
            self.only_owner()?;
            require(!is_null(&asset), PoolError::InvalidAddress)?;
            require(!self.is_supported_asset(asset), PoolError::AssetAlreadySupported)?;

            self.list_asset(asset);
            Ok(())
        }

        #[ink(message)]
        pub fn remove_supported_asset(&mut self, asset: AccountId) -> Result<(), PoolError> {
            self.only_owner()?;
            require(self.is_supported_asset(asset), PoolError::UnsupportedAsset)?;

            self.unlist_asset(asset);
            Ok(())
        }

        #[ink(message)]
        pub fn set_flash_loan_fee(&mut self, fee_bps: u32) -> Result<(), PoolError> {
            self.only_owner()?;
            require(fee_bps <= MAX_FLASH_LOAN_FEE_BPS, PoolError::FeeTooHigh)?;

            self.flash_loan_fee_bps = fee_bps;
            Ok(())
        }

        #[ink(message)]
        pub fn initialize_with_assets(&mut self, assets: Vec<AccountId>) -> Result<(), PoolError> {
            self.batch_add_supported_assets(assets)
        }

        /// Lists every asset that is neither null nor already supported, skipping the rest.
        #[ink(message)]
        pub fn batch_add_supported_assets(&mut self, assets: Vec<AccountId>) -> Result<(), PoolError> {
            self.only_owner()?;
            for asset in assets {
                self.list_asset(asset);
            }
            Ok(())
        }

        /// Sends `amount` of `asset` from pool custody to the owner without
        /// touching pool balances or deposits, which may be stale afterwards.
        #[ink(message)]
        pub fn emergency_withdraw(&mut self, asset: AccountId, amount: u128) -> Result<(), PoolError> {
            self.non_reentrant(|pool| {
                pool.only_owner()?;
                let owner = pool.owner;
                psp22_transfer(asset, owner, amount).map_err(PoolError::TransferFailed)?;

                pool.env().emit_event(EmergencyWithdrawn {
                    owner,
                    asset,
                    amount,
                    timestamp: pool.env().block_timestamp(),
                });
                Ok(())
            })
        }

        #[ink(message)]
        pub fn get_pool_balance(&self, asset: AccountId) -> u128 {
            self.pool_balance.get(asset).unwrap_or(0)
        }

        #[ink(message)]
        pub fn get_user_deposit(&self, user: AccountId, asset: AccountId) -> u128 {
            self.deposits.get((user, asset)).unwrap_or(0)
        }

        #[ink(message)]
        pub fn get_supported_assets(&self) -> Vec<AccountId> {
            (0..self.assets.len()).filter_map(|index| self.assets.get(index)).collect()
        }

        #[ink(message)]
        pub fn is_supported_asset(&self, asset: AccountId) -> bool {
            self.supported.get(asset).unwrap_or(false)
        }

        #[ink(message)]
        pub fn flash_loan_fee_bps(&self) -> u32 {
            self.flash_loan_fee_bps
        }

        #[ink(message)]
        pub fn calculate_flash_loan_fee(&self, amount: u128) -> u128 {
            bps_of(amount, self.flash_loan_fee_bps)
        }

        #[ink(message)]
        pub fn get_contract_info(&self) -> ContractInfo {
            ContractInfo {
                owner: self.owner,
                flash_loan_fee_bps: self.flash_loan_fee_bps,
                asset_count: self.assets.len(),
                assets: self.get_supported_assets(),
            }
        }

        /// Largest loan currently available for `asset`, zero if it is not supported.
        #[ink(message)]
        pub fn max_flash_loan(&self, asset: AccountId) -> u128 {
            if self.is_supported_asset(asset) {
                self.get_pool_balance(asset)
            } else {
                0
            }
        }

        #[ink(message)]
        pub fn flash_fee(&self, asset: AccountId, amount: u128) -> Result<u128, PoolError> {
            require(self.is_supported_asset(asset), PoolError::UnsupportedAsset)?;
            Ok(self.calculate_flash_loan_fee(amount))
        }

        /// Runs `op` holding the reentrancy lock. The lock is released on every
        /// return path; a trap reverts the whole message, lock included.
        fn non_reentrant<T, F>(&mut self, op: F) -> Result<T, PoolError>
        where
            F: FnOnce(&mut Self) -> Result<T, PoolError>,
        {
            require(!self.locked.get().unwrap_or(false), PoolError::Reentrant)?;
            self.locked.set(&true);
            let result = op(self);
            self.locked.set(&false);
            result
        }

        fn only_owner(&self) -> Result<(), PoolError> {
            require(self.env().caller() == self.owner, PoolError::Unauthorized)
        }

        fn ensure_supported(&self, asset: AccountId) -> Result<(), PoolError> {
            require(self.is_supported_asset(asset), PoolError::UnsupportedAsset)
        }

        fn list_asset(&mut self, asset: AccountId) {
            if is_null(&asset) || self.is_supported_asset(asset) {
                return;
            }
            self.supported.insert(asset, &true);
            self.assets.push(&asset);
        }

        fn unlist_asset(&mut self, asset: AccountId) {
            self.supported.remove(asset);
            let len = self.assets.len();
            let Some(index) = (0..len).find(|&index| self.assets.get(index) == Some(asset)) else {
                return;
            };
            if let Some(last) = self.assets.pop() {
                if index + 1 < len {
                    self.assets.set(index, &last);
                }
            }
        }

        fn set_deposit(&mut self, user: AccountId, asset: AccountId, amount: u128) {
            if amount != 0 {
                self.deposits.insert((user, asset), &amount);
            } else {
                self.deposits.remove((user, asset));
            }
        }

        fn flash_loan(&mut self, asset: AccountId, amount: u128, receiver: AccountId, params: Vec<u8>) -> Result<(), PoolError> {
            let borrower = self.env().caller();
            let this = self.env().account_id();

            self.ensure_supported(asset)?;
            require(amount > 0, PoolError::InvalidAmount)?;
            require(!is_null(&receiver), PoolError::InvalidAddress)?;
            require(self.get_pool_balance(asset) >= amount, PoolError::InsufficientLiquidity)?;

            let fee = self.calculate_flash_loan_fee(amount);
            let balance_before = psp22_balance_of(asset, this);
            let required = balance_before.checked_add(fee).ok_or(PoolError::Overflow)?;

            psp22_transfer(asset, receiver, amount).map_err(PoolError::TransferFailed)?;
            let success = self.call_receiver(receiver, asset, amount, fee, params);
            require(success, PoolError::CallbackFailed)?;

            // only the observed balance is trusted, never the callback's word
            let balance_after = psp22_balance_of(asset, this);
            require(balance_after >= required, PoolError::RepaymentShortfall)?;

            self.pool_balance.insert(asset, &balance_after);
            self.env().emit_event(FlashLoanExecuted {
                borrower,
                asset,
                receiver,
                amount,
                fee,
                timestamp: self.env().block_timestamp(),
            });
            Ok(())
        }

        fn deposit(&mut self, asset: AccountId, amount: u128) -> Result<(), PoolError> {
            let caller = self.env().caller();
            let this = self.env().account_id();

            self.ensure_supported(asset)?;
            require(amount > 0, PoolError::InvalidAmount)?;

            let new_balance = self.get_pool_balance(asset).checked_add(amount).ok_or(PoolError::Overflow)?;
            let new_deposit = self.get_user_deposit(caller, asset).checked_add(amount).ok_or(PoolError::Overflow)?;

            psp22_transfer_from(asset, caller, this, amount).map_err(PoolError::TransferFailed)?;

            self.pool_balance.insert(asset, &new_balance);
            self.set_deposit(caller, asset, new_deposit);
            self.env().emit_event(LiquidityDeposited {
                provider: caller,
                asset,
                amount,
                timestamp: self.env().block_timestamp(),
            });
            Ok(())
        }

        fn withdraw(&mut self, asset: AccountId, amount: u128) -> Result<(), PoolError> {
            let caller = self.env().caller();

            self.ensure_supported(asset)?;
            require(amount > 0, PoolError::InvalidAmount)?;
            let deposit = self.get_user_deposit(caller, asset);
            require(deposit >= amount, PoolError::InsufficientDeposit)?;
            let balance = self.get_pool_balance(asset);
            require(balance >= amount, PoolError::InsufficientLiquidity)?;

            self.set_deposit(caller, asset, deposit - amount);
            self.pool_balance.insert(asset, &(balance - amount));

            if let Err(error) = psp22_transfer(asset, caller, amount) {
                self.set_deposit(caller, asset, deposit);
                self.pool_balance.insert(asset, &balance);
                return Err(PoolError::TransferFailed(error));
            }

            self.env().emit_event(LiquidityWithdrawn {
                provider: caller,
                asset,
                amount,
                timestamp: self.env().block_timestamp(),
            });
            Ok(())
        }

        #[cfg(not(any(test, fuzzing)))]
        fn call_receiver(&mut self, receiver: AccountId, asset: AccountId, amount: u128, fee: u128, params: Vec<u8>) -> bool {
            let mut receiver: ink::contract_ref!(FlashLoanReceiver) = receiver.into();
            receiver.execute_operation(asset, amount, fee, params)
        }

        #[cfg(any(test, fuzzing))]
        fn call_receiver(&mut self, receiver: AccountId, asset: AccountId, amount: u128, fee: u128, params: Vec<u8>) -> bool {
            use crate::mock::{self, Borrower, Reentry};

            let Some(borrower) = mock::borrower(receiver) else {
                return false;
            };
            let due = amount.saturating_add(fee);
            let (repayment, success) = match borrower {
                Borrower::Repay { surplus } => (due.saturating_add(surplus), true),
                Borrower::RepayPrincipal => (amount, true),
                Borrower::Keep => (0, true),
                Borrower::Refuse => (due, false),
                Borrower::Reenter(reentry) => {
                    let caller = self.env().caller();
                    ink::env::test::set_caller::<ink::env::DefaultEnvironment>(receiver);
                    let result = match reentry {
                        Reentry::FlashLoan => self.execute_flash_loan(asset, amount, receiver, params),
                        Reentry::ProvideLiquidity => self.provide_liquidity(asset, amount),
                        Reentry::WithdrawLiquidity => self.withdraw_liquidity(asset, amount),
                    };
                    ink::env::test::set_caller::<ink::env::DefaultEnvironment>(caller);
                    mock::record_reentry(result);
                    (due, true)
                }
            };
            if repayment > 0 && mock::transfer(asset, receiver, self.env().account_id(), repayment).is_err() {
                return false;
            }
            success
        }
    }

    impl Ownable for FlashPool {
        #[ink(message)]
        fn owner(&self) -> AccountId {
            self.owner
        }

        #[ink(message)]
        fn transfer_ownership(&mut self, new_owner: AccountId) -> Result<(), PoolError> {
            self.only_owner()?;
            require(!is_null(&new_owner), PoolError::InvalidAddress)?;

            let previous_owner = self.owner;
            self.owner = new_owner;
            self.env().emit_event(OwnershipTransferred { previous_owner, new_owner });
            Ok(())
        }
    }

    #[cfg(not(any(test, fuzzing)))]
    fn psp22_balance_of(token: AccountId, owner: AccountId) -> u128 {
        let token: ink::contract_ref!(PSP22) = token.into();
        token.balance_of(owner)
    }

    #[cfg(any(test, fuzzing))]
    fn psp22_balance_of(token: AccountId, owner: AccountId) -> u128 {
        crate::mock::balance_of(token, owner)
    }

    #[cfg(not(any(test, fuzzing)))]
    fn psp22_transfer(token: AccountId, to: AccountId, value: u128) -> Result<(), PSP22Error> {
        let mut token: ink::contract_ref!(PSP22) = token.into();
        token.transfer(to, value, Vec::new())
    }

    #[cfg(any(test, fuzzing))]
    fn psp22_transfer(token: AccountId, to: AccountId, value: u128) -> Result<(), PSP22Error> {
        let this = ink::env::account_id::<ink::env::DefaultEnvironment>();
        crate::mock::transfer(token, this, to, value)
    }

    #[cfg(not(any(test, fuzzing)))]
    fn psp22_transfer_from(token: AccountId, from: AccountId, to: AccountId, value: u128) -> Result<(), PSP22Error> {
        let mut token: ink::contract_ref!(PSP22) = token.into();
        token.transfer_from(from, to, value, Vec::new())
    }

    #[cfg(any(test, fuzzing))]
    fn psp22_transfer_from(token: AccountId, from: AccountId, to: AccountId, value: u128) -> Result<(), PSP22Error> {
        crate::mock::transfer(token, from, to, value)
    }
}
