use ink::prelude::vec::Vec;
use ink::primitives::AccountId;

/// 0.09%
pub const DEFAULT_FLASH_LOAN_FEE_BPS: u32 = 9;
/// 1%
pub const MAX_FLASH_LOAN_FEE_BPS: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
#[ink::scale_derive(Encode, Decode, TypeInfo)]
pub struct ContractInfo {
    pub owner: AccountId,
    pub flash_loan_fee_bps: u32,
    pub asset_count: u32,
    pub assets: Vec<AccountId>,
}
