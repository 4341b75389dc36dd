use crate::psp22::PSP22Error;

#[derive(Debug, Clone, PartialEq, Eq)]
#[ink::scale_derive(Encode, Decode, TypeInfo)]
pub enum PoolError {
    UnsupportedAsset,
    AssetAlreadySupported,
    /// Zero amount
    InvalidAmount,
    /// Null asset, receiver or owner
    InvalidAddress,
    InsufficientLiquidity,
    InsufficientDeposit,
    TransferFailed(PSP22Error),
    /// Receiver reported failure from `execute_operation`
    CallbackFailed,
    /// Pool custody after the callback is below balance before the loan plus fee
    RepaymentShortfall,
    Unauthorized,
    FeeTooHigh,
    Reentrant,
    Overflow,
}
