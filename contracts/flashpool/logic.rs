use ink::primitives::AccountId;
use primitive_types::U256;

pub const BPS_DENOMINATOR: u128 = 10_000;
pub const ZERO_ADDRESS: [u8; 32] = [0; 32];

pub fn require<E>(condition: bool, error: E) -> Result<(), E> {
    if condition {
        Ok(())
    } else {
        Err(error)
    }
}

pub fn is_null(account: &AccountId) -> bool {
    *account == AccountId::from(ZERO_ADDRESS)
}

pub fn mulw(a: u128, b: u128) -> U256 {
    U256::from(a) * U256::from(b)
}

/// floor(amount * bps / 10_000)
pub fn bps_of(amount: u128, bps: u32) -> u128 {
    let w = mulw(amount, bps as u128) / U256::from(BPS_DENOMINATOR);
    // fee rates never exceed the denominator, so the quotient fits
    w.low_u128()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bps_of_floors() {
        assert_eq!(bps_of(100_000, 9), 90);
        assert_eq!(bps_of(1_111, 9), 0);
        assert_eq!(bps_of(11_112, 9), 10);
        assert_eq!(bps_of(0, 100), 0);
    }

    #[test]
    fn bps_of_does_not_overflow() {
        assert_eq!(bps_of(u128::MAX, 100), u128::MAX / 100);
        assert_eq!(bps_of(u128::MAX, 10_000), u128::MAX);
    }

    #[test]
    fn null_address() {
        assert!(is_null(&AccountId::from(ZERO_ADDRESS)));
        assert!(!is_null(&AccountId::from([1; 32])));
    }
}
