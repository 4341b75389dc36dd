#![no_main]

use flashpool::mock::{self, Borrower, Reentry};
use flashpool::FlashPool;
use ink::env::DefaultEnvironment;
use ink::primitives::AccountId;
use libfuzzer_sys::arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use traits::PoolError;

const POOL: [u8; 32] = [0x10; 32];
const ADMIN: [u8; 32] = [0x4; 32];
const USERS: [[u8; 32]; 3] = [[0x8; 32], [0x9; 32], [0xa; 32]];
const RECEIVER: [u8; 32] = [0xb; 32];
const ASSETS: [[u8; 32]; 2] = [[0x20; 32], [0x21; 32]];

#[derive(Arbitrary, Debug, Clone, Copy)]
enum Behaviour {
    Repay { surplus: u16 },
    RepayPrincipal,
    Keep,
    Refuse,
    Reenter(u8),
}

#[derive(Arbitrary, Debug)]
enum Method {
    Provide {
        caller: u8,
        asset: bool,
        amount: u64,
        transfer_error: bool,
    },
    Withdraw {
        caller: u8,
        asset: bool,
        amount: u64,
        transfer_error: bool,
    },
    FlashLoan {
        caller: u8,
        asset: bool,
        amount: u64,
        behaviour: Behaviour,
    },
    SetFee {
        fee_bps: u8,
    },
    Delist {
        asset: bool,
    },
    Relist {
        asset: bool,
    },
}

fn user(index: u8) -> AccountId {
    AccountId::from(USERS[index as usize % USERS.len()])
}

fn asset(second: bool) -> AccountId {
    AccountId::from(ASSETS[second as usize])
}

fn borrower(behaviour: Behaviour) -> Borrower {
    match behaviour {
        Behaviour::Repay { surplus } => Borrower::Repay { surplus: surplus as u128 },
        Behaviour::RepayPrincipal => Borrower::RepayPrincipal,
        Behaviour::Keep => Borrower::Keep,
        Behaviour::Refuse => Borrower::Refuse,
        Behaviour::Reenter(kind) => Borrower::Reenter(match kind % 3 {
            0 => Reentry::FlashLoan,
            1 => Reentry::ProvideLiquidity,
            _ => Reentry::WithdrawLiquidity,
        }),
    }
}

fn set_caller(caller: AccountId) {
    ink::env::test::set_caller::<DefaultEnvironment>(caller);
    ink::env::test::set_callee::<DefaultEnvironment>(AccountId::from(POOL));
}

/// Failed messages revert every token movement they made, as on chain.
fn dispatch(op: impl FnOnce() -> Result<(), PoolError>) -> Result<(), PoolError> {
    let ledger = mock::snapshot();
    let result = op();
    if result.is_err() {
        mock::restore(ledger);
    }
    result
}

fn check(pool: &FlashPool) {
    for asset in ASSETS.map(AccountId::from) {
        let claims: u128 = USERS
            .iter()
            .map(|user| pool.get_user_deposit(AccountId::from(*user), asset))
            .sum();
        let balance = pool.get_pool_balance(asset);
        assert!(claims <= balance, "claims {} exceed pool balance {}", claims, balance);
        assert_eq!(balance, mock::balance_of(asset, AccountId::from(POOL)));
    }
    assert!(mock::reentries().iter().all(|r| *r == Err(PoolError::Reentrant)));
}

fuzz_target!(|methods: Vec<Method>| {
    ink::env::test::run_test::<DefaultEnvironment, _>(|_| {
        mock::reset();
        for user in USERS.iter().chain([RECEIVER].iter()) {
            for token in ASSETS {
                mock::mint(AccountId::from(token), AccountId::from(*user), u64::MAX as u128);
            }
        }
        set_caller(AccountId::from(ADMIN));
        let mut pool = FlashPool::with_assets(ASSETS.map(AccountId::from).to_vec());

        for method in methods {
            let _ = match method {
                Method::Provide { caller, asset: a, amount, transfer_error } => {
                    set_caller(user(caller));
                    if transfer_error {
                        mock::fail_next_transfer();
                    }
                    dispatch(|| pool.provide_liquidity(asset(a), amount as u128))
                }
                Method::Withdraw { caller, asset: a, amount, transfer_error } => {
                    set_caller(user(caller));
                    if transfer_error {
                        mock::fail_next_transfer();
                    }
                    dispatch(|| pool.withdraw_liquidity(asset(a), amount as u128))
                }
                Method::FlashLoan { caller, asset: a, amount, behaviour } => {
                    set_caller(user(caller));
                    mock::set_borrower(AccountId::from(RECEIVER), borrower(behaviour));
                    dispatch(|| pool.execute_flash_loan(asset(a), amount as u128, AccountId::from(RECEIVER), Vec::new()))
                }
                Method::SetFee { fee_bps } => {
                    set_caller(AccountId::from(ADMIN));
                    dispatch(|| pool.set_flash_loan_fee(fee_bps as u32))
                }
                Method::Delist { asset: a } => {
                    set_caller(AccountId::from(ADMIN));
                    dispatch(|| pool.remove_supported_asset(asset(a)))
                }
                Method::Relist { asset: a } => {
                    set_caller(AccountId::from(ADMIN));
                    dispatch(|| pool.add_supported_asset(asset(a)))
                }
            };
            check(&pool);
        }
        Ok(())
    })
    .unwrap();
});
