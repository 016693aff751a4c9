#![allow(dead_code)]

use anchor_lang::prelude::Pubkey;
use escrow_scanner::{
    account_discriminator, AccountData, EscrowRecord, InMemoryAccounts, RawAccount,
};

pub const MEMO_CAPACITY: usize = 64;

pub fn record(seller: Pubkey, transaction_id: u64, amount: u64, deadline: i64) -> EscrowRecord {
    EscrowRecord {
        seller,
        buyer: Pubkey::new_unique(),
        transaction_id,
        amount,
        refund_deadline: deadline,
        memo: "netflix, standard plan".to_owned(),
    }
}

pub fn account(record: &EscrowRecord, lamports: u64) -> RawAccount {
    RawAccount {
        address: Pubkey::new_unique(),
        lamports,
        data: AccountData::Binary(
            record
                .encode(account_discriminator("Escrow"), MEMO_CAPACITY)
                .unwrap(),
        ),
    }
}

/// Program id plus an in-memory source pre-loaded with `accounts`
pub fn source_with(accounts: Vec<RawAccount>) -> (Pubkey, InMemoryAccounts) {
    let program = Pubkey::new_unique();
    let mut source = InMemoryAccounts::new();
    for account in accounts {
        source.insert(program, account);
    }
    (program, source)
}
