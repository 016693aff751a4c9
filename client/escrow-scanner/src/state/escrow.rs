use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::hash::hash;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::state::SolAmount;

/// Anchor account discriminator length
pub const DISCRIMINATOR_LEN: usize = 8;

// Byte offsets inside the escrow account data
pub const SELLER_OFFSET: usize = 8;
pub const BUYER_OFFSET: usize = 40;
pub const TRANSACTION_ID_OFFSET: usize = 72;
pub const AMOUNT_OFFSET: usize = 80;
pub const REFUND_DEADLINE_OFFSET: usize = 96;
pub const MEMO_OFFSET: usize = 109;

/// Smallest buffer that still holds every fixed field. The memo may be empty.
pub const MIN_RECORD_LEN: usize = MEMO_OFFSET;

/// What to do with memo bytes that are not valid UTF-8
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoPolicy {
    /// Reject the record with [`CodecError::EncodingError`]
    #[default]
    Strict,
    /// Replace invalid sequences with U+FFFD and keep the record
    Lossy,
}

/// Decoded form of one escrow account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscrowRecord {
    pub seller: Pubkey,         // owner of the escrow, matched by the scan filter
    pub buyer: Pubkey,          // party that funded the escrow
    pub transaction_id: u64,    // id chosen by the buyer when paying
    pub amount: u64,            // lamports held for the payment
    pub refund_deadline: i64,   // unix seconds
    pub memo: String,           // free text, NUL padding removed
}

impl EscrowRecord {
    /// Decodes an escrow account with the strict memo policy.
    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        Self::decode_with(data, MemoPolicy::Strict)
    }

    /// Decodes every field at its fixed offset. Integers are little-endian.
    ///
    /// Buffers shorter than [`MIN_RECORD_LEN`] are rejected before any field
    /// is read.
    pub fn decode_with(data: &[u8], memo_policy: MemoPolicy) -> Result<Self, CodecError> {
        if data.len() < MIN_RECORD_LEN {
            return Err(CodecError::MalformedRecord {
                expected: MIN_RECORD_LEN,
                actual: data.len(),
            });
        }

        Ok(Self {
            seller: Pubkey::new_from_array(array_at(data, SELLER_OFFSET)),
            buyer: Pubkey::new_from_array(array_at(data, BUYER_OFFSET)),
            transaction_id: u64::from_le_bytes(array_at(data, TRANSACTION_ID_OFFSET)),
            amount: u64::from_le_bytes(array_at(data, AMOUNT_OFFSET)),
            refund_deadline: i64::from_le_bytes(array_at(data, REFUND_DEADLINE_OFFSET)),
            memo: decode_memo(&data[MEMO_OFFSET..], memo_policy)?,
        })
    }

    /// Writes the record back into the account layout.
    ///
    /// Bytes the layout does not assign stay zero and the memo is NUL-padded
    /// up to `memo_capacity`.
    pub fn encode(
        &self,
        discriminator: [u8; DISCRIMINATOR_LEN],
        memo_capacity: usize,
    ) -> Result<Vec<u8>, CodecError> {
        let memo = self.memo.as_bytes();
        if memo.len() > memo_capacity {
            return Err(CodecError::MemoTooLong {
                len: memo.len(),
                capacity: memo_capacity,
            });
        }

        let mut data = vec![0u8; MIN_RECORD_LEN + memo_capacity];
        data[..DISCRIMINATOR_LEN].copy_from_slice(&discriminator);
        data[SELLER_OFFSET..SELLER_OFFSET + 32].copy_from_slice(self.seller.as_ref());
        data[BUYER_OFFSET..BUYER_OFFSET + 32].copy_from_slice(self.buyer.as_ref());
        data[TRANSACTION_ID_OFFSET..TRANSACTION_ID_OFFSET + 8]
            .copy_from_slice(&self.transaction_id.to_le_bytes());
        data[AMOUNT_OFFSET..AMOUNT_OFFSET + 8].copy_from_slice(&self.amount.to_le_bytes());
        data[REFUND_DEADLINE_OFFSET..REFUND_DEADLINE_OFFSET + 8]
            .copy_from_slice(&self.refund_deadline.to_le_bytes());
        data[MEMO_OFFSET..MEMO_OFFSET + memo.len()].copy_from_slice(memo);
        Ok(data)
    }

    /// True once the refund deadline lies strictly before `now` (unix seconds)
    pub fn is_expired(&self, now: i64) -> bool {
        self.refund_deadline < now
    }

    /// The held amount in SOL, exact to the lamport
    pub fn amount_as_decimal(&self) -> SolAmount {
        SolAmount::from_lamports(self.amount)
    }
}

/// Anchor discriminator of an account type: `sha256("account:<name>")[..8]`
pub fn account_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let digest = hash(format!("account:{name}").as_bytes()).to_bytes();
    let mut discriminator = [0u8; DISCRIMINATOR_LEN];
    discriminator.copy_from_slice(&digest[..DISCRIMINATOR_LEN]);
    discriminator
}

// Callers check the buffer length first
fn array_at<const N: usize>(data: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&data[offset..offset + N]);
    out
}

fn decode_memo(bytes: &[u8], policy: MemoPolicy) -> Result<String, CodecError> {
    let text = match policy {
        MemoPolicy::Strict => std::str::from_utf8(bytes)?.to_owned(),
        MemoPolicy::Lossy => String::from_utf8_lossy(bytes).into_owned(),
    };
    Ok(text.replace('\0', "").trim().to_owned())
}
