use std::fmt;
use std::str::FromStr;

use anchor_lang::prelude::Pubkey;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::ScannerConfig;
use crate::error::{CodecError, ScanError};
use crate::source::{AccountSource, MemcmpFilter, RawAccount};
use crate::state::{EscrowRecord, SolAmount, SELLER_OFFSET};

/// An escrow the seller can withdraw right now.
///
/// Identities and the transaction id are kept as strings so the presentation
/// layer never pushes them through a lossy number type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithdrawCandidate {
    pub address: String,
    pub seller: String,
    pub buyer: String,
    pub transaction_id: String,
    pub amount: SolAmount,
    pub refund_deadline: i64,
    pub memo: String,
}

impl WithdrawCandidate {
    fn new(address: &Pubkey, record: EscrowRecord) -> Self {
        Self {
            address: address.to_string(),
            seller: record.seller.to_string(),
            buyer: record.buyer.to_string(),
            transaction_id: record.transaction_id.to_string(),
            amount: record.amount_as_decimal(),
            refund_deadline: record.refund_deadline,
            memo: record.memo,
        }
    }

    /// Identity handed to the withdrawal action together with the transaction id
    pub fn counterparty(&self) -> &str {
        &self.buyer
    }

    /// `None` when the deadline is outside chrono's representable range
    pub fn deadline_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.refund_deadline, 0)
    }
}

/// Sum of all candidate amounts, `None` on overflow
pub fn total_amount(candidates: &[WithdrawCandidate]) -> Option<SolAmount> {
    candidates
        .iter()
        .try_fold(SolAmount::ZERO, |total, candidate| total.checked_add(candidate.amount))
}

/// Why an account did not become a candidate
#[derive(Debug)]
enum Skip {
    NotBinary,
    Malformed(CodecError),
    ForeignSeller(Pubkey),
    Underfunded { lamports: u64, amount: u64 },
    NotExpired { deadline: i64 },
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skip::NotBinary => f.write_str("account data is not a byte buffer"),
            Skip::Malformed(err) => write!(f, "{err}"),
            Skip::ForeignSeller(seller) => write!(f, "escrow belongs to {seller}"),
            Skip::Underfunded { lamports, amount } => {
                write!(f, "balance {lamports} does not cover amount {amount}")
            }
            Skip::NotExpired { deadline } => write!(f, "refund deadline {deadline} not reached"),
        }
    }
}

/// Finds the escrows of one seller that are past their refund deadline
pub struct EscrowScanner<S, C = SystemClock> {
    config: ScannerConfig,
    source: S,
    clock: C,
}

impl<S: AccountSource> EscrowScanner<S> {
    pub fn new(config: ScannerConfig, source: S) -> Self {
        Self::with_clock(config, source, SystemClock)
    }
}

impl<S: AccountSource, C: Clock> EscrowScanner<S, C> {
    pub fn with_clock(config: ScannerConfig, source: S, clock: C) -> Self {
        Self {
            config,
            source,
            clock,
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Filters sent to the account source for `counterparty`
    pub fn filters_for(&self, counterparty: &Pubkey) -> Vec<MemcmpFilter> {
        let mut filters = Vec::with_capacity(2);
        if let Some(discriminator) = self.config.account_discriminator {
            filters.push(MemcmpFilter::new(0, discriminator));
        }
        filters.push(MemcmpFilter::new(SELLER_OFFSET, counterparty.to_bytes()));
        filters
    }

    /// Runs one query and one decode pass.
    ///
    /// Only the query can fail the scan. Accounts that cannot be decoded, are
    /// not backed by enough lamports or have not expired are left out. The
    /// result keeps the order of the account source.
    pub async fn scan(&self, counterparty: &Pubkey) -> Result<Vec<WithdrawCandidate>, ScanError> {
        let now = self.clock.unix_timestamp();
        let filters = self.filters_for(counterparty);

        let accounts = self
            .source
            .program_accounts(&self.config.program_id, &filters)
            .await
            .map_err(ScanError::QueryFailed)?;

        let fetched = accounts.len();
        let candidates: Vec<_> = accounts
            .iter()
            .filter_map(|account| match self.evaluate(account, counterparty, now) {
                Ok(record) => Some(WithdrawCandidate::new(&account.address, record)),
                Err(Skip::ForeignSeller(seller)) => {
                    warn!(address = %account.address, %seller, %counterparty, "source returned escrow of another seller");
                    None
                }
                Err(reason) => {
                    debug!(address = %account.address, %reason, "escrow skipped");
                    None
                }
            })
            .collect();

        info!(%counterparty, fetched, eligible = candidates.len(), now, "escrow scan finished");
        Ok(candidates)
    }

    /// Parses `counterparty` as a base58 identity and scans for it
    pub async fn scan_str(&self, counterparty: &str) -> Result<Vec<WithdrawCandidate>, ScanError> {
        let counterparty = Pubkey::from_str(counterparty)
            .map_err(|_| ScanError::InvalidIdentity(counterparty.to_owned()))?;
        self.scan(&counterparty).await
    }

    fn evaluate(
        &self,
        account: &RawAccount,
        counterparty: &Pubkey,
        now: i64,
    ) -> Result<EscrowRecord, Skip> {
        let data = account.data.as_bytes().ok_or(Skip::NotBinary)?;
        let record =
            EscrowRecord::decode_with(data, self.config.memo_policy).map_err(Skip::Malformed)?;

        if record.seller != *counterparty {
            return Err(Skip::ForeignSeller(record.seller));
        }
        if account.lamports < record.amount {
            return Err(Skip::Underfunded {
                lamports: account.lamports,
                amount: record.amount,
            });
        }
        if !record.is_expired(now) {
            return Err(Skip::NotExpired {
                deadline: record.refund_deadline,
            });
        }
        Ok(record)
    }
}
