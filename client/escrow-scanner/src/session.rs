use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anchor_lang::prelude::Pubkey;
use tracing::debug;

use crate::clock::Clock;
use crate::error::ScanError;
use crate::scanner::{EscrowScanner, WithdrawCandidate};
use crate::source::AccountSource;

/// Result of a [`ScanSession::refresh`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// No newer refresh was issued while this one ran
    Current {
        counterparty: Pubkey,
        candidates: Vec<WithdrawCandidate>,
    },
    /// A newer refresh superseded this one; its result must not be shown
    Stale { counterparty: Pubkey },
}

/// Re-scans on every counterparty change and keeps only the latest answer.
///
/// Each refresh takes a ticket from a shared generation counter. When the scan
/// completes, its result is returned only if the ticket is still the newest
/// one. Earlier refreshes still finish but report [`ScanOutcome::Stale`].
pub struct ScanSession<S, C> {
    scanner: Arc<EscrowScanner<S, C>>,
    generation: AtomicU64,
}

impl<S: AccountSource, C: Clock> ScanSession<S, C> {
    pub fn new(scanner: Arc<EscrowScanner<S, C>>) -> Self {
        Self {
            scanner,
            generation: AtomicU64::new(0),
        }
    }

    pub fn scanner(&self) -> &EscrowScanner<S, C> {
        &self.scanner
    }

    /// Discards every refresh still in flight, e.g. after a wallet disconnect
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub async fn refresh(&self, counterparty: Pubkey) -> Result<ScanOutcome, ScanError> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.scanner.scan(&counterparty).await;

        let latest = self.generation.load(Ordering::SeqCst);
        if latest != ticket {
            debug!(%counterparty, ticket, latest, "dropping stale escrow scan");
            return Ok(ScanOutcome::Stale { counterparty });
        }

        result.map(|candidates| ScanOutcome::Current {
            counterparty,
            candidates,
        })
    }
}
