mod support;

use std::sync::Arc;

use anchor_lang::prelude::Pubkey;
use async_trait::async_trait;
use escrow_scanner::{
    AccountSource, EscrowScanner, FixedClock, InMemoryAccounts, MemcmpFilter, QueryError,
    RawAccount, ScanOutcome, ScanSession, ScannerConfig, SELLER_OFFSET,
};
use support::{account, record, source_with};
use tokio::sync::Notify;

/// Holds queries for one seller until released
struct GatedSource {
    inner: InMemoryAccounts,
    slow_seller: Pubkey,
    entered: Arc<Notify>,
    release: Arc<Notify>,
    fail_slow: bool,
}

#[async_trait]
impl AccountSource for GatedSource {
    async fn program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[MemcmpFilter],
    ) -> Result<Vec<RawAccount>, QueryError> {
        let slow = filters
            .iter()
            .any(|f| f.offset == SELLER_OFFSET && f.bytes == self.slow_seller.to_bytes());
        if slow {
            self.entered.notify_one();
            self.release.notified().await;
            if self.fail_slow {
                return Err("node went away".into());
            }
        }
        self.inner.program_accounts(program_id, filters).await
    }
}

fn gated_session(
    fail_slow: bool,
) -> (
    Arc<ScanSession<GatedSource, FixedClock>>,
    Pubkey,
    Pubkey,
    Arc<Notify>,
    Arc<Notify>,
) {
    let old_key = Pubkey::new_unique();
    let new_key = Pubkey::new_unique();
    let (program, inner) = source_with(vec![
        account(&record(old_key, 1, 10, 0), 10),
        account(&record(new_key, 2, 10, 0), 10),
    ]);
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let source = GatedSource {
        inner,
        slow_seller: old_key,
        entered: entered.clone(),
        release: release.clone(),
        fail_slow,
    };
    let scanner = EscrowScanner::with_clock(ScannerConfig::new(program), source, FixedClock(1));
    let session = Arc::new(ScanSession::new(Arc::new(scanner)));
    (session, old_key, new_key, entered, release)
}

#[tokio::test]
async fn latest_refresh_wins() {
    let (session, old_key, new_key, entered, release) = gated_session(false);

    let pending = tokio::spawn({
        let session = session.clone();
        async move { session.refresh(old_key).await }
    });
    entered.notified().await;

    match session.refresh(new_key).await.unwrap() {
        ScanOutcome::Current {
            counterparty,
            candidates,
        } => {
            assert_eq!(counterparty, new_key);
            assert_eq!(candidates.len(), 1);
            assert_eq!(candidates[0].seller, new_key.to_string());
        }
        other => panic!("expected current result, got {other:?}"),
    }

    release.notify_one();
    let stale = pending.await.unwrap().unwrap();
    assert_eq!(stale, ScanOutcome::Stale { counterparty: old_key });
}

#[tokio::test]
async fn failures_of_superseded_scans_are_discarded_too() {
    let (session, old_key, new_key, entered, release) = gated_session(true);

    let pending = tokio::spawn({
        let session = session.clone();
        async move { session.refresh(old_key).await }
    });
    entered.notified().await;

    assert!(matches!(
        session.refresh(new_key).await.unwrap(),
        ScanOutcome::Current { .. }
    ));

    release.notify_one();
    assert_eq!(
        pending.await.unwrap().unwrap(),
        ScanOutcome::Stale { counterparty: old_key }
    );
}

#[tokio::test]
async fn invalidate_discards_in_flight_scan() {
    let (session, old_key, _, entered, release) = gated_session(false);

    let pending = tokio::spawn({
        let session = session.clone();
        async move { session.refresh(old_key).await }
    });
    entered.notified().await;
    session.invalidate();
    release.notify_one();

    assert_eq!(
        pending.await.unwrap().unwrap(),
        ScanOutcome::Stale { counterparty: old_key }
    );
}

#[tokio::test]
async fn sequential_refreshes_are_all_current() {
    let seller = Pubkey::new_unique();
    let (program, source) = source_with(vec![account(&record(seller, 1, 10, 0), 10)]);
    let scanner = EscrowScanner::with_clock(ScannerConfig::new(program), source, FixedClock(1));
    let session = ScanSession::new(Arc::new(scanner));

    for _ in 0..3 {
        match session.refresh(seller).await.unwrap() {
            ScanOutcome::Current { candidates, .. } => assert_eq!(candidates.len(), 1),
            other => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(session.scanner().config().program_id, program);
}
