use anchor_lang::prelude::Pubkey;
use async_trait::async_trait;

/// Error reported by an [`AccountSource`]
pub type QueryError = Box<dyn std::error::Error + Send + Sync>;

/// Exact byte match at a fixed offset of the account data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemcmpFilter {
    pub offset: usize,
    pub bytes: Vec<u8>,
}

impl MemcmpFilter {
    pub fn new(offset: usize, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            offset,
            bytes: bytes.into(),
        }
    }

    pub fn matches(&self, data: &[u8]) -> bool {
        self.offset
            .checked_add(self.bytes.len())
            .and_then(|end| data.get(self.offset..end))
            .is_some_and(|window| window == self.bytes.as_slice())
    }
}

/// Account payload as returned by the storage layer
#[derive(Debug, Clone, PartialEq)]
pub enum AccountData {
    /// Raw account bytes
    Binary(Vec<u8>),
    /// Data the storage layer already parsed into JSON
    Parsed(serde_json::Value),
}

impl AccountData {
    /// The flat byte buffer, if there is one
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AccountData::Binary(bytes) => Some(bytes),
            AccountData::Parsed(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawAccount {
    pub address: Pubkey,
    pub lamports: u64,
    pub data: AccountData,
}

/// Read-only query over the accounts owned by a program
#[async_trait]
pub trait AccountSource: Send + Sync {
    /// Returns every account of `program_id` matching all `filters`, in the
    /// order the storage layer yields them.
    async fn program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[MemcmpFilter],
    ) -> Result<Vec<RawAccount>, QueryError>;
}

/// Accounts held in memory, filtered the same way a node filters them
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccounts {
    accounts: Vec<(Pubkey, RawAccount)>,
}

impl InMemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, owner: Pubkey, account: RawAccount) {
        self.accounts.push((owner, account));
    }
}

#[async_trait]
impl AccountSource for InMemoryAccounts {
    async fn program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[MemcmpFilter],
    ) -> Result<Vec<RawAccount>, QueryError> {
        Ok(self
            .accounts
            .iter()
            .filter(|(owner, _)| owner == program_id)
            .filter(|(_, account)| match account.data.as_bytes() {
                Some(data) => filters.iter().all(|filter| filter.matches(data)),
                // Parsed payloads cannot be compared byte-wise
                None => filters.is_empty(),
            })
            .map(|(_, account)| account.clone())
            .collect())
    }
}
