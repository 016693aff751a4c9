use anchor_lang::prelude::Pubkey;
use serde::{Deserialize, Serialize};

use crate::state::{account_discriminator, MemoPolicy, DISCRIMINATOR_LEN};

/// Everything the scanner needs to know about the deployed escrow program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Program that owns the escrow accounts
    #[serde(with = "pubkey_string")]
    pub program_id: Pubkey,

    /// When set, only accounts starting with these bytes are fetched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_discriminator: Option<[u8; DISCRIMINATOR_LEN]>,

    #[serde(default)]
    pub memo_policy: MemoPolicy,
}

impl ScannerConfig {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            account_discriminator: None,
            memo_policy: MemoPolicy::default(),
        }
    }

    /// Restricts the scan to one Anchor account type, e.g. `"Escrow"`
    pub fn with_account_name(mut self, name: &str) -> Self {
        self.account_discriminator = Some(account_discriminator(name));
        self
    }

    pub fn with_memo_policy(mut self, memo_policy: MemoPolicy) -> Self {
        self.memo_policy = memo_policy;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

mod pubkey_string {
    use std::str::FromStr;

    use anchor_lang::prelude::Pubkey;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(key: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(key)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Pubkey, D::Error> {
        let text = String::deserialize(deserializer)?;
        Pubkey::from_str(&text).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_minimal_json_with_defaults() {
        let program_id = Pubkey::new_unique();
        let config =
            ScannerConfig::from_json(&format!(r#"{{ "program_id": "{program_id}" }}"#)).unwrap();
        assert_eq!(config, ScannerConfig::new(program_id));
        assert_eq!(config.memo_policy, MemoPolicy::Strict);
    }

    #[test]
    fn loads_full_json() {
        let program_id = Pubkey::new_unique();
        let json = format!(
            r#"{{
                "program_id": "{program_id}",
                "account_discriminator": [1, 2, 3, 4, 5, 6, 7, 8],
                "memo_policy": "lossy"
            }}"#
        );
        let config = ScannerConfig::from_json(&json).unwrap();
        assert_eq!(config.account_discriminator, Some([1, 2, 3, 4, 5, 6, 7, 8]));
        assert_eq!(config.memo_policy, MemoPolicy::Lossy);
    }

    #[test]
    fn rejects_bad_program_id() {
        assert!(ScannerConfig::from_json(r#"{ "program_id": "not-a-key" }"#).is_err());
    }

    #[test]
    fn survives_json_round_trip() {
        let config = ScannerConfig::new(Pubkey::new_unique())
            .with_account_name("Escrow")
            .with_memo_policy(MemoPolicy::Lossy);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(ScannerConfig::from_json(&json).unwrap(), config);
    }
}
