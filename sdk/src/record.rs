//! Records held by the store account and the client's view of them

use crate::error::FetchError;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

/// A single submitted link and the address that submitted it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub link: String,
    #[serde(with = "base58_pubkey")]
    pub creator: Pubkey,
}

/// Addresses are rendered in base58, the way wallets and explorers show them
mod base58_pubkey {
    use serde::{Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;
    use std::str::FromStr;

    pub fn serialize<S>(pubkey: &Pubkey, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(pubkey)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Pubkey, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        Pubkey::from_str(&encoded).map_err(serde::de::Error::custom)
    }
}

/// Cached view of the store contents
///
/// `Uninitialized` covers both a store that was never created and a read that
/// failed; use [`StoreState`] when the two must be told apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordList {
    Uninitialized,
    Records(Vec<Record>),
}

impl RecordList {
    pub fn is_uninitialized(&self) -> bool {
        matches!(self, RecordList::Uninitialized)
    }

    /// Records in remote order, empty when uninitialized
    pub fn records(&self) -> &[Record] {
        match self {
            RecordList::Uninitialized => &[],
            RecordList::Records(records) => records,
        }
    }
}

/// Result of a single read of the store account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreState {
    /// The account does not exist yet
    Uninitialized,
    /// The account exists and decoded cleanly
    Populated(Vec<Record>),
    /// The read or the decode failed
    FetchFailed(FetchError),
}

impl From<StoreState> for RecordList {
    fn from(state: StoreState) -> Self {
        match state {
            StoreState::Populated(records) => RecordList::Records(records),
            StoreState::Uninitialized | StoreState::FetchFailed(_) => RecordList::Uninitialized,
        }
    }
}

/// On-chain item layout (matches the program's `ItemStruct`)
#[derive(Debug, Clone, BorshSerialize, BorshDeserialize)]
pub struct StoredItem {
    pub link: String,
    pub creator: [u8; 32],
}

/// On-chain account layout (matches the program's `BaseAccount`)
#[derive(Debug, Clone, Default, BorshSerialize, BorshDeserialize)]
pub struct StoreAccount {
    pub total_records: u64,
    pub records: Vec<StoredItem>,
}

impl StoreAccount {
    /// Decode an account payload, checking the 8-byte discriminator
    ///
    /// Anchor accounts are allocated with fixed space, so anything after the
    /// encoded struct is padding and is ignored.
    pub fn decode(data: &[u8], discriminator: &[u8; 8]) -> Result<Self, FetchError> {
        if data.len() < 8 {
            return Err(FetchError::Decode(format!(
                "account data too short: {} bytes",
                data.len()
            )));
        }
        if &data[..8] != discriminator {
            return Err(FetchError::Decode("unexpected account discriminator".to_string()));
        }

        let mut payload = &data[8..];
        StoreAccount::deserialize(&mut payload).map_err(|e| FetchError::Decode(e.to_string()))
    }

    /// Encode with discriminator, padded with zeros up to `space` bytes
    pub fn encode(&self, discriminator: &[u8; 8], space: usize) -> std::io::Result<Vec<u8>> {
        let mut data = discriminator.to_vec();
        data.extend_from_slice(&self.try_to_vec()?);
        if data.len() < space {
            data.resize(space, 0);
        }
        Ok(data)
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
            .into_iter()
            .map(|item| Record {
                link: item.link,
                creator: Pubkey::new_from_array(item.creator),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISC: [u8; 8] = [1, 2, 3, 4, 5, 6, 7, 8];

    fn sample_account() -> StoreAccount {
        StoreAccount {
            total_records: 2,
            records: vec![
                StoredItem {
                    link: "http://a".to_string(),
                    creator: [7u8; 32],
                },
                StoredItem {
                    link: "http://b".to_string(),
                    creator: [9u8; 32],
                },
            ],
        }
    }

    #[test]
    fn test_decode_ignores_trailing_padding() {
        let data = sample_account().encode(&DISC, 9000).unwrap();
        assert_eq!(data.len(), 9000);

        let decoded = StoreAccount::decode(&data, &DISC).unwrap();
        let records = decoded.into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].link, "http://a");
        assert_eq!(records[1].link, "http://b");
        assert_eq!(records[1].creator, Pubkey::new_from_array([9u8; 32]));
    }

    #[test]
    fn test_decode_rejects_foreign_discriminator() {
        let data = sample_account().encode(&[0u8; 8], 0).unwrap();
        let err = StoreAccount::decode(&data, &DISC).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_truncated_payload() {
        let data = sample_account().encode(&DISC, 0).unwrap();
        assert!(StoreAccount::decode(&data[..20], &DISC).is_err());
        assert!(StoreAccount::decode(&data[..4], &DISC).is_err());
    }

    #[test]
    fn test_record_json_uses_base58_creator() {
        let creator = Pubkey::new_from_array([9u8; 32]);
        let record = Record {
            link: "http://a".to_string(),
            creator,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["creator"], serde_json::json!(creator.to_string()));

        let parsed: Record = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, record);
        let bad = r#"{"link":"x","creator":"not-an-address"}"#;
        assert!(serde_json::from_str::<Record>(bad).is_err());
    }

    #[test]
    fn test_fetch_failed_collapses_to_uninitialized() {
        let state = StoreState::FetchFailed(FetchError::Decode("bad".to_string()));
        assert_eq!(RecordList::from(state), RecordList::Uninitialized);
        assert_eq!(
            RecordList::from(StoreState::Populated(vec![])),
            RecordList::Records(vec![])
        );
    }
}
