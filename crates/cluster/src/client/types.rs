//! Wire types for member REST endpoints.
//!
//! The validator API encodes u64 fields as JSON strings; the custom
//! deserializer below converts them on the way in.

use localnet_types::LedgerSnapshot;
use serde::{Deserialize, Serialize};

/// Response from the ledger-status endpoint (`GET /v1`).
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerInfoResponse {
    pub chain_id: u8,
    #[serde(deserialize_with = "deserialize_string_to_u64")]
    pub epoch: u64,
    #[serde(deserialize_with = "deserialize_string_to_u64")]
    pub ledger_version: u64,
    #[serde(deserialize_with = "deserialize_string_to_u64")]
    pub block_height: u64,
    #[serde(deserialize_with = "deserialize_string_to_u64")]
    pub ledger_timestamp: u64,
}

impl From<LedgerInfoResponse> for LedgerSnapshot {
    fn from(info: LedgerInfoResponse) -> Self {
        LedgerSnapshot {
            chain_id: info.chain_id,
            epoch: info.epoch,
            block_height: info.block_height,
            ledger_version: info.ledger_version,
            ledger_timestamp_usecs: info.ledger_timestamp,
        }
    }
}

/// Response from the account endpoint (`GET /v1/accounts/{address}`).
#[derive(Debug, Clone, Deserialize)]
pub struct AccountResponse {
    #[serde(deserialize_with = "deserialize_string_to_u64")]
    pub sequence_number: u64,
    #[serde(deserialize_with = "deserialize_string_to_u64")]
    pub balance: u64,
}

/// Request to submit a signed transfer (`POST /v1/transactions`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTransferRequest {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
    pub sequence_number: u64,
    pub expiration_timestamp_secs: u64,
    pub chain_id: u8,
    pub public_key: String,
    pub signature: String,
}

/// Response from transfer submission.
#[derive(Debug, Deserialize)]
pub struct SubmitTransferResponse {
    pub accepted: bool,
    pub hash: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response from the committed-transaction lookup
/// (`GET /v1/transactions/by_hash/{hash}`).
#[derive(Debug, Deserialize)]
pub struct TransactionStatusResponse {
    pub hash: String,
    pub success: bool,
    #[serde(default)]
    pub vm_status: Option<String>,
}

/// Deserialize a u64 encoded as a JSON string.
fn deserialize_string_to_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse::<u64>().map_err(serde::de::Error::custom)
}
