//! Signed peer-to-peer transfer construction.
//!
//! Transfers are signed over a canonical byte encoding and identified by
//! the content hash of that encoding plus the signature. The submitting
//! node derives the same hash, so inclusion can be polled before the
//! submission response arrives.

use crate::client::SubmitTransferRequest;
use crate::error::FundingError;
use localnet_types::AccountKey;
use sha2::{Digest, Sha256};

/// Domain separation tag for transfer signatures.
const TRANSFER_TAG: &[u8] = b"localnet::transfer::v1";

/// Hash of a submitted transaction, lowercase hex.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxHash(pub String);

impl std::fmt::Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An unsigned account-to-account transfer.
#[derive(Clone, Debug)]
pub struct TransferPayload {
    /// Sender address, lowercase hex without `0x`.
    pub sender: String,
    /// Recipient address, lowercase hex without `0x`. If the recipient has
    /// no account yet, the transfer implicitly creates it.
    pub recipient: String,
    /// Amount in base units.
    pub amount: u64,
    /// Sender's next sequence number.
    pub sequence_number: u64,
    /// Unix expiration timestamp, seconds.
    pub expiration_timestamp_secs: u64,
    /// Chain the transfer is valid on.
    pub chain_id: u8,
}

impl TransferPayload {
    /// Canonical byte encoding: tag, chain id, length-prefixed addresses,
    /// then the fixed-width numeric fields, all little-endian.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, FundingError> {
        let sender = decode_address(&self.sender)?;
        let recipient = decode_address(&self.recipient)?;

        let mut bytes = Vec::with_capacity(TRANSFER_TAG.len() + sender.len() + recipient.len() + 33);
        bytes.extend_from_slice(TRANSFER_TAG);
        bytes.push(self.chain_id);
        bytes.extend_from_slice(&(sender.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&sender);
        bytes.extend_from_slice(&(recipient.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&recipient);
        bytes.extend_from_slice(&self.amount.to_le_bytes());
        bytes.extend_from_slice(&self.sequence_number.to_le_bytes());
        bytes.extend_from_slice(&self.expiration_timestamp_secs.to_le_bytes());
        Ok(bytes)
    }

    /// Sign the canonical encoding with the sender's key.
    pub fn sign(self, key: &AccountKey) -> Result<SignedTransfer, FundingError> {
        let canonical = self.canonical_bytes()?;
        let signature = key.sign(&canonical);

        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        hasher.update(signature.to_bytes());
        let hash = TxHash(hex::encode(hasher.finalize()));

        Ok(SignedTransfer {
            payload: self,
            public_key: key.public_key_hex(),
            signature: hex::encode(signature.to_bytes()),
            hash,
        })
    }
}

/// A transfer ready for submission.
#[derive(Clone, Debug)]
pub struct SignedTransfer {
    pub payload: TransferPayload,
    pub public_key: String,
    pub signature: String,
    pub hash: TxHash,
}

impl SignedTransfer {
    /// Build the submission request body.
    pub fn to_request(&self) -> SubmitTransferRequest {
        SubmitTransferRequest {
            sender: self.payload.sender.clone(),
            recipient: self.payload.recipient.clone(),
            amount: self.payload.amount,
            sequence_number: self.payload.sequence_number,
            expiration_timestamp_secs: self.payload.expiration_timestamp_secs,
            chain_id: self.payload.chain_id,
            public_key: self.public_key.clone(),
            signature: self.signature.clone(),
        }
    }
}

/// Normalize an account address to lowercase hex without a `0x` prefix.
pub fn normalize_address(address: &str) -> Result<String, FundingError> {
    let trimmed = address.trim_start_matches("0x").to_lowercase();
    if trimmed.is_empty() || hex::decode(&trimmed).is_err() {
        return Err(FundingError::InvalidAddress(address.to_string()));
    }
    Ok(trimmed)
}

fn decode_address(address: &str) -> Result<Vec<u8>, FundingError> {
    hex::decode(address).map_err(|_| FundingError::InvalidAddress(address.to_string()))
}
