//! Funding subsystem: one-time bootstrap and the peer-to-peer faucet.
//!
//! Bootstrap is the only point in the system where the privileged genesis
//! root account moves value: it seeds each validator's own account, then
//! the root key is dropped and never touched again. Every later faucet
//! call is an ordinary peer-to-peer transfer from a randomly selected
//! funded validator, so application code under test sees exactly the
//! account-funding semantics of a real network.

mod transfer;

pub use transfer::{normalize_address, SignedTransfer, TransferPayload, TxHash};

use crate::client::MemberClient;
use crate::error::{FundingError, TimeoutError};
use localnet_types::{AccountKey, MemberHandle, LOCAL_CHAIN_ID};
use rand::Rng;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Transfers expire this long after signing.
const TRANSFER_EXPIRY_SECS: u64 = 60;

/// A funded validator account the faucet can spend from.
///
/// The cached sequence number is only valid while no one else spends from
/// this account; it is invalidated on any submission failure and re-fetched
/// from the chain on the next use.
struct FaucetSlot {
    key: AccountKey,
    next_sequence: Option<u64>,
}

/// Funding state owned by the cluster handle.
///
/// The funded flag is monotonic: it is set exactly once, when bootstrap
/// succeeds, and faucet calls before that point fail fast.
pub struct FundingState {
    claimed: AtomicBool,
    pool: OnceLock<Vec<Mutex<FaucetSlot>>>,
}

impl FundingState {
    pub fn new() -> Self {
        Self {
            claimed: AtomicBool::new(false),
            pool: OnceLock::new(),
        }
    }

    /// Whether bootstrap has completed.
    pub fn is_bootstrapped(&self) -> bool {
        self.pool.get().is_some()
    }

    /// Seed each validator's account with `amount_per_member` from the
    /// privileged genesis root account. Callable exactly once.
    pub async fn bootstrap(
        &self,
        clients: &[MemberClient],
        members: &[MemberHandle],
        root_key_path: &Path,
        amount_per_member: u64,
        inclusion_timeout: Duration,
        poll_interval: Duration,
    ) -> Result<(), FundingError> {
        // Claim before doing any work so a concurrent second call fails
        // fast instead of double-funding.
        if self
            .claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(FundingError::AlreadyBootstrapped);
        }

        // Pre-flight work has no on-chain effects; failures here release
        // the claim so the caller can retry.
        let prepared = self
            .prepare_bootstrap(clients, members, root_key_path)
            .await;
        let (root, member_keys, sequence) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                self.claimed.store(false, Ordering::Release);
                return Err(err);
            }
        };

        // Once the first transfer is submitted a retry could double-fund,
        // so from here on the claim stays set even on failure.
        self.seed_members(
            clients,
            members,
            root,
            member_keys,
            sequence,
            amount_per_member,
            inclusion_timeout,
            poll_interval,
        )
        .await
    }

    async fn prepare_bootstrap(
        &self,
        clients: &[MemberClient],
        members: &[MemberHandle],
        root_key_path: &Path,
    ) -> Result<(AccountKey, Vec<AccountKey>, u64), FundingError> {
        let root = AccountKey::from_yaml_file(root_key_path)?;
        let member_keys = members
            .iter()
            .map(|member| AccountKey::from_yaml_file(&member.key_path))
            .collect::<Result<Vec<_>, _>>()?;
        let sequence = clients[0].sequence_number(&root.address).await?;
        Ok((root, member_keys, sequence))
    }

    #[allow(clippy::too_many_arguments)]
    async fn seed_members(
        &self,
        clients: &[MemberClient],
        members: &[MemberHandle],
        root: AccountKey,
        member_keys: Vec<AccountKey>,
        mut sequence: u64,
        amount_per_member: u64,
        inclusion_timeout: Duration,
        poll_interval: Duration,
    ) -> Result<(), FundingError> {
        info!(
            members = members.len(),
            amount_per_member, "bootstrapping validator accounts from genesis root"
        );
        for (member, key) in members.iter().zip(&member_keys) {
            let signed = TransferPayload {
                sender: root.address.clone(),
                recipient: key.address.clone(),
                amount: amount_per_member,
                sequence_number: sequence,
                expiration_timestamp_secs: expiry_timestamp(),
                chain_id: LOCAL_CHAIN_ID,
            }
            .sign(&root)?;

            submit_and_await(
                &clients[0],
                &signed,
                inclusion_timeout,
                poll_interval,
            )
            .await?;
            debug!(member = member.index, hash = %signed.hash, "member account seeded");
            sequence += 1;
        }

        let slots = member_keys
            .into_iter()
            .map(|key| {
                Mutex::new(FaucetSlot {
                    key,
                    next_sequence: None,
                })
            })
            .collect();
        // Set exactly once; the claim flag guarantees no competitor.
        let _ = self.pool.set(slots);

        info!("bootstrap complete, root account retired");
        Ok(())
    }

    /// Transfer `amount` to `target` from a uniformly random funded
    /// validator. Returns the transaction hash once included.
    pub async fn fund(
        &self,
        clients: &[MemberClient],
        target: &str,
        amount: u64,
        inclusion_timeout: Duration,
        poll_interval: Duration,
    ) -> Result<TxHash, FundingError> {
        let pool = self.pool.get().ok_or(FundingError::NotBootstrapped)?;
        let recipient = normalize_address(target)?;

        // Uniform selection spreads faucet traffic (and sequence-number
        // contention) across all funded members.
        let index = rand::thread_rng().gen_range(0..pool.len());
        let mut slot = pool[index].lock().await;
        let client = &clients[index];

        let sequence = match slot.next_sequence {
            Some(sequence) => sequence,
            None => client.sequence_number(&slot.key.address).await?,
        };

        let signed = TransferPayload {
            sender: slot.key.address.clone(),
            recipient,
            amount,
            sequence_number: sequence,
            expiration_timestamp_secs: expiry_timestamp(),
            chain_id: LOCAL_CHAIN_ID,
        }
        .sign(&slot.key)?;

        debug!(member = index, hash = %signed.hash, amount, "submitting faucet transfer");
        match submit_and_await(client, &signed, inclusion_timeout, poll_interval).await {
            Ok(()) => {
                slot.next_sequence = Some(sequence + 1);
                Ok(signed.hash)
            }
            Err(err) => {
                // The on-chain sequence is now unknown; re-fetch next time.
                slot.next_sequence = None;
                Err(err)
            }
        }
    }
}

impl Default for FundingState {
    fn default() -> Self {
        Self::new()
    }
}

/// Submit a signed transfer and poll until it is included.
async fn submit_and_await(
    client: &MemberClient,
    signed: &SignedTransfer,
    timeout: Duration,
    interval: Duration,
) -> Result<(), FundingError> {
    let response = client.submit_transfer(&signed.to_request()).await?;
    if !response.accepted {
        return Err(FundingError::Rejected {
            hash: response.hash,
            reason: response.error.unwrap_or_else(|| "rejected".to_string()),
        });
    }
    if response.hash != signed.hash.0 {
        warn!(ours = %signed.hash, theirs = %response.hash, "node derived a different transaction hash");
    }

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = client.transaction_by_hash(&signed.hash.0).await? {
            if status.success {
                return Ok(());
            }
            return Err(FundingError::Rejected {
                hash: status.hash,
                reason: status
                    .vm_status
                    .unwrap_or_else(|| "execution failed".to_string()),
            });
        }
        if Instant::now() + interval > deadline {
            return Err(FundingError::Inclusion(TimeoutError::new(
                format!("inclusion of transfer {}", signed.hash),
                timeout,
            )));
        }
        tokio::time::sleep(interval).await;
    }
}

fn expiry_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|now| now.as_secs())
        .unwrap_or(0)
        + TRANSFER_EXPIRY_SECS
}
