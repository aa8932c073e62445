//! Fake member endpoints for engine-free tests.
//!
//! A `FakeMember` serves the same REST surface as a real validator: the
//! ledger-status endpoint, account state, transfer submission with
//! sequence-number enforcement, and committed-transaction lookup. Several
//! fake members can share one `FakeState` to model a cluster with common
//! chain state.

use crate::client::{MemberClient, SubmitTransferRequest};
use crate::funding::TransferPayload;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shared chain state behind one or more fake members.
pub struct FakeState {
    chain_id: u8,
    height: AtomicU64,
    version: AtomicU64,
    advance_per_poll: AtomicU64,
    accounts: Mutex<HashMap<String, Account>>,
    committed: Mutex<HashMap<String, bool>>,
}

#[derive(Clone, Copy, Default)]
struct Account {
    sequence: u64,
    balance: u64,
}

impl FakeState {
    pub fn new(chain_id: u8) -> Arc<Self> {
        Arc::new(Self {
            chain_id,
            height: AtomicU64::new(1),
            version: AtomicU64::new(1),
            advance_per_poll: AtomicU64::new(0),
            accounts: Mutex::new(HashMap::new()),
            committed: Mutex::new(HashMap::new()),
        })
    }

    /// Create or overwrite an account.
    pub fn set_account(&self, address: &str, sequence: u64, balance: u64) {
        self.accounts
            .lock()
            .insert(address.to_string(), Account { sequence, balance });
    }

    /// Current balance of `address`, if the account exists.
    pub fn balance_of(&self, address: &str) -> Option<u64> {
        self.accounts.lock().get(address).map(|a| a.balance)
    }
}

/// One fake member endpoint bound to an ephemeral port.
pub struct FakeMember {
    pub addr: SocketAddr,
    pub state: Arc<FakeState>,
    task: tokio::task::JoinHandle<()>,
}

impl FakeMember {
    /// Spawn a fake member with fresh state.
    pub async fn spawn(chain_id: u8) -> Self {
        Self::spawn_with_state(FakeState::new(chain_id)).await
    }

    /// Spawn a fake member sharing `state` with other members.
    pub async fn spawn_with_state(state: Arc<FakeState>) -> Self {
        let app = Router::new()
            .route("/v1", get(ledger_status))
            .route("/v1/accounts/{address}", get(account))
            .route("/v1/transactions", post(submit_transfer))
            .route("/v1/transactions/by_hash/{hash}", get(transaction_by_hash))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state, task }
    }

    /// Set the reported block height.
    pub fn with_height(self, height: u64) -> Self {
        self.state.height.store(height, Ordering::Relaxed);
        self
    }

    /// Advance the height by `blocks` on every status poll.
    pub fn with_auto_advance(self, blocks: u64) -> Self {
        self.state.advance_per_poll.store(blocks, Ordering::Relaxed);
        self
    }

    /// A client pointed at this member.
    pub fn client(&self) -> MemberClient {
        MemberClient::new(format!("http://{}", self.addr), Duration::from_secs(2)).unwrap()
    }
}

impl Drop for FakeMember {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn ledger_status(State(state): State<Arc<FakeState>>) -> Json<serde_json::Value> {
    let advance = state.advance_per_poll.load(Ordering::Relaxed);
    let height = state.height.fetch_add(advance, Ordering::Relaxed) + advance;
    let version = state.version.fetch_add(advance, Ordering::Relaxed) + advance;

    Json(serde_json::json!({
        "chain_id": state.chain_id,
        "epoch": "1",
        "ledger_version": version.to_string(),
        "block_height": height.to_string(),
        "ledger_timestamp": "1700000000000000",
    }))
}

async fn account(
    State(state): State<Arc<FakeState>>,
    Path(address): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let accounts = state.accounts.lock();
    let account = accounts.get(&address).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(serde_json::json!({
        "sequence_number": account.sequence.to_string(),
        "balance": account.balance.to_string(),
    })))
}

async fn submit_transfer(
    State(state): State<Arc<FakeState>>,
    Json(request): Json<SubmitTransferRequest>,
) -> Json<serde_json::Value> {
    let reject = |reason: &str| {
        Json(serde_json::json!({
            "accepted": false,
            "hash": "",
            "error": reason,
        }))
    };

    let mut accounts = state.accounts.lock();
    let Some(sender) = accounts.get(&request.sender).copied() else {
        return reject("sender account does not exist");
    };
    if sender.sequence != request.sequence_number {
        return reject("sequence number mismatch");
    }
    if sender.balance < request.amount {
        return reject("insufficient balance");
    }

    // Same content hash the orchestrator derives client-side.
    let hash = transfer_hash(&request);

    accounts.insert(
        request.sender.clone(),
        Account {
            sequence: sender.sequence + 1,
            balance: sender.balance - request.amount,
        },
    );
    // Transfers to unknown addresses implicitly create the account.
    let recipient = accounts.entry(request.recipient.clone()).or_default();
    recipient.balance += request.amount;
    drop(accounts);

    state.committed.lock().insert(hash.clone(), true);

    Json(serde_json::json!({
        "accepted": true,
        "hash": hash,
    }))
}

async fn transaction_by_hash(
    State(state): State<Arc<FakeState>>,
    Path(hash): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let committed = state.committed.lock();
    let success = committed.get(&hash).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(serde_json::json!({
        "hash": hash,
        "success": success,
        "vm_status": null,
    })))
}

fn transfer_hash(request: &SubmitTransferRequest) -> String {
    let canonical = TransferPayload {
        sender: request.sender.clone(),
        recipient: request.recipient.clone(),
        amount: request.amount,
        sequence_number: request.sequence_number,
        expiration_timestamp_secs: request.expiration_timestamp_secs,
        chain_id: request.chain_id,
    }
    .canonical_bytes()
    .expect("fake node only sees hex addresses");

    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    hasher.update(hex::decode(&request.signature).expect("signature is hex"));
    hex::encode(hasher.finalize())
}
