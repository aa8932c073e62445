//! Funding subsystem tests against fake member endpoints.

use crate::client::MemberClient;
use crate::error::FundingError;
use crate::funding::FundingState;
use crate::tests::support::{FakeMember, FakeState};
use localnet_types::MemberHandle;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const ROOT_BALANCE: u64 = 1_000_000_000;
const INCLUSION_TIMEOUT: Duration = Duration::from_secs(2);
const POLL: Duration = Duration::from_millis(10);

fn root_address() -> String {
    format!("{:064x}", 0xa550c18u64)
}

fn member_account_address(index: usize) -> String {
    format!("{:064x}", 0x1000 + index as u64)
}

fn key_yaml(address: &str, key_byte: u8) -> String {
    format!(
        "---\naccount_address: {address}\naccount_private_key: \"0x{}\"\n",
        hex::encode([key_byte; 32])
    )
}

struct Fixture {
    _dir: tempfile::TempDir,
    members: Vec<MemberHandle>,
    clients: Vec<MemberClient>,
    _fakes: Vec<FakeMember>,
    state: Arc<FakeState>,
    root_key_path: PathBuf,
}

/// A cluster of fake members sharing one chain state, with key material
/// scaffolded the way the genesis tooling lays it out.
async fn fixture(num_members: usize) -> Fixture {
    let dir = tempfile::tempdir().unwrap();

    let root_key_path = dir
        .path()
        .join("genesis-artifacts/root-account-private-keys.yaml");
    std::fs::create_dir_all(root_key_path.parent().unwrap()).unwrap();
    std::fs::write(&root_key_path, key_yaml(&root_address(), 0x11)).unwrap();

    let state = FakeState::new(4);
    state.set_account(&root_address(), 0, ROOT_BALANCE);

    let mut members = Vec::new();
    let mut clients = Vec::new();
    let mut fakes = Vec::new();
    for i in 0..num_members {
        let key_path = dir
            .path()
            .join(format!("validators/validator-{i}/private-keys.yaml"));
        std::fs::create_dir_all(key_path.parent().unwrap()).unwrap();
        std::fs::write(&key_path, key_yaml(&member_account_address(i), 0x20 + i as u8)).unwrap();

        let fake = FakeMember::spawn_with_state(Arc::clone(&state)).await;
        clients.push(fake.client());
        members.push(MemberHandle::new(i, "172.28.0", key_path));
        fakes.push(fake);
    }

    Fixture {
        _dir: dir,
        members,
        clients,
        _fakes: fakes,
        state,
        root_key_path,
    }
}

async fn bootstrap(funding: &FundingState, fixture: &Fixture, amount: u64) -> Result<(), FundingError> {
    funding
        .bootstrap(
            &fixture.clients,
            &fixture.members,
            &fixture.root_key_path,
            amount,
            INCLUSION_TIMEOUT,
            POLL,
        )
        .await
}

#[tokio::test]
async fn test_fund_before_bootstrap_fails_fast() {
    let funding = FundingState::new();

    // No endpoint calls are made; an empty client list proves it.
    let err = funding
        .fund(&[], "feed", 100, INCLUSION_TIMEOUT, POLL)
        .await
        .unwrap_err();
    assert!(matches!(err, FundingError::NotBootstrapped));
}

#[tokio::test]
async fn test_bootstrap_seeds_every_member_from_root() {
    let fixture = fixture(3).await;
    let funding = FundingState::new();

    bootstrap(&funding, &fixture, 100_000).await.unwrap();
    assert!(funding.is_bootstrapped());

    for i in 0..3 {
        assert_eq!(
            fixture.state.balance_of(&member_account_address(i)),
            Some(100_000),
            "member {i} account should be seeded"
        );
    }
    assert_eq!(
        fixture.state.balance_of(&root_address()),
        Some(ROOT_BALANCE - 3 * 100_000),
        "root pays for the seeding"
    );
}

#[tokio::test]
async fn test_double_bootstrap_is_rejected() {
    let fixture = fixture(1).await;
    let funding = FundingState::new();

    bootstrap(&funding, &fixture, 1_000).await.unwrap();
    let err = bootstrap(&funding, &fixture, 1_000).await.unwrap_err();
    assert!(matches!(err, FundingError::AlreadyBootstrapped));

    // No double-funding happened.
    assert_eq!(
        fixture.state.balance_of(&member_account_address(0)),
        Some(1_000)
    );
}

#[tokio::test]
async fn test_fund_accumulates_balance_at_target() {
    let fixture = fixture(4).await;
    let funding = FundingState::new();
    bootstrap(&funding, &fixture, 100_000).await.unwrap();

    let hash = funding
        .fund(&fixture.clients, "0xFEED", 100, INCLUSION_TIMEOUT, POLL)
        .await
        .unwrap();
    assert_eq!(hash.0.len(), 64);
    assert_eq!(fixture.state.balance_of("feed"), Some(100));

    funding
        .fund(&fixture.clients, "0xFEED", 100, INCLUSION_TIMEOUT, POLL)
        .await
        .unwrap();
    assert_eq!(fixture.state.balance_of("feed"), Some(200));
}

#[tokio::test]
async fn test_faucet_never_touches_root_account() {
    let fixture = fixture(2).await;
    let funding = FundingState::new();
    bootstrap(&funding, &fixture, 50_000).await.unwrap();

    let root_after_bootstrap = fixture.state.balance_of(&root_address()).unwrap();
    for _ in 0..5 {
        funding
            .fund(&fixture.clients, "beef", 10, INCLUSION_TIMEOUT, POLL)
            .await
            .unwrap();
    }

    // Only validator member accounts paid; the root balance is frozen
    // after bootstrap.
    assert_eq!(
        fixture.state.balance_of(&root_address()),
        Some(root_after_bootstrap)
    );
    let member_total: u64 = (0..2)
        .map(|i| fixture.state.balance_of(&member_account_address(i)).unwrap())
        .sum();
    assert_eq!(member_total, 2 * 50_000 - 50);
    assert_eq!(fixture.state.balance_of("beef"), Some(50));
}

#[tokio::test]
async fn test_rejected_transfer_recovers_sequence_state() {
    let fixture = fixture(1).await;
    let funding = FundingState::new();
    bootstrap(&funding, &fixture, 1_000).await.unwrap();

    let err = funding
        .fund(&fixture.clients, "feed", 10_000, INCLUSION_TIMEOUT, POLL)
        .await
        .unwrap_err();
    assert!(matches!(err, FundingError::Rejected { .. }));

    // The cached sequence was invalidated; the next transfer re-fetches
    // and succeeds.
    funding
        .fund(&fixture.clients, "feed", 10, INCLUSION_TIMEOUT, POLL)
        .await
        .unwrap();
    assert_eq!(fixture.state.balance_of("feed"), Some(10));
}

#[tokio::test]
async fn test_failed_bootstrap_can_be_retried() {
    let fixture = fixture(1).await;
    let funding = FundingState::new();

    // Missing root key material: the claim is released on failure.
    let err = funding
        .bootstrap(
            &fixture.clients,
            &fixture.members,
            std::path::Path::new("/nonexistent/root-keys.yaml"),
            1_000,
            INCLUSION_TIMEOUT,
            POLL,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, FundingError::Key(_)));
    assert!(!funding.is_bootstrapped());

    bootstrap(&funding, &fixture, 1_000).await.unwrap();
    assert!(funding.is_bootstrapped());
}

#[tokio::test]
async fn test_invalid_target_address_is_rejected_locally() {
    let fixture = fixture(1).await;
    let funding = FundingState::new();
    bootstrap(&funding, &fixture, 1_000).await.unwrap();

    let err = funding
        .fund(&fixture.clients, "not-hex", 10, INCLUSION_TIMEOUT, POLL)
        .await
        .unwrap_err();
    assert!(matches!(err, FundingError::InvalidAddress(_)));
}

#[tokio::test]
async fn test_concurrent_faucet_calls_serialize_per_member() {
    let fixture = fixture(2).await;
    let funding = Arc::new(FundingState::new());
    bootstrap(&funding, &fixture, 100_000).await.unwrap();

    // Calls routed to the same randomly-selected member serialize on its
    // slot; calls to different members proceed in parallel. Either way no
    // sequence number is ever reused.
    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let funding = Arc::clone(&funding);
            let clients = fixture.clients.clone();
            tokio::spawn(async move {
                funding.fund(&clients, "feed", 5, INCLUSION_TIMEOUT, POLL).await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().expect("concurrent fund succeeds");
    }

    assert_eq!(fixture.state.balance_of("feed"), Some(40));
}

#[tokio::test]
async fn test_sequential_funds_from_single_member_use_increasing_sequences() {
    // With one member every fund is routed to the same account, so the
    // fake's sequence enforcement would reject any reuse.
    let fixture = fixture(1).await;
    let funding = FundingState::new();
    bootstrap(&funding, &fixture, 10_000).await.unwrap();

    for i in 1..=5u64 {
        funding
            .fund(&fixture.clients, "cafe", 7, INCLUSION_TIMEOUT, POLL)
            .await
            .unwrap();
        assert_eq!(fixture.state.balance_of("cafe"), Some(7 * i));
    }
}
