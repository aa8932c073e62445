//! The cluster handle returned to tests.

use crate::client::MemberClient;
use crate::error::{ClientError, FundingError, StartupError, TeardownError, TimeoutError};
use crate::funding::{FundingState, TxHash};
use crate::home::ClusterHome;
use crate::lifecycle::{self, Cleanup};
use crate::{compose, progress, readiness, supervisor};
use localnet_types::{ClusterSpec, LedgerSnapshot, MemberHandle, LOCAL_CHAIN_ID};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Budget for one submitted transfer to be included in a block.
const INCLUSION_TIMEOUT: Duration = Duration::from_secs(30);

/// Log lines per member captured when startup fails.
const FAILURE_LOG_TAIL: usize = 50;

/// A live ephemeral validator cluster.
///
/// Exactly one handle exists per test process at a time. Dropping the
/// handle (including during a panic) tears the cluster down; SIGINT and
/// SIGTERM do the same before the process exits.
pub struct ClusterHandle {
    spec: ClusterSpec,
    members: Vec<MemberHandle>,
    clients: Vec<MemberClient>,
    funding: FundingState,
    cleanup: Arc<Cleanup>,
    signal_task: tokio::task::JoinHandle<()>,
}

impl ClusterHandle {
    /// Create a fresh cluster with `num_members` validators and block until
    /// every member is ready.
    pub async fn new(num_members: usize) -> Result<Self, StartupError> {
        Self::with_spec(ClusterSpec::new(num_members)).await
    }

    /// Create a fresh cluster from an explicit spec.
    pub async fn with_spec(spec: ClusterSpec) -> Result<Self, StartupError> {
        spec.validate()?;
        lifecycle::claim_process_slot()?;

        match Self::start(spec).await {
            Ok(handle) => Ok(handle),
            Err(err) => {
                lifecycle::release_process_slot();
                Err(err)
            }
        }
    }

    async fn start(spec: ClusterSpec) -> Result<Self, StartupError> {
        let home = ClusterHome::discover(spec.home.as_deref())?;
        let members = supervisor::start(&spec, &home)?;

        let clients = match members
            .iter()
            .map(|member| MemberClient::new(member.api_url(), spec.request_timeout))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(clients) => clients,
            Err(err) => {
                supervisor::cleanup_stale(&home);
                return Err(StartupError::EnvironmentUnavailable(err.to_string()));
            }
        };

        if let Err(timeout) = readiness::await_ready(
            &clients,
            LOCAL_CHAIN_ID,
            spec.readiness_timeout,
            spec.poll_interval,
        )
        .await
        {
            if let Some(logs) = supervisor::dump_logs(&home, FAILURE_LOG_TAIL) {
                warn!("member logs at readiness failure:\n{logs}");
            }
            supervisor::cleanup_stale(&home);
            return Err(StartupError::NotReady(timeout));
        }

        let cleanup = Arc::new(Cleanup::new(home));
        let signal_task = lifecycle::spawn_signal_task(Arc::clone(&cleanup));

        info!(members = members.len(), "cluster ready");
        Ok(Self {
            spec,
            members,
            clients,
            funding: FundingState::new(),
            cleanup,
            signal_task,
        })
    }

    /// Number of validator members.
    pub fn num_members(&self) -> usize {
        self.members.len()
    }

    /// All member handles.
    pub fn members(&self) -> &[MemberHandle] {
        &self.members
    }

    /// REST API base URL of the member at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn api_url(&self, index: usize) -> String {
        self.members[index].api_url()
    }

    /// REST API base URLs of all members.
    pub fn api_urls(&self) -> Vec<String> {
        self.members.iter().map(|member| member.api_url()).collect()
    }

    /// Re-probe readiness of every member within `timeout`.
    pub async fn await_ready(&self, timeout: Duration) -> Result<(), TimeoutError> {
        readiness::await_ready(&self.clients, LOCAL_CHAIN_ID, timeout, self.spec.poll_interval)
            .await
    }

    /// Fetch a fresh ledger snapshot from the member at `index`.
    pub async fn ledger_snapshot(&self, index: usize) -> Result<LedgerSnapshot, ClientError> {
        self.clients[index].ledger_info().await
    }

    /// Wait until the member at `index` has produced at least `blocks` more
    /// blocks, within `timeout`.
    pub async fn wait_for_blocks(
        &self,
        index: usize,
        blocks: u64,
        timeout: Duration,
    ) -> Result<(), TimeoutError> {
        progress::wait_for_blocks(&self.clients[index], blocks, timeout, self.spec.poll_interval)
            .await
    }

    /// Current block height of every member, collected concurrently.
    pub async fn member_heights(&self) -> Result<Vec<u64>, ClientError> {
        progress::member_heights(&self.clients).await
    }

    /// Spread between the highest and lowest member height.
    pub async fn height_spread(&self) -> Result<u64, ClientError> {
        Ok(progress::height_spread(&self.member_heights().await?))
    }

    /// Whether all members are within the configured sync tolerance.
    pub async fn is_synced(&self) -> Result<bool, ClientError> {
        Ok(progress::is_synced(
            &self.member_heights().await?,
            self.spec.sync_tolerance,
        ))
    }

    /// Seed every validator account with `amount_per_member` from the
    /// genesis root account. Callable exactly once per cluster lifetime.
    pub async fn bootstrap(&self, amount_per_member: u64) -> Result<(), FundingError> {
        self.funding
            .bootstrap(
                &self.clients,
                &self.members,
                &self.cleanup.home().root_key_path(),
                amount_per_member,
                INCLUSION_TIMEOUT,
                self.spec.poll_interval,
            )
            .await
    }

    /// Whether bootstrap funding has completed.
    pub fn is_bootstrapped(&self) -> bool {
        self.funding.is_bootstrapped()
    }

    /// Give `address` spendable balance via a peer-to-peer transfer from a
    /// randomly selected funded validator. Requires a completed bootstrap.
    pub async fn fund(&self, address: &str, amount: u64) -> Result<TxHash, FundingError> {
        self.funding
            .fund(
                &self.clients,
                address,
                amount,
                INCLUSION_TIMEOUT,
                self.spec.poll_interval,
            )
            .await
    }

    /// Spendable balance of `address`, queried from member 0.
    pub async fn balance(&self, address: &str) -> Result<u64, ClientError> {
        let address = address.trim_start_matches("0x").to_lowercase();
        self.clients[0].balance(&address).await
    }

    /// Next sequence number of `address`, queried from member 0.
    pub async fn account_sequence(&self, address: &str) -> Result<u64, ClientError> {
        let address = address.trim_start_matches("0x").to_lowercase();
        self.clients[0].sequence_number(&address).await
    }

    /// Stop every member and remove their backing resources.
    ///
    /// Graceful stop is attempted within the configured budget, then
    /// escalates to forced removal. The signal registration is released.
    pub fn teardown(self) -> Result<(), TeardownError> {
        self.signal_task.abort();

        if !self.cleanup.has_run() {
            info!("tearing down cluster");
            if let Err(err) = supervisor::stop_graceful(self.cleanup.home(), self.spec.stop_budget)
            {
                warn!(%err, "graceful stop failed, escalating to forced removal");
            }
        }

        match self.cleanup.run() {
            Some(result) => result,
            None => Ok(()),
        }
    }
}

impl Drop for ClusterHandle {
    fn drop(&mut self) {
        self.signal_task.abort();
        lifecycle::cleanup_on_drop(&self.cleanup);
    }
}

impl std::fmt::Debug for ClusterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterHandle")
            .field("members", &self.members.len())
            .field("bootstrapped", &self.is_bootstrapped())
            .finish_non_exhaustive()
    }
}

/// Remove any cluster left behind by a crashed prior run.
///
/// Idempotent: a missing home or an already-clean engine is success. Used
/// by the CLI `down` command; `ClusterHandle::new` performs the same
/// cleanup automatically before starting.
pub fn purge(spec: &ClusterSpec) -> Result<(), TeardownError> {
    let home = match ClusterHome::discover(spec.home.as_deref()) {
        Ok(home) => home,
        Err(_) => {
            info!("no cluster home found, nothing to purge");
            return Ok(());
        }
    };

    if !home.compose_path().exists() {
        std::fs::write(home.compose_path(), compose::render(spec))
            .map_err(|err| TeardownError::Prepare(err.to_string()))?;
    }
    supervisor::down(&home)
}
