//! Localnet CLI
//!
//! A command-line wrapper around the cluster orchestrator: start an
//! ephemeral validator cluster and hold it until interrupted, remove
//! leftovers from a crashed run, or inspect a running cluster.

use anyhow::Context;
use clap::{Parser, Subcommand};
use localnet_cluster::{ClusterHandle, MemberClient};
use localnet_types::{ClusterSpec, PortLayout};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "localnet")]
#[command(about = "Ephemeral multi-node validator test network")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a cluster, optionally bootstrap funding, and hold it until
    /// interrupted (teardown runs on SIGINT/SIGTERM)
    Up {
        /// Number of validator members (1-7)
        #[arg(short = 'n', long, default_value = "4")]
        validators: usize,

        /// Validator container image
        #[arg(long)]
        image: Option<String>,

        /// Cluster home directory (genesis artifacts and key material)
        #[arg(long)]
        home: Option<PathBuf>,

        /// Readiness budget (e.g. "120s", "5m")
        #[arg(long, default_value = "120s")]
        timeout: humantime::Duration,

        /// Bootstrap each validator account with this balance
        #[arg(long)]
        fund_per_member: Option<u64>,
    },

    /// Remove any cluster left behind by a crashed run
    Down {
        /// Member count of the stale cluster, if known
        #[arg(short = 'n', long, default_value = "7")]
        validators: usize,

        /// Cluster home directory
        #[arg(long)]
        home: Option<PathBuf>,
    },

    /// Show per-member ledger status of a running cluster
    Status {
        /// Number of validator members to query
        #[arg(short = 'n', long, default_value = "4")]
        validators: usize,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run(Cli::parse()).await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Up {
            validators,
            image,
            home,
            timeout,
            fund_per_member,
        } => {
            let mut spec = ClusterSpec::new(validators).with_readiness_timeout(*timeout);
            if let Some(image) = image {
                spec = spec.with_image(image);
            }
            if let Some(home) = home {
                spec = spec.with_home(home);
            }

            let cluster = ClusterHandle::with_spec(spec)
                .await
                .context("failed to start cluster")?;

            if let Some(amount) = fund_per_member {
                cluster
                    .bootstrap(amount)
                    .await
                    .context("bootstrap funding failed")?;
                println!("bootstrapped {amount} units per member");
            }

            println!("cluster up with {} members:", cluster.num_members());
            for (i, url) in cluster.api_urls().iter().enumerate() {
                println!("  validator-{i}  {url}");
            }
            println!("press ctrl-c to tear down");

            // The signal handler registered at handle creation tears the
            // cluster down and exits the process.
            std::future::pending::<()>().await;
            unreachable!("pending future never resolves");
        }

        Commands::Down { validators, home } => {
            let mut spec = ClusterSpec::new(validators);
            if let Some(home) = home {
                spec = spec.with_home(home);
            }
            localnet_cluster::purge(&spec).context("cleanup failed")?;
            println!("cluster resources removed");
            Ok(())
        }

        Commands::Status { validators } => {
            let mut heights = Vec::new();
            for i in 0..validators {
                let url = format!("http://127.0.0.1:{}", PortLayout::for_member(i).api);
                let client = MemberClient::new(&url, Duration::from_secs(3))
                    .context("failed to build client")?;
                match client.ledger_info().await {
                    Ok(snapshot) => {
                        println!(
                            "validator-{i}  chain {}  epoch {}  height {}  version {}",
                            snapshot.chain_id,
                            snapshot.epoch,
                            snapshot.block_height,
                            snapshot.ledger_version
                        );
                        heights.push(snapshot.block_height);
                    }
                    Err(err) => println!("validator-{i}  unreachable: {err}"),
                }
            }

            if let (Some(max), Some(min)) = (heights.iter().max(), heights.iter().min()) {
                println!("height spread: {}", max - min);
            }
            anyhow::ensure!(!heights.is_empty(), "no members reachable");
            Ok(())
        }
    }
}
