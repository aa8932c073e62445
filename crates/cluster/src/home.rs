//! Cluster home discovery.
//!
//! The cluster home holds everything the validator image expects on disk:
//! genesis artifacts, per-validator key material, and the generated compose
//! file. Keys are produced by the genesis tooling that builds the image;
//! this crate only reads them.

use crate::error::StartupError;
use std::path::{Path, PathBuf};

/// Environment variable overriding home discovery.
const HOME_ENV: &str = "LOCALNET_HOME";

/// Well-known candidate paths, tried relative to the working directory.
const CANDIDATES: &[&str] = &["localnet-home", "../localnet-home", "../../localnet-home"];

/// Marker file that identifies a directory as a cluster home.
const MARKER: &str = "genesis-artifacts/root-account-private-keys.yaml";

/// Resolved cluster home directory.
#[derive(Clone, Debug)]
pub struct ClusterHome {
    root: PathBuf,
}

impl ClusterHome {
    /// Discover the cluster home.
    ///
    /// Resolution order: explicit `override_path`, the `LOCALNET_HOME`
    /// environment variable, well-known candidates relative to the working
    /// directory, then `CARGO_MANIFEST_DIR/../localnet-home` so tests find
    /// the home regardless of which crate invokes them.
    pub fn discover(override_path: Option<&Path>) -> Result<Self, StartupError> {
        if let Some(path) = override_path {
            return Self::at(path);
        }

        if let Ok(env_path) = std::env::var(HOME_ENV) {
            return Self::at(Path::new(&env_path));
        }

        for candidate in CANDIDATES {
            if Path::new(candidate).join(MARKER).exists() {
                return Ok(Self {
                    root: PathBuf::from(candidate),
                });
            }
        }

        if let Ok(dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let path = Path::new(&dir).join("../localnet-home");
            if path.join(MARKER).exists() {
                return Ok(Self { root: path });
            }
        }

        Err(StartupError::HomeNotFound(format!(
            "no directory containing {MARKER} found; set {HOME_ENV} or pass an explicit home"
        )))
    }

    fn at(path: &Path) -> Result<Self, StartupError> {
        if !path.join(MARKER).exists() {
            return Err(StartupError::HomeNotFound(format!(
                "{} does not contain {MARKER}",
                path.display()
            )));
        }
        Ok(Self {
            root: path.to_path_buf(),
        })
    }

    /// Root directory of the home.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the generated compose file.
    pub fn compose_path(&self) -> PathBuf {
        self.root.join("docker-compose.yaml")
    }

    /// Key file for the validator at `index`.
    pub fn validator_key_path(&self, index: usize) -> PathBuf {
        self.root
            .join("validators")
            .join(format!("validator-{index}"))
            .join("private-keys.yaml")
    }

    /// Key file for the privileged genesis root account.
    pub fn root_key_path(&self) -> PathBuf {
        self.root.join(MARKER)
    }
}
