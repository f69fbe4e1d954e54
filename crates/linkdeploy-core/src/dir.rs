//! Deployment report directory
//!
//! The [`DeploymentsDir`] struct manages the `deployments/` directory where
//! run reports are written, one subdirectory per network.

use std::path::{Path, PathBuf};

/// Manages the `deployments/` directory of a project.
#[derive(Debug, Clone)]
pub struct DeploymentsDir {
    path: PathBuf,
}

impl DeploymentsDir {
    /// The directory name used for run reports
    pub const NAME: &str = "deployments";

    /// Name of the report that always points at the most recent run
    pub const LATEST: &str = "run-latest.json";

    /// Create a `DeploymentsDir` pointing to `deployments/` in the current directory.
    pub fn new() -> Self {
        Self {
            path: PathBuf::from(Self::NAME),
        }
    }

    /// Create a `DeploymentsDir` at a custom location.
    pub fn at<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the reports of one network
    pub fn network(&self, network: &str) -> PathBuf {
        self.path.join(network)
    }

    /// Path of the latest report for a network
    pub fn latest(&self, network: &str) -> PathBuf {
        self.network(network).join(Self::LATEST)
    }

    /// Path of the report for a run started at `timestamp` (unix seconds)
    pub fn run(&self, network: &str, timestamp: u64) -> PathBuf {
        self.network(network).join(format!("run-{}.json", timestamp))
    }

    /// Create the directory for a network if it doesn't exist.
    pub fn create(&self, network: &str) -> std::io::Result<PathBuf> {
        let dir = self.network(network);
        if !dir.is_dir() {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(dir)
    }
}

impl Default for DeploymentsDir {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Path> for DeploymentsDir {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let dir = DeploymentsDir::new();
        assert_eq!(dir.path(), Path::new("deployments"));
    }

    #[test]
    fn test_report_paths() {
        let dir = DeploymentsDir::at("/project/deployments");
        assert_eq!(
            dir.latest("canto_testnet"),
            PathBuf::from("/project/deployments/canto_testnet/run-latest.json")
        );
        assert_eq!(
            dir.run("canto_testnet", 1700000000),
            PathBuf::from("/project/deployments/canto_testnet/run-1700000000.json")
        );
    }

    #[test]
    fn test_default() {
        let dir = DeploymentsDir::default();
        assert_eq!(dir.path(), Path::new("deployments"));
    }
}
