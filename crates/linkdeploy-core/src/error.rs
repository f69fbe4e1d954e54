use thiserror::Error;

/// Failures surfaced by the signer/transport collaborator.
///
/// Kept apart from [`Error`] so callers can tell a network or execution
/// failure from a linking or ordering mistake in the run itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },

    #[error("Transaction {tx_hash} did not create a contract")]
    MissingContractAddress { tx_hash: String },

    #[error("Signer error: {0}")]
    Signer(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("Unresolved dependency: '{artifact}' requires library '{library}' which has not been deployed")]
    UnresolvedDependency { artifact: String, library: String },

    #[error("Duplicate deployment: '{0}' was already deployed in this run")]
    DuplicateDeployment(String),

    #[error("Dependency cycle between artifacts: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    #[error("Invalid artifact '{name}': {reason}")]
    InvalidArtifact { name: String, reason: String },

    #[error("Chain ID mismatch: configured {expected}, network reports {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("ABI error: {0}")]
    Abi(String),

    #[error("Account error: {0}")]
    Account(String),

    #[error("Deployment cancelled before '{0}'")]
    Cancelled(String),

    #[error("Invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl Error {
    pub fn invalid_artifact(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidArtifact {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn unresolved(artifact: impl Into<String>, library: impl Into<String>) -> Self {
        Error::UnresolvedDependency {
            artifact: artifact.into(),
            library: library.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
