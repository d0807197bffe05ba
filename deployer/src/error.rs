// deployer/src/error.rs

use ethers::types::{Address, TxHash};
use std::path::PathBuf;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every way a deployment can fail. The runner does not distinguish between
/// them: any variant ends the run with exit code 1.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to connect to {url}")]
    Provider {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("artifact for contract {0} not found")]
    BlueprintNotFound(String),

    #[error("multiple artifacts for contract {name}, use a fully qualified name: {}", .candidates.join(", "))]
    AmbiguousBlueprint { name: String, candidates: Vec<String> },

    #[error("contract {0} is abstract and can't be deployed")]
    AbstractContract(String),

    #[error("contract {name} needs to be linked against: {}", .libraries.join(", "))]
    UnlinkedLibraries { name: String, libraries: Vec<String> },

    #[error("contract {name} constructor expects {expected} argument(s), none are supplied")]
    ConstructorArguments { name: String, expected: usize },

    #[error("failed to load artifact {path:?}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("failed to submit deployment transaction")]
    Submission(#[source] BoxError),

    #[error("deployment transaction {0:?} was dropped from the mempool")]
    Dropped(TxHash),

    #[error("deployment transaction {0:?} reverted")]
    Reverted(TxHash),

    #[error("receipt for {0:?} carries no contract address")]
    NotDeployed(TxHash),

    #[error("no code found at {address:?} after transaction {tx_hash:?}")]
    NoCode { address: Address, tx_hash: TxHash },

    #[error("failed waiting for deployment transaction {tx_hash:?}")]
    Confirmation {
        tx_hash: TxHash,
        #[source]
        source: BoxError,
    },

    #[error("failed to write deployment result")]
    Output(#[source] std::io::Error),
}

impl DeployError {
    pub(crate) fn artifact(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        Self::Artifact {
            path: path.into(),
            source: source.into(),
        }
    }
}

pub type Result<T, E = DeployError> = std::result::Result<T, E>;
