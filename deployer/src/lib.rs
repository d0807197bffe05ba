// deployer/src/lib.rs
//! Deploys the `MetaVaultProtocol` contract from its compiled Hardhat
//! artifact and reports the resulting address.

pub mod artifact;
pub mod config;
pub mod error;
pub mod logging;
pub mod runner;
pub mod toolkit;

pub use artifact::{ArtifactStore, Blueprint};
pub use config::{load_config, DeployConfig, NetworkConfig, SignerConfig};
pub use error::DeployError;
pub use runner::{deploy_contract, report, run, CONTRACT_NAME, EXIT_FAILURE, EXIT_SUCCESS};
pub use toolkit::{Deployment, EthersToolkit, PendingDeployment, Toolkit};
