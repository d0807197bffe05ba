// deployer/src/config.rs

use crate::error::{DeployError, Result};
use dotenv::dotenv;
use std::{env, fmt, path::PathBuf, str::FromStr, time::Duration};
use tracing::{info, warn};

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";
const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
const DEFAULT_CONFIRMATIONS: usize = 1;

/// Which chain to talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub rpc_url: String,
    /// Queried from the node when unset.
    pub chain_id: Option<u64>,
    pub poll_interval: Duration,
}

/// Where the deploying key comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum SignerConfig {
    PrivateKey(String),
    Mnemonic { phrase: String, index: u32 },
}

// Keep key material out of logs.
impl fmt::Debug for SignerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignerConfig::PrivateKey(_) => f.write_str("PrivateKey(<redacted>)"),
            SignerConfig::Mnemonic { index, .. } => f
                .debug_struct("Mnemonic")
                .field("phrase", &"<redacted>")
                .field("index", index)
                .finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub network: NetworkConfig,
    pub signer: SignerConfig,
    pub artifacts_dir: PathBuf,
    pub confirmations: usize,
}

impl DeployConfig {
    /// Builds the config from any key/value source. Unset and empty values
    /// are treated the same.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let network = NetworkConfig {
            rpc_url: get("RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            chain_id: parse_optional(&get, "CHAIN_ID")?,
            poll_interval: Duration::from_millis(
                parse_optional(&get, "POLL_INTERVAL_MS")?.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            ),
        };

        let signer = match (get("PRIVATE_KEY"), get("MNEMONIC")) {
            (Some(key), mnemonic) => {
                if mnemonic.is_some() {
                    warn!("Both PRIVATE_KEY and MNEMONIC are set, using PRIVATE_KEY");
                }
                SignerConfig::PrivateKey(key)
            }
            (None, Some(phrase)) => SignerConfig::Mnemonic {
                phrase,
                index: parse_optional(&get, "ACCOUNT_INDEX")?.unwrap_or(0),
            },
            (None, None) => {
                return Err(DeployError::Config(
                    "one of PRIVATE_KEY or MNEMONIC must be set".to_string(),
                ))
            }
        };

        let confirmations = parse_optional(&get, "CONFIRMATIONS")?.unwrap_or(DEFAULT_CONFIRMATIONS);
        if confirmations == 0 {
            return Err(DeployError::Config("CONFIRMATIONS must be at least 1".to_string()));
        }

        Ok(Self {
            network,
            signer,
            artifacts_dir: get("ARTIFACTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACTS_DIR)),
            confirmations,
        })
    }
}

fn parse_optional<T, G>(get: &G, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| DeployError::Config(format!("{key}={raw:?}: {e}")))
        })
        .transpose()
}

/// Merges a `.env` file, when one is present, into the process environment.
/// Variables already set in the environment take precedence.
pub fn load_env_file() {
    dotenv().ok();
}

/// Loads the configuration from the process environment, after merging in a
/// `.env` file when one is present.
pub fn load_config() -> Result<DeployConfig> {
    load_env_file();
    let config = DeployConfig::from_lookup(|key| env::var(key).ok())?;
    info!(
        rpc_url = %config.network.rpc_url,
        artifacts = %config.artifacts_dir.display(),
        confirmations = config.confirmations,
        "Configuration loaded"
    );
    Ok(config)
}
