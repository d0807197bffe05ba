// deployer/src/toolkit.rs

use crate::{
    artifact::ArtifactStore,
    config::{DeployConfig, SignerConfig},
    error::{DeployError, Result},
};
use ethers::{
    prelude::{
        ContractFactory, Http, JsonRpcClient, LocalWallet, Middleware, PendingTransaction, Provider,
        SignerMiddleware,
    },
    signers::{coins_bip39::English, MnemonicBuilder, Signer},
    types::{Address, BlockNumber, TxHash, U256, U64},
    utils::get_contract_address,
};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, instrument, warn};

pub type SignerClient<P = Http> = SignerMiddleware<Provider<P>, LocalWallet>;

/// A confirmed contract instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub address: Address,
    pub transaction_hash: TxHash,
    pub block_number: Option<U64>,
    pub gas_used: Option<U256>,
}

/// The three steps of a deployment: resolve a blueprint, submit it, wait for
/// it to land. Each step is attempted once; implementations must not retry.
#[allow(async_fn_in_trait)]
pub trait Toolkit {
    /// A resolved blueprint bound to the deploying account.
    type Factory;
    /// A submitted, not yet confirmed, deployment.
    type Pending;

    async fn contract_factory(&self, name: &str) -> Result<Self::Factory>;

    /// Submits a creation transaction with no constructor arguments.
    async fn deploy(&self, factory: Self::Factory) -> Result<Self::Pending>;

    async fn deployed(&self, pending: Self::Pending) -> Result<Deployment>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeployment {
    pub tx_hash: TxHash,
    /// Derived from sender and nonce, known before the receipt is.
    pub expected_address: Address,
}

/// [`Toolkit`] backed by a JSON-RPC node and a local signing key.
#[derive(Debug, Clone)]
pub struct EthersToolkit<P = Http> {
    client: Arc<SignerClient<P>>,
    artifacts: ArtifactStore,
    confirmations: usize,
    poll_interval: Duration,
}

impl<P: JsonRpcClient> EthersToolkit<P> {
    pub fn new(
        client: Arc<SignerClient<P>>,
        artifacts: ArtifactStore,
        confirmations: usize,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client,
            artifacts,
            confirmations,
            poll_interval,
        }
    }

    pub fn client(&self) -> Arc<SignerClient<P>> {
        self.client.clone()
    }
}

impl EthersToolkit<Http> {
    /// Connects to the configured node and prepares the signer. The chain id
    /// is fetched from the node unless the config pins it.
    #[instrument(skip_all, fields(rpc_url = %config.network.rpc_url))]
    pub async fn connect(config: &DeployConfig) -> Result<Self> {
        let url = &config.network.rpc_url;
        let provider = Provider::<Http>::try_from(url.as_str())
            .map_err(|e| DeployError::Provider {
                url: url.clone(),
                source: e.into(),
            })?
            .interval(config.network.poll_interval);

        let chain_id = match config.network.chain_id {
            Some(id) => id,
            None => provider
                .get_chainid()
                .await
                .map_err(|e| DeployError::Provider {
                    url: url.clone(),
                    source: e.into(),
                })?
                .as_u64(),
        };

        let wallet = build_wallet(&config.signer)?.with_chain_id(chain_id);
        info!(deployer = ?wallet.address(), chain_id, "Deploying account ready");

        let client = Arc::new(SignerMiddleware::new(provider, wallet));
        Ok(Self::new(
            client,
            ArtifactStore::new(&config.artifacts_dir),
            config.confirmations,
            config.network.poll_interval,
        ))
    }
}

impl<P: JsonRpcClient + 'static> Toolkit for EthersToolkit<P> {
    type Factory = ContractFactory<SignerClient<P>>;
    type Pending = PendingDeployment;

    async fn contract_factory(&self, name: &str) -> Result<Self::Factory> {
        let blueprint = self.artifacts.resolve(name)?;

        let expected = blueprint.constructor_inputs();
        if expected > 0 {
            return Err(DeployError::ConstructorArguments {
                name: blueprint.contract_name,
                expected,
            });
        }

        info!(
            contract = %blueprint.fully_qualified_name(),
            bytecode_len = blueprint.bytecode.len(),
            "Blueprint resolved"
        );
        Ok(ContractFactory::new(
            blueprint.abi,
            blueprint.bytecode,
            self.client.clone(),
        ))
    }

    async fn deploy(&self, factory: Self::Factory) -> Result<Self::Pending> {
        let deployer = factory
            .deploy(())
            .map_err(|e| DeployError::Submission(e.into()))?;

        // Pin the nonce so the contract address is known up front.
        let from = self.client.address();
        let nonce = self
            .client
            .get_transaction_count(from, Some(BlockNumber::Pending.into()))
            .await
            .map_err(|e| DeployError::Submission(e.into()))?;
        let expected_address = get_contract_address(from, nonce);

        let mut tx = deployer.tx;
        tx.set_from(from);
        tx.set_nonce(nonce);
        debug!(%nonce, ?expected_address, "Sending deployment transaction");

        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| DeployError::Submission(e.into()))?;
        let tx_hash = pending.tx_hash();
        info!(?tx_hash, "Deployment transaction sent");

        Ok(PendingDeployment {
            tx_hash,
            expected_address,
        })
    }

    async fn deployed(&self, pending: Self::Pending) -> Result<Deployment> {
        let tx_hash = pending.tx_hash;
        info!(?tx_hash, confirmations = self.confirmations, "Waiting for deployment to be mined");

        let receipt = PendingTransaction::new(tx_hash, self.client.provider())
            .interval(self.poll_interval)
            .confirmations(self.confirmations)
            .await
            .map_err(|e| DeployError::Confirmation {
                tx_hash,
                source: e.into(),
            })?
            .ok_or(DeployError::Dropped(tx_hash))?;

        if receipt.status == Some(U64::zero()) {
            return Err(DeployError::Reverted(tx_hash));
        }
        let address = receipt
            .contract_address
            .ok_or(DeployError::NotDeployed(tx_hash))?;
        if address != pending.expected_address {
            warn!(?address, expected = ?pending.expected_address, "Contract address differs from nonce derivation");
        }

        let code = self
            .client
            .get_code(address, None)
            .await
            .map_err(|e| DeployError::Confirmation {
                tx_hash,
                source: e.into(),
            })?;
        if code.is_empty() {
            return Err(DeployError::NoCode { address, tx_hash });
        }

        info!(
            ?address,
            block = ?receipt.block_number,
            gas_used = ?receipt.gas_used,
            "Deployment confirmed"
        );
        Ok(Deployment {
            address,
            transaction_hash: tx_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        })
    }
}

pub fn build_wallet(signer: &SignerConfig) -> Result<LocalWallet> {
    match signer {
        SignerConfig::PrivateKey(key) => key
            .parse::<LocalWallet>()
            .map_err(|e| DeployError::Config(format!("invalid PRIVATE_KEY: {e}"))),
        SignerConfig::Mnemonic { phrase, index } => MnemonicBuilder::<English>::default()
            .phrase(phrase.as_str())
            .index(*index)
            .and_then(|builder| builder.build())
            .map_err(|e| DeployError::Config(format!("invalid MNEMONIC/ACCOUNT_INDEX: {e}"))),
    }
}
