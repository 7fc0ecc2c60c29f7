use std::time::Duration;

use dioxus_logger::tracing::warn;
use ethers_core::types::{Address, U256};
use serde_json::Value;

use crate::abi;
use crate::constants::{token_price_wei, NFT_CONTRACT_ADDRESS};
use crate::error::{ConnectionError, ReadError, WriteError};
use crate::wallet::Wallet;

/// The typed call surface of the sale contract, plus the wallet session it
/// rides on. The controller in `ui` is generic over this so its state
/// machine runs against an in-memory fake in tests.
#[allow(async_fn_in_trait)]
pub trait ChainClient: Clone {
    /// Establishes the wallet session (idempotent).
    async fn connect(&self) -> Result<Address, ConnectionError>;

    /// Address of the connected signing identity, once connected.
    fn signer_address(&self) -> Option<Address>;

    /// Whether the restricted sale has been started.
    async fn presale_started(&self) -> Result<bool, ReadError>;

    /// Unix deadline at which the restricted sale window closes.
    async fn presale_ended(&self) -> Result<U256, ReadError>;

    /// Number of tokens issued so far.
    async fn token_ids(&self) -> Result<U256, ReadError>;

    /// The contract's administrator address.
    async fn owner(&self) -> Result<Address, ReadError>;

    /// Admin-only: transition the contract into the restricted sale.
    async fn start_presale(&self) -> Result<(), WriteError>;

    /// Mint one token during the restricted sale (payable).
    async fn presale_mint(&self) -> Result<(), WriteError>;

    /// Mint one token during the open sale (payable).
    async fn mint(&self) -> Result<(), WriteError>;
}

const RECEIPT_POLL_PERIOD: Duration = Duration::from_secs(1);

/// [`ChainClient`] backed by the real contract: reads go through the
/// current read handle (injected provider or the default HTTP endpoint),
/// writes through the signing handle, and confirmation means the
/// transaction receipt exists.
#[derive(Clone, Default)]
pub struct EthChain {
    wallet: Wallet,
}

impl EthChain {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read(&self, signature: &str) -> Result<String, ReadError> {
        self.wallet
            .read_handle()
            .eth_call(NFT_CONTRACT_ADDRESS, &abi::call_data(signature))
            .await
    }

    async fn write(&self, signature: &str, value: Option<U256>) -> Result<(), WriteError> {
        let sign = self
            .wallet
            .sign_handle()
            .map_err(|e| WriteError::Provider(e.to_string()))?;
        let hash = sign
            .send_transaction(NFT_CONTRACT_ADDRESS, &abi::call_data(signature), value)
            .await?;
        self.wait_for_confirmation(&hash).await
    }

    /// Blocks until the transaction is mined. Transient receipt-poll
    /// failures are retried on the next period; a reverted transaction is
    /// a write failure.
    async fn wait_for_confirmation(&self, hash: &str) -> Result<(), WriteError> {
        let reads = self.wallet.read_handle();
        loop {
            match reads.transaction_receipt(hash).await {
                Ok(Value::Null) => {}
                Ok(receipt) => {
                    if receipt.get("status").and_then(Value::as_str) == Some("0x0") {
                        return Err(WriteError::Rejected(format!(
                            "transaction {hash} reverted"
                        )));
                    }
                    return Ok(());
                }
                Err(e) => warn!("receipt poll for {hash} failed, retrying: {e}"),
            }
            crate::sleep(RECEIPT_POLL_PERIOD).await;
        }
    }
}

impl ChainClient for EthChain {
    async fn connect(&self) -> Result<Address, ConnectionError> {
        self.wallet.connect().await
    }

    fn signer_address(&self) -> Option<Address> {
        self.wallet.address()
    }

    async fn presale_started(&self) -> Result<bool, ReadError> {
        abi::decode_bool(&self.read("presaleStarted()").await?)
    }

    async fn presale_ended(&self) -> Result<U256, ReadError> {
        abi::decode_uint(&self.read("presaleEnded()").await?)
    }

    async fn token_ids(&self) -> Result<U256, ReadError> {
        abi::decode_uint(&self.read("tokenIds()").await?)
    }

    async fn owner(&self) -> Result<Address, ReadError> {
        abi::decode_address(&self.read("owner()").await?)
    }

    async fn start_presale(&self) -> Result<(), WriteError> {
        self.write("startPresale()", None).await
    }

    async fn presale_mint(&self) -> Result<(), WriteError> {
        self.write("presaleMint()", Some(token_price_wei())).await
    }

    async fn mint(&self) -> Result<(), WriteError> {
        self.write("mint()", Some(token_price_wei())).await
    }
}
