//! The connection manager. Establishes and memoizes the wallet session,
//! enforces the required network, and hands out read-only or signing
//! handles on demand.

use std::sync::{Arc, Mutex, PoisonError};

use ethers_core::types::Address;
use serde_json::Value;

use crate::constants::{DEFAULT_RPC_URL, REQUIRED_CHAIN_ID};
use crate::error::{ConnectionError, ReadError, WriteError};
use crate::rpc::HttpProvider;

#[derive(Clone)]
struct Session {
    address: Address,
    #[cfg(target_arch = "wasm32")]
    provider: crate::provider::InjectedProvider,
}

/// Memoized connection state. Cloning shares the session.
#[derive(Clone)]
pub struct Wallet {
    session: Arc<Mutex<Option<Session>>>,
    http: HttpProvider,
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

impl Wallet {
    pub fn new() -> Self {
        Self {
            session: Arc::new(Mutex::new(None)),
            http: HttpProvider::new(DEFAULT_RPC_URL),
        }
    }

    fn current_session(&self) -> Option<Session> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Address of the connected account, if any.
    pub fn address(&self) -> Option<Address> {
        self.current_session().map(|s| s.address)
    }

    /// Establishes the wallet session. Idempotent: while a session exists
    /// this returns it without prompting the wallet chooser again.
    ///
    /// Fails with [`ConnectionError::WrongNetwork`] when the wallet is on
    /// any chain other than the required one; the session is not kept.
    pub async fn connect(&self) -> Result<Address, ConnectionError> {
        if let Some(session) = self.current_session() {
            return Ok(session.address);
        }

        #[cfg(target_arch = "wasm32")]
        {
            use std::str::FromStr;

            let provider = crate::provider::InjectedProvider::detect()
                .ok_or(ConnectionError::NoWallet)?;

            let accounts = provider
                .request("eth_requestAccounts", serde_json::json!([]))
                .await
                .map_err(ConnectionError::Provider)?;
            let account = accounts
                .get(0)
                .and_then(Value::as_str)
                .ok_or_else(|| ConnectionError::Provider("no accounts returned".into()))?;
            let address = Address::from_str(account)
                .map_err(|e| ConnectionError::Provider(format!("bad account address: {e}")))?;

            let chain = provider
                .request("eth_chainId", serde_json::json!([]))
                .await
                .map_err(ConnectionError::Provider)?;
            let found = parse_chain_id(&chain)?;
            if found != REQUIRED_CHAIN_ID {
                return Err(ConnectionError::WrongNetwork {
                    found,
                    required: REQUIRED_CHAIN_ID,
                });
            }

            *self
                .session
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(Session { address, provider });
            Ok(address)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            Err(ConnectionError::NoWallet)
        }
    }

    /// A handle for read-only contract calls. Works without a wallet: the
    /// default HTTP provider serves reads until a session exists.
    pub fn read_handle(&self) -> ReadHandle {
        #[cfg(target_arch = "wasm32")]
        if let Some(session) = self.current_session() {
            return ReadHandle::Injected(session.provider);
        }
        ReadHandle::Http(self.http.clone())
    }

    /// A handle bound to the connected account's signing identity.
    pub fn sign_handle(&self) -> Result<SignHandle, ConnectionError> {
        #[cfg(target_arch = "wasm32")]
        {
            let session = self
                .current_session()
                .ok_or(ConnectionError::NotConnected)?;
            Ok(SignHandle {
                from: session.address,
                provider: session.provider,
            })
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            Err(ConnectionError::NotConnected)
        }
    }
}

/// Parses the `eth_chainId` result (`"0x5"`) into a chain number.
fn parse_chain_id(value: &Value) -> Result<u64, ConnectionError> {
    let text = value
        .as_str()
        .ok_or_else(|| ConnectionError::Provider(format!("non-string chain id: {value}")))?;
    u64::from_str_radix(text.trim_start_matches("0x"), 16)
        .map_err(|e| ConnectionError::Provider(format!("bad chain id {text:?}: {e}")))
}

/// Read-only access to the chain, with or without a wallet.
#[derive(Clone)]
pub enum ReadHandle {
    #[cfg(target_arch = "wasm32")]
    Injected(crate::provider::InjectedProvider),
    Http(HttpProvider),
}

impl ReadHandle {
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, ReadError> {
        match self {
            #[cfg(target_arch = "wasm32")]
            ReadHandle::Injected(provider) => provider
                .request(method, params)
                .await
                .map_err(ReadError::Rpc),
            ReadHandle::Http(http) => http.request(method, params).await,
        }
    }

    pub async fn eth_call(&self, to: &str, data: &str) -> Result<String, ReadError> {
        let result = self
            .request(
                "eth_call",
                serde_json::json!([{ "to": to, "data": data }, "latest"]),
            )
            .await?;
        result
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| ReadError::Decode(format!("non-string eth_call result: {result}")))
    }

    /// Receipt of a submitted transaction; `Null` until it is mined.
    pub async fn transaction_receipt(&self, hash: &str) -> Result<Value, ReadError> {
        self.request("eth_getTransactionReceipt", serde_json::json!([hash]))
            .await
    }
}

/// Write access bound to the connected account.
#[cfg(target_arch = "wasm32")]
#[derive(Clone)]
pub struct SignHandle {
    from: Address,
    provider: crate::provider::InjectedProvider,
}

#[cfg(target_arch = "wasm32")]
impl SignHandle {
    /// Submits a transaction and returns its hash. A rejection in the
    /// wallet UI surfaces here as [`WriteError::Rejected`].
    pub async fn send_transaction(
        &self,
        to: &str,
        data: &str,
        value: Option<ethers_core::types::U256>,
    ) -> Result<String, WriteError> {
        let mut tx = serde_json::json!({
            "from": format!("{:?}", self.from),
            "to": to,
            "data": data,
        });
        if let Some(value) = value {
            tx["value"] = serde_json::json!(format!("{value:#x}"));
        }
        let result = self
            .provider
            .request("eth_sendTransaction", serde_json::json!([tx]))
            .await
            .map_err(WriteError::Rejected)?;
        result
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| WriteError::Provider(format!("non-string transaction hash: {result}")))
    }
}

/// Stub for non-wasm targets, where [`Wallet::sign_handle`] always fails
/// before one of these could be produced.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone)]
pub struct SignHandle;

#[cfg(not(target_arch = "wasm32"))]
impl SignHandle {
    pub async fn send_transaction(
        &self,
        _to: &str,
        _data: &str,
        _value: Option<ethers_core::types::U256>,
    ) -> Result<String, WriteError> {
        Err(WriteError::Provider("no injected wallet provider".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chain_id_parses_goerli() {
        assert_eq!(parse_chain_id(&json!("0x5")).unwrap(), 5);
    }

    #[test]
    fn chain_id_parses_mainnet() {
        assert_eq!(parse_chain_id(&json!("0x1")).unwrap(), 1);
    }

    #[test]
    fn chain_id_rejects_garbage() {
        assert!(parse_chain_id(&json!(5)).is_err());
        assert!(parse_chain_id(&json!("0xzz")).is_err());
    }

    #[tokio::test]
    async fn connect_without_a_provider_fails_closed() {
        let wallet = Wallet::new();
        assert_eq!(wallet.connect().await, Err(ConnectionError::NoWallet));
        assert!(wallet.address().is_none());
    }

    #[tokio::test]
    async fn sign_handle_requires_a_session() {
        let wallet = Wallet::new();
        assert!(matches!(
            wallet.sign_handle(),
            Err(ConnectionError::NotConnected)
        ));
    }
}
