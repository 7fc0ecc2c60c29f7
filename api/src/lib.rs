//! The chain boundary for the token-sale page.
//!
//! Everything that talks to the outside world lives here: the wallet
//! connection, the JSON-RPC transports, the ABI plumbing for the sale
//! contract, and the error taxonomy. The `ui` crate only ever sees the
//! [`ChainClient`] trait and plain Rust types.

pub mod abi;
mod client;
pub mod constants;
mod error;
pub mod provider;
pub mod rpc;
mod wallet;

pub use client::{ChainClient, EthChain};
pub use error::{ChainError, ConnectionError, ReadError, WriteError};
pub use ethers_core::types::{Address, U256};
pub use wallet::{ReadHandle, SignHandle, Wallet};

use std::time::Duration;

/// Cross-target async sleep, used by the confirmation wait.
pub async fn sleep(duration: Duration) {
    #[cfg(target_arch = "wasm32")]
    gloo_timers::future::sleep(duration).await;

    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(duration).await;
}
