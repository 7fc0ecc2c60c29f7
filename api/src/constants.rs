//! Fixed parameters of the sale: where the contract lives, which network it
//! is deployed on, and what a token costs.

use ethers_core::types::U256;

/// Address of the deployed NFT sale contract.
pub const NFT_CONTRACT_ADDRESS: &str = "0x8C4A2a9C31cFDE7B75C4c9C5C1f13bF2b8cD3B1e";

/// The sale only runs on the Goerli test network.
pub const REQUIRED_CHAIN_ID: u64 = 5;

/// Public read-only endpoint used before a wallet is connected.
pub const DEFAULT_RPC_URL: &str = "https://rpc.ankr.com/eth_goerli";

/// Collection size shown in the "n/20 minted" status line. Enforcement is
/// the contract's job, not ours.
pub const MAX_TOKEN_SUPPLY: u64 = 20;

/// Price of one token, in wei (0.01 ether).
pub fn token_price_wei() -> U256 {
    U256::from(10_000_000_000_000_000u64)
}
