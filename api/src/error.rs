use thiserror::Error;

/// Failure to establish or use a wallet session.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("no injected wallet provider found")]
    NoWallet,

    #[error("wrong network: connected to chain {found}, required chain {required}")]
    WrongNetwork { found: u64, required: u64 },

    #[error("no wallet is connected")]
    NotConnected,

    #[error("wallet provider error: {0}")]
    Provider(String),
}

/// A read call against the contract failed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReadError {
    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("http transport error: {0}")]
    Http(String),

    #[error("malformed call result: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ReadError {
    fn from(err: reqwest::Error) -> Self {
        ReadError::Http(err.to_string())
    }
}

/// A state-changing call failed or was rejected before confirmation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WriteError {
    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("wallet provider error: {0}")]
    Provider(String),

    #[error("confirmation failed: {0}")]
    Confirmation(String),
}

/// The full taxonomy, for callers that handle all three kinds at once.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Write(#[from] WriteError),
}
