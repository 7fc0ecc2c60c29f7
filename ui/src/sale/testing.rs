//! A programmable in-memory [`ChainClient`] for the controller and
//! scheduler tests. `None` for any read slot makes that read fail.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use api::{Address, ChainClient, ConnectionError, ReadError, U256, WriteError};
use tokio::sync::Notify;

#[derive(Default)]
struct FakeInner {
    connect_error: Option<ConnectionError>,
    signer: Option<Address>,
    started: Option<bool>,
    deadline: Option<u64>,
    minted: Option<u64>,
    owner: Option<Address>,
    write_error: Option<WriteError>,
    write_gate: Option<Arc<Notify>>,
    start_presale_flips_flag: bool,
    started_reads: usize,
    deadline_reads: usize,
    minted_reads: usize,
    owner_reads: usize,
    writes: Vec<&'static str>,
}

#[derive(Clone, Default)]
pub struct FakeChain {
    inner: Arc<Mutex<FakeInner>>,
}

impl FakeChain {
    fn lock(&self) -> MutexGuard<'_, FakeInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_connect_error(&self, error: Option<ConnectionError>) {
        self.lock().connect_error = error;
    }

    pub fn set_signer(&self, signer: Option<Address>) {
        self.lock().signer = signer;
    }

    pub fn set_started(&self, started: Option<bool>) {
        self.lock().started = started;
    }

    pub fn set_deadline(&self, deadline: Option<u64>) {
        self.lock().deadline = deadline;
    }

    pub fn set_minted(&self, minted: Option<u64>) {
        self.lock().minted = minted;
    }

    pub fn set_owner(&self, owner: Option<Address>) {
        self.lock().owner = owner;
    }

    pub fn set_write_error(&self, error: Option<WriteError>) {
        self.lock().write_error = error;
    }

    /// While set, write calls park on the notify before completing, keeping
    /// the dispatcher's `pending` window open for as long as a test needs.
    pub fn set_write_gate(&self, gate: Option<Arc<Notify>>) {
        self.lock().write_gate = gate;
    }

    /// Makes a confirmed `startPresale` flip the started flag, the way the
    /// real contract would.
    pub fn set_start_presale_flips_flag(&self, flips: bool) {
        self.lock().start_presale_flips_flag = flips;
    }

    pub fn started_reads(&self) -> usize {
        self.lock().started_reads
    }

    pub fn deadline_reads(&self) -> usize {
        self.lock().deadline_reads
    }

    pub fn minted_reads(&self) -> usize {
        self.lock().minted_reads
    }

    pub fn owner_reads(&self) -> usize {
        self.lock().owner_reads
    }

    pub fn writes(&self) -> Vec<&'static str> {
        self.lock().writes.clone()
    }

    async fn write(&self, name: &'static str) -> Result<(), WriteError> {
        let (gate, error, flips) = {
            let mut inner = self.lock();
            inner.writes.push(name);
            (
                inner.write_gate.clone(),
                inner.write_error.clone(),
                inner.start_presale_flips_flag,
            )
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(error) = error {
            return Err(error);
        }
        if name == "startPresale" && flips {
            self.lock().started = Some(true);
        }
        Ok(())
    }
}

impl ChainClient for FakeChain {
    async fn connect(&self) -> Result<Address, ConnectionError> {
        let inner = self.lock();
        match &inner.connect_error {
            Some(error) => Err(error.clone()),
            None => Ok(inner.signer.unwrap_or_default()),
        }
    }

    fn signer_address(&self) -> Option<Address> {
        self.lock().signer
    }

    async fn presale_started(&self) -> Result<bool, ReadError> {
        let mut inner = self.lock();
        inner.started_reads += 1;
        inner
            .started
            .ok_or_else(|| ReadError::Rpc("presaleStarted unavailable".into()))
    }

    async fn presale_ended(&self) -> Result<U256, ReadError> {
        let mut inner = self.lock();
        inner.deadline_reads += 1;
        inner
            .deadline
            .map(U256::from)
            .ok_or_else(|| ReadError::Rpc("presaleEnded unavailable".into()))
    }

    async fn token_ids(&self) -> Result<U256, ReadError> {
        let mut inner = self.lock();
        inner.minted_reads += 1;
        inner
            .minted
            .map(U256::from)
            .ok_or_else(|| ReadError::Rpc("tokenIds unavailable".into()))
    }

    async fn owner(&self) -> Result<Address, ReadError> {
        let mut inner = self.lock();
        inner.owner_reads += 1;
        inner
            .owner
            .ok_or_else(|| ReadError::Rpc("owner unavailable".into()))
    }

    async fn start_presale(&self) -> Result<(), WriteError> {
        self.write("startPresale").await
    }

    async fn presale_mint(&self) -> Result<(), WriteError> {
        self.write("presaleMint").await
    }

    async fn mint(&self) -> Result<(), WriteError> {
        self.write("mint").await
    }
}
