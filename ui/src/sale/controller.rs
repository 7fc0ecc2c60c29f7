//! The sale controller: owns the shared record, resolves the phase from the
//! contract, and dispatches the gated write calls.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use api::{ChainClient, ChainError, ConnectionError, U256};
use dioxus_logger::tracing::{error, info, warn};
use tokio::sync::watch;
use web_time::{SystemTime, UNIX_EPOCH};

use super::state::SaleState;

/// The three gated write calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum SaleAction {
    #[strum(to_string = "start presale")]
    StartPresale,
    #[strum(to_string = "presale mint")]
    PresaleMint,
    #[strum(to_string = "public mint")]
    PublicMint,
}

impl SaleAction {
    /// Phase gate, evaluated against the record at dispatch time.
    fn valid_for(self, state: &SaleState) -> bool {
        match self {
            SaleAction::StartPresale => state.is_admin && !state.sale_started,
            SaleAction::PresaleMint => state.sale_started && !state.sale_ended,
            SaleAction::PublicMint => state.sale_started && state.sale_ended,
        }
    }
}

/// Why a dispatched action never reached the chain, or failed there.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("another transaction is still pending")]
    Busy,

    #[error("action is not valid in the current sale phase")]
    WrongPhase,

    #[error(transparent)]
    Chain(#[from] ChainError),
}

struct Shared {
    record: SaleState,
    /// Latched once the admin comparison has succeeded for this
    /// connection, so `owner()` is not re-read on every tick.
    admin_resolved: bool,
}

struct Inner {
    state: Mutex<Shared>,
    updates: watch::Sender<SaleState>,
}

/// Owns the [`SaleState`] record. All mutation goes through here; readers
/// subscribe to snapshots. Cloning shares the record and the client.
pub struct SaleController<C> {
    client: C,
    inner: Arc<Inner>,
}

impl<C> Clone for SaleController<C>
where
    C: Clone,
{
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: ChainClient> SaleController<C> {
    pub fn new(client: C) -> Self {
        let (updates, _) = watch::channel(SaleState::default());
        Self {
            client,
            inner: Arc::new(Inner {
                state: Mutex::new(Shared {
                    record: SaleState::default(),
                    admin_resolved: false,
                }),
                updates,
            }),
        }
    }

    /// Read-only snapshot stream for the rendering layer.
    pub fn subscribe(&self) -> watch::Receiver<SaleState> {
        self.inner.updates.subscribe()
    }

    pub fn snapshot(&self) -> SaleState {
        self.lock().record.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        // Single event loop; a poisoned lock can only mean a panic already
        // tore the session down.
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update_shared(&self, apply: impl FnOnce(&mut Shared)) {
        let snapshot = {
            let mut shared = self.lock();
            apply(&mut shared);
            shared.record.clone()
        };
        self.inner.updates.send_replace(snapshot);
    }

    fn update(&self, apply: impl FnOnce(&mut SaleState)) {
        self.update_shared(|shared| apply(&mut shared.record));
    }

    /// Establishes the wallet session. `connected` flips only after the
    /// network-identity check inside the client has passed.
    pub async fn connect(&self) -> Result<(), ConnectionError> {
        match self.client.connect().await {
            Ok(address) => {
                info!("wallet connected as {address:?}");
                self.update(|s| s.connected = true);
                Ok(())
            }
            Err(e) => {
                warn!("wallet connection failed: {e}");
                Err(e)
            }
        }
    }

    /// Connect plus the initial full resolution pass. The poll loops are
    /// only worth starting when this succeeds.
    pub async fn init(&self) -> Result<(), ConnectionError> {
        self.connect().await?;
        self.refresh().await;
        Ok(())
    }

    /// One full resolution pass: started, then ended (only when started),
    /// then the minted counter.
    pub async fn refresh(&self) {
        if self.resolve_sale_started().await {
            self.resolve_sale_ended().await;
        }
        self.resolve_minted_count().await;
    }

    /// Reads the restricted-sale flag. While the sale has not started this
    /// also derives `is_admin`, since the start-sale affordance hangs off
    /// both. Fail-closed: a read failure returns false and leaves the
    /// record at its last-known value.
    pub async fn resolve_sale_started(&self) -> bool {
        match self.client.presale_started().await {
            Ok(started) => {
                if !started {
                    self.resolve_is_admin().await;
                }
                self.update(|s| s.sale_started = started);
                started
            }
            Err(e) => {
                warn!("presaleStarted read failed: {e}");
                false
            }
        }
    }

    /// Compares the contract deadline against wall-clock time. A deadline
    /// at or before now counts as ended. Fail-closed on read errors.
    pub async fn resolve_sale_ended(&self) -> bool {
        match self.client.presale_ended().await {
            Ok(deadline) => {
                let ended = deadline <= U256::from(unix_now());
                self.update(|s| s.sale_ended = ended);
                ended
            }
            Err(e) => {
                warn!("presaleEnded read failed: {e}");
                false
            }
        }
    }

    /// Refreshes the issued-token counter. The counter is kept as a
    /// decimal string; a failed read keeps the previous value.
    pub async fn resolve_minted_count(&self) {
        match self.client.token_ids().await {
            Ok(count) => self.update(|s| s.minted_count = count.to_string()),
            Err(e) => warn!("tokenIds read failed: {e}"),
        }
    }

    /// Derives `is_admin` at most once per connection. Not latched on
    /// failure, so the next tick retries.
    async fn resolve_is_admin(&self) {
        {
            let shared = self.lock();
            if shared.admin_resolved || !shared.record.connected {
                return;
            }
        }
        let Some(signer) = self.client.signer_address() else {
            return;
        };
        match self.client.owner().await {
            Ok(owner) => self.update_shared(|shared| {
                shared.admin_resolved = true;
                shared.record.is_admin = owner == signer;
            }),
            Err(e) => warn!("owner read failed: {e}"),
        }
    }

    pub async fn start_presale(&self) -> Result<(), DispatchError> {
        self.dispatch(SaleAction::StartPresale).await
    }

    pub async fn presale_mint(&self) -> Result<(), DispatchError> {
        self.dispatch(SaleAction::PresaleMint).await
    }

    pub async fn public_mint(&self) -> Result<(), DispatchError> {
        self.dispatch(SaleAction::PublicMint).await
    }

    /// The shared write protocol: gate on phase and the global `pending`
    /// lock, submit, block until confirmation, then re-resolve. `pending`
    /// is set before the first suspension point and released by a drop
    /// guard, so every exit path unlocks.
    async fn dispatch(&self, action: SaleAction) -> Result<(), DispatchError> {
        {
            let mut shared = self.lock();
            if shared.record.pending {
                return Err(DispatchError::Busy);
            }
            if !action.valid_for(&shared.record) {
                return Err(DispatchError::WrongPhase);
            }
            shared.record.pending = true;
            let snapshot = shared.record.clone();
            drop(shared);
            self.inner.updates.send_replace(snapshot);
        }

        let result = {
            let _pending = PendingGuard { controller: self };
            match action {
                SaleAction::StartPresale => self.client.start_presale().await,
                SaleAction::PresaleMint => self.client.presale_mint().await,
                SaleAction::PublicMint => self.client.mint().await,
            }
        };

        match result {
            Ok(()) => {
                info!("{action} confirmed");
                if action == SaleAction::StartPresale {
                    // The admin gate reads this flag; refresh it before the
                    // generic pass.
                    self.resolve_sale_started().await;
                }
                self.refresh().await;
                Ok(())
            }
            Err(e) => {
                error!("{action} failed: {e}");
                Err(ChainError::from(e).into())
            }
        }
    }
}

/// Clears `pending` when the write path exits, normally or not.
struct PendingGuard<'a, C: ChainClient> {
    controller: &'a SaleController<C>,
}

impl<C: ChainClient> Drop for PendingGuard<'_, C> {
    fn drop(&mut self) {
        self.controller.update(|s| s.pending = false);
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use api::{Address, ConnectionError, WriteError};
    use tokio::sync::Notify;

    use super::super::testing::FakeChain;
    use super::*;
    use crate::sale::state::SalePhase;

    fn connected_controller(fake: &FakeChain) -> SaleController<FakeChain> {
        let controller = SaleController::new(fake.clone());
        controller.update(|s| s.connected = true);
        controller
    }

    #[tokio::test]
    async fn ended_is_never_read_while_the_sale_is_unstarted() {
        let fake = FakeChain::default();
        fake.set_started(Some(false));
        fake.set_minted(Some(0));
        let controller = connected_controller(&fake);

        for _ in 0..3 {
            controller.refresh().await;
        }

        assert_eq!(fake.deadline_reads(), 0);
        assert!(!controller.snapshot().sale_ended);
    }

    #[tokio::test]
    async fn admin_match_is_case_insensitive_and_derived_once() {
        let fake = FakeChain::default();
        fake.set_started(Some(false));
        fake.set_owner(Some(
            Address::from_str("0xABCDEF0123456789abcdef0123456789ABCDEF01").unwrap(),
        ));
        fake.set_signer(Some(
            Address::from_str("0xabcdef0123456789abcdef0123456789abcdef01").unwrap(),
        ));
        let controller = connected_controller(&fake);

        for _ in 0..3 {
            controller.resolve_sale_started().await;
        }

        let state = controller.snapshot();
        assert!(state.is_admin);
        assert_eq!(state.phase(), SalePhase::AdminAwaitingPresale);
        assert_eq!(fake.owner_reads(), 1);
    }

    #[tokio::test]
    async fn failed_owner_read_is_retried_on_the_next_tick() {
        let fake = FakeChain::default();
        fake.set_started(Some(false));
        fake.set_signer(Some(Address::repeat_byte(0x11)));
        fake.set_owner(None);
        let controller = connected_controller(&fake);

        controller.resolve_sale_started().await;
        assert!(!controller.snapshot().is_admin);

        fake.set_owner(Some(Address::repeat_byte(0x11)));
        controller.resolve_sale_started().await;
        assert!(controller.snapshot().is_admin);
        assert_eq!(fake.owner_reads(), 2);
    }

    #[tokio::test]
    async fn admin_is_not_derived_without_a_connection() {
        let fake = FakeChain::default();
        fake.set_started(Some(false));
        fake.set_signer(Some(Address::repeat_byte(0x11)));
        fake.set_owner(Some(Address::repeat_byte(0x11)));
        let controller = SaleController::new(fake.clone());

        controller.resolve_sale_started().await;

        assert_eq!(fake.owner_reads(), 0);
        assert!(!controller.snapshot().is_admin);
    }

    #[tokio::test]
    async fn minted_count_keeps_the_previous_value_on_failure() {
        let fake = FakeChain::default();
        fake.set_minted(Some(5));
        let controller = connected_controller(&fake);

        controller.resolve_minted_count().await;
        assert_eq!(controller.snapshot().minted_count, "5");

        fake.set_minted(None);
        controller.resolve_minted_count().await;
        assert_eq!(controller.snapshot().minted_count, "5");

        fake.set_minted(Some(7));
        controller.resolve_minted_count().await;
        assert_eq!(controller.snapshot().minted_count, "7");
    }

    #[tokio::test]
    async fn a_deadline_in_the_past_means_public_sale() {
        let fake = FakeChain::default();
        fake.set_started(Some(true));
        fake.set_deadline(Some(unix_now() - 10));
        let controller = connected_controller(&fake);

        assert!(controller.resolve_sale_started().await);
        assert!(controller.resolve_sale_ended().await);
        assert_eq!(controller.snapshot().phase(), SalePhase::PublicSale);
    }

    #[tokio::test]
    async fn a_deadline_in_the_future_keeps_the_presale_active() {
        let fake = FakeChain::default();
        fake.set_started(Some(true));
        fake.set_deadline(Some(unix_now() + 600));
        let controller = connected_controller(&fake);

        controller.resolve_sale_started().await;
        assert!(!controller.resolve_sale_ended().await);
        assert_eq!(controller.snapshot().phase(), SalePhase::PresaleActive);
    }

    #[tokio::test]
    async fn failed_reads_fail_closed_and_leave_the_record_alone() {
        let fake = FakeChain::default();
        fake.set_started(Some(true));
        fake.set_deadline(Some(unix_now() + 600));
        let controller = connected_controller(&fake);
        controller.refresh().await;
        let before = controller.snapshot();

        fake.set_started(None);
        fake.set_deadline(None);
        assert!(!controller.resolve_sale_started().await);
        assert!(!controller.resolve_sale_ended().await);
        assert_eq!(controller.snapshot(), before);
    }

    #[tokio::test]
    async fn wrong_network_blocks_init_and_all_reads() {
        let fake = FakeChain::default();
        fake.set_connect_error(Some(ConnectionError::WrongNetwork {
            found: 1,
            required: 5,
        }));
        let controller = SaleController::new(fake.clone());

        let result = controller.init().await;
        assert!(matches!(
            result,
            Err(ConnectionError::WrongNetwork { found: 1, .. })
        ));
        assert!(!controller.snapshot().connected);
        assert_eq!(fake.started_reads(), 0);
        assert_eq!(fake.minted_reads(), 0);
    }

    #[tokio::test]
    async fn dispatch_is_rejected_while_a_write_is_pending() {
        let fake = FakeChain::default();
        fake.set_started(Some(true));
        fake.set_deadline(Some(unix_now() + 600));
        fake.set_minted(Some(1));
        let controller = connected_controller(&fake);
        controller.refresh().await;

        let gate = Arc::new(Notify::new());
        fake.set_write_gate(Some(gate.clone()));
        let second_controller = controller.clone();

        let (first, second) = tokio::join!(controller.presale_mint(), async {
            tokio::task::yield_now().await;
            let second = second_controller.presale_mint().await;
            gate.notify_one();
            second
        });

        assert_eq!(first, Ok(()));
        assert_eq!(second, Err(DispatchError::Busy));
        assert_eq!(fake.writes(), vec!["presaleMint"]);
        assert!(!controller.snapshot().pending);
    }

    #[tokio::test]
    async fn actions_are_gated_by_phase() {
        let fake = FakeChain::default();
        fake.set_started(Some(true));
        fake.set_deadline(Some(unix_now() + 600));
        let controller = connected_controller(&fake);
        controller.refresh().await;

        assert_eq!(
            controller.public_mint().await,
            Err(DispatchError::WrongPhase)
        );
        assert_eq!(
            controller.start_presale().await,
            Err(DispatchError::WrongPhase)
        );
        assert!(fake.writes().is_empty());
    }

    #[tokio::test]
    async fn a_failed_write_releases_the_lock_and_changes_nothing_else() {
        let fake = FakeChain::default();
        fake.set_started(Some(true));
        fake.set_deadline(Some(unix_now() + 600));
        fake.set_minted(Some(3));
        let controller = connected_controller(&fake);
        controller.refresh().await;
        let before = controller.snapshot();

        fake.set_write_error(Some(WriteError::Rejected("user denied".into())));
        let result = controller.presale_mint().await;

        assert!(matches!(
            result,
            Err(DispatchError::Chain(ChainError::Write(
                WriteError::Rejected(_)
            )))
        ));
        assert_eq!(controller.snapshot(), before);
    }

    #[tokio::test]
    async fn confirmed_start_presale_re_resolves_the_started_flag() {
        let fake = FakeChain::default();
        fake.set_started(Some(false));
        fake.set_minted(Some(0));
        fake.set_owner(Some(Address::repeat_byte(0x22)));
        fake.set_signer(Some(Address::repeat_byte(0x22)));
        fake.set_start_presale_flips_flag(true);
        let controller = connected_controller(&fake);
        controller.refresh().await;
        assert_eq!(
            controller.snapshot().phase(),
            SalePhase::AdminAwaitingPresale
        );
        fake.set_deadline(Some(unix_now() + 600));

        controller.start_presale().await.unwrap();

        let state = controller.snapshot();
        assert!(state.sale_started);
        assert!(!state.pending);
        assert_eq!(state.phase(), SalePhase::PresaleActive);
        assert_eq!(fake.writes(), vec!["startPresale"]);
    }

    #[tokio::test]
    async fn a_successful_mint_triggers_a_refresh_pass() {
        let fake = FakeChain::default();
        fake.set_started(Some(true));
        fake.set_deadline(Some(unix_now() + 600));
        fake.set_minted(Some(4));
        let controller = connected_controller(&fake);
        controller.refresh().await;
        let minted_reads_before = fake.minted_reads();

        fake.set_minted(Some(5));
        controller.presale_mint().await.unwrap();

        assert_eq!(controller.snapshot().minted_count, "5");
        assert!(fake.minted_reads() > minted_reads_before);
    }

    #[tokio::test]
    async fn read_errors_do_not_surface_to_callers() {
        let fake = FakeChain::default();
        let controller = connected_controller(&fake);

        // Every backing read is failing; refresh still completes.
        controller.refresh().await;
        let expected = SaleState {
            connected: true,
            ..Default::default()
        };
        assert_eq!(controller.snapshot(), expected);
    }
}
