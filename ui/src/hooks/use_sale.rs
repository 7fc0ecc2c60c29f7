//! Wires the sale controller into the component tree: one coroutine owns
//! the controller and the poll loops, a mirror task copies snapshots into
//! the signal the views read, and button handlers just send commands.

use api::EthChain;
use dioxus::prelude::*;
use dioxus_logger::tracing::{debug, warn};
use futures::StreamExt;

use crate::sale::{
    run_minted_count_loop, run_sale_status_loop, DispatchError, SaleController, SaleState,
    POLL_PERIOD,
};

/// Outcome of a completed write, surfaced as a dialog by the screen.
#[derive(Clone, Debug, PartialEq)]
pub struct SaleNotice {
    pub success: bool,
    pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum SaleCommand {
    Connect,
    StartPresale,
    PresaleMint,
    PublicMint,
}

#[derive(Clone, Copy)]
pub struct UseSale {
    /// Read-only projection of the controller's record.
    pub state: Signal<SaleState>,
    /// Latest write outcome, if any.
    pub notice: Signal<Option<SaleNotice>>,
    commands: Coroutine<SaleCommand>,
}

impl UseSale {
    pub fn connect(&self) {
        self.commands.send(SaleCommand::Connect);
    }

    pub fn start_presale(&self) {
        self.commands.send(SaleCommand::StartPresale);
    }

    pub fn presale_mint(&self) {
        self.commands.send(SaleCommand::PresaleMint);
    }

    pub fn public_mint(&self) {
        self.commands.send(SaleCommand::PublicMint);
    }
}

pub fn use_sale() -> UseSale {
    let mut state = use_signal(SaleState::default);
    let notice = use_signal(|| None);

    let commands = use_coroutine(move |mut rx: UnboundedReceiver<SaleCommand>| async move {
        let controller = SaleController::new(EthChain::new());

        // Mirror controller snapshots into the signal the views read.
        let mut updates = controller.subscribe();
        spawn(async move {
            loop {
                state.set(updates.borrow_and_update().clone());
                if updates.changed().await.is_err() {
                    break;
                }
            }
        });

        // The page connects on mount; the connect button remains for the
        // case where that fails (no wallet, wrong network, rejection).
        let mut session_up = start_session(&controller).await;

        while let Some(command) = rx.next().await {
            match command {
                SaleCommand::Connect => {
                    if !session_up {
                        session_up = start_session(&controller).await;
                    }
                }
                SaleCommand::StartPresale => {
                    report(notice, controller.start_presale().await, "Presale started!");
                }
                SaleCommand::PresaleMint => {
                    report(
                        notice,
                        controller.presale_mint().await,
                        "You successfully minted a Next Token!",
                    );
                }
                SaleCommand::PublicMint => {
                    report(
                        notice,
                        controller.public_mint().await,
                        "You successfully minted a Next Token!",
                    );
                }
            }
        }
    });

    UseSale {
        state,
        notice,
        commands,
    }
}

/// Connect, run the initial resolution pass, and start both poll loops.
/// Loops are only started on a successful connect, so a wrong-network
/// session never polls.
async fn start_session(controller: &SaleController<EthChain>) -> bool {
    match controller.init().await {
        Ok(()) => {
            spawn(run_sale_status_loop(controller.clone(), POLL_PERIOD));
            spawn(run_minted_count_loop(controller.clone(), POLL_PERIOD));
            true
        }
        Err(e) => {
            warn!("session start failed: {e}");
            false
        }
    }
}

fn report(
    mut notice: Signal<Option<SaleNotice>>,
    result: Result<(), DispatchError>,
    success_message: &str,
) {
    match result {
        Ok(()) => notice.set(Some(SaleNotice {
            success: true,
            message: success_message.to_string(),
        })),
        // The button is disabled while pending; a Busy here is just a
        // double-click racing the disable.
        Err(DispatchError::Busy) => debug!("action ignored: write already pending"),
        Err(e) => notice.set(Some(SaleNotice {
            success: false,
            message: e.to_string(),
        })),
    }
}
