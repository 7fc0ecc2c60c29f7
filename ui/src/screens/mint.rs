//=============================================================================
// File: src/screens/mint.rs
//=============================================================================
use dioxus::prelude::*;

use crate::components::pico::{Button, Card, Modal};
use crate::hooks::use_sale::{use_sale, SaleNotice};
use crate::sale::SalePhase;

fn notice_title(notice: &SaleNotice) -> &'static str {
    if notice.success {
        "Success"
    } else {
        "Error"
    }
}

/// The one screen of the page: the minted counter, the single affordance
/// valid for the current phase, and the outcome dialog for writes.
#[component]
pub fn MintScreen() -> Element {
    let sale = use_sale();
    let mut dialog_open = use_signal(|| false);

    // Pop the dialog whenever a write completes.
    use_effect(move || {
        if sale.notice.read().is_some() {
            dialog_open.set(true);
        }
    });

    let state = sale.state.read().clone();
    let pending = state.pending;
    let notice = sale.notice.read().clone();

    rsx! {
        if let Some(notice) = notice {
            Modal {
                is_open: dialog_open,
                title: notice_title(&notice).to_string(),
                p { "{notice.message}" }
            }
        }
        Card {
            p { "{state.minted_line()}" }
            if pending {
                p { "Loading..." }
            }
            match state.phase() {
                SalePhase::Disconnected => rsx! {
                    Button {
                        on_click: move |_| sale.connect(),
                        "Connect your wallet"
                    }
                },
                SalePhase::AdminAwaitingPresale => rsx! {
                    Button {
                        disabled: pending,
                        on_click: move |_| sale.start_presale(),
                        "Start Presale!"
                    }
                },
                SalePhase::AwaitingPresale => rsx! {
                    p { "Presale hasnt started!" }
                },
                SalePhase::PresaleActive => rsx! {
                    div {
                        p { "Presale has started!! 🥳" }
                        Button {
                            disabled: pending,
                            on_click: move |_| sale.presale_mint(),
                            "Presale Mint 🚀"
                        }
                    }
                },
                SalePhase::PublicSale => rsx! {
                    Button {
                        disabled: pending,
                        on_click: move |_| sale.public_mint(),
                        "Public Mint"
                    }
                },
            }
        }
    }
}
