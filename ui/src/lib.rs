// The client-side Dioxus application logic.

use dioxus::prelude::*;

pub mod compat;
mod components;
pub mod hooks;
pub mod sale;
mod screens;

use components::pico::Container;
use screens::MintScreen;

#[allow(non_snake_case)]
pub fn App() -> Element {
    rsx! {
        document::Meta {
            name: "viewport",
            content: "width=device-width, initial-scale=1.0",
        }
        document::Stylesheet {
            href: "https://cdn.jsdelivr.net/npm/@picocss/pico@2.0.6/css/pico.min.css",
        }
        Container {
            header {
                h1 { "Next Tokens" }
                p { "An NFT collection of 20 pieces for developers." }
            }
            MintScreen {}
        }
    }
}
