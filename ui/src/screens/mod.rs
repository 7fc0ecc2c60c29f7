mod mint;

pub use mint::MintScreen;
