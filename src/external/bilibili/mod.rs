mod client;
mod types;
pub mod wbi;

pub use client::BilibiliClient;
pub use wbi::WbiKeys;
