pub mod bilibili;
pub mod client;
pub mod source;
pub mod user_agent;

pub use bilibili::BilibiliClient;
pub use client::build_http_client;
pub use source::{Video, VideoSource};
