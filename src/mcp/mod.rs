pub mod backend;
pub(crate) mod client;

pub use backend::ToolBackend;
pub(crate) use client::handshake;
pub use client::UpstreamClient;
