pub mod config;
pub mod demo;
pub mod error;
pub mod mcp;
pub mod proxy;
pub mod routing;
pub mod upstream;
pub mod wrapper;

pub use error::{Result, WrapperError};
pub use wrapper::{ServerWrapper, WrapperState};
