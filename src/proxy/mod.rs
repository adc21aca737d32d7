pub mod server;

pub use server::FilteringProxy;
