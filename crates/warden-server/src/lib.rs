//! Server wiring: configuration, JSON persistence, the console and the
//! [`Server`] facade used by the connection layer.

pub mod config;
pub mod console;
pub mod server;
pub mod store;

pub use server::Server;
