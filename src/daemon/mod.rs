//! Persistent synthesis daemon.
//!
//! One voice model is loaded at startup and wrapped in an immutable
//! [`DaemonContext`]. The [`DaemonServer`] accepts connections on a Unix
//! socket and spawns one [`handle_connection`] task per client, each given
//! a clone of the shared context.

pub mod context;
pub mod handler;
pub mod server;

pub use context::DaemonContext;
pub use handler::handle_connection;
pub use server::DaemonServer;
