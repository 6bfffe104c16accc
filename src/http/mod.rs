//! HTTP server lifecycle.

pub mod server;
pub mod shutdown;

pub use server::{serve, ServerError};
