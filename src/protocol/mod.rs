//! Protocol Module
//!
//! The memcache text protocol: wire codec, per-client connection loop and the
//! TCP accept loop.

pub mod codec;
mod connection;
mod server;

pub use codec::{CommandDecoder, MAX_KEY_LENGTH, MAX_VALUE_SIZE};
pub use connection::{serve_connection, Connection};
pub use server::serve;
