//! WebSocket gateway. Each connection identifies with a JWT, receives its
//! conversation list, then gets new messages pushed from the change feed.

pub mod connection;
pub mod session;

pub use connection::{GatewayContext, handle_connection};

#[cfg(test)]
mod testing;
