//! Messaging core and board services. Every operation takes an explicit
//! [`Session`] and goes through [`policy`] before it mutates anything.

pub mod aggregator;
pub mod applications;
pub mod bridge;
pub mod composer;
pub mod conversation;
pub mod error;
pub mod jobs;
pub mod policy;
pub mod profile;
pub mod session;
pub mod store;

pub use error::CoreError;
pub use session::Session;

#[cfg(test)]
pub(crate) mod testing;
