//! # keylock-core
//!
//! Keyed mutual exclusion over long-lived connections. A [`Registry`] hands
//! out one exclusive token per resource key, a [`Session`] drives one
//! connection through acquire, grant and release, and the [`client`] module
//! (feature `client`) talks to a server running those sessions over websockets.
//!
//! [`Registry`]: registry::Registry
//! [`Session`]: session::Session

pub mod connection;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod token;
pub mod types;
#[cfg(feature = "client")]
pub mod client;

pub use error::{Error, Result};

#[cfg(test)]
mod session_test;
