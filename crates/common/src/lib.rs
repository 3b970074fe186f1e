//! Common types and errors shared across `httpsd` crates.

pub mod error;

pub use error::ServerError;
