//! Graph API client and models
//!
//! The Graph API is an HTTP front of the property graph holding experiments,
//! series, signal values and stamp chains.

pub mod client;
pub mod models;
pub mod traits;

pub use client::GraphApiClient;
pub use models::*;
pub use traits::GraphStore;

#[cfg(test)]
pub(crate) mod mock;
