//! HTTP API for the signal-series engine

pub mod experiment_handlers;
pub mod handlers;
pub mod query;
pub mod routes;
pub mod series_handlers;

pub use query::*;
pub use routes::create_router;
