//! Signal-series engine
//!
//! Series of signal values ordered along an experiment-wide chain of
//! stamps, stored in the property graph behind [`GraphStore`].
//!
//! - [`stamp_chain`]: locate-or-insert over an experiment's stamp chain
//! - [`value_chain`]: append values to a series
//! - [`service`]: save, read, delete and transform whole series
//!
//! [`GraphStore`]: crate::graph_api::GraphStore

pub mod error;
pub mod kind;
pub mod models;
pub mod service;
pub mod stamp_chain;
pub mod value_chain;

pub use error::{Result, SignalError};
pub use kind::{SeriesDomain, SeriesKind, SeriesType};
pub use models::*;
pub use service::SignalSeriesService;
