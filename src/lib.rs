//! Merit-order supply curves for an electricity-market dashboard.

#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod error;
/// Offer and live-generation feeds.
pub mod feed;
pub mod io;
/// Curve builder, filters, statistics and display helpers.
pub mod market;

pub use error::{Error, Result};
