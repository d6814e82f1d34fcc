//! Input feeds: offers, live generation, and the per-date cache in front of them.

pub mod cache;
/// Live-generation feed (site metadata and unit output).
pub mod generation;
/// Generator offer feed and EMI CSV ingest.
pub mod offers;
pub mod synthetic;

pub use cache::DatedCache;
pub use generation::GenerationFeed;
pub use offers::OfferFeed;
