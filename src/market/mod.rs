//! Merit-order curve construction and the types it works on.

pub mod curve;
/// Fuel code labels, colours and renewable flags.
pub mod fuel;
/// Allow-list filters and offered-site helpers.
pub mod filter;
pub mod period;
/// Generation projects in the build pipeline.
pub mod pipeline;
pub mod stats;
/// Generation and capacity totals.
pub mod summary;
pub mod tooltip;
pub mod types;

// Re-export the main types for convenience
pub use curve::{CurveBuild, CurvePoint, CurveSegment, PointRole, build_curve};
pub use filter::CurveFilters;
pub use fuel::FuelTable;
pub use period::TradingPeriod;
pub use types::{GeneratorMetadata, GeneratorOffer, MetadataBySite, Tranche};
