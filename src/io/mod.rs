/// CSV export of curve points.
pub mod export;
