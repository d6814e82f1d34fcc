//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use chrono::NaiveDate;

use merit_curve::config::MeritConfig;
use merit_curve::feed::generation::GenerationFeed;
use merit_curve::feed::offers::OfferFeed;
use merit_curve::market::curve::{CurveBuild, PointRole};
use merit_curve::market::pipeline::Pipeline;

/// Trading date of the fixture feeds.
pub fn fixture_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 30).unwrap()
}

/// Path of a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Fixture offer feed (two periods).
pub fn fixture_offers() -> OfferFeed {
    OfferFeed::from_json_file(&fixture_path("offers.json")).unwrap()
}

/// Fixture live-generation feed.
pub fn fixture_generation() -> GenerationFeed {
    GenerationFeed::from_json_file(&fixture_path("generation.json")).unwrap()
}

/// Fixture pipeline project list.
pub fn fixture_pipeline() -> Pipeline {
    Pipeline::from_file(&fixture_path("pipeline.json")).unwrap()
}

/// NZ preset with the interconnector pseudo-generator excluded.
pub fn nz_config() -> MeritConfig {
    let mut config = MeritConfig::nz();
    config.curve.exclude_sites = vec!["HVDC".into()];
    config
}

/// `configs/nz.toml`, which points at the fixture feeds.
pub fn nz_toml_config() -> MeritConfig {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("configs/nz.toml");
    MeritConfig::from_toml_file(&path).unwrap()
}

/// Checks the structural invariants every built curve must hold:
/// x starts at 0 and never decreases, every tranche has three points,
/// midpoints sit halfway along a non-empty step, and gaps never open a
/// segment.
pub fn assert_curve_invariants(build: &CurveBuild) {
    let mut previous_x: Option<f64> = None;
    for segment in &build.segments {
        assert!(
            matches!(segment.points.first(), Some(Some(_))),
            "segment {} starts with a gap",
            segment.fuel
        );
        for point in segment.points() {
            match previous_x {
                None => assert_eq!(point.x, 0.0, "curve must start at 0 MW"),
                Some(px) => assert!(point.x >= px, "x went backwards: {px} -> {}", point.x),
            }
            previous_x = Some(point.x);
        }
        for mid in segment.midpoints() {
            let detail = mid.detail.as_ref().expect("midpoints carry tranche detail");
            assert!(detail.megawatts > 0.0, "zero-MW tranche on the curve");
            assert_eq!(detail.fuel, segment.fuel);
        }
        let roles: Vec<PointRole> = segment.points().map(|p| p.role).collect();
        for step in roles.chunks(3) {
            assert_eq!(step, [PointRole::Start, PointRole::Mid, PointRole::End]);
        }
    }
}
