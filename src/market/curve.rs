//! Merit-order supply curve construction.
//!
//! [`build_curve`] flattens per-unit offer stacks into tranches, sorts them
//! cheapest first and lays them end to end along a cumulative-MW axis. The
//! result is split into [`CurveSegment`]s, one per contiguous run of the same
//! fuel, so a renderer can draw each run as its own stepped series.

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use super::filter::CurveFilters;
use super::types::{GeneratorOffer, MetadataBySite, Tranche, UNKNOWN_FUEL};

/// Position of a point within its tranche's horizontal step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointRole {
    /// Left edge of the step. Carries no tranche detail.
    Start,
    /// Middle of the step; the hover target. Carries tranche detail.
    Mid,
    /// Right edge of the step. Carries no tranche detail.
    End,
}

impl fmt::Display for PointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::Mid => "mid",
            Self::End => "end",
        };
        f.write_str(s)
    }
}

/// Tranche metadata attached to a curve's midpoint for tooltip display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrancheDetail {
    /// Site code.
    pub site: String,
    /// Unit code.
    pub unit: String,
    /// Site display name, or the site code when metadata is missing.
    pub name: String,
    /// Operator, when metadata is available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    /// Tranche number within the unit's stack.
    pub tranche: u32,
    /// Tranche quantity (MW).
    pub megawatts: f64,
    /// Raw fuel code.
    pub fuel: String,
}

/// One vertex of the stepped curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurvePoint {
    /// Cumulative offered quantity (MW).
    pub x: f64,
    /// Offer price ($/MWh).
    pub y: f64,
    /// Where on the tranche step this point sits.
    pub role: PointRole,
    /// Present on [`PointRole::Mid`] points only.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub detail: Option<TrancheDetail>,
}

impl CurvePoint {
    fn anchor(x: f64, y: f64, role: PointRole) -> Self {
        Self {
            x,
            y,
            role,
            detail: None,
        }
    }
}

/// A contiguous run of same-fuel tranches.
///
/// `None` entries in `points` are gap markers: the renderer must not join
/// the points either side of one. Serialized as JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveSegment {
    /// Raw fuel code shared by every tranche in the run.
    pub fuel: String,
    /// Points in drawing order, with gap markers.
    pub points: Vec<Option<CurvePoint>>,
}

impl CurveSegment {
    fn new(fuel: &str) -> Self {
        Self {
            fuel: fuel.to_string(),
            points: Vec::new(),
        }
    }

    /// Points with gap markers skipped.
    pub fn points(&self) -> impl Iterator<Item = &CurvePoint> {
        self.points.iter().flatten()
    }

    /// Midpoints, one per tranche.
    pub fn midpoints(&self) -> impl Iterator<Item = &CurvePoint> {
        self.points().filter(|p| p.role == PointRole::Mid)
    }

    /// Number of gap markers.
    pub fn gap_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_none()).count()
    }

    /// Quantity covered by this segment (MW).
    pub fn megawatts(&self) -> f64 {
        self.midpoints()
            .filter_map(|p| p.detail.as_ref())
            .map(|d| d.megawatts)
            .sum()
    }

    /// Cumulative-MW span `(first x, last x)`, `None` if empty.
    pub fn span(&self) -> Option<(f64, f64)> {
        let first = self.points().next()?.x;
        let last = self.points().last()?.x;
        Some((first, last))
    }
}

/// Why a tranche was kept off the curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuarantineReason {
    /// Price or quantity is NaN or infinite.
    NonFinite,
    /// Quantity below zero.
    NegativeQuantity,
}

/// A tranche rejected before sorting because it would corrupt the curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarantinedTranche {
    /// Site code.
    pub site: String,
    /// Unit code.
    pub unit: String,
    /// The offending tranche as read.
    pub tranche: Tranche,
    /// Rejection reason.
    pub reason: QuarantineReason,
}

/// Output of [`build_curve`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CurveBuild {
    /// Fuel segments in merit order.
    pub segments: Vec<CurveSegment>,
    /// Tranches that passed the filters but were malformed.
    pub quarantined: Vec<QuarantinedTranche>,
}

impl CurveBuild {
    /// Whether the curve has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Every point of every segment in order, gap markers skipped.
    pub fn points(&self) -> impl Iterator<Item = &CurvePoint> {
        self.segments.iter().flat_map(CurveSegment::points)
    }

    /// Total quantity on the curve (MW).
    pub fn total_megawatts(&self) -> f64 {
        self.points().last().map_or(0.0, |p| p.x)
    }
}

/// A tranche joined with its site's metadata, ready for sorting.
struct MeritTranche<'a> {
    site: &'a str,
    unit: &'a str,
    name: &'a str,
    operator: Option<&'a str>,
    fuel: &'a str,
    tranche: &'a Tranche,
}

impl MeritTranche<'_> {
    fn detail(&self) -> TrancheDetail {
        TrancheDetail {
            site: self.site.to_string(),
            unit: self.unit.to_string(),
            name: self.name.to_string(),
            operator: self.operator.map(str::to_string),
            tranche: self.tranche.tranche,
            megawatts: self.tranche.megawatts,
            fuel: self.fuel.to_string(),
        }
    }
}

/// Builds the merit-order supply curve for one trading period.
///
/// Steps:
///
/// 1. Every non-zero tranche of every offer admitted by `filters` is joined
///    with its site metadata. Missing metadata yields fuel `UNKNOWN` and the
///    site code as name. Non-finite or negative tranches are quarantined.
/// 2. Tranches are sorted by price, then fuel code; ties keep feed order.
/// 3. Tranches are laid end to end from 0 MW. A new segment opens whenever
///    the fuel changes. Within a segment, a price change inserts a gap
///    marker before the new step; the first step of a new segment never
///    gets one, even when the price also changed.
///
/// Each tranche contributes a start anchor, a midpoint carrying
/// [`TrancheDetail`] and an end anchor, all at the tranche price.
///
/// # Examples
///
/// ```
/// use merit_curve::market::curve::build_curve;
/// use merit_curve::market::filter::CurveFilters;
/// use merit_curve::market::types::{GeneratorOffer, MetadataBySite};
///
/// let offers = vec![GeneratorOffer::new("A", "A1").with_tranche(1, 100.0, 50.0)];
/// let curve = build_curve(&offers, &MetadataBySite::new(), &CurveFilters::none());
/// assert_eq!(curve.segments.len(), 1);
/// assert_eq!(curve.segments[0].fuel, "UNKNOWN");
/// assert_eq!(curve.total_megawatts(), 100.0);
/// ```
pub fn build_curve(
    offers: &[GeneratorOffer],
    metadata: &MetadataBySite,
    filters: &CurveFilters,
) -> CurveBuild {
    let mut quarantined = Vec::new();
    let mut merit = Vec::new();

    for offer in offers {
        let meta = metadata.get(&offer.site);
        if !filters.admits(&offer.site, meta) {
            continue;
        }
        for tranche in &offer.tranches {
            if tranche.megawatts == 0.0 {
                continue;
            }
            let reason = if !tranche.is_finite() {
                Some(QuarantineReason::NonFinite)
            } else if tranche.megawatts < 0.0 {
                Some(QuarantineReason::NegativeQuantity)
            } else {
                None
            };
            if let Some(reason) = reason {
                warn!(
                    site = %offer.site,
                    unit = %offer.unit,
                    tranche = tranche.tranche,
                    ?reason,
                    "quarantined tranche"
                );
                quarantined.push(QuarantinedTranche {
                    site: offer.site.clone(),
                    unit: offer.unit.clone(),
                    tranche: tranche.clone(),
                    reason,
                });
                continue;
            }
            merit.push(MeritTranche {
                site: &offer.site,
                unit: &offer.unit,
                name: meta.map_or(offer.site.as_str(), |m| m.name.as_str()),
                operator: meta.map(|m| m.operator.as_str()),
                fuel: meta.map_or(UNKNOWN_FUEL, |m| m.fuel()),
                tranche,
            });
        }
    }

    merit.sort_by(|a, b| {
        a.tranche
            .price
            .total_cmp(&b.tranche.price)
            .then_with(|| a.fuel.cmp(b.fuel))
    });

    let mut segments: Vec<CurveSegment> = Vec::new();
    let mut cumulative = 0.0_f64;
    let mut previous_price: Option<f64> = None;

    for t in &merit {
        let price = t.tranche.price;
        let start = cumulative;
        let end = start + t.tranche.megawatts;
        let mid = (start + end) / 2.0;
        let price_changed = previous_price.is_some_and(|p| p != price);

        let continues = segments.last().is_some_and(|s| s.fuel == t.fuel);
        if !continues {
            segments.push(CurveSegment::new(t.fuel));
        }
        if let Some(segment) = segments.last_mut() {
            if continues && price_changed {
                segment.points.push(None);
            }
            segment
                .points
                .push(Some(CurvePoint::anchor(start, price, PointRole::Start)));
            segment.points.push(Some(CurvePoint {
                x: mid,
                y: price,
                role: PointRole::Mid,
                detail: Some(t.detail()),
            }));
            segment
                .points
                .push(Some(CurvePoint::anchor(end, price, PointRole::End)));
        }

        cumulative = end;
        previous_price = Some(price);
    }

    debug!(
        offers = offers.len(),
        tranches = merit.len(),
        segments = segments.len(),
        quarantined = quarantined.len(),
        total_mw = cumulative,
        "built merit-order curve"
    );

    CurveBuild {
        segments,
        quarantined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::types::GeneratorMetadata;

    fn meta(fuel: &str) -> GeneratorMetadata {
        GeneratorMetadata {
            name: format!("{fuel} station"),
            operator: "OpCo".into(),
            island: "NI".into(),
            grid_zone: 1,
            fuel_code: Some(fuel.into()),
        }
    }

    fn xs(segment: &CurveSegment) -> Vec<Option<f64>> {
        segment.points.iter().map(|p| p.as_ref().map(|p| p.x)).collect()
    }

    #[test]
    fn empty_offers_give_empty_curve() {
        let curve = build_curve(&[], &MetadataBySite::new(), &CurveFilters::none());
        assert!(curve.is_empty());
        assert!(curve.quarantined.is_empty());
        assert_eq!(curve.total_megawatts(), 0.0);
    }

    #[test]
    fn cheaper_fuel_comes_first() {
        let offers = vec![
            GeneratorOffer::new("A", "A1").with_tranche(1, 100.0, 50.0),
            GeneratorOffer::new("B", "B1").with_tranche(1, 50.0, 30.0),
        ];
        let metadata = MetadataBySite::from([
            ("A".to_string(), meta("Coal")),
            ("B".to_string(), meta("Hydro")),
        ]);
        let curve = build_curve(&offers, &metadata, &CurveFilters::none());

        assert_eq!(curve.segments.len(), 2);
        assert_eq!(curve.segments[0].fuel, "Hydro");
        assert_eq!(
            xs(&curve.segments[0]),
            vec![Some(0.0), Some(25.0), Some(50.0)]
        );
        assert_eq!(curve.segments[1].fuel, "Coal");
        assert_eq!(
            xs(&curve.segments[1]),
            vec![Some(50.0), Some(100.0), Some(150.0)]
        );
    }

    #[test]
    fn same_fuel_price_step_inserts_gap() {
        let offers = vec![
            GeneratorOffer::new("A", "A1")
                .with_tranche(1, 10.0, 30.0)
                .with_tranche(2, 20.0, 40.0),
        ];
        let metadata = MetadataBySite::from([("A".to_string(), meta("GAS"))]);
        let curve = build_curve(&offers, &metadata, &CurveFilters::none());

        assert_eq!(curve.segments.len(), 1);
        assert_eq!(
            xs(&curve.segments[0]),
            vec![
                Some(0.0),
                Some(5.0),
                Some(10.0),
                None,
                Some(10.0),
                Some(20.0),
                Some(30.0)
            ]
        );
    }

    #[test]
    fn same_fuel_same_price_has_no_gap() {
        let offers = vec![
            GeneratorOffer::new("A", "A1").with_tranche(1, 10.0, 30.0),
            GeneratorOffer::new("A", "A2").with_tranche(1, 10.0, 30.0),
        ];
        let metadata = MetadataBySite::from([("A".to_string(), meta("GAS"))]);
        let curve = build_curve(&offers, &metadata, &CurveFilters::none());
        assert_eq!(curve.segments.len(), 1);
        assert_eq!(curve.segments[0].gap_count(), 0);
        assert_eq!(curve.segments[0].points.len(), 6);
    }

    #[test]
    fn fuel_change_with_price_change_has_no_leading_gap() {
        let offers = vec![
            GeneratorOffer::new("A", "A1").with_tranche(1, 10.0, 10.0),
            GeneratorOffer::new("B", "B1").with_tranche(1, 10.0, 90.0),
        ];
        let metadata = MetadataBySite::from([
            ("A".to_string(), meta("HYD")),
            ("B".to_string(), meta("GAS")),
        ]);
        let curve = build_curve(&offers, &metadata, &CurveFilters::none());
        assert_eq!(curve.segments.len(), 2);
        assert!(curve.segments[1].points[0].is_some());
        assert_eq!(curve.segments[1].gap_count(), 0);
    }

    #[test]
    fn reappearing_fuel_opens_new_segment() {
        let offers = vec![
            GeneratorOffer::new("H", "H1").with_tranche(1, 10.0, 5.0),
            GeneratorOffer::new("G", "G1").with_tranche(1, 10.0, 50.0),
            GeneratorOffer::new("H", "H2").with_tranche(1, 10.0, 100.0),
        ];
        let metadata = MetadataBySite::from([
            ("H".to_string(), meta("HYD")),
            ("G".to_string(), meta("GAS")),
        ]);
        let curve = build_curve(&offers, &metadata, &CurveFilters::none());
        let fuels: Vec<&str> = curve.segments.iter().map(|s| s.fuel.as_str()).collect();
        assert_eq!(fuels, vec!["HYD", "GAS", "HYD"]);
    }

    #[test]
    fn equal_prices_group_by_fuel_code() {
        let offers = vec![
            GeneratorOffer::new("W", "W1").with_tranche(1, 10.0, 0.0),
            GeneratorOffer::new("H", "H1").with_tranche(1, 10.0, 0.0),
            GeneratorOffer::new("W", "W2").with_tranche(1, 10.0, 0.0),
        ];
        let metadata = MetadataBySite::from([
            ("W".to_string(), meta("WIN")),
            ("H".to_string(), meta("HYD")),
        ]);
        let curve = build_curve(&offers, &metadata, &CurveFilters::none());
        let fuels: Vec<&str> = curve.segments.iter().map(|s| s.fuel.as_str()).collect();
        assert_eq!(fuels, vec!["HYD", "WIN"]);
        assert_eq!(curve.segments[1].megawatts(), 20.0);
    }

    #[test]
    fn zero_quantity_tranches_produce_no_points() {
        let offers = vec![
            GeneratorOffer::new("A", "A1")
                .with_tranche(1, 0.0, 10.0)
                .with_tranche(2, 5.0, 20.0)
                .with_tranche(3, 0.0, 30.0),
        ];
        let curve = build_curve(&offers, &MetadataBySite::new(), &CurveFilters::none());
        let tranches: Vec<u32> = curve
            .points()
            .filter_map(|p| p.detail.as_ref())
            .map(|d| d.tranche)
            .collect();
        assert_eq!(tranches, vec![2]);
    }

    #[test]
    fn missing_metadata_uses_sentinels() {
        let offers = vec![GeneratorOffer::new("XYZ", "XYZ0").with_tranche(1, 5.0, 1.0)];
        let curve = build_curve(&offers, &MetadataBySite::new(), &CurveFilters::none());
        let detail = curve.points().find_map(|p| p.detail.as_ref()).unwrap();
        assert_eq!(detail.fuel, UNKNOWN_FUEL);
        assert_eq!(detail.name, "XYZ");
        assert!(detail.operator.is_none());
    }

    #[test]
    fn only_midpoints_carry_detail() {
        let offers = vec![GeneratorOffer::new("A", "A1").with_tranche(1, 8.0, 12.0)];
        let metadata = MetadataBySite::from([("A".to_string(), meta("GEO"))]);
        let curve = build_curve(&offers, &metadata, &CurveFilters::none());
        for p in curve.points() {
            assert_eq!(p.detail.is_some(), p.role == PointRole::Mid);
        }
        let detail = curve.points().find_map(|p| p.detail.as_ref()).unwrap();
        assert_eq!(detail.name, "GEO station");
        assert_eq!(detail.operator.as_deref(), Some("OpCo"));
    }

    #[test]
    fn excluded_site_contributes_nothing() {
        let offers = vec![
            GeneratorOffer::new("HVDC", "HVDC1").with_tranche(1, 500.0, 1.0),
            GeneratorOffer::new("A", "A1").with_tranche(1, 10.0, 2.0),
        ];
        let filters = CurveFilters::none().excluding(["HVDC"]);
        let curve = build_curve(&offers, &MetadataBySite::new(), &filters);
        assert!(
            curve
                .points()
                .filter_map(|p| p.detail.as_ref())
                .all(|d| d.site != "HVDC")
        );
        assert_eq!(curve.total_megawatts(), 10.0);
    }

    #[test]
    fn malformed_tranches_are_quarantined() {
        let offers = vec![
            GeneratorOffer::new("A", "A1")
                .with_tranche(1, 10.0, f64::NAN)
                .with_tranche(2, -5.0, 10.0)
                .with_tranche(3, 10.0, 20.0),
        ];
        let curve = build_curve(&offers, &MetadataBySite::new(), &CurveFilters::none());
        assert_eq!(curve.quarantined.len(), 2);
        assert_eq!(curve.quarantined[0].reason, QuarantineReason::NonFinite);
        assert_eq!(
            curve.quarantined[1].reason,
            QuarantineReason::NegativeQuantity
        );
        assert_eq!(curve.total_megawatts(), 10.0);
    }

    #[test]
    fn gap_serializes_as_null() {
        let offers = vec![
            GeneratorOffer::new("A", "A1")
                .with_tranche(1, 10.0, 30.0)
                .with_tranche(2, 10.0, 40.0),
        ];
        let curve = build_curve(&offers, &MetadataBySite::new(), &CurveFilters::none());
        let json = serde_json::to_value(&curve.segments).unwrap();
        assert!(json[0]["points"][3].is_null());
        assert_eq!(json[0]["points"][1]["role"], "mid");
        assert_eq!(json[0]["points"][1]["site"], "A");
        assert!(json[0]["points"][0].get("site").is_none());
    }
}
