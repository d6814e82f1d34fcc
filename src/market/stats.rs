//! Summary figures derived from a built supply curve.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::curve::CurveSegment;

/// One horizontal step of the curve, recovered from its midpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Step {
    start: f64,
    end: f64,
    price: f64,
}

fn steps(segments: &[CurveSegment]) -> Vec<Step> {
    let mut cumulative = 0.0_f64;
    segments
        .iter()
        .flat_map(CurveSegment::midpoints)
        .filter_map(|p| p.detail.as_ref().map(|d| (d.megawatts, p.y)))
        .map(|(mw, price)| {
            let start = cumulative;
            cumulative += mw;
            Step {
                start,
                end: cumulative,
                price,
            }
        })
        .collect()
}

/// Aggregate figures for one merit-order curve.
///
/// Computed after the fact from the segments so the figures always agree
/// with what was drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveStats {
    /// Total quantity offered (MW).
    pub total_megawatts: f64,
    /// Number of tranches on the curve.
    pub tranche_count: usize,
    /// Number of fuel segments.
    pub segment_count: usize,
    /// Cheapest offer price, `None` for an empty curve.
    pub min_price: Option<f64>,
    /// Dearest offer price, `None` for an empty curve.
    pub max_price: Option<f64>,
    /// Quantity-weighted mean price, `None` for an empty curve.
    pub weighted_average_price: Option<f64>,
    /// Quantity offered per fuel code (MW).
    pub megawatts_by_fuel: BTreeMap<String, f64>,
}

impl CurveStats {
    /// Computes statistics over `segments`.
    pub fn from_segments(segments: &[CurveSegment]) -> Self {
        let steps = steps(segments);

        let mut megawatts_by_fuel = BTreeMap::new();
        for segment in segments {
            *megawatts_by_fuel
                .entry(segment.fuel.clone())
                .or_insert(0.0) += segment.megawatts();
        }

        let total: f64 = steps.iter().map(|s| s.end - s.start).sum();
        let weighted = if total > 0.0 {
            Some(steps.iter().map(|s| (s.end - s.start) * s.price).sum::<f64>() / total)
        } else {
            None
        };

        Self {
            total_megawatts: steps.last().map_or(0.0, |s| s.end),
            tranche_count: steps.len(),
            segment_count: segments.len(),
            min_price: steps.iter().map(|s| s.price).min_by(f64::total_cmp),
            max_price: steps.iter().map(|s| s.price).max_by(f64::total_cmp),
            weighted_average_price: weighted,
            megawatts_by_fuel,
        }
    }
}

impl fmt::Display for CurveStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let price = |p: Option<f64>| p.map_or_else(|| "-".to_string(), |p| format!("${p:.2}"));
        writeln!(f, "--- Supply Curve ---")?;
        writeln!(f, "Offered capacity:      {:.1} MW", self.total_megawatts)?;
        writeln!(
            f,
            "Tranches / segments:   {} / {}",
            self.tranche_count, self.segment_count
        )?;
        writeln!(
            f,
            "Price range:           {} .. {} /MWh",
            price(self.min_price),
            price(self.max_price)
        )?;
        write!(
            f,
            "Weighted avg price:    {} /MWh",
            price(self.weighted_average_price)
        )
    }
}

/// Price of the step supplying the `demand_mw`-th megawatt.
///
/// A demand exactly on a step boundary takes the cheaper step. Zero
/// demand takes the first step. Returns `None` for negative demand or
/// demand beyond total supply.
pub fn price_at(segments: &[CurveSegment], demand_mw: f64) -> Option<f64> {
    if demand_mw.is_nan() || demand_mw < 0.0 {
        return None;
    }
    steps(segments)
        .into_iter()
        .find(|s| demand_mw <= s.end)
        .map(|s| s.price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::curve::build_curve;
    use crate::market::filter::CurveFilters;
    use crate::market::types::{GeneratorMetadata, GeneratorOffer, MetadataBySite};

    fn meta(fuel: &str) -> GeneratorMetadata {
        GeneratorMetadata {
            name: fuel.into(),
            operator: "OpCo".into(),
            island: "NI".into(),
            grid_zone: 1,
            fuel_code: Some(fuel.into()),
        }
    }

    fn sample() -> Vec<CurveSegment> {
        let offers = vec![
            GeneratorOffer::new("H", "H1")
                .with_tranche(1, 100.0, 10.0)
                .with_tranche(2, 50.0, 20.0),
            GeneratorOffer::new("G", "G1").with_tranche(1, 50.0, 100.0),
        ];
        let metadata = MetadataBySite::from([
            ("H".to_string(), meta("HYD")),
            ("G".to_string(), meta("GAS")),
        ]);
        build_curve(&offers, &metadata, &CurveFilters::none()).segments
    }

    #[test]
    fn totals_and_prices() {
        let stats = CurveStats::from_segments(&sample());
        assert_eq!(stats.total_megawatts, 200.0);
        assert_eq!(stats.tranche_count, 3);
        assert_eq!(stats.segment_count, 2);
        assert_eq!(stats.min_price, Some(10.0));
        assert_eq!(stats.max_price, Some(100.0));
        // (100*10 + 50*20 + 50*100) / 200 = 35
        assert!((stats.weighted_average_price.unwrap() - 35.0).abs() < 1e-9);
        assert_eq!(stats.megawatts_by_fuel.get("HYD"), Some(&150.0));
        assert_eq!(stats.megawatts_by_fuel.get("GAS"), Some(&50.0));
    }

    #[test]
    fn empty_curve_stats() {
        let stats = CurveStats::from_segments(&[]);
        assert_eq!(stats.total_megawatts, 0.0);
        assert_eq!(stats.tranche_count, 0);
        assert!(stats.min_price.is_none());
        assert!(stats.weighted_average_price.is_none());
        assert!(!stats.to_string().is_empty());
    }

    #[test]
    fn price_lookup_by_demand() {
        let segments = sample();
        assert_eq!(price_at(&segments, 0.0), Some(10.0));
        assert_eq!(price_at(&segments, 100.0), Some(10.0));
        assert_eq!(price_at(&segments, 100.5), Some(20.0));
        assert_eq!(price_at(&segments, 175.0), Some(100.0));
        assert_eq!(price_at(&segments, 200.0), Some(100.0));
        assert_eq!(price_at(&segments, 200.1), None);
        assert_eq!(price_at(&segments, -1.0), None);
        assert_eq!(price_at(&[], 0.0), None);
    }
}
