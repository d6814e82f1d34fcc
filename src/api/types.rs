//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::market::curve::{CurveSegment, QuarantinedTranche};
use crate::market::filter::CurveFilters;
use crate::market::pipeline::{PipelineProject, PipelineTotals, SortKey};
use crate::market::stats::CurveStats;
use crate::market::types::{GridZone, Operator, Site};

/// One trading period available in the offer feed.
#[derive(Debug, Serialize)]
pub struct PeriodInfo {
    /// 1-based position in the feed; the value `tp` selects.
    pub position: u32,
    /// Trading period of `timestamp`, as reported by the curve endpoints.
    pub period: u32,
    /// Feed timestamp.
    pub timestamp: String,
}

/// Curve for one trading period.
#[derive(Debug, Serialize)]
pub struct CurveResponse {
    /// Feed timestamp the offers were taken from.
    pub timestamp: String,
    /// Trading period of `timestamp`.
    pub period: u32,
    /// Fuel segments in merit order; gap markers are `null`.
    pub segments: Vec<CurveSegment>,
    /// Tranches left out because of malformed numbers.
    pub quarantined: Vec<QuarantinedTranche>,
    /// Every site offering in this period, for filter pickers.
    pub sites: Vec<Site>,
    /// Every operator offering in this period, for filter pickers.
    pub operators: Vec<Operator>,
}

/// Curve statistics for one trading period.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Feed timestamp the offers were taken from.
    pub timestamp: String,
    /// Trading period of `timestamp`.
    pub period: u32,
    /// Totals and price figures.
    #[serde(flatten)]
    pub stats: CurveStats,
    /// Price of the step covering `demand`, when requested and covered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clearing_price: Option<f64>,
}

/// Query parameters for `/v1/pipeline`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PipelineQuery {
    /// Listing order, e.g. `?sort=annualGeneration`; commissioning date
    /// when absent.
    pub sort: Option<SortKey>,
}

/// Sorted pipeline listing with its totals.
#[derive(Debug, Serialize)]
pub struct PipelineResponse {
    pub sort: SortKey,
    pub projects: Vec<PipelineProject>,
    pub totals: PipelineTotals,
}

/// Query parameters shared by the curve endpoints.
///
/// List parameters are comma-separated, e.g. `?site=MAN,BEN&zone=13,14`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CurveQuery {
    /// Position of the period in the feed (see `PeriodInfo::position`);
    /// wraps into 1..=48.
    pub tp: Option<u32>,
    /// Site allow-list.
    pub site: Option<String>,
    /// Operator allow-list.
    pub operator: Option<String>,
    /// Island allow-list.
    pub island: Option<String>,
    /// Grid zone allow-list.
    pub zone: Option<String>,
    /// Demand (MW) to price against the curve.
    pub demand: Option<f64>,
}

fn split_list(param: Option<&str>) -> Vec<String> {
    param
        .into_iter()
        .flat_map(|s| s.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl CurveQuery {
    /// Applies the allow-lists on top of `base`.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first grid zone that is not a number.
    pub fn filters(&self, base: CurveFilters) -> Result<CurveFilters, String> {
        let zones = split_list(self.zone.as_deref())
            .into_iter()
            .map(|z| {
                z.parse::<GridZone>()
                    .map_err(|_| format!("invalid grid zone \"{z}\""))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(base
            .with_sites(split_list(self.site.as_deref()))
            .with_operators(split_list(self.operator.as_deref()))
            .with_islands(split_list(self.island.as_deref()))
            .with_zones(zones))
    }
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_lists_become_allow_lists() {
        let query = CurveQuery {
            site: Some("MAN, BEN,,".into()),
            zone: Some("13,14".into()),
            ..CurveQuery::default()
        };
        let filters = query.filters(CurveFilters::none().excluding(["HVDC"])).unwrap();
        assert_eq!(filters.site, vec!["MAN", "BEN"]);
        assert_eq!(filters.zone, vec![13, 14]);
        assert!(filters.operator.is_empty());
        assert!(filters.exclude.contains("HVDC"));
    }

    #[test]
    fn bad_zone_is_rejected() {
        let query = CurveQuery {
            zone: Some("13,north".into()),
            ..CurveQuery::default()
        };
        let err = query.filters(CurveFilters::none()).unwrap_err();
        assert!(err.contains("north"));
    }
}
