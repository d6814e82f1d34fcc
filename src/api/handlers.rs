//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use tracing::debug;

use super::AppState;
use super::types::{
    CurveQuery, CurveResponse, ErrorResponse, PeriodInfo, PipelineQuery, PipelineResponse,
    StatsResponse,
};
use crate::market::curve::{CurveBuild, build_curve};
use crate::market::filter::{operators_offered, sites_offered};
use crate::market::fuel::FuelTable;
use crate::market::period::TradingPeriod;
use crate::market::stats::{CurveStats, price_at};
use crate::market::summary::GenerationSummary;
use crate::market::types::GeneratorOffer;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// A curve resolved for one request.
struct Resolved<'a> {
    timestamp: &'a str,
    period: u32,
    offers: &'a [GeneratorOffer],
    build: CurveBuild,
}

/// Picks the period, applies the filters and builds the curve.
fn resolve<'a>(state: &'a AppState, query: &CurveQuery) -> Result<Resolved<'a>, ApiError> {
    let filters = query
        .filters(state.config.base_filters())
        .map_err(|e| error(StatusCode::BAD_REQUEST, e))?;
    let tp = query.tp.map_or_else(
        || TradingPeriod::wrapping(state.config.curve.default_period),
        TradingPeriod::wrapping,
    );
    let (timestamp, offers) = state
        .offers
        .offers_for_period(tp)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "offer feed is empty"))?;
    let period = TradingPeriod::from_timestamp(timestamp)
        .map_or(tp.number(), |(_, p)| p.number());
    debug!(%tp, timestamp, active = filters.is_active(), "building curve");

    Ok(Resolved {
        timestamp,
        period,
        offers,
        build: build_curve(offers, &state.metadata, &filters),
    })
}

/// Lists the trading periods present in the offer feed, with both the feed
/// position that `tp` selects and the period of each timestamp.
///
/// `GET /v1/periods` → 200 + `Vec<PeriodInfo>` JSON
pub async fn get_periods(State(state): State<Arc<AppState>>) -> Json<Vec<PeriodInfo>> {
    let periods = state
        .offers
        .timestamps()
        .zip(1..)
        .map(|(timestamp, position)| PeriodInfo {
            position,
            period: TradingPeriod::from_timestamp(timestamp)
                .map_or(position, |(_, p)| p.number()),
            timestamp: timestamp.to_string(),
        })
        .collect();
    Json(periods)
}

/// Builds the merit-order curve for one period.
///
/// `GET /v1/curve?tp=N&site=A,B&operator=X&island=NI&zone=1,2` → 200 + `CurveResponse`
/// `GET /v1/curve?zone=north` → 400 + `ErrorResponse`
/// Empty offer feed → 404 + `ErrorResponse`
pub async fn get_curve(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CurveQuery>,
) -> Result<Json<CurveResponse>, ApiError> {
    let r = resolve(&state, &query)?;
    Ok(Json(CurveResponse {
        timestamp: r.timestamp.to_string(),
        period: r.period,
        sites: sites_offered(r.offers),
        operators: operators_offered(r.offers, &state.metadata),
        segments: r.build.segments,
        quarantined: r.build.quarantined,
    }))
}

/// Curve totals and price figures for one period.
///
/// `GET /v1/curve/stats?tp=N&demand=MW` → 200 + `StatsResponse`
pub async fn get_curve_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CurveQuery>,
) -> Result<Json<StatsResponse>, ApiError> {
    let r = resolve(&state, &query)?;
    Ok(Json(StatsResponse {
        timestamp: r.timestamp.to_string(),
        period: r.period,
        stats: CurveStats::from_segments(&r.build.segments),
        clearing_price: query
            .demand
            .and_then(|mw| price_at(&r.build.segments, mw)),
    }))
}

/// Generation and capacity totals from the live feed.
///
/// `GET /v1/summary` → 200 + `GenerationSummary` JSON
pub async fn get_summary(State(state): State<Arc<AppState>>) -> Json<GenerationSummary> {
    let options = state.config.summary_options(&state.exclude, &state.fuels);
    Json(GenerationSummary::from_feed(&state.generation, options))
}

/// Fuel labels and colours.
///
/// `GET /v1/fuels` → 200 + fuel code map
pub async fn get_fuels(State(state): State<Arc<AppState>>) -> Json<FuelTable> {
    Json(state.fuels.clone())
}

/// Pipeline projects in the requested order, with totals.
///
/// `GET /v1/pipeline?sort=cost` → 200 + `PipelineResponse`
/// Unknown `sort` → 400
pub async fn get_pipeline(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PipelineQuery>,
) -> Json<PipelineResponse> {
    let sort = query.sort.unwrap_or_default();
    Json(PipelineResponse {
        sort,
        projects: state.pipeline.sorted(sort),
        totals: state.pipeline.totals(),
    })
}
