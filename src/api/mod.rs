//! REST API over the loaded feeds.
//!
//! Read-only GET endpoints:
//! - `/v1/periods`: trading periods present in the offer feed
//! - `/v1/curve`: merit-order curve for one period, with optional filters
//! - `/v1/curve/stats`: curve totals and price figures
//! - `/v1/summary`: generation and capacity totals
//! - `/v1/fuels`: fuel labels and colours
//! - `/v1/pipeline`: generation projects in the build pipeline, sortable

mod handlers;
pub mod types;

use std::collections::BTreeSet;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::config::MeritConfig;
use crate::feed::generation::GenerationFeed;
use crate::feed::offers::OfferFeed;
use crate::market::fuel::FuelTable;
use crate::market::pipeline::Pipeline;
use crate::market::types::{MetadataBySite, Site};

/// Immutable application state shared across all request handlers.
///
/// Built once after the feeds are loaded and wrapped in `Arc`. Every
/// request builds its own curve, so no locks are needed.
pub struct AppState {
    /// Active configuration.
    pub config: MeritConfig,
    /// Offers for every period of the trading day.
    pub offers: OfferFeed,
    /// Live-generation snapshot.
    pub generation: GenerationFeed,
    /// Site metadata derived from `generation`.
    pub metadata: MetadataBySite,
    /// Fuel table with config overrides applied.
    pub fuels: FuelTable,
    /// Sites excluded from curves and summaries.
    pub exclude: BTreeSet<Site>,
    /// Generation pipeline projects, empty unless configured.
    pub pipeline: Pipeline,
}

impl AppState {
    /// Derives lookup tables from the config and feeds.
    pub fn new(config: MeritConfig, offers: OfferFeed, generation: GenerationFeed) -> Self {
        Self {
            metadata: generation.metadata_by_site(),
            fuels: config.fuel_table(),
            exclude: config.excluded_sites(),
            config,
            offers,
            generation,
            pipeline: Pipeline::default(),
        }
    }

    /// Attaches a pipeline project list.
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/periods", get(handlers::get_periods))
        .route("/v1/curve", get(handlers::get_curve))
        .route("/v1/curve/stats", get(handlers::get_curve_stats))
        .route("/v1/summary", get(handlers::get_summary))
        .route("/v1/fuels", get(handlers::get_fuels))
        .route("/v1/pipeline", get(handlers::get_pipeline))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process exits.
///
/// # Errors
///
/// Returns an error if the listener cannot bind to `addr` or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
