//! merit-curve entry point: CLI wiring, feed loading and curve output.

mod cli;

use std::process;

use chrono::{Local, NaiveDate};
use clap::Parser;
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use merit_curve::config::MeritConfig;
use merit_curve::feed::generation::GenerationFeed;
use merit_curve::feed::offers::{OfferArchive, OfferFeed, load_emi_csv};
use merit_curve::feed::synthetic::SyntheticMarket;
use merit_curve::io::export::export_curve_csv;
use merit_curve::market::curve::{CurveBuild, build_curve};
use merit_curve::market::period::TradingPeriod;
use merit_curve::market::pipeline::{Pipeline, PipelineTable};
use merit_curve::market::stats::CurveStats;
use merit_curve::market::summary::GenerationSummary;
use merit_curve::{Error, Result};

use cli::Cli;

/// JSON document printed by `--json`.
#[derive(Serialize)]
struct CurveOutput<'a> {
    timestamp: &'a str,
    period: u32,
    #[serde(flatten)]
    build: &'a CurveBuild,
    stats: CurveStats,
}

/// Loads the offer and live-generation feeds named by the config.
///
/// Without `--date`, synthetic feeds use today and an offer archive serves
/// its latest day.
fn load_feeds(config: &MeritConfig, date: Option<NaiveDate>) -> Result<(OfferFeed, GenerationFeed)> {
    let feed = &config.feed;
    let today = Local::now().date_naive();

    if let Some(s) = &feed.synthetic {
        let date = date.unwrap_or(today);
        info!(seed = s.seed, sites = s.sites, %date, "generating synthetic feeds");
        let market = SyntheticMarket {
            sites: s.sites,
            missing_metadata_every: s.missing_metadata_every,
            ..SyntheticMarket::day(date, s.seed)
        };
        let (generation, offers) = market.generate();
        return Ok((offers, generation));
    }

    let offers = if let Some(path) = &feed.offers_csv {
        load_emi_csv(path, &config.site_map())?
    } else if let Some(path) = &feed.offers {
        OfferFeed::from_json_file(path)?
    } else if let Some(dir) = &feed.offers_dir {
        let mut archive = OfferArchive::new(dir, today);
        let (served, offers) = archive.load_or_latest(date)?;
        info!(date = %served, dir = %dir.display(), "loaded offer archive day");
        offers.clone()
    } else {
        warn!("no offer feed configured; pass --offers, --offers-csv, --offers-dir or --preset demo");
        OfferFeed::default()
    };

    let generation = match &feed.generation {
        Some(path) => GenerationFeed::from_json_file(path)?,
        None => {
            warn!("no live-generation feed; every site will show as UNKNOWN fuel");
            GenerationFeed::default()
        }
    };

    Ok((offers, generation))
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.load_config()?;

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("{e}");
        }
        process::exit(2);
    }

    let (offers, generation) = load_feeds(&config, cli.date)?;
    let pipeline = match &config.feed.pipeline {
        Some(path) => Pipeline::from_file(path)?,
        None => Pipeline::default(),
    };

    let tp = TradingPeriod::new(cli.tp.unwrap_or(config.curve.default_period))?;
    let Some((timestamp, period_offers)) = offers.offers_for_period(tp) else {
        warn!("offer feed is empty, nothing to draw");
        return Ok(());
    };
    if tp.index() >= offers.len() {
        warn!(%tp, periods = offers.len(), "period not in feed, showing the first period");
    }

    let metadata = generation.metadata_by_site();
    let filters = cli.filters(config.base_filters());
    let build = build_curve(period_offers, &metadata, &filters);
    let stats = CurveStats::from_segments(&build.segments);
    let period = TradingPeriod::from_timestamp(timestamp).map_or(tp, |(_, p)| p);

    if cli.json {
        let output = CurveOutput {
            timestamp,
            period: period.number(),
            build: &build,
            stats,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Offers for {timestamp} ({period})");
        for segment in &build.segments {
            let (from, to) = segment.span().unwrap_or_default();
            println!(
                "  {:<6} {:>9.1} - {:>9.1} MW  {:>3} tranches",
                segment.fuel,
                from,
                to,
                segment.midpoints().count()
            );
        }
        println!("\n{stats}");
        if !build.quarantined.is_empty() {
            println!("Quarantined tranches:  {}", build.quarantined.len());
        }
        if !generation.generators.is_empty() {
            let exclude = config.excluded_sites();
            let fuels = config.fuel_table();
            let summary =
                GenerationSummary::from_feed(&generation, config.summary_options(&exclude, &fuels));
            println!("\n{summary}");
        }
        if !pipeline.projects.is_empty() {
            let projects = pipeline.sorted(cli.pipeline_sort);
            let totals = pipeline.totals();
            print!(
                "\n{}",
                PipelineTable {
                    projects: &projects,
                    totals: &totals,
                }
            );
        }
    }

    if let Some(path) = &cli.curve_out {
        export_curve_csv(&build.segments, path)?;
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let addr = SocketAddr::from(([0, 0, 0, 0], config.api.port));
        let state = Arc::new(
            merit_curve::api::AppState::new(config, offers, generation).with_pipeline(pipeline),
        );
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(merit_curve::api::serve(state, addr))?;
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli) {
        error!("{e}");
        let code = match e {
            Error::Config(_) | Error::Period(_) => 2,
            _ => 1,
        };
        process::exit(code);
    }
}
