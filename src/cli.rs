//! Command-line arguments.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Parser, ValueHint};

use merit_curve::config::MeritConfig;
use merit_curve::config::ConfigError;
use merit_curve::market::filter::CurveFilters;
use merit_curve::market::pipeline::SortKey;
use merit_curve::market::types::GridZone;

/// Merit-order supply curves from generator offers.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Load configuration from a TOML file
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Use a built-in preset (nz, demo)
    #[arg(long)]
    pub preset: Option<String>,

    /// Offer feed JSON
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub offers: Option<PathBuf>,

    /// Market operator offers CSV
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "offers")]
    pub offers_csv: Option<PathBuf>,

    /// Directory of per-day offer feeds named YYYY-MM-DD.json
    #[arg(long, value_hint = ValueHint::DirPath, conflicts_with_all = ["offers", "offers_csv"])]
    pub offers_dir: Option<PathBuf>,

    /// Live-generation feed JSON
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub generation: Option<PathBuf>,

    /// Generation pipeline project list (JSON or TOML)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub pipeline: Option<PathBuf>,

    /// Order of the pipeline listing
    #[arg(long, default_value_t = SortKey::default())]
    pub pipeline_sort: SortKey,

    /// Trading date (YYYY-MM-DD); defaults to today, or to the latest
    /// archived day with --offers-dir
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Trading period (1-48)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=48))]
    pub tp: Option<u32>,

    /// Only these sites (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub site: Vec<String>,

    /// Only these operators (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub operator: Vec<String>,

    /// Only these islands (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub island: Vec<String>,

    /// Only these grid zones (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub zone: Vec<GridZone>,

    /// Print the curve as JSON instead of a table
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Export curve points to CSV
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub curve_out: Option<PathBuf>,

    /// Override the synthetic feed seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Start the REST API server after printing the curve
    #[cfg(feature = "api")]
    #[arg(long, action = ArgAction::SetTrue)]
    pub serve: bool,

    /// API server port
    #[cfg(feature = "api")]
    #[arg(long)]
    pub port: Option<u16>,
}

impl Cli {
    /// Resolves the configuration: `--config`, else `--preset`, else `nz`,
    /// with feed and seed flags layered on top.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file or preset cannot be loaded.
    pub fn load_config(&self) -> Result<MeritConfig, ConfigError> {
        let mut config = match (&self.config, &self.preset) {
            (Some(path), _) => MeritConfig::from_toml_file(path)?,
            (None, Some(name)) => MeritConfig::from_preset(name)?,
            (None, None) => MeritConfig::nz(),
        };

        let feed = &mut config.feed;
        if self.offers.is_some() || self.offers_csv.is_some() || self.offers_dir.is_some() {
            feed.offers.clone_from(&self.offers);
            feed.offers_csv.clone_from(&self.offers_csv);
            feed.offers_dir.clone_from(&self.offers_dir);
            feed.synthetic = None;
        }
        if let Some(path) = &self.generation {
            feed.generation = Some(path.clone());
            feed.synthetic = None;
        }
        if let Some(path) = &self.pipeline {
            feed.pipeline = Some(path.clone());
        }
        if let Some(seed) = self.seed {
            feed.synthetic.get_or_insert_with(Default::default).seed = seed;
        }
        #[cfg(feature = "api")]
        if let Some(port) = self.port {
            config.api.port = port;
        }
        Ok(config)
    }

    /// Command-line allow-lists on top of `base`.
    pub fn filters(&self, base: CurveFilters) -> CurveFilters {
        base.with_sites(self.site.iter().cloned())
            .with_operators(self.operator.iter().cloned())
            .with_islands(self.island.iter().cloned())
            .with_zones(self.zone.iter().copied())
    }
}
