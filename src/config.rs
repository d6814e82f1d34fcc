//! TOML-based configuration and preset definitions.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::market::filter::CurveFilters;
use crate::market::fuel::{FuelStyle, FuelTable};
use crate::market::period::PERIODS_PER_DAY;
use crate::market::summary::SummaryOptions;
use crate::market::types::Site;

/// Top-level configuration parsed from TOML.
///
/// Every section has defaults. Load from TOML with
/// [`MeritConfig::from_toml_file`] or pick a built-in preset with
/// [`MeritConfig::from_preset`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeritConfig {
    /// Curve construction settings.
    #[serde(default)]
    pub curve: CurveConfig,
    /// Fuel label/colour overrides layered over the built-in table,
    /// keyed by fuel code (`[fuels.HYD]`).
    #[serde(default)]
    pub fuels: BTreeMap<String, FuelStyle>,
    /// Generation summary settings.
    #[serde(default)]
    pub summary: SummaryConfig,
    /// Input feed locations.
    #[serde(default)]
    pub feed: FeedConfig,
    /// REST API settings.
    #[serde(default)]
    pub api: ApiConfig,
}

/// Curve construction settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CurveConfig {
    /// Sites never drawn on a curve nor counted in summaries.
    pub exclude_sites: Vec<Site>,
    /// Trading period shown when none is requested (1..=48).
    pub default_period: u32,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            exclude_sites: Vec::new(),
            default_period: 1,
        }
    }
}

/// Generation summary settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SummaryConfig {
    /// Named site groups totalled separately, e.g. a hydro scheme.
    pub groups: BTreeMap<String, Vec<Site>>,
}

/// Input feed locations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    /// Offer feed JSON.
    pub offers: Option<PathBuf>,
    /// Market operator offers CSV, used instead of `offers`.
    pub offers_csv: Option<PathBuf>,
    /// Directory of per-day offer feeds (`YYYY-MM-DD.json`), used instead of `offers`.
    pub offers_dir: Option<PathBuf>,
    /// Live-generation feed JSON.
    pub generation: Option<PathBuf>,
    /// Generation pipeline project list (JSON, or TOML by extension).
    pub pipeline: Option<PathBuf>,
    /// `"{PointOfConnection} {Unit}"` to site code, for the offers CSV.
    pub site_map: BTreeMap<String, Site>,
    /// Generate feeds instead of reading them.
    pub synthetic: Option<SyntheticConfig>,
}

/// Parameters for generated feeds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntheticConfig {
    /// RNG seed.
    pub seed: u64,
    /// Number of generating sites.
    pub sites: usize,
    /// Drop metadata for every n-th site (0 keeps all).
    pub missing_metadata_every: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            sites: 24,
            missing_metadata_every: 0,
        }
    }
}

/// REST API settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// Listen port.
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"curve.default_period"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn sites(codes: &[&str]) -> Vec<Site> {
    codes.iter().map(|s| s.to_string()).collect()
}

impl MeritConfig {
    /// New Zealand market defaults: live feeds read from disk and the
    /// dashboard's regional site groups.
    pub fn nz() -> Self {
        Self {
            summary: SummaryConfig {
                groups: BTreeMap::from([
                    (
                        "Waitaki".to_string(),
                        sites(&["TKA", "TKB", "OHA", "OHB", "OHC", "BEN", "AVI", "WTK"]),
                    ),
                    (
                        "Waikato hydro".to_string(),
                        sites(&["ARA", "OHK", "ATI", "WKM", "MTI", "WPA", "ARI", "KPO"]),
                    ),
                    (
                        "Manawatu wind".to_string(),
                        sites(&["TAP", "TWF", "NZW", "TUR"]),
                    ),
                ]),
            },
            ..Self::default()
        }
    }

    /// Seeded synthetic market, no input files needed.
    pub fn demo() -> Self {
        Self {
            curve: CurveConfig {
                default_period: 36,
                ..CurveConfig::default()
            },
            feed: FeedConfig {
                synthetic: Some(SyntheticConfig {
                    missing_metadata_every: 7,
                    ..SyntheticConfig::default()
                }),
                ..FeedConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["nz", "demo"];

    /// Loads a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "nz" => Ok(Self::nz()),
            "demo" => Ok(Self::demo()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Built-in fuel table with `[fuels]` overrides applied.
    pub fn fuel_table(&self) -> FuelTable {
        let mut table = FuelTable::nz();
        for (code, style) in &self.fuels {
            table.insert(code.clone(), style.clone());
        }
        table
    }

    /// Excluded sites as a set.
    pub fn excluded_sites(&self) -> BTreeSet<Site> {
        self.curve.exclude_sites.iter().cloned().collect()
    }

    /// Filters with only the exclusion set applied.
    pub fn base_filters(&self) -> CurveFilters {
        CurveFilters::none().excluding(self.curve.exclude_sites.iter().cloned())
    }

    /// Site lookup for the offers CSV.
    pub fn site_map(&self) -> HashMap<String, Site> {
        self.feed
            .site_map
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Summary options borrowing from this config and the given tables.
    pub fn summary_options<'a>(
        &'a self,
        exclude: &'a BTreeSet<Site>,
        fuels: &'a FuelTable,
    ) -> SummaryOptions<'a> {
        SummaryOptions {
            exclude,
            fuels,
            groups: &self.summary.groups,
        }
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let c = &self.curve;
        if !(1..=PERIODS_PER_DAY).contains(&c.default_period) {
            errors.push(ConfigError::new(
                "curve.default_period",
                format!("must be in 1..={PERIODS_PER_DAY}, got {}", c.default_period),
            ));
        }
        if c.exclude_sites.iter().any(|s| s.trim().is_empty()) {
            errors.push(ConfigError::new(
                "curve.exclude_sites",
                "site codes must not be blank",
            ));
        }

        for (code, style) in &self.fuels {
            if !is_hex_colour(&style.colour) {
                errors.push(ConfigError::new(
                    format!("fuels.{code}.colour"),
                    format!("must be a #rgb or #rrggbb colour, got \"{}\"", style.colour),
                ));
            }
        }

        for (name, members) in &self.summary.groups {
            if members.is_empty() {
                errors.push(ConfigError::new(
                    format!("summary.groups.{name}"),
                    "must list at least one site",
                ));
            }
        }

        let f = &self.feed;
        let offer_sources = [&f.offers, &f.offers_csv, &f.offers_dir]
            .iter()
            .filter(|p| p.is_some())
            .count();
        if offer_sources > 1 {
            errors.push(ConfigError::new(
                "feed",
                "set only one of feed.offers, feed.offers_csv and feed.offers_dir",
            ));
        }
        if let Some(s) = &f.synthetic {
            if s.sites == 0 {
                errors.push(ConfigError::new("feed.synthetic.sites", "must be > 0"));
            }
            if offer_sources > 0 || f.generation.is_some() {
                errors.push(ConfigError::new(
                    "feed.synthetic",
                    "cannot be combined with feed file paths",
                ));
            }
        }

        if self.api.port == 0 {
            errors.push(ConfigError::new("api.port", "must be > 0"));
        }

        errors
    }
}

fn is_hex_colour(s: &str) -> bool {
    s.strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
