//! Live-generation feed: per-site names, operators, locations and unit fuels.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::market::types::{GeneratorMetadata, GridZone, MetadataBySite};

/// One generating unit as reported by the live feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveUnit {
    /// Unit code.
    #[serde(default)]
    pub code: String,
    /// Fuel label as published, e.g. `"Battery (Discharging)"`.
    #[serde(default)]
    pub fuel: String,
    /// Fuel code, e.g. `"HYD"`.
    #[serde(default)]
    pub fuel_code: String,
    /// Installed capacity (MW).
    #[serde(default)]
    pub capacity: f64,
    /// Current output (MW).
    #[serde(default)]
    pub generation: f64,
}

/// One site as reported by the live feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveGenerator {
    /// Site code.
    pub site: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Operating participant.
    #[serde(default)]
    pub operator: String,
    /// Island (`"NI"` / `"SI"`).
    #[serde(default)]
    pub island: String,
    /// Grid zone number.
    #[serde(default)]
    pub grid_zone: GridZone,
    /// Units in feed order.
    #[serde(default)]
    pub units: Vec<LiveUnit>,
}

impl LiveGenerator {
    /// Metadata record for the curve builder. Fuel comes from the first unit.
    pub fn metadata(&self) -> GeneratorMetadata {
        GeneratorMetadata {
            name: self.name.clone(),
            operator: self.operator.clone(),
            island: self.island.clone(),
            grid_zone: self.grid_zone,
            fuel_code: self
                .units
                .first()
                .map(|u| u.fuel_code.clone())
                .filter(|c| !c.is_empty()),
        }
    }

    /// Sum of unit outputs (MW).
    pub fn generation(&self) -> f64 {
        self.units.iter().map(|u| u.generation).sum()
    }

    /// Sum of unit capacities (MW).
    pub fn capacity(&self) -> f64 {
        self.units.iter().map(|u| u.capacity).sum()
    }
}

/// Snapshot of the live-generation feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationFeed {
    /// Feed timestamp as published.
    #[serde(default)]
    pub last_update: Option<String>,
    /// All reporting sites.
    #[serde(default)]
    pub generators: Vec<LiveGenerator>,
}

impl GenerationFeed {
    /// Parses the feed from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::error::Error::Json) on malformed input.
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Reads the feed from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let feed = Self::from_json_str(&content)?;
        info!(
            path = %path.display(),
            generators = feed.generators.len(),
            "loaded live-generation feed"
        );
        Ok(feed)
    }

    /// Looks up a site.
    pub fn generator(&self, site: &str) -> Option<&LiveGenerator> {
        self.generators.iter().find(|g| g.site == site)
    }

    /// Builds the site-keyed metadata map. Later duplicates of a site win.
    pub fn metadata_by_site(&self) -> MetadataBySite {
        self.generators
            .iter()
            .map(|g| (g.site.clone(), g.metadata()))
            .collect()
    }
}
