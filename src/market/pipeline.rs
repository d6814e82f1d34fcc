//! Generation pipeline: projects under construction or consented, with
//! sortable listings and capacity, energy and cost totals.
//!
//! Projects are read from a JSON array or from a TOML file of
//! `[[projects]]` tables, using the field names the project list is
//! published with (`capacityMW`, `yearlyGenerationGWh`, `openBy`, ...).

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

/// One project in the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineProject {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_description: Option<String>,
    pub operator: String,
    /// Fuel or technology, e.g. `Wind`, `Solar`, `Battery`.
    pub fuel: String,
    /// e.g. `Under Construction`, `Commissioning`.
    pub status: String,
    /// Expected commissioning date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_by: Option<NaiveDate>,
    /// Confirmed nameplate capacity (MW AC).
    #[serde(rename = "capacityMW", default, skip_serializing_if = "Option::is_none")]
    pub capacity_mw: Option<f64>,
    /// Estimated capacity when no confirmed figure exists.
    #[serde(rename = "predictedCapacityMW", default, skip_serializing_if = "Option::is_none")]
    pub predicted_capacity_mw: Option<f64>,
    /// Storage size, for batteries.
    #[serde(rename = "capacityMWh", default, skip_serializing_if = "Option::is_none")]
    pub capacity_mwh: Option<f64>,
    /// DC peak, for solar farms.
    #[serde(rename = "capacityMWp", default, skip_serializing_if = "Option::is_none")]
    pub capacity_mwp: Option<f64>,
    #[serde(rename = "yearlyGenerationGWh", default, skip_serializing_if = "Option::is_none")]
    pub yearly_generation_gwh: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_million_dollars: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl PipelineProject {
    /// Confirmed capacity, else the predicted one.
    pub fn nameplate_mw(&self) -> Option<f64> {
        self.capacity_mw.or(self.predicted_capacity_mw)
    }
}

/// Column a pipeline listing is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Name,
    Operator,
    /// Fuel.
    Type,
    Status,
    /// Commissioning date, earliest first.
    #[default]
    Opening,
    /// Confirmed capacity, largest first.
    Nameplate,
    /// Yearly energy, largest first.
    AnnualGeneration,
    /// Cost, largest first.
    Cost,
}

impl SortKey {
    /// Every key, in table-column order.
    pub const ALL: [SortKey; 8] = [
        SortKey::Name,
        SortKey::Operator,
        SortKey::Type,
        SortKey::Status,
        SortKey::Opening,
        SortKey::Nameplate,
        SortKey::AnnualGeneration,
        SortKey::Cost,
    ];

    /// Query-string name, e.g. `annualGeneration`.
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Operator => "operator",
            SortKey::Type => "type",
            SortKey::Status => "status",
            SortKey::Opening => "opening",
            SortKey::Nameplate => "nameplate",
            SortKey::AnnualGeneration => "annualGeneration",
            SortKey::Cost => "cost",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<&str> = SortKey::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown sort key \"{s}\" (expected one of {})", names.join(", "))
            })
    }
}

/// Orders two optional values with `None` last whatever the direction.
fn missing_last<T>(a: Option<T>, b: Option<T>, cmp: impl FnOnce(T, T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn text_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Sorts projects in place by `key`. Stable: ties keep list order.
pub fn sort_projects(projects: &mut [PipelineProject], key: SortKey) {
    projects.sort_by(|a, b| match key {
        SortKey::Name => text_cmp(&a.name, &b.name),
        SortKey::Operator => text_cmp(&a.operator, &b.operator),
        SortKey::Type => text_cmp(&a.fuel, &b.fuel),
        SortKey::Status => text_cmp(&a.status, &b.status),
        SortKey::Opening => missing_last(a.open_by, b.open_by, |a, b| a.cmp(&b)),
        SortKey::Nameplate => missing_last(a.capacity_mw, b.capacity_mw, |a, b| b.total_cmp(&a)),
        SortKey::AnnualGeneration => {
            missing_last(a.yearly_generation_gwh, b.yearly_generation_gwh, |a, b| {
                b.total_cmp(&a)
            })
        }
        SortKey::Cost => missing_last(a.cost_million_dollars, b.cost_million_dollars, |a, b| {
            b.total_cmp(&a)
        }),
    });
}

/// Capacity and energy added in one commissioning year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct YearTotals {
    /// Nameplate (confirmed or predicted) capacity, MW.
    pub capacity_mw: f64,
    /// Yearly energy, GWh.
    pub annual_gwh: f64,
}

/// Pipeline-wide totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineTotals {
    /// Nameplate (confirmed or predicted) capacity, MW.
    pub capacity_mw: f64,
    /// Yearly energy, GWh.
    pub annual_gwh: f64,
    /// Cost of projects with a published figure, $m.
    pub cost_million_dollars: f64,
    /// Keyed by the year of `openBy`; undated projects are left out.
    pub by_year: BTreeMap<i32, YearTotals>,
    /// Confirmed capacity per fuel, MW.
    pub by_fuel: BTreeMap<String, f64>,
}

impl PipelineTotals {
    pub fn from_projects(projects: &[PipelineProject]) -> Self {
        let mut totals = Self::default();
        for p in projects {
            let capacity = p.nameplate_mw().unwrap_or(0.0);
            let energy = p.yearly_generation_gwh.unwrap_or(0.0);
            totals.capacity_mw += capacity;
            totals.annual_gwh += energy;
            totals.cost_million_dollars += p.cost_million_dollars.unwrap_or(0.0);

            if let Some(open_by) = p.open_by {
                let year = totals.by_year.entry(open_by.year()).or_default();
                year.capacity_mw += capacity;
                year.annual_gwh += energy;
            }
            if let Some(mw) = p.capacity_mw {
                *totals.by_fuel.entry(p.fuel.clone()).or_default() += mw;
            }
        }
        totals
    }
}

/// Cost in `$1.23b` form above $1000m, `$450m` below.
pub fn format_cost(million_dollars: f64) -> String {
    if million_dollars > 1000.0 {
        format!("${:.2}b", million_dollars / 1000.0)
    } else {
        format!("${million_dollars}m")
    }
}

/// A loaded project list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub projects: Vec<PipelineProject>,
}

impl Pipeline {
    /// Parses a JSON array of projects.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) on malformed input.
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(Self {
            projects: serde_json::from_str(s)?,
        })
    }

    /// Parses a TOML document of `[[projects]]` tables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Toml`](crate::Error::Toml) on malformed input.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Reads a project list, as TOML for `.toml` files and JSON otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let pipeline = if path.extension().is_some_and(|e| e == "toml") {
            Self::from_toml_str(&text)?
        } else {
            Self::from_json_str(&text)?
        };
        info!(path = %path.display(), projects = pipeline.projects.len(), "loaded pipeline");
        Ok(pipeline)
    }

    /// Projects ordered by `key`.
    pub fn sorted(&self, key: SortKey) -> Vec<PipelineProject> {
        let mut projects = self.projects.clone();
        sort_projects(&mut projects, key);
        projects
    }

    pub fn totals(&self) -> PipelineTotals {
        PipelineTotals::from_projects(&self.projects)
    }
}

/// Text table of a pipeline listing followed by its totals.
pub struct PipelineTable<'a> {
    pub projects: &'a [PipelineProject],
    pub totals: &'a PipelineTotals,
}

impl fmt::Display for PipelineTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Generation Pipeline ---")?;
        for p in self.projects {
            let capacity = p
                .nameplate_mw()
                .map_or_else(|| "?".to_string(), |mw| format!("{mw:.1}"));
            let energy = p
                .yearly_generation_gwh
                .map_or_else(|| "?".to_string(), |gwh| format!("{gwh}"));
            let opening = p
                .open_by
                .map_or_else(String::new, |d| d.format("%B %Y").to_string());
            writeln!(
                f,
                "  {:<28} {:<20} {:<8} {:<18} {:<14} {:>8} MW {:>6} GWh {:>8}",
                p.name,
                p.operator,
                p.fuel,
                p.status,
                opening,
                capacity,
                energy,
                p.cost_million_dollars.map_or_else(String::new, format_cost),
            )?;
        }
        let t = self.totals;
        writeln!(
            f,
            "Total:                 {:.1} MW, {:.0} GWh/yr, {}",
            t.capacity_mw,
            t.annual_gwh,
            format_cost(t.cost_million_dollars)
        )?;
        for (year, y) in &t.by_year {
            writeln!(
                f,
                "  Total in {year}:        {:.1} MW, {:.0} GWh/yr",
                y.capacity_mw, y.annual_gwh
            )?;
        }
        for (fuel, mw) in &t.by_fuel {
            writeln!(f, "  Total for {fuel:<12} {mw:.1} MW")?;
        }
        Ok(())
    }
}
