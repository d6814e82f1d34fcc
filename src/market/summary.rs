//! Generation and capacity totals from the live-generation feed.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use super::fuel::{BATTERY_CHARGING, FuelTable};
use super::types::{GridZone, UNKNOWN_FUEL, grid_zone_name};
use crate::feed::generation::GenerationFeed;

/// Output and installed capacity of some group of units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    /// Current output (MW).
    pub generation: f64,
    /// Installed capacity (MW).
    pub capacity: f64,
}

impl Totals {
    fn add(&mut self, generation: f64, capacity: f64) {
        self.generation += generation;
        self.capacity += capacity;
    }

    /// Output as a percentage of capacity, `None` without capacity.
    pub fn utilisation_pct(&self) -> Option<f64> {
        (self.capacity > 0.0).then(|| 100.0 * self.generation / self.capacity)
    }

    /// Output as a percentage of `total` output, `None` when `total` is zero.
    pub fn share_pct(&self, total: &Totals) -> Option<f64> {
        (total.generation > 0.0).then(|| 100.0 * self.generation / total.generation)
    }
}

/// Totals for one fuel code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelTotals {
    /// Fuel code.
    pub fuel: String,
    /// Display label.
    pub label: String,
    /// Output and capacity.
    #[serde(flatten)]
    pub totals: Totals,
}

/// Totals for one grid zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneTotals {
    /// Zone name, or `Zone n` for numbers off the NZ map.
    pub name: String,
    /// Output and capacity.
    #[serde(flatten)]
    pub totals: Totals,
}

impl ZoneTotals {
    fn new(zone: GridZone) -> Self {
        Self {
            name: grid_zone_name(zone).map_or_else(|| format!("Zone {zone}"), str::to_string),
            totals: Totals::default(),
        }
    }
}

/// Inputs that shape a [`GenerationSummary`] besides the feed itself.
#[derive(Debug, Clone, Copy)]
pub struct SummaryOptions<'a> {
    /// Sites left out of every total.
    pub exclude: &'a BTreeSet<String>,
    /// Labels and renewable flags.
    pub fuels: &'a FuelTable,
    /// Named site groups (e.g. a river scheme) to total separately.
    pub groups: &'a BTreeMap<String, Vec<String>>,
}

/// National, island, zone, fuel and group totals for one feed snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationSummary {
    /// Feed timestamp.
    pub last_update: Option<String>,
    /// All included units.
    pub national: Totals,
    /// Per island.
    pub by_island: BTreeMap<String, Totals>,
    /// Per grid zone, with zone names.
    pub by_zone: BTreeMap<GridZone, ZoneTotals>,
    /// Per fuel, largest output first, battery charging left out.
    pub by_fuel: Vec<FuelTotals>,
    /// Per island and fuel, largest output first, battery charging included.
    pub by_island_fuel: BTreeMap<String, Vec<FuelTotals>>,
    /// Units whose fuel is flagged renewable.
    pub renewables: Totals,
    /// Batteries while charging.
    pub battery_charging: Totals,
    /// Configured site groups.
    pub groups: BTreeMap<String, Totals>,
}

fn ranked(map: BTreeMap<String, Totals>, fuels: &FuelTable) -> Vec<FuelTotals> {
    let mut out: Vec<FuelTotals> = map
        .into_iter()
        .map(|(fuel, totals)| FuelTotals {
            label: fuels.label(&fuel).to_string(),
            fuel,
            totals,
        })
        .collect();
    out.sort_by(|a, b| b.totals.generation.total_cmp(&a.totals.generation));
    out
}

impl GenerationSummary {
    /// Totals every unit of every non-excluded site.
    pub fn from_feed(feed: &GenerationFeed, options: SummaryOptions<'_>) -> Self {
        let mut national = Totals::default();
        let mut by_island: BTreeMap<String, Totals> = BTreeMap::new();
        let mut by_zone: BTreeMap<GridZone, ZoneTotals> = BTreeMap::new();
        let mut by_fuel: BTreeMap<String, Totals> = BTreeMap::new();
        let mut by_island_fuel: BTreeMap<String, BTreeMap<String, Totals>> = BTreeMap::new();
        let mut renewables = Totals::default();
        // Battery charging is a load: kept out of the national fuel ranking.
        let mut battery_charging = Totals::default();
        let mut groups: BTreeMap<String, Totals> = options
            .groups
            .keys()
            .map(|k| (k.clone(), Totals::default()))
            .collect();

        for g in &feed.generators {
            if options.exclude.contains(&g.site) {
                continue;
            }
            for unit in &g.units {
                let fuel = if unit.fuel_code.is_empty() {
                    UNKNOWN_FUEL
                } else {
                    unit.fuel_code.as_str()
                };
                if fuel == BATTERY_CHARGING {
                    battery_charging.add(unit.generation, unit.capacity);
                } else {
                    by_fuel
                        .entry(fuel.to_string())
                        .or_default()
                        .add(unit.generation, unit.capacity);
                }
                by_island_fuel
                    .entry(g.island.clone())
                    .or_default()
                    .entry(fuel.to_string())
                    .or_default()
                    .add(unit.generation, unit.capacity);
                if options.fuels.is_renewable(fuel) {
                    renewables.add(unit.generation, unit.capacity);
                }
            }

            let (generation, capacity) = (g.generation(), g.capacity());
            national.add(generation, capacity);
            by_island
                .entry(g.island.clone())
                .or_default()
                .add(generation, capacity);
            by_zone
                .entry(g.grid_zone)
                .or_insert_with(|| ZoneTotals::new(g.grid_zone))
                .totals
                .add(generation, capacity);
            for (name, sites) in options.groups {
                if sites.contains(&g.site) {
                    if let Some(t) = groups.get_mut(name) {
                        t.add(generation, capacity);
                    }
                }
            }
        }

        Self {
            last_update: feed.last_update.clone(),
            national,
            by_island,
            by_zone,
            by_fuel: ranked(by_fuel, options.fuels),
            by_island_fuel: by_island_fuel
                .into_iter()
                .map(|(island, fuels)| (island, ranked(fuels, options.fuels)))
                .collect(),
            renewables,
            battery_charging,
            groups,
        }
    }
}

fn pct(p: Option<f64>) -> String {
    p.map_or_else(|| "-".to_string(), |p| format!("{p:.0}%"))
}

impl fmt::Display for GenerationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Generation Summary ---")?;
        writeln!(
            f,
            "National:              {:.0} / {:.0} MW ({})",
            self.national.generation,
            self.national.capacity,
            pct(self.national.utilisation_pct())
        )?;
        for (island, t) in &self.by_island {
            writeln!(
                f,
                "Island {island:<14} {:.0} / {:.0} MW ({})",
                t.generation,
                t.capacity,
                pct(t.utilisation_pct())
            )?;
        }
        for (zone, z) in &self.by_zone {
            writeln!(
                f,
                "  {zone:>2} {:<17} {:.0} / {:.0} MW",
                z.name, z.totals.generation, z.totals.capacity
            )?;
        }
        for ft in &self.by_fuel {
            writeln!(
                f,
                "  {:<20} {:>7.0} MW  {:>4} of total",
                ft.label,
                ft.totals.generation,
                pct(ft.totals.share_pct(&self.national))
            )?;
        }
        write!(
            f,
            "Renewables:            {:.0} MW ({} of total)",
            self.renewables.generation,
            pct(self.renewables.share_pct(&self.national))
        )
    }
}
