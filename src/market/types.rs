//! Offer and generator records consumed by the curve builder.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Site code, e.g. `"HLY"`.
pub type Site = String;
/// Generating unit code within a site.
pub type Unit = String;
/// Participant operating a site.
pub type Operator = String;
/// Island identifier as reported by the live-generation feed (`"NI"`, `"SI"`).
pub type Island = String;
/// Numeric grid zone (1-14 on the New Zealand grid).
pub type GridZone = u32;

/// Display name of a New Zealand grid zone, `None` outside 1-14.
pub fn grid_zone_name(zone: GridZone) -> Option<&'static str> {
    const NAMES: [&str; 14] = [
        "Northland",
        "Auckland",
        "Hamilton",
        "Edgecumbe",
        "Hawkes Bay",
        "Taranaki",
        "Bunnythorpe",
        "Wellington",
        "Nelson",
        "Christchurch",
        "Canterbury",
        "West Coast",
        "Otago",
        "Southland",
    ];
    let index = zone.checked_sub(1)?;
    NAMES.get(usize::try_from(index).ok()?).copied()
}

/// Fuel code assigned to tranches whose site has no metadata.
pub const UNKNOWN_FUEL: &str = "UNKNOWN";

/// Metadata lookup keyed by site code.
pub type MetadataBySite = HashMap<Site, GeneratorMetadata>;

/// A priced block of offered capacity for one trading period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tranche {
    /// Tranche number, ordering within the unit's offer stack.
    pub tranche: u32,
    /// Offered quantity (MW). Zero-quantity tranches are ignored.
    pub megawatts: f64,
    /// Offer price ($/MWh).
    pub price: f64,
}

impl Tranche {
    /// Creates a tranche.
    pub fn new(tranche: u32, megawatts: f64, price: f64) -> Self {
        Self {
            tranche,
            megawatts,
            price,
        }
    }

    /// Whether both numeric fields can be placed on a curve.
    pub fn is_finite(&self) -> bool {
        self.megawatts.is_finite() && self.price.is_finite()
    }
}

/// Offer stack of one (site, unit) pair for a single trading period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorOffer {
    /// Site code.
    pub site: Site,
    /// Unit code.
    pub unit: Unit,
    /// Tranches in feed order.
    #[serde(default)]
    pub tranches: Vec<Tranche>,
}

impl GeneratorOffer {
    /// Creates an offer with no tranches.
    pub fn new(site: impl Into<Site>, unit: impl Into<Unit>) -> Self {
        Self {
            site: site.into(),
            unit: unit.into(),
            tranches: Vec::new(),
        }
    }

    /// Appends a tranche, builder style.
    pub fn with_tranche(mut self, tranche: u32, megawatts: f64, price: f64) -> Self {
        self.tranches.push(Tranche::new(tranche, megawatts, price));
        self
    }

    /// Total offered quantity across all tranches (MW).
    pub fn total_megawatts(&self) -> f64 {
        self.tranches.iter().map(|t| t.megawatts).sum()
    }
}

/// Per-site descriptive data joined onto offers.
///
/// `fuel_code` comes from the first listed unit of the site, so a site
/// mixing fuels across units is reported under one fuel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorMetadata {
    /// Display name.
    pub name: String,
    /// Operating participant.
    pub operator: Operator,
    /// Island.
    pub island: Island,
    /// Grid zone.
    pub grid_zone: GridZone,
    /// Primary fuel code, absent if the site lists no units.
    pub fuel_code: Option<String>,
}

impl GeneratorMetadata {
    /// Fuel code the curve builder should use for this site.
    pub fn fuel(&self) -> &str {
        self.fuel_code.as_deref().unwrap_or(UNKNOWN_FUEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_zones_have_names() {
        assert_eq!(grid_zone_name(1), Some("Northland"));
        assert_eq!(grid_zone_name(13), Some("Otago"));
        assert_eq!(grid_zone_name(14), Some("Southland"));
        assert_eq!(grid_zone_name(0), None);
        assert_eq!(grid_zone_name(15), None);
    }

    #[test]
    fn offer_builder_accumulates_tranches() {
        let offer = GeneratorOffer::new("HLY", "HLY1")
            .with_tranche(1, 100.0, 50.0)
            .with_tranche(2, 40.0, 120.0);
        assert_eq!(offer.tranches.len(), 2);
        assert_eq!(offer.total_megawatts(), 140.0);
    }

    #[test]
    fn non_finite_tranche_detected() {
        assert!(Tranche::new(1, 10.0, 5.0).is_finite());
        assert!(!Tranche::new(1, f64::NAN, 5.0).is_finite());
        assert!(!Tranche::new(1, 10.0, f64::INFINITY).is_finite());
    }

    #[test]
    fn metadata_without_units_reports_unknown_fuel() {
        let meta = GeneratorMetadata {
            name: "Empty".into(),
            operator: "OpCo".into(),
            island: "NI".into(),
            grid_zone: 2,
            fuel_code: None,
        };
        assert_eq!(meta.fuel(), UNKNOWN_FUEL);
    }

    #[test]
    fn offer_deserializes_from_feed_json() {
        let json = r#"{"site":"MAN","unit":"MAN0","tranches":[{"tranche":1,"megawatts":200.5,"price":0.01}]}"#;
        let offer: GeneratorOffer = serde_json::from_str(json).unwrap();
        assert_eq!(offer.site, "MAN");
        assert_eq!(offer.tranches[0].megawatts, 200.5);
    }
}
