//! Fuel code display labels and colours.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How one fuel code is shown to users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FuelStyle {
    /// Human-readable label.
    pub label: String,
    /// Display colour as a CSS hex string.
    pub colour: String,
    /// Counted towards renewable totals.
    #[serde(default)]
    pub renewable: bool,
}

impl FuelStyle {
    fn new(label: &str, colour: &str, renewable: bool) -> Self {
        Self {
            label: label.to_string(),
            colour: colour.to_string(),
            renewable,
        }
    }
}

/// Fuel code used for batteries while charging.
pub const BATTERY_CHARGING: &str = "BESS-C";

/// Colour used for codes missing from the table.
pub const FALLBACK_COLOUR: &str = "#7f7f7f";

/// Lookup from fuel code to [`FuelStyle`].
///
/// Codes missing from the table render as the raw code in grey. The
/// builder never consults this table; it only matters for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FuelTable(BTreeMap<String, FuelStyle>);

impl Default for FuelTable {
    fn default() -> Self {
        Self::nz()
    }
}

impl FuelTable {
    /// Empty table; every code falls back to itself.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Fuel codes reported by the New Zealand live-generation feed.
    pub fn nz() -> Self {
        let entries = [
            ("HYD", FuelStyle::new("Hydro", "#1f77b4", true)),
            ("GEO", FuelStyle::new("Geothermal", "#8c564b", true)),
            ("WIN", FuelStyle::new("Wind", "#2ca02c", true)),
            ("SOL", FuelStyle::new("Solar", "#ffbf00", true)),
            ("BIO", FuelStyle::new("Wood", "#6b8e23", true)),
            ("GAS", FuelStyle::new("Gas", "#ff7f0e", false)),
            ("CG", FuelStyle::new("Coal/Gas", "#595959", false)),
            ("COL", FuelStyle::new("Coal", "#262626", false)),
            ("DSL", FuelStyle::new("Diesel", "#d62728", false)),
            ("BESS", FuelStyle::new("Battery", "#9467bd", false)),
            (
                BATTERY_CHARGING,
                FuelStyle::new("Battery (Charging)", "#c5b0d5", false),
            ),
        ];
        Self(
            entries
                .into_iter()
                .map(|(code, style)| (code.to_string(), style))
                .collect(),
        )
    }

    /// Adds or replaces a code.
    pub fn insert(&mut self, code: impl Into<String>, style: FuelStyle) {
        self.0.insert(code.into(), style);
    }

    /// Style for `code`, if known.
    pub fn get(&self, code: &str) -> Option<&FuelStyle> {
        self.0.get(code)
    }

    /// Display label, falling back to the code itself.
    pub fn label<'a>(&'a self, code: &'a str) -> &'a str {
        self.0.get(code).map_or(code, |s| s.label.as_str())
    }

    /// Display colour, falling back to [`FALLBACK_COLOUR`].
    pub fn colour(&self, code: &str) -> &str {
        self.0.get(code).map_or(FALLBACK_COLOUR, |s| s.colour.as_str())
    }

    /// Whether `code` is flagged renewable.
    pub fn is_renewable(&self, code: &str) -> bool {
        self.0.get(code).is_some_and(|s| s.renewable)
    }

    /// Iterates codes and styles in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FuelStyle)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of codes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the table has no codes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_code_resolves() {
        let table = FuelTable::nz();
        assert_eq!(table.label("HYD"), "Hydro");
        assert!(table.is_renewable("WIN"));
        assert!(!table.is_renewable("COL"));
    }

    #[test]
    fn unknown_code_falls_back() {
        let table = FuelTable::nz();
        assert_eq!(table.label("UNKNOWN"), "UNKNOWN");
        assert_eq!(table.colour("UNKNOWN"), FALLBACK_COLOUR);
        assert!(!table.is_renewable("UNKNOWN"));
    }

    #[test]
    fn insert_overrides_label() {
        let mut table = FuelTable::empty();
        assert!(table.is_empty());
        table.insert("HYD", FuelStyle::new("Water", "#0000ff", true));
        assert_eq!(table.label("HYD"), "Water");
        assert_eq!(table.len(), 1);
    }
}
