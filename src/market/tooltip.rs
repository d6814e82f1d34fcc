//! Hover text for curve midpoints.

use super::curve::CurvePoint;
use super::fuel::FuelTable;

/// Formats the tooltip for a curve point.
///
/// Only midpoints carry tranche detail; anchors and any other point
/// without detail return `None`.
///
/// # Examples
///
/// ```
/// use merit_curve::market::curve::build_curve;
/// use merit_curve::market::filter::CurveFilters;
/// use merit_curve::market::fuel::FuelTable;
/// use merit_curve::market::tooltip::format_tooltip;
/// use merit_curve::market::types::{GeneratorOffer, MetadataBySite};
///
/// let offers = vec![GeneratorOffer::new("A", "A1").with_tranche(2, 12.5, 80.0)];
/// let curve = build_curve(&offers, &MetadataBySite::new(), &CurveFilters::none());
/// let texts: Vec<String> = curve
///     .points()
///     .filter_map(|p| format_tooltip(p, &FuelTable::nz()))
///     .collect();
/// assert_eq!(texts.len(), 1);
/// assert!(texts[0].contains("Price: $80.00/MWh"));
/// ```
pub fn format_tooltip(point: &CurvePoint, fuels: &FuelTable) -> Option<String> {
    let detail = point.detail.as_ref()?;
    let mut lines = vec![format!("{} - {}", detail.name, detail.unit)];
    if let Some(operator) = &detail.operator {
        lines.push(format!("Operator: {operator}"));
    }
    lines.push(format!("Tranche {}", detail.tranche));
    lines.push(format!("Price: ${:.2}/MWh", point.y));
    lines.push(format!("Quantity: {:.1} MW", detail.megawatts));
    lines.push(format!("Cumulative: {:.1} MW", point.x));
    lines.push(format!("Fuel: {}", fuels.label(&detail.fuel)));
    Some(lines.join("\n"))
}
