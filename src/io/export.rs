//! CSV export of curve points.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::market::curve::CurveSegment;

/// Column header for curve CSV export.
const HEADER: &str = "segment,fuel,role,x_mw,price,site,unit,tranche,megawatts";

/// Role written for gap markers.
const GAP_ROLE: &str = "gap";

/// Exports curve segments to a CSV file at the given path.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn export_curve_csv(segments: &[CurveSegment], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_curve_csv(segments, io::BufWriter::new(file))?;
    info!(path = %path.display(), segments = segments.len(), "exported curve CSV");
    Ok(())
}

/// Writes curve segments as CSV to any writer.
///
/// One row per point in segment order. Gap markers become a row with
/// role `gap` and empty numeric columns, so a plotting tool can break the
/// line there. Anchor points leave the tranche columns empty.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_curve_csv(segments: &[CurveSegment], writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(','))?;

    for (i, segment) in segments.iter().enumerate() {
        let index = i.to_string();
        for point in &segment.points {
            let Some(p) = point else {
                let record: [&str; 9] = [&index, &segment.fuel, GAP_ROLE, "", "", "", "", "", ""];
                wtr.write_record(record)?;
                continue;
            };
            let (site, unit, tranche, megawatts) = match &p.detail {
                Some(d) => (
                    d.site.as_str(),
                    d.unit.as_str(),
                    d.tranche.to_string(),
                    format!("{:.3}", d.megawatts),
                ),
                None => ("", "", String::new(), String::new()),
            };
            let (role, x, y) = (p.role.to_string(), format!("{:.3}", p.x), format!("{:.2}", p.y));
            let record: [&str; 9] = [
                &index, &segment.fuel, &role, &x, &y, site, unit, &tranche, &megawatts,
            ];
            wtr.write_record(record)?;
        }
    }

    wtr.flush()?;
    Ok(())
}
