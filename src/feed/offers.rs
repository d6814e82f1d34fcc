//! Offer feed: per trading period, the offer stack of every (site, unit).
//!
//! The lookup service publishes one trading day as JSON keyed by period
//! start timestamp:
//!
//! ```json
//! { "2025-12-30T00:00:00": [
//!     { "site": "MAN", "unit": "MAN0",
//!       "tranches": [{ "tranche": 1, "megawatts": 200.0, "price": 0.01 }] } ] }
//! ```
//!
//! The same shape can be produced locally from the market operator's raw
//! offers CSV with [`read_emi_csv`] and [`OfferFeed::from_rows`].

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::cache::DatedCache;
use crate::error::{Error, Result};
use crate::market::period::TradingPeriod;
use crate::market::types::{GeneratorOffer, Site, Tranche};

/// One tranche in flat, row-per-tranche form.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferRow {
    /// Trading date.
    pub trading_date: NaiveDate,
    /// Trading period number (1-48).
    pub trading_period: u32,
    /// Site code.
    pub site: Site,
    /// Unit code.
    pub unit: String,
    /// Tranche number.
    pub tranche: u32,
    /// Offered quantity (MW).
    pub megawatts: f64,
    /// Offer price ($/MWh).
    pub price: f64,
}

/// Offers for one trading day, keyed by period start timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfferFeed {
    periods: BTreeMap<String, Vec<GeneratorOffer>>,
}

impl OfferFeed {
    /// Parses the feed from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] on malformed input.
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
            periods = feed.len(),
            "loaded offer feed"
        );
        Ok(feed)
    }

    /// Groups flat rows into periods and (site, unit) stacks.
    ///
    /// Stacks appear in the order their first row appears; tranches keep
    /// row order within a stack.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Period`] if a row's trading period is outside 1-48.
    pub fn from_rows(rows: impl IntoIterator<Item = OfferRow>) -> Result<Self> {
        let mut periods: BTreeMap<String, Vec<GeneratorOffer>> = BTreeMap::new();
        for row in rows {
            let tp = TradingPeriod::new(row.trading_period)?;
            let offers = periods.entry(tp.timestamp(row.trading_date)).or_default();
            let position = offers
                .iter()
                .position(|o| o.site == row.site && o.unit == row.unit);
            let offer = match position {
                Some(i) => &mut offers[i],
                None => {
                    offers.push(GeneratorOffer::new(row.site, row.unit));
                    let last = offers.len() - 1;
                    &mut offers[last]
                }
            };
            offer
                .tranches
                .push(Tranche::new(row.tranche, row.megawatts, row.price));
        }
        Ok(Self { periods })
    }

    /// Inserts or replaces the offers of one period.
    pub fn insert(&mut self, date: NaiveDate, tp: TradingPeriod, offers: Vec<GeneratorOffer>) {
        self.periods.insert(tp.timestamp(date), offers);
    }

    /// Number of periods present.
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Whether no periods are present.
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Period timestamps in order.
    pub fn timestamps(&self) -> impl Iterator<Item = &str> {
        self.periods.keys().map(String::as_str)
    }

    /// Offers of the `tp`-th period present in the feed.
    ///
    /// Periods are addressed by position, not by timestamp, and a position
    /// past the end falls back to the first period. Returns `None` only for
    /// an empty feed.
    pub fn offers_for_period(&self, tp: TradingPeriod) -> Option<(&str, &[GeneratorOffer])> {
        self.periods
            .iter()
            .nth(tp.index())
            .or_else(|| self.periods.iter().next())
            .map(|(ts, offers)| (ts.as_str(), offers.as_slice()))
    }

    /// Offers keyed by exact timestamp.
    pub fn offers_at(&self, timestamp: &str) -> Option<&[GeneratorOffer]> {
        self.periods.get(timestamp).map(Vec::as_slice)
    }

    /// Trading date of the first period.
    pub fn trading_date(&self) -> Option<NaiveDate> {
        let first = self.periods.keys().next()?;
        TradingPeriod::from_timestamp(first).ok().map(|(d, _)| d)
    }
}

/// Directory of per-day offer feeds named `YYYY-MM-DD.json`.
///
/// Loaded days are cached. The live day is re-read on every request
/// because the lookup service is still appending periods to it.
#[derive(Debug)]
pub struct OfferArchive {
    dir: PathBuf,
    cache: DatedCache<OfferFeed>,
}

impl OfferArchive {
    /// Opens an archive directory; `live` is the day still being published.
    pub fn new(dir: impl Into<PathBuf>, live: NaiveDate) -> Self {
        Self {
            dir: dir.into(),
            cache: DatedCache::with_live_date(live),
        }
    }

    /// File holding the offers of `date`.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{date}.json"))
    }

    /// Offers of `date`, from the cache when possible.
    ///
    /// # Errors
    ///
    /// Returns an error if the day's file cannot be read or parsed.
    pub fn load(&mut self, date: NaiveDate) -> Result<&OfferFeed> {
        let path = self.path_for(date);
        self.cache
            .get_or_try_insert_with(date, || OfferFeed::from_json_file(&path))
    }

    /// Latest trading date with a `YYYY-MM-DD.json` file in the directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub fn latest_date(&self) -> Result<Option<NaiveDate>> {
        let mut latest = None;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Ok(date) = NaiveDate::parse_from_str(stem, "%Y-%m-%d") {
                latest = latest.max(Some(date));
            }
        }
        Ok(latest)
    }

    /// Offers of `date`, or of the latest archived day when `date` is
    /// `None` or has no file. Returns the date actually served.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive holds no days at all, or if the
    /// chosen day cannot be read or parsed.
    pub fn load_or_latest(&mut self, date: Option<NaiveDate>) -> Result<(NaiveDate, &OfferFeed)> {
        let served = match date {
            Some(d) if self.path_for(d).is_file() => d,
            requested => {
                let latest = self.latest_date()?.ok_or_else(|| {
                    Error::Io(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("no offer days in {}", self.dir.display()),
                    ))
                })?;
                if let Some(d) = requested {
                    info!(requested = %d, %latest, "no offers for requested day, serving latest");
                }
                latest
            }
        };
        Ok((served, self.load(served)?))
    }

    /// Moves the live day, e.g. at midnight.
    pub fn set_live_date(&mut self, live: NaiveDate) {
        self.cache.set_live_date(live);
    }

    /// Number of days held in memory.
    pub fn cached_days(&self) -> usize {
        self.cache.len()
    }
}

/// Raw offer record as published in the market operator's offers CSV.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EmiOfferRecord {
    trading_date: NaiveDate,
    trading_period: u32,
    point_of_connection: String,
    unit: String,
    product_type: String,
    product_class: String,
    is_latest_yes_no: String,
    tranche: u32,
    megawatts: Option<f64>,
    dollars_per_megawatt_hour: Option<f64>,
}

impl EmiOfferRecord {
    fn is_latest_energy_injection(&self) -> bool {
        self.is_latest_yes_no == "Y"
            && self.product_class == "Injection"
            && self.product_type == "Energy"
    }
}

/// Reads latest energy-injection offers from the market operator's offers CSV.
///
/// Rows that are superseded (`IsLatestYesNo != Y`), reserve products or
/// non-injection classes are skipped. The site is looked up in `sites` by
/// `"{PointOfConnection} {Unit}"`; unknown pairs keep the point of
/// connection code as their site. Blank quantity or price fields read as 0.
///
/// # Errors
///
/// Returns [`Error::Parse`] with the CSV line number when a record cannot be
/// decoded, or [`Error::Csv`] on lower-level read failures.
pub fn read_emi_csv<R: Read>(reader: R, sites: &HashMap<String, Site>) -> Result<Vec<OfferRow>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    let mut skipped = 0_usize;

    for result in rdr.deserialize::<EmiOfferRecord>() {
        let record = result.map_err(|e| match e.position() {
            Some(pos) => Error::Parse {
                line: pos.line(),
                message: e.to_string(),
            },
            None => Error::Csv(e),
        })?;
        if !record.is_latest_energy_injection() {
            skipped += 1;
            continue;
        }
        let key = format!("{} {}", record.point_of_connection, record.unit);
        let site = match sites.get(&key) {
            Some(site) => site.clone(),
            None => {
                debug!(%key, "no site mapping, using point of connection");
                record.point_of_connection.clone()
            }
        };
        rows.push(OfferRow {
            trading_date: record.trading_date,
            trading_period: record.trading_period,
            site,
            unit: record.unit,
            tranche: record.tranche,
            megawatts: record.megawatts.unwrap_or(0.0),
            price: record.dollars_per_megawatt_hour.unwrap_or(0.0),
        });
    }

    info!(kept = rows.len(), skipped, "read offers CSV");
    Ok(rows)
}

/// Reads an offers CSV file and groups it into a feed.
///
/// # Errors
///
/// See [`read_emi_csv`] and [`OfferFeed::from_rows`].
pub fn load_emi_csv(path: &Path, sites: &HashMap<String, Site>) -> Result<OfferFeed> {
    let file = fs::File::open(path)?;
    OfferFeed::from_rows(read_emi_csv(file, sites)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 30).unwrap()
    }

    fn row(tp: u32, site: &str, unit: &str, tranche: u32, mw: f64, price: f64) -> OfferRow {
        OfferRow {
            trading_date: date(),
            trading_period: tp,
            site: site.into(),
            unit: unit.into(),
            tranche,
            megawatts: mw,
            price,
        }
    }

    const CSV: &str = "\
TradingDate,TradingPeriod,ParticipantCode,PointOfConnection,Unit,ProductType,ProductClass,ReserveType,ProductDescription,UTCSubmissionDate,UTCSubmissionTime,SubmissionOrder,IsLatestYesNo,Tranche,MaximumRampUpMegawattsPerHour,MaximumRampDownMegawattsPerHour,PartiallyLoadedSpinningReservePercent,MaximumOutputMegawatts,ForecastOfGenerationPotentialMegawatts,Megawatts,DollarsPerMegawattHour
2025-12-30,1,MERI,MAN2201,MAN0,Energy,Injection,,,2025-12-29,10:00:00,1,Y,1,,,,,,200,0.01
2025-12-30,1,MERI,MAN2201,MAN0,Energy,Injection,,,2025-12-29,09:00:00,0,N,1,,,,,,150,5
2025-12-30,1,MERI,MAN2201,MAN0,Reserve,Injection,FIR,,2025-12-29,10:00:00,1,Y,1,,,,,,50,1
2025-12-30,1,GENE,HLY2201,HLY5,Energy,Injection,,,2025-12-29,10:00:00,1,Y,1,,,,,,,
2025-12-30,2,MERI,MAN2201,MAN0,Energy,Injection,,,2025-12-29,10:00:00,1,Y,1,,,,,,210,0.01
";

    #[test]
    fn from_rows_groups_by_period_and_unit() {
        let feed = OfferFeed::from_rows(vec![
            row(1, "MAN", "MAN0", 1, 200.0, 0.01),
            row(1, "HLY", "HLY5", 1, 100.0, 80.0),
            row(1, "MAN", "MAN0", 2, 50.0, 30.0),
            row(2, "MAN", "MAN0", 1, 210.0, 0.01),
        ])
        .unwrap();

        assert_eq!(feed.len(), 2);
        let (ts, offers) = feed.offers_for_period(TradingPeriod::FIRST).unwrap();
        assert_eq!(ts, "2025-12-30T00:00:00");
        assert_eq!(offers.len(), 2);
        assert_eq!(offers[0].site, "MAN");
        assert_eq!(offers[0].tranches.len(), 2);
        assert_eq!(offers[1].site, "HLY");
        assert_eq!(feed.trading_date(), Some(date()));
    }

    #[test]
    fn from_rows_rejects_bad_period() {
        let err = OfferFeed::from_rows(vec![row(49, "MAN", "MAN0", 1, 1.0, 1.0)]);
        assert!(matches!(err, Err(Error::Period(49))));
    }

    #[test]
    fn out_of_range_period_falls_back_to_first() {
        let feed = OfferFeed::from_rows(vec![
            row(1, "A", "A1", 1, 1.0, 1.0),
            row(2, "B", "B1", 1, 1.0, 1.0),
        ])
        .unwrap();
        let tp = TradingPeriod::new(30).unwrap();
        let (ts, offers) = feed.offers_for_period(tp).unwrap();
        assert_eq!(ts, "2025-12-30T00:00:00");
        assert_eq!(offers[0].site, "A");
        let (_, second) = feed.offers_for_period(TradingPeriod::new(2).unwrap()).unwrap();
        assert_eq!(second[0].site, "B");
    }

    #[test]
    fn empty_feed_has_no_periods() {
        let feed = OfferFeed::default();
        assert!(feed.is_empty());
        assert!(feed.offers_for_period(TradingPeriod::FIRST).is_none());
        assert!(feed.trading_date().is_none());
    }

    #[test]
    fn json_round_trip_preserves_shape() {
        let json = r#"{"2025-12-30T00:30:00":[{"site":"MAN","unit":"MAN0","tranches":[{"tranche":1,"megawatts":200.0,"price":0.01}]}]}"#;
        let feed = OfferFeed::from_json_str(json).unwrap();
        assert_eq!(feed.timestamps().collect::<Vec<_>>(), vec!["2025-12-30T00:30:00"]);
        assert_eq!(feed.offers_at("2025-12-30T00:30:00").unwrap()[0].unit, "MAN0");
        let back = serde_json::to_string(&feed).unwrap();
        assert_eq!(back, json);
    }

    #[test]
    fn emi_csv_keeps_latest_energy_injection_only() {
        let sites = HashMap::from([("MAN2201 MAN0".to_string(), "MAN".to_string())]);
        let rows = read_emi_csv(CSV.as_bytes(), &sites).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].site, "MAN");
        assert_eq!(rows[0].megawatts, 200.0);
        // No mapping: point of connection stands in for the site.
        assert_eq!(rows[1].site, "HLY2201");
        // Blank numeric fields read as zero.
        assert_eq!(rows[1].megawatts, 0.0);
        assert_eq!(rows[1].price, 0.0);

        let feed = OfferFeed::from_rows(rows).unwrap();
        assert_eq!(feed.len(), 2);
    }

    #[test]
    fn emi_csv_reports_line_of_bad_record() {
        let bad = "\
TradingDate,TradingPeriod,PointOfConnection,Unit,ProductType,ProductClass,IsLatestYesNo,Tranche,Megawatts,DollarsPerMegawattHour
2025-12-30,1,MAN2201,MAN0,Energy,Injection,Y,1,200,0.01
2025-12-30,1,MAN2201,MAN0,Energy,Injection,Y,2,lots,0.01
";
        let err = read_emi_csv(bad.as_bytes(), &HashMap::new());
        assert!(matches!(err, Err(Error::Parse { line: 3, .. })));
    }

    #[test]
    fn archive_caches_past_days_and_rereads_live_day() {
        let dir = std::env::temp_dir().join(format!("merit-curve-archive-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let yesterday = date().pred_opt().unwrap();
        let mut feed = OfferFeed::default();
        feed.insert(
            yesterday,
            TradingPeriod::FIRST,
            vec![GeneratorOffer::new("MAN", "MAN1").with_tranche(1, 10.0, 5.0)],
        );
        let json = serde_json::to_string(&feed).unwrap();
        let mut archive = OfferArchive::new(&dir, date());
        fs::write(archive.path_for(yesterday), &json).unwrap();
        fs::write(archive.path_for(date()), "{}").unwrap();

        assert_eq!(archive.load(yesterday).unwrap(), &feed);
        assert!(archive.load(date()).unwrap().is_empty());

        fs::write(archive.path_for(date()), &json).unwrap();
        fs::remove_file(archive.path_for(yesterday)).unwrap();
        // Past day served from memory, live day re-read from disk.
        assert_eq!(archive.load(yesterday).unwrap(), &feed);
        assert_eq!(archive.load(date()).unwrap().len(), 1);
        assert_eq!(archive.cached_days(), 2);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn archive_falls_back_to_latest_day() {
        let dir = std::env::temp_dir().join(format!("merit-curve-latest-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let older = date().pred_opt().unwrap().pred_opt().unwrap();
        let newer = date().pred_opt().unwrap();
        let mut archive = OfferArchive::new(&dir, date());
        let mut feed = OfferFeed::default();
        feed.insert(
            newer,
            TradingPeriod::FIRST,
            vec![GeneratorOffer::new("MAN", "MAN1").with_tranche(1, 10.0, 5.0)],
        );
        fs::write(archive.path_for(older), "{}").unwrap();
        fs::write(archive.path_for(newer), serde_json::to_string(&feed).unwrap()).unwrap();
        fs::write(dir.join("notes.txt"), "not a feed").unwrap();
        fs::write(dir.join("latest.json"), "{}").unwrap();

        assert_eq!(archive.latest_date().unwrap(), Some(newer));

        let (served, offers) = archive.load_or_latest(None).unwrap();
        assert_eq!(served, newer);
        assert_eq!(offers.len(), 1);

        // Requested day has no file: latest day instead.
        let (served, _) = archive.load_or_latest(Some(date())).unwrap();
        assert_eq!(served, newer);

        // Requested day exists: served as asked.
        let (served, offers) = archive.load_or_latest(Some(older)).unwrap();
        assert_eq!(served, older);
        assert!(offers.is_empty());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn empty_archive_has_no_latest_day() {
        let dir = std::env::temp_dir().join(format!("merit-curve-empty-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let mut archive = OfferArchive::new(&dir, date());
        assert_eq!(archive.latest_date().unwrap(), None);
        assert!(archive.load_or_latest(None).is_err());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn archive_missing_day_is_an_error() {
        let mut archive = OfferArchive::new(std::env::temp_dir().join("merit-curve-missing"), date());
        assert!(archive.load(date()).is_err());
        assert_eq!(archive.cached_days(), 0);
    }
}
