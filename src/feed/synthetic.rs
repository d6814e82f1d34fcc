//! Seeded synthetic feeds for the `demo` preset and property tests.

use chrono::NaiveDate;
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::generation::{GenerationFeed, LiveGenerator, LiveUnit};
use super::offers::OfferFeed;
use crate::market::period::TradingPeriod;
use crate::market::types::GeneratorOffer;

/// Fuel archetype: code, (min, max) unit capacity in MW, (min, max) base price.
const ARCHETYPES: &[(&str, (f64, f64), (f64, f64))] = &[
    ("HYD", (50.0, 400.0), (0.01, 150.0)),
    ("GEO", (20.0, 150.0), (0.0, 5.0)),
    ("WIN", (30.0, 200.0), (0.0, 1.0)),
    ("SOL", (10.0, 100.0), (0.0, 1.0)),
    ("GAS", (50.0, 400.0), (80.0, 300.0)),
    ("COL", (200.0, 250.0), (150.0, 400.0)),
    ("DSL", (10.0, 150.0), (300.0, 1000.0)),
    ("BESS", (20.0, 100.0), (100.0, 500.0)),
];

const OPERATORS: &[&str] = &["Alpha Energy", "Beta Power", "Gamma Generation", "Delta Renewables"];

/// Parameters of a synthetic market day.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticMarket {
    /// Trading date of the generated feed.
    pub date: NaiveDate,
    /// Number of generating sites.
    pub sites: usize,
    /// Number of trading periods to generate, starting at period 1.
    pub periods: u32,
    /// Sites with index divisible by this are left out of the generation feed
    /// (0 keeps metadata for every site).
    pub missing_metadata_every: usize,
    /// RNG seed.
    pub seed: u64,
}

impl SyntheticMarket {
    /// A full 48-period day with 24 sites.
    pub fn day(date: NaiveDate, seed: u64) -> Self {
        Self {
            date,
            sites: 24,
            periods: 48,
            missing_metadata_every: 0,
            seed,
        }
    }

    /// Generates the live-generation and offer feeds.
    pub fn generate(&self) -> (GenerationFeed, OfferFeed) {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut generators = Vec::with_capacity(self.sites);
        let mut stacks = Vec::with_capacity(self.sites);

        for i in 0..self.sites {
            let (fuel, (cap_lo, cap_hi), (price_lo, price_hi)) =
                ARCHETYPES[rng.random_range(0..ARCHETYPES.len())];
            let site = format!("S{i:02}");
            let unit_count = rng.random_range(1..=3_usize);
            let island = if rng.random_bool(0.6) { "NI" } else { "SI" };
            let grid_zone = if island == "NI" {
                rng.random_range(1..=8)
            } else {
                rng.random_range(9..=14)
            };

            let mut units = Vec::with_capacity(unit_count);
            for u in 0..unit_count {
                let capacity = round1(rng.random_range(cap_lo..=cap_hi));
                units.push(LiveUnit {
                    code: format!("{site}{u}"),
                    fuel: fuel.to_string(),
                    fuel_code: fuel.to_string(),
                    capacity,
                    generation: round1(capacity * rng.random_range(0.0..=1.0)),
                });
                let base = round2(rng.random_range(price_lo..=price_hi));
                stacks.push((site.clone(), format!("{site}{u}"), capacity, base));
            }

            let keep_metadata =
                self.missing_metadata_every == 0 || i % self.missing_metadata_every != 0;
            if keep_metadata {
                generators.push(LiveGenerator {
                    site: site.clone(),
                    name: format!("Station {i:02}"),
                    operator: OPERATORS[i % OPERATORS.len()].to_string(),
                    island: island.to_string(),
                    grid_zone,
                    units,
                });
            }
        }

        let mut offers = OfferFeed::default();
        for tp in TradingPeriod::all().take(self.periods as usize) {
            let period_offers = stacks
                .iter()
                .map(|(site, unit, capacity, base)| {
                    let tranche_count = rng.random_range(1..=5_u32);
                    let mut offer = GeneratorOffer::new(site.clone(), unit.clone());
                    let mut remaining = *capacity;
                    let mut price = *base;
                    for n in 1..=tranche_count {
                        let mw = if n == tranche_count {
                            remaining
                        } else if rng.random_bool(0.1) {
                            0.0
                        } else {
                            round1(remaining * rng.random_range(0.1..=0.6))
                        };
                        remaining = (remaining - mw).max(0.0);
                        offer = offer.with_tranche(n, mw, price);
                        price = round2(price + rng.random_range(0.0..=50.0));
                    }
                    offer
                })
                .collect();
            offers.insert(self.date, tp, period_offers);
        }

        (
            GenerationFeed {
                last_update: Some(format!("{}T00:00:00", self.date)),
                generators,
            },
            offers,
        )
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 30).unwrap()
    }

    #[test]
    fn same_seed_same_feed() {
        let a = SyntheticMarket::day(date(), 7).generate();
        let b = SyntheticMarket::day(date(), 7).generate();
        assert_eq!(a, b);
    }

    #[test]
    fn generates_requested_shape() {
        let market = SyntheticMarket {
            periods: 4,
            sites: 10,
            missing_metadata_every: 3,
            ..SyntheticMarket::day(date(), 1)
        };
        let (generation, offers) = market.generate();
        assert_eq!(offers.len(), 4);
        // Sites 0, 3, 6 and 9 have no metadata.
        assert_eq!(generation.generators.len(), 6);
        assert_eq!(offers.trading_date(), Some(date()));
    }

    #[test]
    fn tranches_are_finite_and_non_negative() {
        let (_, offers) = SyntheticMarket::day(date(), 3).generate();
        for tp in TradingPeriod::all() {
            let (_, period) = offers.offers_for_period(tp).unwrap();
            for offer in period {
                for t in &offer.tranches {
                    assert!(t.is_finite());
                    assert!(t.megawatts >= 0.0);
                }
            }
        }
    }
}
