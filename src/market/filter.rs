//! Allow-list filters applied before curve construction.

use std::collections::BTreeSet;

use serde::Deserialize;

use super::types::{
    GeneratorMetadata, GeneratorOffer, GridZone, Island, MetadataBySite, Operator, Site,
};

/// Filter set for one curve build.
///
/// Every allow-list is optional: an empty list means "no filtering on
/// that dimension". Lists are combined with AND. Sites in `exclude` are
/// always dropped.
///
/// Operator, island and zone filters need metadata to evaluate. When a
/// site has no metadata those filters are skipped for it, so the site is
/// kept. This is permissive and probably unintended upstream, but curves
/// built by the dashboard depend on it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CurveFilters {
    /// Sites to keep.
    pub site: Vec<Site>,
    /// Operators to keep.
    pub operator: Vec<Operator>,
    /// Islands to keep.
    pub island: Vec<Island>,
    /// Grid zones to keep.
    pub zone: Vec<GridZone>,
    /// Sites that never appear on a curve (e.g. interconnector pseudo-generators).
    #[serde(skip)]
    pub exclude: BTreeSet<Site>,
}

impl CurveFilters {
    /// No allow-lists, no exclusions.
    pub fn none() -> Self {
        Self::default()
    }

    /// Replaces the exclusion set.
    pub fn excluding<I, S>(mut self, sites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Site>,
    {
        self.exclude = sites.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts to the given sites.
    pub fn with_sites<I, S>(mut self, sites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Site>,
    {
        self.site = sites.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts to the given operators.
    pub fn with_operators<I, S>(mut self, operators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Operator>,
    {
        self.operator = operators.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts to the given islands.
    pub fn with_islands<I, S>(mut self, islands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Island>,
    {
        self.island = islands.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts to the given grid zones.
    pub fn with_zones(mut self, zones: impl IntoIterator<Item = GridZone>) -> Self {
        self.zone = zones.into_iter().collect();
        self
    }

    /// Whether any allow-list is active.
    pub fn is_active(&self) -> bool {
        !(self.site.is_empty()
            && self.operator.is_empty()
            && self.island.is_empty()
            && self.zone.is_empty())
    }

    /// Decides whether offers from `site` take part in the curve.
    pub fn admits(&self, site: &str, metadata: Option<&GeneratorMetadata>) -> bool {
        if self.exclude.contains(site) {
            return false;
        }
        if !self.site.is_empty() && !self.site.iter().any(|s| s == site) {
            return false;
        }
        let Some(meta) = metadata else {
            return true;
        };
        if !self.operator.is_empty() && !self.operator.contains(&meta.operator) {
            return false;
        }
        if !self.island.is_empty() && !self.island.contains(&meta.island) {
            return false;
        }
        if !self.zone.is_empty() && !self.zone.contains(&meta.grid_zone) {
            return false;
        }
        true
    }
}

/// Sites with at least one offer, sorted and de-duplicated.
pub fn sites_offered(offers: &[GeneratorOffer]) -> Vec<Site> {
    offers
        .iter()
        .map(|o| o.site.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Operators of offering sites, sorted and de-duplicated. Sites without
/// metadata or with a blank operator are skipped.
pub fn operators_offered(offers: &[GeneratorOffer], metadata: &MetadataBySite) -> Vec<Operator> {
    offers
        .iter()
        .filter_map(|o| metadata.get(&o.site))
        .filter(|m| !m.operator.is_empty())
        .map(|m| m.operator.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
