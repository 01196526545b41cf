use crate::core::catalog::DiseaseCatalog;
use crate::domain::model::{Disease, Severity};
use crate::utils::error::Result;
use crate::utils::validation::validate_known_tokens;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Conjunctive filter over the catalog. An empty field passes every disease.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchCriteria {
    pub free_text: String,
    pub crops: BTreeSet<String>,
    pub severities: BTreeSet<Severity>,
    pub regions: BTreeSet<String>,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses raw tokens as a presentation layer would hand them over.
    /// Severity tokens must name a known severity.
    pub fn from_tokens<S: AsRef<str>>(
        free_text: &str,
        crops: &[S],
        severities: &[S],
        regions: &[S],
    ) -> Result<Self> {
        let severities = severities
            .iter()
            .map(|token| token.as_ref().parse::<Severity>())
            .collect::<Result<BTreeSet<_>>>()?;

        Ok(Self {
            free_text: free_text.to_string(),
            crops: crops.iter().map(|c| c.as_ref().to_string()).collect(),
            severities,
            regions: regions.iter().map(|r| r.as_ref().to_string()).collect(),
        })
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.free_text = text.into();
        self
    }

    pub fn with_crop(mut self, crop: impl Into<String>) -> Self {
        self.crops.insert(crop.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severities.insert(severity);
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.regions.insert(region.into());
        self
    }

    pub fn toggle_crop(&mut self, crop: &str) {
        toggle(&mut self.crops, crop.to_string());
    }

    pub fn toggle_severity(&mut self, severity: Severity) {
        toggle(&mut self.severities, severity);
    }

    pub fn toggle_region(&mut self, region: &str) {
        toggle(&mut self.regions, region.to_string());
    }

    pub fn clear(&mut self) {
        self.free_text.clear();
        self.crops.clear();
        self.severities.clear();
        self.regions.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.free_text.is_empty()
            && self.crops.is_empty()
            && self.severities.is_empty()
            && self.regions.is_empty()
    }

    /// Rejects crop or region tokens the catalog never mentions.
    pub fn validate_against(&self, catalog: &DiseaseCatalog) -> Result<()> {
        validate_known_tokens("crop", &self.crops, &catalog.list_crops())?;
        validate_known_tokens("region", &self.regions, &catalog.list_regions())?;
        Ok(())
    }

    pub fn matches(&self, disease: &Disease) -> bool {
        self.matches_text(disease)
            && (self.crops.is_empty() || disease.affects_any(&self.crops))
            && (self.severities.is_empty() || self.severities.contains(&disease.severity))
            && (self.regions.is_empty() || disease.occurs_in_any(&self.regions))
    }

    fn matches_text(&self, disease: &Disease) -> bool {
        if self.free_text.is_empty() {
            return true;
        }
        let needle = self.free_text.to_lowercase();
        disease.name.to_lowercase().contains(&needle)
            || disease.scientific_name.to_lowercase().contains(&needle)
    }
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T) {
    if !set.remove(&value) {
        set.insert(value);
    }
}

/// Stateless multi-criteria filter. Results keep catalog order.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryEngine;

impl QueryEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn search<'a>(&self, catalog: &'a DiseaseCatalog, criteria: &SearchCriteria) -> Vec<&'a Disease> {
        let results: Vec<&Disease> = catalog.iter().filter(|d| criteria.matches(d)).collect();
        tracing::debug!(
            "Search matched {} of {} diseases (criteria: {:?})",
            results.len(),
            catalog.len(),
            criteria
        );
        results
    }

    /// Resets every field to its pass-all state.
    pub fn clear_filters(&self, criteria: &mut SearchCriteria) {
        criteria.clear();
    }
}
