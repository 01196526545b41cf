use crate::domain::model::Disease;
use crate::utils::error::{KbError, Result};
use crate::utils::validation::validate_non_empty_string;
use std::collections::HashSet;

const EMBEDDED_DISEASES: &str = include_str!("../../data/diseases.json");

/// Immutable, session-lifetime store of reference disease records.
///
/// Record order is the order of the source data and every listing derived
/// from the catalog preserves it.
#[derive(Debug, Clone, Default)]
pub struct DiseaseCatalog {
    diseases: Vec<Disease>,
}

impl DiseaseCatalog {
    /// Builds the catalog from the embedded reference data.
    ///
    /// Fails only if the embedded data itself is malformed.
    pub fn load() -> Result<Self> {
        let records: Vec<Disease> = serde_json::from_str(EMBEDDED_DISEASES)
            .map_err(|e| KbError::malformed_seed("diseases.json", e.to_string()))?;
        let catalog = Self::from_records(records)?;
        tracing::debug!("Loaded disease catalog with {} records", catalog.len());
        Ok(catalog)
    }

    /// Builds a catalog from caller-supplied records, checking the same
    /// invariants as the embedded data.
    pub fn from_records(diseases: Vec<Disease>) -> Result<Self> {
        let mut seen = HashSet::new();

        for disease in &diseases {
            validate_non_empty_string("disease.id", &disease.id)
                .map_err(|e| KbError::malformed_seed("disease records", e.to_string()))?;

            if !seen.insert(disease.id.as_str()) {
                return Err(KbError::malformed_seed(
                    "disease records",
                    format!("duplicate disease id '{}'", disease.id),
                ));
            }

            if disease.affected_crops.is_empty() {
                return Err(KbError::malformed_seed(
                    "disease records",
                    format!("disease '{}' lists no affected crops", disease.id),
                ));
            }
        }

        Ok(Self { diseases })
    }

    pub fn diseases(&self) -> &[Disease] {
        &self.diseases
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Disease> {
        self.diseases.iter()
    }

    pub fn len(&self) -> usize {
        self.diseases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diseases.is_empty()
    }

    pub fn get_by_id(&self, id: &str) -> Result<&Disease> {
        self.diseases
            .iter()
            .find(|disease| disease.id == id)
            .ok_or_else(|| KbError::NotFound { id: id.to_string() })
    }

    /// Distinct crop names in order of first appearance.
    pub fn list_crops(&self) -> Vec<&str> {
        first_appearance(self.diseases.iter().flat_map(|d| d.affected_crops.iter()))
    }

    /// Distinct region names in order of first appearance.
    pub fn list_regions(&self) -> Vec<&str> {
        first_appearance(self.diseases.iter().flat_map(|d| d.common_regions.iter()))
    }
}

impl<'a> IntoIterator for &'a DiseaseCatalog {
    type Item = &'a Disease;
    type IntoIter = std::slice::Iter<'a, Disease>;

    fn into_iter(self) -> Self::IntoIter {
        self.diseases.iter()
    }
}

fn first_appearance<'a>(names: impl Iterator<Item = &'a String>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    names
        .map(String::as_str)
        .filter(|name| seen.insert(*name))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::model::{Severity, Treatments};

    pub(crate) fn disease(id: &str, name: &str, crops: &[&str], severity: Severity) -> Disease {
        Disease {
            id: id.to_string(),
            name: name.to_string(),
            scientific_name: format!("{} spp.", name),
            description: String::new(),
            symptoms: vec![],
            causes: vec![],
            treatments: Treatments {
                chemical: vec![format!("{} fungicide", name)],
                organic: vec![],
                preventive: vec![],
            },
            images: vec![],
            affected_crops: crops.iter().map(|c| c.to_string()).collect(),
            severity,
            common_regions: vec![],
        }
    }

    #[test]
    fn test_load_embedded_catalog() {
        let catalog = DiseaseCatalog::load().unwrap();
        assert_eq!(catalog.len(), 5);

        let names: Vec<&str> = catalog.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Late Blight", "Powdery Mildew", "Rice Blast", "Anthracnose", "Rust"]
        );
    }

    #[test]
    fn test_get_by_id() {
        let catalog = DiseaseCatalog::load().unwrap();
        let disease = catalog.get_by_id("3").unwrap();
        assert_eq!(disease.name, "Rice Blast");
        assert_eq!(disease.severity, Severity::High);

        match catalog.get_by_id("404") {
            Err(KbError::NotFound { id }) => assert_eq!(id, "404"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_list_crops_first_appearance_order() {
        let catalog = DiseaseCatalog::load().unwrap();
        let crops = catalog.list_crops();
        assert_eq!(&crops[..3], &["Potato", "Tomato", "Grapes"]);
        // "Roses" appears under Powdery Mildew and Rust but is listed once.
        assert_eq!(crops.iter().filter(|c| **c == "Roses").count(), 1);
        assert_eq!(crops, catalog.list_crops());
    }

    #[test]
    fn test_list_regions_deduplicated() {
        let catalog = DiseaseCatalog::load().unwrap();
        let regions = catalog.list_regions();
        assert_eq!(regions[0], "Maharashtra");
        assert_eq!(regions.iter().filter(|r| **r == "West Bengal").count(), 1);
        assert_eq!(regions.iter().filter(|r| **r == "Tamil Nadu").count(), 1);
    }

    #[test]
    fn test_from_records_rejects_duplicate_ids() {
        let records = vec![
            disease("1", "A", &["Rice"], Severity::Low),
            disease("1", "B", &["Rice"], Severity::Low),
        ];
        assert!(matches!(
            DiseaseCatalog::from_records(records),
            Err(KbError::MalformedSeed { .. })
        ));
    }

    #[test]
    fn test_from_records_rejects_missing_crops() {
        let records = vec![disease("1", "A", &[], Severity::Low)];
        assert!(matches!(
            DiseaseCatalog::from_records(records),
            Err(KbError::MalformedSeed { .. })
        ));
    }

    #[test]
    fn test_empty_catalog_is_valid() {
        let catalog = DiseaseCatalog::from_records(vec![]).unwrap();
        assert!(catalog.is_empty());
        assert!(catalog.list_crops().is_empty());
    }
}
