use crate::utils::error::{KbError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = KbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            _ => Err(KbError::validation(
                "severity",
                s,
                "expected one of: low, medium, high",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Treatments {
    pub chemical: Vec<String>,
    pub organic: Vec<String>,
    pub preventive: Vec<String>,
}

/// A reference disease record. Owned by the catalog and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disease {
    pub id: String,
    pub name: String,
    pub scientific_name: String,
    pub description: String,
    pub symptoms: Vec<String>,
    pub causes: Vec<String>,
    pub treatments: Treatments,
    pub images: Vec<String>,
    pub affected_crops: Vec<String>,
    pub severity: Severity,
    pub common_regions: Vec<String>,
}

impl Disease {
    pub fn affects_any<'a, I>(&self, crops: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        crops
            .into_iter()
            .any(|crop| self.affected_crops.contains(crop))
    }

    pub fn occurs_in_any<'a, I>(&self, regions: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        regions
            .into_iter()
            .any(|region| self.common_regions.contains(region))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub image_ref: String,
    pub disease_id: String,
    pub disease_name: String,
    pub confidence: u8,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedCount {
    pub name: String,
    pub count: u32,
}

impl NamedCount {
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionBreakdown {
    pub region: String,
    pub diseases: Vec<NamedCount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::Jan,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
        Month::Nov,
        Month::Dec,
    ];

    /// Maps a 1-based month number (as returned by `chrono::Datelike::month`).
    pub fn from_number(month: u32) -> Option<Self> {
        month
            .checked_sub(1)
            .and_then(|idx| Self::ALL.get(idx as usize))
            .copied()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Month::Jan => "Jan",
            Month::Feb => "Feb",
            Month::Mar => "Mar",
            Month::Apr => "Apr",
            Month::May => "May",
            Month::Jun => "Jun",
            Month::Jul => "Jul",
            Month::Aug => "Aug",
            Month::Sep => "Sep",
            Month::Oct => "Oct",
            Month::Nov => "Nov",
            Month::Dec => "Dec",
        }
    }
}

impl FromStr for Month {
    type Err = KbError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .find(|m| m.label().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| KbError::validation("month", s, "expected a three-letter month label"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCount {
    pub month: Month,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub top_diseases: Vec<NamedCount>,
    pub by_region: Vec<RegionBreakdown>,
    pub monthly_series: Vec<MonthlyCount>,
    pub success_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parse_is_lenient_on_case_only() {
        assert_eq!("High".parse::<Severity>().unwrap(), Severity::High);
        assert_eq!(" low ".parse::<Severity>().unwrap(), Severity::Low);
        assert!(matches!(
            "critical".parse::<Severity>(),
            Err(KbError::Validation { .. })
        ));
    }

    #[test]
    fn test_month_numbering() {
        assert_eq!(Month::from_number(1), Some(Month::Jan));
        assert_eq!(Month::from_number(12), Some(Month::Dec));
        assert_eq!(Month::from_number(0), None);
        assert_eq!(Month::from_number(13), None);
        assert_eq!("sep".parse::<Month>().unwrap(), Month::Sep);
    }

    #[test]
    fn test_disease_serializes_camel_case() {
        let disease = Disease {
            id: "x".to_string(),
            name: "Test".to_string(),
            scientific_name: "Testus".to_string(),
            description: String::new(),
            symptoms: vec![],
            causes: vec![],
            treatments: Treatments::default(),
            images: vec![],
            affected_crops: vec!["Rice".to_string()],
            severity: Severity::Medium,
            common_regions: vec![],
        };
        let json = serde_json::to_value(&disease).unwrap();
        assert_eq!(json["scientificName"], "Testus");
        assert_eq!(json["severity"], "medium");
    }
}
