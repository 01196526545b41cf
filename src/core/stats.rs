use crate::core::catalog::DiseaseCatalog;
use crate::core::detection::DetectionCounters;
use crate::core::history::HistoryLedger;
use crate::domain::model::{Month, MonthlyCount, NamedCount, RegionBreakdown, Stats};
use crate::utils::error::{KbError, Result};
use chrono::Datelike;
use serde::Deserialize;
use std::cmp::Reverse;
use std::collections::HashMap;

const EMBEDDED_STATS: &str = include_str!("../../data/stats_seed.json");

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsSeed {
    most_common_diseases: Vec<NamedCount>,
    diseases_by_region: Vec<RegionBreakdown>,
    uploads_by_month: Vec<SeedMonth>,
    success_rate: f64,
}

#[derive(Debug, Deserialize)]
struct SeedMonth {
    month: String,
    count: u32,
}

/// Derived summary views over catalog and usage data.
#[derive(Debug, Clone)]
pub struct StatsAggregator {
    catalog_order: Vec<String>,
    disease_counts: Vec<NamedCount>,
    region_counts: Vec<RegionBreakdown>,
    monthly: [u32; 12],
    success_rate: f64,
}

impl StatsAggregator {
    /// Aggregator over the embedded sample dataset.
    pub fn from_seed(catalog: &DiseaseCatalog) -> Result<Self> {
        let seed: StatsSeed = serde_json::from_str(EMBEDDED_STATS)
            .map_err(|e| KbError::malformed_seed("stats_seed.json", e.to_string()))?;

        let mut monthly = [0u32; 12];
        let mut seen = [false; 12];
        for entry in &seed.uploads_by_month {
            let month: Month = entry
                .month
                .parse()
                .map_err(|e: KbError| KbError::malformed_seed("stats_seed.json", e.to_string()))?;
            let slot = month as usize;
            if seen[slot] {
                return Err(KbError::malformed_seed(
                    "stats_seed.json",
                    format!("month {} listed twice", month.label()),
                ));
            }
            seen[slot] = true;
            monthly[slot] = entry.count;
        }

        if !(0.0..=100.0).contains(&seed.success_rate) {
            return Err(KbError::malformed_seed(
                "stats_seed.json",
                format!("success rate {} outside 0..=100", seed.success_rate),
            ));
        }

        Ok(Self {
            catalog_order: catalog_names(catalog),
            disease_counts: seed.most_common_diseases,
            region_counts: seed.diseases_by_region,
            monthly,
            success_rate: seed.success_rate,
        })
    }

    /// Aggregator over the detections recorded in this session.
    ///
    /// Each detection counts once for its disease, once for every region the
    /// disease commonly occurs in, and once for the calendar month of its
    /// timestamp. The success rate is completed attempts over all attempts.
    ///
    /// Failed attempts never reach the ledger, so the success rate always
    /// covers the whole session. With a capped ledger the disease, region and
    /// month counts cover only the retained entries.
    pub fn from_history(
        catalog: &DiseaseCatalog,
        ledger: &HistoryLedger,
        counters: DetectionCounters,
    ) -> Self {
        let mut disease_counts: Vec<NamedCount> = Vec::new();
        let mut region_counts: HashMap<&str, Vec<NamedCount>> = HashMap::new();
        let mut monthly = [0u32; 12];

        for result in ledger.iter() {
            bump(&mut disease_counts, &result.disease_name);

            if let Ok(disease) = catalog.get_by_id(&result.disease_id) {
                for region in &disease.common_regions {
                    bump(region_counts.entry(region.as_str()).or_default(), &result.disease_name);
                }
            }

            if let Some(month) = Month::from_number(result.timestamp.month()) {
                monthly[month as usize] += 1;
            }
        }

        let region_counts = catalog
            .list_regions()
            .into_iter()
            .filter_map(|region| {
                region_counts.remove(region).map(|diseases| RegionBreakdown {
                    region: region.to_string(),
                    diseases,
                })
            })
            .collect();

        Self {
            catalog_order: catalog_names(catalog),
            disease_counts,
            region_counts,
            monthly,
            success_rate: counters.success_rate(),
        }
    }

    /// Top `n` diseases by count, ties broken by catalog order.
    pub fn top_diseases_by_frequency(&self, n: usize) -> Vec<NamedCount> {
        let mut ranked = self.rank(&self.disease_counts);
        ranked.truncate(n);
        ranked
    }

    pub fn diseases_by_region(&self) -> Vec<RegionBreakdown> {
        self.region_counts
            .iter()
            .map(|breakdown| RegionBreakdown {
                region: breakdown.region.clone(),
                diseases: self.rank(&breakdown.diseases),
            })
            .collect()
    }

    /// Exactly twelve entries, January through December.
    pub fn monthly_series(&self) -> Vec<MonthlyCount> {
        Month::ALL
            .iter()
            .map(|&month| MonthlyCount {
                month,
                count: self.monthly[month as usize],
            })
            .collect()
    }

    pub fn success_rate(&self) -> f64 {
        self.success_rate.clamp(0.0, 100.0)
    }

    pub fn snapshot(&self) -> Stats {
        Stats {
            top_diseases: self.top_diseases_by_frequency(self.disease_counts.len()),
            by_region: self.diseases_by_region(),
            monthly_series: self.monthly_series(),
            success_rate: self.success_rate(),
        }
    }

    fn rank(&self, counts: &[NamedCount]) -> Vec<NamedCount> {
        let mut indexed: Vec<(usize, &NamedCount)> = counts.iter().enumerate().collect();
        indexed.sort_by_key(|(input_idx, entry)| {
            let catalog_idx = self
                .catalog_order
                .iter()
                .position(|name| *name == entry.name)
                .unwrap_or(usize::MAX);
            (Reverse(entry.count), catalog_idx, *input_idx)
        });
        indexed.into_iter().map(|(_, entry)| entry.clone()).collect()
    }
}

fn catalog_names(catalog: &DiseaseCatalog) -> Vec<String> {
    catalog.iter().map(|disease| disease.name.clone()).collect()
}

fn bump(counts: &mut Vec<NamedCount>, name: &str) {
    match counts.iter_mut().find(|entry| entry.name == name) {
        Some(entry) => entry.count += 1,
        None => counts.push(NamedCount::new(name, 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::DetectionResult;
    use chrono::{TimeZone, Utc};

    fn seed_aggregator() -> StatsAggregator {
        let catalog = DiseaseCatalog::load().unwrap();
        StatsAggregator::from_seed(&catalog).unwrap()
    }

    #[test]
    fn test_top_diseases_on_seed() {
        let top = seed_aggregator().top_diseases_by_frequency(5);
        assert_eq!(
            top,
            vec![
                NamedCount::new("Late Blight", 156),
                NamedCount::new("Powdery Mildew", 109),
                NamedCount::new("Rice Blast", 87),
                NamedCount::new("Anthracnose", 64),
                NamedCount::new("Rust", 53),
            ]
        );
        assert_eq!(seed_aggregator().top_diseases_by_frequency(2).len(), 2);
    }

    #[test]
    fn test_monthly_series_has_twelve_ordered_slots() {
        let series = seed_aggregator().monthly_series();
        assert_eq!(series.len(), 12);
        let months: Vec<Month> = series.iter().map(|m| m.month).collect();
        assert_eq!(months, Month::ALL.to_vec());
        assert_eq!(series[0].count, 45);
        assert_eq!(series[7].count, 132);
    }

    #[test]
    fn test_regions_ranked_descending() {
        let regions = seed_aggregator().diseases_by_region();
        let regions_named: Vec<&str> = regions.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(regions_named, vec!["Maharashtra", "Punjab", "West Bengal"]);
        for region in &regions {
            assert!(region.diseases.windows(2).all(|w| w[0].count >= w[1].count));
        }
        assert_eq!(regions[1].diseases[0], NamedCount::new("Rust", 35));
    }

    #[test]
    fn test_success_rate_in_range() {
        let rate = seed_aggregator().success_rate();
        assert!((rate - 87.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ties_follow_catalog_order() {
        let catalog = DiseaseCatalog::load().unwrap();
        let mut aggregator = StatsAggregator::from_seed(&catalog).unwrap();
        aggregator.disease_counts = vec![
            NamedCount::new("Rust", 10),
            NamedCount::new("Unlisted", 10),
            NamedCount::new("Late Blight", 10),
            NamedCount::new("Rice Blast", 12),
        ];
        let names: Vec<String> = aggregator
            .top_diseases_by_frequency(4)
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Rice Blast", "Late Blight", "Rust", "Unlisted"]);
    }

    #[test]
    fn test_live_stats_from_history() {
        let catalog = DiseaseCatalog::load().unwrap();
        let mut ledger = HistoryLedger::new();
        let detections = [("1", "Late Blight", 3), ("3", "Rice Blast", 3), ("1", "Late Blight", 5)];
        for (i, (id, name, month)) in detections.iter().enumerate() {
            ledger
                .append(DetectionResult {
                    id: i.to_string(),
                    timestamp: Utc.with_ymd_and_hms(2024, *month, 1, 0, 0, 0).unwrap(),
                    image_ref: "leaf.jpg".to_string(),
                    disease_id: id.to_string(),
                    disease_name: name.to_string(),
                    confidence: 80,
                    recommendations: vec![],
                })
                .unwrap();
        }

        let counters = DetectionCounters { completed: 3, failed: 1 };
        let stats = StatsAggregator::from_history(&catalog, &ledger, counters).snapshot();

        assert_eq!(
            stats.top_diseases,
            vec![NamedCount::new("Late Blight", 2), NamedCount::new("Rice Blast", 1)]
        );
        assert_eq!(stats.monthly_series[2].count, 2);
        assert_eq!(stats.monthly_series[4].count, 1);
        assert_eq!(stats.monthly_series.len(), 12);
        assert!((stats.success_rate - 75.0).abs() < f64::EPSILON);

        let west_bengal = stats
            .by_region
            .iter()
            .find(|r| r.region == "West Bengal")
            .unwrap();
        assert_eq!(
            west_bengal.diseases,
            vec![NamedCount::new("Late Blight", 2), NamedCount::new("Rice Blast", 1)]
        );
        assert_eq!(stats.by_region[0].region, "Maharashtra");
    }

    #[test]
    fn test_live_stats_without_attempts() {
        let catalog = DiseaseCatalog::load().unwrap();
        let stats = StatsAggregator::from_history(
            &catalog,
            &HistoryLedger::new(),
            DetectionCounters::default(),
        )
        .snapshot();
        assert!(stats.top_diseases.is_empty());
        assert!(stats.monthly_series.iter().all(|m| m.count == 0));
        assert_eq!(stats.success_rate, 0.0);
    }
}
