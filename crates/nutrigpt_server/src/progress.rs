//! Weight/BMI history.

use std::sync::Arc;

use chrono::NaiveDate;
use nutrigpt_client::UserProfile;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::cache::Clock;
use crate::error::{AppError, AppResult};
use crate::store::{Store, keys};

/// Id of the entry seeded from the profile when no history exists.
pub const INITIAL_ENTRY_ID: &str = "initial";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgressEntry {
    pub id: String,
    /// ISO `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub weight: f64,
    /// Centimetres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waist: Option<f64>,
    pub bmi: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewProgressEntry {
    pub weight: f64,
    #[serde(default)]
    pub waist: Option<f64>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Abaixo",
            BmiCategory::Normal => "Normal",
            BmiCategory::Overweight => "Sobrepeso",
            BmiCategory::Obese => "Obesidade",
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub latest_weight: f64,
    pub latest_bmi: f64,
    /// Latest minus oldest weight, kg.
    pub total_change: f64,
    pub category: BmiCategory,
    /// pt-BR display label for `category`.
    pub category_label: &'static str,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Body-mass index from kilograms and centimetres, one decimal.
pub fn calculate_bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    round1(weight_kg / (height_m * height_m))
}

pub fn summarize(entries: &[ProgressEntry], profile: &UserProfile) -> ProgressSummary {
    let (latest_weight, latest_bmi) = entries
        .first()
        .map(|e| (e.weight, e.bmi))
        .unwrap_or((profile.current_weight, 0.0));
    let oldest_weight = entries.last().map(|e| e.weight).unwrap_or(latest_weight);
    let category = BmiCategory::from_bmi(latest_bmi);
    ProgressSummary {
        latest_weight,
        latest_bmi,
        total_change: round1(latest_weight - oldest_weight),
        category,
        category_label: category.label(),
    }
}

pub struct ProgressLog {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl ProgressLog {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    fn read(&self) -> AppResult<Vec<ProgressEntry>> {
        let Some(raw) = self.store.get(keys::PROGRESS)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<ProgressEntry>>(&raw) {
            Ok(mut entries) => {
                entries.sort_by(|a, b| b.date.cmp(&a.date));
                Ok(entries)
            }
            Err(e) => {
                warn!(error = %e, "ignoring unreadable progress history");
                Ok(Vec::new())
            }
        }
    }

    fn write(&self, entries: &[ProgressEntry]) -> AppResult<()> {
        let raw = serde_json::to_string(entries)?;
        self.store.set(keys::PROGRESS, &raw)?;
        Ok(())
    }

    /// History newest-first. An empty history is seeded from the profile's current weight.
    pub fn entries(&self, profile: &UserProfile) -> AppResult<Vec<ProgressEntry>> {
        let entries = self.read()?;
        if !entries.is_empty() {
            return Ok(entries);
        }
        let seeded = vec![ProgressEntry {
            id: INITIAL_ENTRY_ID.to_string(),
            date: self.clock.today(),
            weight: profile.current_weight,
            waist: None,
            bmi: calculate_bmi(profile.current_weight, profile.height),
            note: None,
        }];
        self.write(&seeded)?;
        Ok(seeded)
    }

    pub fn record(&self, profile: &UserProfile, input: NewProgressEntry) -> AppResult<ProgressEntry> {
        if !input.weight.is_finite() || input.weight <= 0.0 {
            return Err(AppError::Validation("weight must be a positive number".into()));
        }
        if input.waist.is_some_and(|w| !w.is_finite() || w <= 0.0) {
            return Err(AppError::Validation("waist must be a positive number".into()));
        }

        let entry = ProgressEntry {
            id: Uuid::new_v4().to_string(),
            date: self.clock.today(),
            weight: input.weight,
            waist: input.waist,
            bmi: calculate_bmi(input.weight, profile.height),
            note: input.note.filter(|n| !n.trim().is_empty()),
        };
        let mut entries = self.entries(profile)?;
        entries.insert(0, entry.clone());
        self.write(&entries)?;
        Ok(entry)
    }

    pub fn summary(&self, profile: &UserProfile) -> AppResult<ProgressSummary> {
        Ok(summarize(&self.entries(profile)?, profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FixedClock;
    use crate::store::MemoryStore;
    use crate::test_utils::sample_profile;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn setup() -> (Arc<MemoryStore>, Arc<FixedClock>, ProgressLog) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(date(19)));
        let log = ProgressLog::new(store.clone(), clock.clone());
        (store, clock, log)
    }

    #[test]
    fn bmi_is_rounded_to_one_decimal() {
        assert_eq!(calculate_bmi(80.0, 175.0), 26.1);
        assert_eq!(calculate_bmi(60.0, 160.0), 23.4);
    }

    #[test]
    fn bmi_category_thresholds() {
        assert_eq!(BmiCategory::from_bmi(18.4), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(30.0), BmiCategory::Obese);
        assert_eq!(BmiCategory::Underweight.label(), "Abaixo");
        assert_eq!(BmiCategory::Obese.label(), "Obesidade");
    }

    #[test]
    fn empty_history_is_seeded_and_persisted() {
        let (store, _clock, log) = setup();
        let entries = log.entries(&sample_profile()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, INITIAL_ENTRY_ID);
        assert_eq!(entries[0].date, date(19));
        assert_eq!(entries[0].bmi, 26.1);
        let raw = store.get(keys::PROGRESS).unwrap().unwrap();
        assert!(raw.contains("\"date\":\"2026-10-19\""));
    }

    #[test]
    fn record_prepends_and_summary_tracks_change() {
        let (_store, clock, log) = setup();
        let profile = sample_profile();
        log.entries(&profile).unwrap();

        clock.set(date(26));
        let entry = log
            .record(
                &profile,
                NewProgressEntry {
                    weight: 78.35,
                    waist: Some(88.0),
                    note: Some("  ".into()),
                },
            )
            .unwrap();
        assert_eq!(entry.note, None);

        let entries = log.entries(&profile).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, date(26));

        let summary = log.summary(&profile).unwrap();
        assert_eq!(summary.latest_weight, 78.35);
        assert_eq!(summary.total_change, -1.7);
        assert_eq!(summary.category, BmiCategory::Overweight);
        assert_eq!(summary.category_label, "Sobrepeso");
    }

    #[test]
    fn record_rejects_non_positive_values() {
        let (_store, _clock, log) = setup();
        let bad_weight = NewProgressEntry {
            weight: 0.0,
            waist: None,
            note: None,
        };
        assert!(matches!(
            log.record(&sample_profile(), bad_weight),
            Err(AppError::Validation(_))
        ));
        let bad_waist = NewProgressEntry {
            weight: 70.0,
            waist: Some(-3.0),
            note: None,
        };
        assert!(log.record(&sample_profile(), bad_waist).is_err());
    }

    #[test]
    fn stored_history_is_sorted_newest_first() {
        let (store, _clock, log) = setup();
        let older = ProgressEntry {
            id: "a".into(),
            date: date(1),
            weight: 82.0,
            waist: None,
            bmi: 26.8,
            note: None,
        };
        let newer = ProgressEntry {
            id: "b".into(),
            date: date(15),
            ..older.clone()
        };
        store
            .set(keys::PROGRESS, &serde_json::to_string(&[older, newer]).unwrap())
            .unwrap();
        let ids: Vec<String> = log
            .entries(&sample_profile())
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn corrupt_history_reads_as_empty_and_is_reseeded() {
        let (store, _clock, log) = setup();
        store.set(keys::PROGRESS, "not json").unwrap();
        let entries = log.entries(&sample_profile()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, INITIAL_ENTRY_ID);
    }
}
