//! Health history: one append-only row per symptom analysis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::people::title_case;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthHistoryEntry {
  pub id:                   i64,
  pub patient_id:           i64,
  /// Titled symptom names joined with `", "`, e.g. `"Fever, Headache"`.
  pub symptom_summary:      String,
  pub recommendation_count: u32,
  pub doctor_count:         u32,
  pub recorded_at:          DateTime<Utc>,
}

/// Input to [`crate::store::ClinicStore::record_history`].
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
  pub patient_id:           i64,
  pub symptom_summary:      String,
  pub recommendation_count: u32,
  pub doctor_count:         u32,
}

impl NewHistoryEntry {
  pub fn summarize<'a>(
    patient_id: i64,
    symptom_names: impl IntoIterator<Item = &'a str>,
    recommendation_count: usize,
    doctor_count: usize,
  ) -> Self {
    let symptom_summary = symptom_names
      .into_iter()
      .map(title_case)
      .collect::<Vec<_>>()
      .join(", ");
    Self {
      patient_id,
      symptom_summary,
      recommendation_count: u32::try_from(recommendation_count).unwrap_or(u32::MAX),
      doctor_count: u32::try_from(doctor_count).unwrap_or(u32::MAX),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn summary_titles_names() {
    let entry = NewHistoryEntry::summarize(1, ["fever", "joint pain"], 5, 2);
    assert_eq!(entry.symptom_summary, "Fever, Joint Pain");
    assert_eq!(entry.recommendation_count, 5);
    assert_eq!(entry.doctor_count, 2);
  }
}
