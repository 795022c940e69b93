//! The symptom resolver: free-text symptoms → care pathway.
//!
//! Matching is exact and case-insensitive against the seeded symptom names.
//! At most [`MAX_SYMPTOMS`] matches are retained; when more match, the
//! highest priorities win and ties keep id order.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  catalog::{Recommendation, Specialty, Symptom},
  history::NewHistoryEntry,
  people::Doctor,
  store::ClinicStore,
};

/// Hard cap on the number of symptoms carried into a care pathway.
pub const MAX_SYMPTOMS: usize = 3;

/// Everything produced by one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarePathway {
  pub symptoms:         Vec<Symptom>,
  pub recommendations:  Vec<Recommendation>,
  pub specialties:      Vec<Specialty>,
  pub doctors:          Vec<Doctor>,
  /// `false` if the history entry could not be written.
  pub history_recorded: bool,
}

/// Split on commas, trim, lower-case, drop empties and repeats.
///
/// First occurrences keep their position. Idempotent: normalising the
/// comma-joined output yields the same list.
pub fn normalize(raw: &str) -> Vec<String> {
  let mut seen = HashSet::new();
  raw
    .split(',')
    .map(|s| s.trim().to_lowercase())
    .filter(|s| !s.is_empty())
    .filter(|s| seen.insert(s.clone()))
    .collect()
}

/// Keep at most [`MAX_SYMPTOMS`] matches. Only reorders when the cap bites.
pub fn cap_by_priority(mut matches: Vec<Symptom>) -> Vec<Symptom> {
  if matches.len() > MAX_SYMPTOMS {
    // `sort_by` is stable, so equal priorities stay in id order.
    matches.sort_by(|a, b| b.priority.cmp(&a.priority));
    matches.truncate(MAX_SYMPTOMS);
  }
  matches
}

/// Stable sort by rating, then experience, both descending.
pub fn order_doctors(doctors: &mut [Doctor]) {
  doctors.sort_by(|a, b| {
    b.rating
      .total_cmp(&a.rating)
      .then_with(|| b.experience_years.cmp(&a.experience_years))
  });
}

/// Run the full resolution for `patient_id` and append a history entry.
///
/// The history write is best-effort: its failure is logged and reported via
/// [`CarePathway::history_recorded`], never returned as an error.
pub async fn resolve<S>(store: &S, patient_id: i64, raw: &str) -> Result<CarePathway>
where
  S: ClinicStore,
{
  let names = normalize(raw);
  if names.is_empty() {
    return Err(Error::NoSymptomInput);
  }

  let matches = store.find_symptoms(names).await.map_err(Error::store)?;
  if matches.is_empty() {
    return Err(Error::NoMatchingSymptoms);
  }
  let symptoms = cap_by_priority(matches);
  let ids: Vec<i64> = symptoms.iter().map(|s| s.id).collect();

  let recommendations = store
    .recommendations_for(ids.clone())
    .await
    .map_err(Error::store)?;
  let specialties = store.specialties_for(ids).await.map_err(Error::store)?;

  let mut doctors = if specialties.is_empty() {
    Vec::new()
  } else {
    store
      .doctors_in(specialties.iter().map(|s| s.id).collect())
      .await
      .map_err(Error::store)?
  };
  order_doctors(&mut doctors);

  let entry = NewHistoryEntry::summarize(
    patient_id,
    symptoms.iter().map(|s| s.name.as_str()),
    recommendations.len(),
    doctors.len(),
  );
  let history_recorded = match store.record_history(entry).await {
    Ok(_) => true,
    Err(e) => {
      tracing::warn!(patient_id, error = %e, "failed to record health history");
      false
    }
  };

  Ok(CarePathway {
    symptoms,
    recommendations,
    specialties,
    doctors,
    history_recorded,
  })
}
