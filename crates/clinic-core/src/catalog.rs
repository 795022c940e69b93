//! Reference data: symptoms, recommendations and specialties.
//!
//! These rows are seeded once when a store is created and never written
//! afterwards. The link tables between them carry no payload, so they have no
//! Rust representation beyond the queries that traverse them.

use serde::{Deserialize, Serialize};

/// A known symptom with the doctor's advice shown alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symptom {
  pub id:          i64,
  /// Unique, compared case-insensitively.
  pub name:        String,
  pub description: Option<String>,
  pub advice:      Option<String>,
  /// Severity weight; only used to choose which matches survive the cap.
  pub priority:    i64,
}

/// The category of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecommendationKind {
  HomeRemedy,
  Dietary,
  Ayurvedic,
  Tablet,
}

impl RecommendationKind {
  /// Label stored in the `rec_type` column and shown to patients.
  pub fn label(self) -> &'static str {
    match self {
      Self::HomeRemedy => "Home Remedy",
      Self::Dietary => "Dietary",
      Self::Ayurvedic => "Ayurvedic",
      Self::Tablet => "Tablet",
    }
  }

  pub fn from_label(s: &str) -> Option<Self> {
    match s {
      "Home Remedy" => Some(Self::HomeRemedy),
      "Dietary" => Some(Self::Dietary),
      "Ayurvedic" => Some(Self::Ayurvedic),
      "Tablet" => Some(Self::Tablet),
      _ => None,
    }
  }
}

/// A home remedy, dietary change, ayurvedic preparation or tablet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
  pub id:           i64,
  pub name:         String,
  pub kind:         RecommendationKind,
  pub instructions: String,
  pub disclaimer:   Option<String>,
}

/// A medical specialty doctors can be filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specialty {
  pub id:          i64,
  pub name:        String,
  pub description: Option<String>,
}
