//! Uploaded medical documents.
//!
//! The file lives on disk under the configured upload directory; only its
//! stored name and metadata live in the database. A row exists iff the file
//! exists, except when a delete fails half-way (see the API layer).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Extensions accepted for upload, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedDocument {
  pub id:          i64,
  pub patient_id:  i64,
  /// Name of the file inside the upload directory.
  pub file_name:   String,
  pub description: Option<String>,
  pub uploaded_at: DateTime<Utc>,
}

/// Input to [`crate::store::ClinicStore::add_document`].
#[derive(Debug, Clone)]
pub struct NewDocument {
  pub patient_id:  i64,
  pub file_name:   String,
  pub description: Option<String>,
  pub uploaded_at: DateTime<Utc>,
}

/// Return the lower-cased extension of `name` if it is on the allow-list.
pub fn allowed_extension(name: &str) -> Option<String> {
  let (_, ext) = name.rsplit_once('.')?;
  let ext = ext.to_ascii_lowercase();
  ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Reduce a client-supplied file name to a safe, flat ASCII name.
///
/// Path separators become spaces, whitespace runs become `_`, anything other
/// than ASCII alphanumerics, `.`, `_` and `-` is dropped, and leading or
/// trailing `.`/`_` are trimmed so the result can never escape the upload
/// directory or be hidden.
pub fn sanitize_file_name(name: &str) -> String {
  let flattened = name.replace(['/', '\\'], " ");
  let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
  let kept: String = joined
    .chars()
    .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    .collect();
  kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Validate an original upload name and derive the name it is stored under:
/// `user<id>_<YYYYmmdd_HHMMSS>_<sanitized>`.
///
/// Returns `(stored_name, sanitized_original)`.
pub fn stored_file_name(
  patient_id: i64,
  at: DateTime<Utc>,
  original: &str,
) -> Result<(String, String)> {
  if allowed_extension(original).is_none() {
    return Err(Error::DisallowedFileType(original.to_string()));
  }
  let sanitized = sanitize_file_name(original);
  // Sanitising may strip the whole stem, leaving only the extension.
  if allowed_extension(&sanitized).is_none() {
    return Err(Error::DisallowedFileType(original.to_string()));
  }
  let stamp = at.format("%Y%m%d_%H%M%S");
  Ok((format!("user{patient_id}_{stamp}_{sanitized}"), sanitized))
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn extension_allow_list() {
    assert_eq!(allowed_extension("scan.PDF").as_deref(), Some("pdf"));
    assert_eq!(allowed_extension("x-ray.jpeg").as_deref(), Some("jpeg"));
    assert!(allowed_extension("notes.txt").is_none());
    assert!(allowed_extension("pdf").is_none());
    assert!(allowed_extension("archive.pdf.exe").is_none());
  }

  #[test]
  fn sanitize_strips_paths_and_oddities() {
    assert_eq!(sanitize_file_name("../../etc/passwd.pdf"), "etc_passwd.pdf");
    assert_eq!(sanitize_file_name("my blood test.pdf"), "my_blood_test.pdf");
    assert_eq!(sanitize_file_name("résumé.png"), "rsum.png");
    assert_eq!(sanitize_file_name(".hidden.jpg"), "hidden.jpg");
  }

  #[test]
  fn stored_name_format() {
    let at = Utc.with_ymd_and_hms(2025, 11, 15, 9, 5, 7).unwrap();
    let (stored, original) = stored_file_name(3, at, "Lab Report.pdf").unwrap();
    assert_eq!(stored, "user3_20251115_090507_Lab_Report.pdf");
    assert_eq!(original, "Lab_Report.pdf");
  }

  #[test]
  fn disallowed_names_are_rejected() {
    let at = Utc::now();
    assert!(matches!(
      stored_file_name(1, at, "virus.exe"),
      Err(Error::DisallowedFileType(_))
    ));
    // Nothing but the extension survives sanitising.
    assert!(matches!(
      stored_file_name(1, at, "\u{5831}\u{544a}.pdf"),
      Err(Error::DisallowedFileType(_))
    ));
  }
}
