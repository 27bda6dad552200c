//! Typed per-title results and the batch summary.
//!
//! The orchestrator never prints. Every title ends in exactly one
//! [`TitleStatus`], and the batch returns a [`BatchSummary`] the caller can
//! render, serialise, or turn into an exit code.

use crate::error::{ArchiveError, ErrorKind, ImageError};
use serde::{Deserialize, Serialize, Serializer};
use std::path::PathBuf;

/// How one title ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TitleStatus {
    /// The full pipeline ran and the final document was written.
    Archived { final_document: PathBuf },
    /// The completion marker already existed; nothing ran.
    Skipped { raw_source: PathBuf },
    /// A fatal per-title error stopped the pipeline.
    Failed { kind: ErrorKind, message: String },
}

/// Result for a single title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleOutcome {
    pub title: String,
    /// Sanitised on-disk name of the title's directory and files.
    pub basename: String,
    pub status: TitleStatus,
    pub images_saved: usize,
    /// Soft failures; never abort the title.
    #[serde(serialize_with = "serialize_image_errors")]
    pub image_errors: Vec<ImageError>,
    pub duration_ms: u64,
}

/// Each image error is written with its kind and display message next to
/// the variant's own fields.
fn serialize_image_errors<S: Serializer>(
    errors: &[ImageError],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct Entry<'a> {
        kind: ErrorKind,
        message: String,
        #[serde(flatten)]
        error: &'a ImageError,
    }

    serializer.collect_seq(errors.iter().map(|error| Entry {
        kind: error.kind(),
        message: error.to_string(),
        error,
    }))
}

impl TitleOutcome {
    pub(crate) fn failed(
        title: &str,
        basename: &str,
        error: &ArchiveError,
        images_saved: usize,
        image_errors: Vec<ImageError>,
        duration_ms: u64,
    ) -> Self {
        Self {
            title: title.to_string(),
            basename: basename.to_string(),
            status: TitleStatus::Failed {
                kind: error.kind(),
                message: error.to_string(),
            },
            images_saved,
            image_errors,
            duration_ms,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, TitleStatus::Failed { .. })
    }
}

/// Aggregate of a whole batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// One entry per title, in input order.
    pub outcomes: Vec<TitleOutcome>,
    pub archived: usize,
    pub skipped: usize,
    pub failed: usize,
    pub images_saved: usize,
    pub images_failed: usize,
    pub total_duration_ms: u64,
}

impl BatchSummary {
    pub(crate) fn push(&mut self, outcome: TitleOutcome) {
        match outcome.status {
            TitleStatus::Archived { .. } => self.archived += 1,
            TitleStatus::Skipped { .. } => self.skipped += 1,
            TitleStatus::Failed { .. } => self.failed += 1,
        }
        self.images_saved += outcome.images_saved;
        self.images_failed += outcome.image_errors.len();
        self.outcomes.push(outcome);
    }

    /// True when no title failed. Image failures do not count.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// True when at least one title was attempted and every attempt failed.
    pub fn is_total_failure(&self) -> bool {
        self.failed > 0 && self.archived == 0 && self.skipped == 0
    }

    /// Process exit code: 0 all good, 2 partial failure, 1 total failure.
    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else if self.is_total_failure() {
            1
        } else {
            2
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &TitleOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: TitleStatus, images: usize, image_errors: usize) -> TitleOutcome {
        TitleOutcome {
            title: "T".into(),
            basename: "T".into(),
            status,
            images_saved: images,
            image_errors: (0..image_errors)
                .map(|i| ImageError::Timeout {
                    url: format!("https://x/{i}.png"),
                    ms: 100,
                })
                .collect(),
            duration_ms: 1,
        }
    }

    fn failed() -> TitleStatus {
        TitleStatus::Failed {
            kind: ErrorKind::Retrieval,
            message: "no <pre>".into(),
        }
    }

    #[test]
    fn counts_and_exit_codes() {
        let mut s = BatchSummary::default();
        assert_eq!(s.exit_code(), 0);

        s.push(outcome(
            TitleStatus::Archived {
                final_document: "A/A.html".into(),
            },
            3,
            1,
        ));
        s.push(outcome(
            TitleStatus::Skipped {
                raw_source: "B/B.mwk".into(),
            },
            0,
            0,
        ));
        assert_eq!(s.exit_code(), 0);
        assert_eq!(s.images_saved, 3);
        assert_eq!(s.images_failed, 1);

        s.push(outcome(failed(), 0, 0));
        assert_eq!((s.archived, s.skipped, s.failed), (1, 1, 1));
        assert_eq!(s.exit_code(), 2);
        assert_eq!(s.failures().count(), 1);
    }

    #[test]
    fn all_failed_is_total_failure() {
        let mut s = BatchSummary::default();
        s.push(outcome(failed(), 0, 0));
        s.push(outcome(failed(), 0, 0));
        assert!(s.is_total_failure());
        assert_eq!(s.exit_code(), 1);
    }

    #[test]
    fn status_serialises_tagged() {
        let json = serde_json::to_value(outcome(failed(), 0, 0)).unwrap();
        assert_eq!(json["status"]["state"], "failed");
        assert_eq!(json["status"]["kind"], "RETRIEVAL");
    }

    #[test]
    fn image_errors_carry_their_kind() {
        let archived = TitleStatus::Archived {
            final_document: "A/A.html".into(),
        };
        let json = serde_json::to_value(outcome(archived, 0, 1)).unwrap();
        let entry = &json["image_errors"][0];
        assert_eq!(entry["kind"], "IMAGE_FETCH");
        assert_eq!(entry["reason"], "timeout");
        assert_eq!(entry["url"], "https://x/0.png");
        assert_eq!(entry["ms"], 100);
        assert!(entry["message"].as_str().unwrap().contains("100ms"));

        let back: TitleOutcome = serde_json::from_value(json).unwrap();
        assert!(matches!(back.image_errors[0], ImageError::Timeout { ms: 100, .. }));
    }
}
