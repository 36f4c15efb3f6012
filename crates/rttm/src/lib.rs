//! RTTM ground-truth parsing.
//!
//! Reads NIST RTTM speaker records into time-interval segments for
//! frame-level diarization scoring.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for RTTM operations.
pub type Result<T> = std::result::Result<T, RttmError>;

#[derive(Debug, Error)]
pub enum RttmError {
    /// The file exists but could not be read.
    #[error("failed to read RTTM file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single speaker turn, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub speaker: String,
    pub start: f64,
    pub end: f64,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Parsed ground truth for one file.
///
/// Segments keep file order. `skipped_records` counts SPEAKER records that
/// were dropped because their time fields did not parse; lines that are not
/// SPEAKER records at all (comments, other RTTM record types, short lines)
/// are ignored without being counted.
#[derive(Debug, Clone, Default)]
pub struct GroundTruth {
    pub segments: Vec<Segment>,
    pub skipped_records: usize,
}

impl GroundTruth {
    /// Sorted distinct speaker labels, before any capacity truncation.
    pub fn speaker_labels(&self) -> Vec<&str> {
        let labels: BTreeSet<&str> = self.segments.iter().map(|s| s.speaker.as_str()).collect();
        labels.into_iter().collect()
    }

    /// Number of distinct speakers in the file.
    pub fn num_speakers(&self) -> usize {
        self.segments
            .iter()
            .map(|s| s.speaker.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Load ground truth from an RTTM file.
///
/// A missing file yields an empty ground truth rather than an error, so
/// callers can treat "no reference available" as skip-not-fatal.
pub fn load(path: &Path) -> Result<GroundTruth> {
    if !path.exists() {
        return Ok(GroundTruth::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| RttmError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    let truth = parse_str(&content);
    tracing::debug!(
        path = %path.display(),
        segments = truth.segments.len(),
        skipped = truth.skipped_records,
        speakers = ?truth.speaker_labels(),
        "loaded RTTM ground truth"
    );
    Ok(truth)
}

/// Parse RTTM content (for testing without a filesystem).
///
/// Record format, whitespace-delimited:
///
/// ```text
/// SPEAKER <uri> <channel> <start> <duration> <NA> <NA> <speaker_id> <NA> <NA>
/// ```
///
/// A line is a candidate record only if it has at least 8 fields and the
/// first is the literal `SPEAKER`. Field 4 is the start and field 5 the
/// duration, both in seconds; field 8 is the speaker label.
pub fn parse_str(content: &str) -> GroundTruth {
    let mut segments = Vec::new();
    let mut skipped_records = 0;

    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 8 || fields[0] != "SPEAKER" {
            continue;
        }

        match (fields[3].parse::<f64>(), fields[4].parse::<f64>()) {
            (Ok(start), Ok(duration)) => segments.push(Segment {
                speaker: fields[7].to_string(),
                start,
                end: start + duration,
            }),
            _ => skipped_records += 1,
        }
    }

    GroundTruth {
        segments,
        skipped_records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_speaker_record() {
        let truth = parse_str("SPEAKER file1 1 10.0 5.0 <NA> <NA> spk1 <NA> <NA>");
        assert_eq!(truth.segments.len(), 1);
        let seg = &truth.segments[0];
        assert_eq!(seg.speaker, "spk1");
        assert_eq!(seg.start, 10.0);
        assert_eq!(seg.end, 15.0);
        assert_eq!(seg.duration(), 5.0);
        assert_eq!(truth.skipped_records, 0);
    }

    #[test]
    fn test_short_line_ignored() {
        let truth = parse_str("SPEAKER file1 1 10.0 5.0");
        assert!(truth.is_empty());
        assert_eq!(truth.skipped_records, 0);
    }

    #[test]
    fn test_non_speaker_lines_ignored() {
        let content = "\
;; a comment line that is long enough to have eight fields in total here
SPKR-INFO file1 1 <NA> <NA> <NA> unknown spk1 <NA> <NA>

SPEAKER file1 1 0.5 1.0 <NA> <NA> spk1 <NA> <NA>";
        let truth = parse_str(content);
        assert_eq!(truth.segments.len(), 1);
        assert_eq!(truth.skipped_records, 0);
    }

    #[test]
    fn test_bad_time_field_counted_as_skipped() {
        let content = "\
SPEAKER file1 1 abc 5.0 <NA> <NA> spk1 <NA> <NA>
SPEAKER file1 1 1.0 xyz <NA> <NA> spk2 <NA> <NA>
SPEAKER file1 1 2.0 1.0 <NA> <NA> spk3 <NA> <NA>";
        let truth = parse_str(content);
        assert_eq!(truth.segments.len(), 1);
        assert_eq!(truth.segments[0].speaker, "spk3");
        assert_eq!(truth.skipped_records, 2);
    }

    #[test]
    fn test_segments_keep_file_order() {
        let content = "\
SPEAKER f 1 7.0 1.0 <NA> <NA> b <NA> <NA>
SPEAKER f 1 0.0 2.0 <NA> <NA> a <NA> <NA>
SPEAKER f 1 1.0 2.0 <NA> <NA> b <NA> <NA>";
        let truth = parse_str(content);
        let order: Vec<_> = truth.segments.iter().map(|s| s.start).collect();
        assert_eq!(order, vec![7.0, 0.0, 1.0]);
    }

    #[test]
    fn test_speaker_labels_sorted_distinct() {
        let content = "\
SPEAKER f 1 0.0 1.0 <NA> <NA> carol <NA> <NA>
SPEAKER f 1 1.0 1.0 <NA> <NA> alice <NA> <NA>
SPEAKER f 1 2.0 1.0 <NA> <NA> carol <NA> <NA>
SPEAKER f 1 3.0 1.0 <NA> <NA> bob <NA> <NA>";
        let truth = parse_str(content);
        assert_eq!(truth.speaker_labels(), vec!["alice", "bob", "carol"]);
        assert_eq!(truth.num_speakers(), 3);
    }

    #[test]
    fn test_missing_file_yields_empty() {
        let truth = load(Path::new("/nonexistent/dir/meeting.rttm")).unwrap();
        assert!(truth.is_empty());
        assert_eq!(truth.skipped_records, 0);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meeting.rttm");
        std::fs::write(&path, "SPEAKER meeting 1 3.25 0.75 <NA> <NA> spk_a <NA> <NA>\n").unwrap();

        let truth = load(&path).unwrap();
        assert_eq!(truth.segments.len(), 1);
        assert_eq!(truth.segments[0].speaker, "spk_a");
        assert_eq!(truth.segments[0].end, 4.0);
    }
}
