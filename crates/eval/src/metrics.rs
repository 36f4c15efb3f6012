//! Per-file metric records and cross-file aggregation.

use dermeter_rttm::GroundTruth;
use serde::{Deserialize, Serialize};

use crate::align::{align, Alignment, Score};
use crate::grid::{FrameGrid, SpeakerMap};
use crate::{EvalConfig, EvalError, Result};

/// Frame-level error rates for one file, as percentages of total reference
/// speech. Immutable once assembled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerMetrics {
    pub der: f64,
    pub miss: f64,
    pub fa: f64,
    pub se: f64,
}

impl DerMetrics {
    fn from_score(score: &Score) -> Self {
        Self {
            der: score.der(),
            miss: score.miss_pct(),
            fa: score.false_alarm_pct(),
            se: score.confusion_pct(),
        }
    }
}

/// DER outcome for one file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerOutcome {
    Scored(DerMetrics),
    /// The file has no reference speech at all; DER is undefined and the
    /// file must not enter averages as a zero.
    NoReferenceSpeech,
}

/// One file's evaluation: the DER outcome plus descriptive counts for
/// reporting. The counts are informational and never feed back into the
/// metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEvaluation {
    pub outcome: DerOutcome,
    /// Prediction columns that cleared the threshold in at least one frame.
    pub detected_speakers: usize,
    /// Distinct ground-truth labels, counted before capacity truncation.
    pub gt_speakers: usize,
    pub num_frames: usize,
}

/// Score one file: rasterize the ground truth and the thresholded
/// predictions onto a common grid, align, and wrap the winning counts.
///
/// `probabilities` is a row-major `[num_frames x speakers]` matrix of
/// per-frame activity probabilities. The evaluation is a pure, stateless
/// pipeline invocation; nothing persists across calls.
pub fn evaluate(
    probabilities: &[f32],
    speakers: usize,
    ground_truth: &GroundTruth,
    config: &EvalConfig,
) -> Result<FileEvaluation> {
    if !(config.frame_shift > 0.0) {
        return Err(EvalError::BadFrameShift(config.frame_shift));
    }

    let prediction = FrameGrid::from_probabilities(probabilities, speakers, config.threshold)?;
    let map = SpeakerMap::new(&ground_truth.segments, speakers);
    let reference = FrameGrid::from_segments(
        &ground_truth.segments,
        &map,
        prediction.frames(),
        config.frame_shift,
    );

    let outcome = match align(&reference, &prediction)? {
        Alignment::Scored(score) => {
            tracing::debug!(
                der = score.der(),
                miss = score.miss_pct(),
                fa = score.false_alarm_pct(),
                se = score.confusion_pct(),
                permutation = ?score.permutation,
                "aligned"
            );
            DerOutcome::Scored(DerMetrics::from_score(&score))
        }
        Alignment::NoReferenceSpeech => DerOutcome::NoReferenceSpeech,
    };

    Ok(FileEvaluation {
        outcome,
        detected_speakers: prediction.active_columns(),
        gt_speakers: ground_truth.num_speakers(),
        num_frames: prediction.frames(),
    })
}

/// Cross-file aggregation.
///
/// Only scored files enter the mean; files without reference speech are
/// counted separately so an undefined DER can never drag an average toward
/// zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct Summary {
    scored: usize,
    no_reference: usize,
    der_sum: f64,
    miss_sum: f64,
    fa_sum: f64,
    se_sum: f64,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, evaluation: &FileEvaluation) {
        match evaluation.outcome {
            DerOutcome::Scored(m) => {
                self.scored += 1;
                self.der_sum += m.der;
                self.miss_sum += m.miss;
                self.fa_sum += m.fa;
                self.se_sum += m.se;
            }
            DerOutcome::NoReferenceSpeech => self.no_reference += 1,
        }
    }

    /// Files that produced a defined DER.
    pub fn scored_files(&self) -> usize {
        self.scored
    }

    /// Files skipped because they contain no reference speech.
    pub fn skipped_files(&self) -> usize {
        self.no_reference
    }

    /// Mean metrics over scored files, or `None` when nothing was scored.
    pub fn mean(&self) -> Option<DerMetrics> {
        if self.scored == 0 {
            return None;
        }
        let n = self.scored as f64;
        Some(DerMetrics {
            der: self.der_sum / n,
            miss: self.miss_sum / n,
            fa: self.fa_sum / n,
            se: self.se_sum / n,
        })
    }
}
