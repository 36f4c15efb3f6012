//! Frame-level Diarization Error Rate (DER) scoring.
//!
//! Rasterizes ground-truth segments and per-frame speaker-activity
//! probabilities onto a common frame grid, then searches speaker-column
//! permutations for the assignment that minimizes miss, false alarm, and
//! speaker confusion.

mod align;
mod grid;
mod metrics;

pub use align::{align, Alignment, ErrorCounts, Score};
pub use grid::{FrameGrid, SpeakerMap};
pub use metrics::{evaluate, DerMetrics, DerOutcome, FileEvaluation, Summary};

/// Seconds of audio covered by one prediction frame in the reference
/// streaming configuration (80 ms).
pub const DEFAULT_FRAME_SHIFT: f64 = 0.08;

/// Default speaker-activity threshold.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Evaluation parameters, passed explicitly through the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct EvalConfig {
    /// Seconds per frame of the prediction matrix. Must be positive.
    pub frame_shift: f64,
    /// Activity threshold; a probability must exceed it strictly to count
    /// as speech.
    pub threshold: f32,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            frame_shift: DEFAULT_FRAME_SHIFT,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("probability matrix of length {len} does not factor into {speakers} speaker columns")]
    BadMatrixShape { len: usize, speakers: usize },
    #[error("grid shape mismatch: reference {ref_frames}x{ref_speakers}, prediction {pred_frames}x{pred_speakers}")]
    GridMismatch {
        ref_frames: usize,
        ref_speakers: usize,
        pred_frames: usize,
        pred_speakers: usize,
    },
    #[error("frame shift must be positive, got {0}")]
    BadFrameShift(f64),
}

pub type Result<T> = std::result::Result<T, EvalError>;
