//! Frame grids: rasterizing interval segments and thresholding
//! probability matrices onto a common frames x speakers lattice.

use std::collections::BTreeSet;

use dermeter_rttm::Segment;

use crate::{EvalError, Result};

/// Assignment of ground-truth speaker labels to grid slots.
///
/// Labels are taken in sorted order; the grid has as many columns as the
/// prediction array has speaker slots, so labels beyond the capacity-th
/// receive no slot and their segments never reach the grid. That bound is
/// part of the scoring contract, not an error, but the dropped labels stay
/// observable through [`SpeakerMap::truncated`].
#[derive(Debug, Clone)]
pub struct SpeakerMap {
    capacity: usize,
    slots: Vec<String>,
    truncated: Vec<String>,
}

impl SpeakerMap {
    /// Build the slot assignment for `capacity` grid columns.
    pub fn new(segments: &[Segment], capacity: usize) -> Self {
        let labels: BTreeSet<&str> = segments.iter().map(|s| s.speaker.as_str()).collect();

        let mut slots = Vec::new();
        let mut truncated = Vec::new();
        for (idx, label) in labels.into_iter().enumerate() {
            if idx < capacity {
                slots.push(label.to_string());
            } else {
                truncated.push(label.to_string());
            }
        }

        if !truncated.is_empty() {
            tracing::warn!(
                capacity,
                dropped = ?truncated,
                "ground truth has more speakers than prediction slots; excess labels are not scored"
            );
        }

        Self {
            capacity,
            slots,
            truncated,
        }
    }

    /// Slot index for a label, if it received one.
    pub fn slot(&self, label: &str) -> Option<usize> {
        self.slots.iter().position(|l| l == label)
    }

    /// Number of grid columns (the prediction array's speaker dimension).
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Labels that received a slot, in slot order.
    pub fn labels(&self) -> &[String] {
        &self.slots
    }

    /// Labels that did not fit into the available slots, in sorted order.
    pub fn truncated(&self) -> &[String] {
        &self.truncated
    }
}

/// Binary speaker-activity matrix, row-major over frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameGrid {
    frames: usize,
    speakers: usize,
    cells: Vec<bool>,
}

impl FrameGrid {
    /// All-inactive grid.
    pub fn zeros(frames: usize, speakers: usize) -> Self {
        Self {
            frames,
            speakers,
            cells: vec![false; frames * speakers],
        }
    }

    /// Rasterize interval segments onto a grid of `num_frames` frames.
    ///
    /// Frame indices are the truncated quotient of time by `frame_shift`,
    /// clipped to `[0, num_frames]`; a segment covers `[start_frame,
    /// end_frame)`. Re-marking an active cell is a no-op, so overlapping
    /// turns of one speaker and simultaneous speech across speakers are
    /// both representable.
    pub fn from_segments(
        segments: &[Segment],
        map: &SpeakerMap,
        num_frames: usize,
        frame_shift: f64,
    ) -> Self {
        let mut grid = Self::zeros(num_frames, map.capacity());
        for seg in segments {
            let Some(slot) = map.slot(&seg.speaker) else {
                continue;
            };
            let start = clip_frame(seg.start, frame_shift, num_frames);
            let end = clip_frame(seg.end, frame_shift, num_frames);
            for frame in start..end {
                grid.set(frame, slot);
            }
        }
        grid
    }

    /// Threshold a row-major `[frames x speakers]` probability matrix.
    ///
    /// A cell is active only when its probability strictly exceeds the
    /// threshold.
    pub fn from_probabilities(probs: &[f32], speakers: usize, threshold: f32) -> Result<Self> {
        if speakers == 0 || probs.len() % speakers != 0 {
            return Err(EvalError::BadMatrixShape {
                len: probs.len(),
                speakers,
            });
        }
        Ok(Self {
            frames: probs.len() / speakers,
            speakers,
            cells: probs.iter().map(|&p| p > threshold).collect(),
        })
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn speakers(&self) -> usize {
        self.speakers
    }

    pub fn get(&self, frame: usize, speaker: usize) -> bool {
        self.cells[frame * self.speakers + speaker]
    }

    pub fn set(&mut self, frame: usize, speaker: usize) {
        self.cells[frame * self.speakers + speaker] = true;
    }

    /// True when any speaker is active in `frame`.
    pub fn any_active(&self, frame: usize) -> bool {
        self.cells[frame * self.speakers..(frame + 1) * self.speakers]
            .iter()
            .any(|&c| c)
    }

    /// Number of columns active in at least one frame.
    pub fn active_columns(&self) -> usize {
        (0..self.speakers)
            .filter(|&k| (0..self.frames).any(|f| self.get(f, k)))
            .count()
    }
}

/// Seconds to frame index, truncated and clipped to `[0, num_frames]`.
fn clip_frame(seconds: f64, frame_shift: f64, num_frames: usize) -> usize {
    let frame = (seconds / frame_shift) as i64;
    frame.clamp(0, num_frames as i64) as usize
}
