//! Frame-timing semantics for entity animation descriptors.
//!
//! Rendering adapters decode sprite sheets themselves; the simulation only
//! tracks which frame of a named animation is current, advancing on the same
//! fixed ticks that drive entity updates.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Pixel rectangle a frame occupies inside its (externally decoded) sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRect {
    /// Left edge of the frame in sheet pixels.
    pub x: u32,
    /// Top edge of the frame in sheet pixels.
    pub y: u32,
    /// Width of the frame in sheet pixels.
    pub width: u32,
    /// Height of the frame in sheet pixels.
    pub height: u32,
}

/// One frame of an animation: where it lives and how long it shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnimationFrame {
    /// Source rectangle of the frame.
    pub rect: FrameRect,
    /// Display duration of the frame in milliseconds.
    pub duration_ms: u32,
}

/// Looping playback cursor over a frame sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationTimeline {
    frames: Vec<AnimationFrame>,
    current: usize,
    elapsed_ms: u64,
}

impl AnimationTimeline {
    /// Creates a timeline over the provided frames, starting at frame zero.
    #[must_use]
    pub fn new(frames: Vec<AnimationFrame>) -> Self {
        Self {
            frames,
            current: 0,
            elapsed_ms: 0,
        }
    }

    /// Index of the frame currently displayed.
    #[must_use]
    pub const fn current_frame(&self) -> usize {
        self.current
    }

    /// Frame descriptor currently displayed, if the timeline has frames.
    #[must_use]
    pub fn frame(&self) -> Option<&AnimationFrame> {
        self.frames.get(self.current)
    }

    /// Advances playback by the elapsed duration, looping at the end.
    pub fn advance(&mut self, dt: Duration) {
        if self.frames.is_empty() {
            return;
        }

        self.elapsed_ms = self.elapsed_ms.saturating_add(dt.as_millis() as u64);
        loop {
            let duration = u64::from(self.frames[self.current].duration_ms.max(1));
            if self.elapsed_ms < duration {
                break;
            }
            self.elapsed_ms -= duration;
            self.current = (self.current + 1) % self.frames.len();
        }
    }

    /// Resets playback to the first frame.
    pub fn reset(&mut self) {
        self.current = 0;
        self.elapsed_ms = 0;
    }
}

/// Named frame sequences, keyed by animation tag ("walk", "die", ...).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationSet {
    sequences: HashMap<String, Vec<AnimationFrame>>,
}

impl AnimationSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the frame sequence for a tag, replacing any previous one.
    pub fn insert(&mut self, tag: &str, frames: Vec<AnimationFrame>) {
        let _ = self.sequences.insert(tag.to_owned(), frames);
    }

    /// Frames registered under a tag.
    #[must_use]
    pub fn frames(&self, tag: &str) -> Option<&[AnimationFrame]> {
        self.sequences.get(tag).map(Vec::as_slice)
    }

    /// Starts a fresh timeline over the sequence registered under a tag.
    #[must_use]
    pub fn timeline(&self, tag: &str) -> Option<AnimationTimeline> {
        self.sequences
            .get(tag)
            .map(|frames| AnimationTimeline::new(frames.clone()))
    }
}
