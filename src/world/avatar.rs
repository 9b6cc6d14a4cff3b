//! Avatar keyframe animation state machine
//!
//! An avatar owns a sprite sheet and a set of named keyframes. Each
//! keyframe is an ordered list of (sheet frame, hold duration) pairs,
//! optionally looping. The machine is driven by `animate` on the owning
//! entity's think tick, independent of the render rate.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::warn;

use super::direction::{Action, Direction};

/// One (sheet frame, hold duration) pair of a keyframe sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePair {
    pub frame: u32,
    pub delay_ms: u64,
}

impl FramePair {
    pub fn new(frame: u32, delay_ms: u64) -> Self {
        Self { frame, delay_ms }
    }
}

/// A named animation clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyframe {
    pub looped: bool,
    pub frames: Vec<FramePair>,
}

impl Keyframe {
    pub fn new(looped: bool, frames: Vec<FramePair>) -> Self {
        Self { looped, frames }
    }
}

/// Everything needed to give an entity a look: sheet geometry plus the
/// keyframe clips cut from it.
#[derive(Debug, Clone)]
pub struct AvatarMetadata {
    /// Width of one sprite cell, px
    pub width: u32,
    /// Height of one sprite cell, px
    pub height: u32,
    /// Total sheet width, px; determines frames per row
    pub sheet_width: u32,
    /// Resource handle of the sheet image (loaded by the asset collaborator)
    pub image: String,
    pub keyframes: HashMap<String, Keyframe>,
}

impl AvatarMetadata {
    /// Built-in fallback look used when an entity's own metadata is bad:
    /// two-frame looping clips for every action and cardinal facing.
    pub fn default_look() -> Self {
        let mut keyframes = HashMap::new();
        let actions = [Action::Idle, Action::Move, Action::Sit, Action::Jump];
        let facings = [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
        ];
        let mut row = 0u32;
        for action in actions {
            for facing in facings {
                let base = row * 2;
                keyframes.insert(
                    keyframe_name(action, facing),
                    Keyframe::new(
                        true,
                        vec![FramePair::new(base, 400), FramePair::new(base + 1, 400)],
                    ),
                );
                row += 1;
            }
        }
        Self {
            width: 32,
            height: 64,
            sheet_width: 64,
            image: "default_avatar".to_string(),
            keyframes,
        }
    }
}

/// Source clip rectangle into the sprite sheet, px.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClipRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Keyframe name for an action and facing, e.g. `move_west`.
pub fn keyframe_name(action: Action, direction: Direction) -> String {
    format!("{}_{}", action, direction.facing())
}

/// Animation state for one actor's sprite.
///
/// `index` is the current pair index into the active keyframe; advancing
/// past the end either wraps to 0 (looping or forced) or stays on the last
/// pair, freezing on the final frame.
#[derive(Debug, Clone)]
pub struct Avatar {
    metadata: AvatarMetadata,
    current: String,
    index: usize,
    frame: u32,
    delay: Duration,
    next_change: Instant,
    clip: ClipRect,
}

impl Avatar {
    pub fn new(metadata: AvatarMetadata, now: Instant) -> Self {
        let clip = ClipRect {
            x: 0,
            y: 0,
            width: metadata.width,
            height: metadata.height,
        };
        Self {
            metadata,
            current: String::new(),
            index: 0,
            frame: 0,
            delay: Duration::ZERO,
            next_change: now,
            clip,
        }
    }

    pub fn width(&self) -> u32 {
        self.metadata.width
    }

    pub fn height(&self) -> u32 {
        self.metadata.height
    }

    pub fn image(&self) -> &str {
        &self.metadata.image
    }

    /// Active keyframe name, empty before the first `set_keyframe`.
    pub fn current_keyframe(&self) -> &str {
        &self.current
    }

    /// Sheet frame currently displayed.
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Source rectangle for the displayed frame; the renderer reads this.
    pub fn clip(&self) -> ClipRect {
        self.clip
    }

    /// Switch to a named keyframe. Already-active or unknown names are
    /// no-ops; unknown names are reported but must not stop playback.
    pub fn set_keyframe(&mut self, key: &str, now: Instant) {
        if self.current == key {
            return;
        }
        if !self.metadata.keyframes.contains_key(key) {
            warn!("unknown keyframe '{}', keeping '{}'", key, self.current);
            return;
        }
        self.current = key.to_string();
        self.index = 0;
        self.frame = 0;
        self.delay = Duration::ZERO;
        self.next_change = now;
        self.next_frame(false, now);
    }

    /// Display the pair at the current index and schedule the next change.
    ///
    /// At the end of a non-looping clip the index stays put, freezing on
    /// the last frame unless `force_loop` is set.
    pub fn next_frame(&mut self, force_loop: bool, now: Instant) {
        let Some(keyframe) = self.metadata.keyframes.get(&self.current) else {
            return;
        };
        let Some(pair) = keyframe.frames.get(self.index) else {
            return;
        };
        self.frame = pair.frame;
        self.delay = Duration::from_millis(pair.delay_ms);
        self.next_change = now + self.delay;

        if self.index + 1 >= keyframe.frames.len() {
            if keyframe.looped || force_loop {
                self.index = 0;
            }
        } else {
            self.index += 1;
        }

        self.recompute_clip();
    }

    /// Advance past every frame whose hold has elapsed by `now`.
    pub fn animate(&mut self, now: Instant) {
        if self.current.is_empty() {
            return;
        }
        while now >= self.next_change {
            self.next_frame(false, self.next_change);
            // A zero hold would spin forever; show it once and move on.
            if self.delay.is_zero() {
                self.next_change = now + Duration::from_millis(1);
                break;
            }
        }
    }

    fn recompute_clip(&mut self) {
        let per_row = (self.metadata.sheet_width / self.metadata.width.max(1)).max(1);
        self.clip = ClipRect {
            x: (self.frame % per_row) * self.metadata.width,
            y: (self.frame / per_row) * self.metadata.height,
            width: self.metadata.width,
            height: self.metadata.height,
        };
    }
}
