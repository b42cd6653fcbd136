//! Frame animations built from atlas quads

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Size};

/// Default playback rate (frames per second)
pub const DEFAULT_ANIMATION_SPEED: f32 = 15.0;

/// A named image region of the texture atlas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub name: String,
    /// Full frame size
    pub size: Size,
    /// Size of the non-transparent area
    pub real_size: Size,
    /// Centre of the non-transparent area, relative to the frame's bottom-left
    pub real_center: Point,
}

impl Quad {
    /// A quad with no transparent padding
    pub fn solid(name: &str, size: Size) -> Self {
        Self {
            name: name.to_string(),
            size,
            real_size: size,
            real_center: Point::new(size.width / 2.0, size.height / 2.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    Loop,
    #[default]
    PlayOnce,
}

#[derive(Debug, Clone)]
pub struct Animation {
    frames: Vec<Arc<Quad>>,
    /// Frames per second
    pub speed: f32,
    mode: LoopMode,
    elapsed: f32,
    current: usize,
    finished: bool,
    pub flip_x: bool,
    pub flip_y: bool,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl Animation {
    /// `frames` must not be empty; the atlas refuses to build empty animations.
    pub fn new(frames: Vec<Arc<Quad>>, mode: LoopMode, speed: f32) -> Self {
        Self {
            frames,
            speed,
            mode,
            elapsed: 0.0,
            current: 0,
            finished: false,
            flip_x: false,
            flip_y: false,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    pub fn update(&mut self, dt: f32) {
        if self.frames.is_empty() {
            return;
        }
        self.elapsed += dt;
        let n = self.frames.len();
        let frame = (self.elapsed * self.speed).floor().max(0.0) as usize;
        match self.mode {
            LoopMode::Loop => self.current = frame % n,
            LoopMode::PlayOnce => {
                if frame >= n {
                    self.finished = true;
                    self.current = n - 1;
                } else {
                    self.current = frame;
                }
            }
        }
    }

    /// Set the loop mode. Playback rewinds only if the animation had finished.
    pub fn reset(&mut self, mode: LoopMode) {
        self.mode = mode;
        if self.finished {
            self.elapsed = 0.0;
            self.current = 0;
            self.finished = false;
        }
    }

    /// Jump to the end, as if it had already played once
    pub fn finish(&mut self) {
        self.mode = LoopMode::PlayOnce;
        self.current = self.frames.len().saturating_sub(1);
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn mode(&self) -> LoopMode {
        self.mode
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn current_quad(&self) -> Option<&Arc<Quad>> {
        self.frames.get(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(n: usize) -> Vec<Arc<Quad>> {
        (0..n)
            .map(|i| Arc::new(Quad::solid(&format!("frame{}", i), Size::new(10.0, 10.0))))
            .collect()
    }

    #[test]
    fn play_once_index_never_decreases() {
        let mut a = Animation::new(frames(5), LoopMode::PlayOnce, 10.0);
        let mut last = 0;
        for _ in 0..40 {
            a.update(0.03);
            assert!(a.current_index() >= last);
            last = a.current_index();
        }
        assert!(a.is_finished());
        assert_eq!(a.current_index(), 4);
    }

    #[test]
    fn play_once_finishes_after_all_frames() {
        let mut a = Animation::new(frames(5), LoopMode::PlayOnce, 5.0);
        a.update(0.5);
        assert_eq!(a.current_index(), 2);
        assert!(!a.is_finished());
        a.update(0.6);
        assert!(a.is_finished());
        assert_eq!(a.current_index(), 4);
    }

    #[test]
    fn looping_wraps_around() {
        let mut a = Animation::new(frames(4), LoopMode::Loop, 10.0);
        a.update(0.45);
        assert_eq!(a.current_index(), 0);
        assert!(!a.is_finished());
    }

    #[test]
    fn reset_rewinds_only_when_finished() {
        let mut a = Animation::new(frames(4), LoopMode::PlayOnce, 10.0);
        a.update(0.2);
        a.reset(LoopMode::PlayOnce);
        assert_eq!(a.current_index(), 2);
        a.update(1.0);
        assert!(a.is_finished());
        a.reset(LoopMode::Loop);
        assert_eq!(a.current_index(), 0);
        assert!(!a.is_finished());
        assert_eq!(a.mode(), LoopMode::Loop);
    }

    #[test]
    fn finish_jumps_to_last_frame() {
        let mut a = Animation::new(frames(3), LoopMode::Loop, 10.0);
        a.finish();
        assert!(a.is_finished());
        assert_eq!(a.current_index(), 2);
    }
}
