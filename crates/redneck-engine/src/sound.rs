//! Audio service seam
//!
//! Gameplay code only triggers sounds; mixing belongs to the platform layer.
//! [`SilentSound`] is the headless stand-in and keeps enough state for
//! tests to check what was played.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

pub trait Sound: fmt::Debug {
    fn name(&self) -> &str;
    fn play(&self);
    fn stop(&self);
    fn set_gain(&self, gain: f32);
}

pub type SoundHandle = Arc<dyn Sound>;

#[derive(Debug)]
pub struct SilentSound {
    name: String,
    playing: AtomicBool,
    plays: AtomicU32,
    /// Gain in thousandths
    gain_milli: AtomicU32,
}

impl SilentSound {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            playing: AtomicBool::new(false),
            plays: AtomicU32::new(0),
            gain_milli: AtomicU32::new(1000),
        }
    }

    pub fn play_count(&self) -> u32 {
        self.plays.load(Ordering::Relaxed)
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    pub fn gain(&self) -> f32 {
        self.gain_milli.load(Ordering::Relaxed) as f32 / 1000.0
    }
}

impl Sound for SilentSound {
    fn name(&self) -> &str {
        &self.name
    }

    fn play(&self) {
        tracing::trace!("play sound '{}'", self.name);
        self.plays.fetch_add(1, Ordering::Relaxed);
        self.playing.store(true, Ordering::Relaxed);
    }

    fn stop(&self) {
        self.playing.store(false, Ordering::Relaxed);
    }

    fn set_gain(&self, gain: f32) {
        self.gain_milli
            .store((gain.clamp(0.0, 1.0) * 1000.0).round() as u32, Ordering::Relaxed);
    }
}

/// Named sounds available to a scene
#[derive(Debug, Default)]
pub struct SoundBank {
    sounds: HashMap<String, SoundHandle>,
    silent: HashMap<String, Arc<SilentSound>>,
}

impl SoundBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bank where every name maps to a [`SilentSound`]
    pub fn silent<S: AsRef<str>>(names: &[S]) -> Self {
        let mut bank = Self::new();
        for name in names {
            let sound = Arc::new(SilentSound::new(name.as_ref()));
            bank.silent.insert(name.as_ref().to_string(), sound.clone());
            bank.sounds.insert(name.as_ref().to_string(), sound);
        }
        bank
    }

    pub fn register(&mut self, sound: SoundHandle) {
        self.sounds.insert(sound.name().to_string(), sound);
    }

    pub fn get(&self, name: &str) -> Option<SoundHandle> {
        let found = self.sounds.get(name).cloned();
        if found.is_none() {
            tracing::warn!("Sound '{}' not in bank", name);
        }
        found
    }

    /// Inspect a silent sound (headless runs and tests)
    pub fn silent_sound(&self, name: &str) -> Option<&Arc<SilentSound>> {
        self.silent.get(name)
    }

    pub fn stop_all(&self) {
        for sound in self.sounds.values() {
            sound.stop();
        }
    }

    pub fn set_gain_all(&self, gain: f32) {
        for sound in self.sounds.values() {
            sound.set_gain(gain);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_sound_counts_plays() {
        let bank = SoundBank::silent(&["shotgun", "ping"]);
        let shot = bank.get("shotgun").unwrap();
        shot.play();
        shot.play();
        let shotgun = bank.silent_sound("shotgun").unwrap();
        assert_eq!(shotgun.play_count(), 2);
        assert!(shotgun.is_playing());
        bank.stop_all();
        assert!(!shotgun.is_playing());
        assert!(bank.get("banjo").is_none());
    }

    #[test]
    fn gain_is_clamped() {
        let s = SilentSound::new("x");
        s.set_gain(3.0);
        assert!((s.gain() - 1.0).abs() < 0.001);
        s.set_gain(0.25);
        assert!((s.gain() - 0.25).abs() < 0.001);
    }
}
