//! Everything a race needs from the rest of the game

use redneck_common::AppConfig;

use crate::best_times::BestTimes;
use crate::feedback::{FeedbackStore, FileFeedbackStore, MemoryFeedbackStore};
use crate::library::GameLibrary;
use crate::Result;

#[derive(Debug)]
pub struct GameContext {
    pub library: GameLibrary,
    pub best_times: BestTimes,
    pub feedback: Box<dyn FeedbackStore>,
    pub config: AppConfig,
}

impl GameContext {
    pub fn new(config: AppConfig) -> Result<Self> {
        let library = GameLibrary::load_for_race()?;
        let best_times = match &config.best_times_file {
            Some(path) => BestTimes::load(path),
            None => BestTimes::in_memory(),
        };
        let feedback: Box<dyn FeedbackStore> = match &config.feedback_file {
            Some(path) => Box::new(FileFeedbackStore::open(path)),
            None => Box::new(MemoryFeedbackStore::new()),
        };
        let context = Self { library, best_times, feedback, config };
        context.apply_sound_settings();
        Ok(context)
    }

    /// Mute or unmute according to the player settings. Music goes last
    /// because the effect gain also reaches the music track.
    pub fn apply_sound_settings(&self) {
        let settings = &self.config.settings;
        self.library.set_sfx_gain(if settings.sfx_enabled { 1.0 } else { 0.0 });
        self.library.set_music_gain(if settings.music_enabled { 1.0 } else { 0.0 });
        tracing::debug!("Sound: music {}, effects {}", settings.music_enabled, settings.sfx_enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{SOUND_MUSIC, SOUND_SHOTGUN};

    #[test]
    fn muted_effects_keep_music_playing() {
        let mut config = AppConfig::default();
        config.settings.sfx_enabled = false;
        let ctx = GameContext::new(config).unwrap();
        let sounds = ctx.library.sounds();
        assert_eq!(sounds.silent_sound(SOUND_SHOTGUN).unwrap().gain(), 0.0);
        assert_eq!(sounds.silent_sound(SOUND_MUSIC).unwrap().gain(), 1.0);
        assert!(!ctx.feedback.has_answered());
    }
}
