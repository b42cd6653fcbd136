//! Common types shared across the Redneck Racer crates
//!
//! Track identifiers, persisted player settings and the application config
//! loaded from TOML.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Errors raised while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("unknown race track '{0}'")]
    UnknownTrack(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Playable race tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RaceTrackId {
    YankeeShot,
    Everwhichaways,
    Uhmurkin,
    DadgumTrakturs,
    RealBammer,
    Wijadidja,
}

impl RaceTrackId {
    /// Get the display name for this track
    pub fn display_name(&self) -> &str {
        match self {
            RaceTrackId::YankeeShot => "Yankee Shot",
            RaceTrackId::Everwhichaways => "Everwhichaways",
            RaceTrackId::Uhmurkin => "Uhmurkin",
            RaceTrackId::DadgumTrakturs => "Dadgum Trakturs",
            RaceTrackId::RealBammer => "Real Bammer",
            RaceTrackId::Wijadidja => "Wijadidja",
        }
    }

    /// Short identifier used in config files and on the command line
    pub fn key(&self) -> &str {
        match self {
            RaceTrackId::YankeeShot => "yankee-shot",
            RaceTrackId::Everwhichaways => "everwhichaways",
            RaceTrackId::Uhmurkin => "uhmurkin",
            RaceTrackId::DadgumTrakturs => "dadgum-trakturs",
            RaceTrackId::RealBammer => "real-bammer",
            RaceTrackId::Wijadidja => "wijadidja",
        }
    }

    /// Get all tracks in menu order
    pub fn all() -> Vec<RaceTrackId> {
        vec![
            RaceTrackId::YankeeShot,
            RaceTrackId::Everwhichaways,
            RaceTrackId::Uhmurkin,
            RaceTrackId::DadgumTrakturs,
            RaceTrackId::RealBammer,
            RaceTrackId::Wijadidja,
        ]
    }
}

impl FromStr for RaceTrackId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace([' ', '_'], "-");
        RaceTrackId::all()
            .into_iter()
            .find(|t| t.key() == wanted)
            .ok_or_else(|| ConfigError::UnknownTrack(s.to_string()))
    }
}

/// Player settings persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Selected control scheme (0 = tilt, 1 = touch, 2 = keys)
    pub control_scheme: u32,
    /// Invert tilt steering
    pub invert_controls: bool,
    /// Key code steering left
    pub left_key: i32,
    /// Key code steering right
    pub right_key: i32,
    pub music_enabled: bool,
    pub sfx_enabled: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            control_scheme: 0,
            invert_controls: false,
            left_key: 21,
            right_key: 22,
            music_enabled: true,
            sfx_enabled: true,
        }
    }
}

/// Application-wide configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub track: RaceTrackId,
    /// Fixed RNG seed, random when absent
    pub seed: Option<u64>,
    pub frame_rate: u32,
    /// A race is abandoned after this many simulated seconds
    pub max_race_seconds: f32,
    /// Number of races to run back to back
    pub races: u32,
    /// Nitro boost is wired but disabled in the shipped game
    pub nitro_enabled: bool,
    /// Where the "already asked for a rating" flag is kept
    pub feedback_file: Option<PathBuf>,
    /// Per-track best race times; kept in memory only when absent
    pub best_times_file: Option<PathBuf>,
    pub settings: GameSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            track: RaceTrackId::YankeeShot,
            seed: None,
            frame_rate: 30,
            max_race_seconds: 180.0,
            races: 1,
            nitro_enabled: false,
            feedback_file: None,
            best_times_file: None,
            settings: GameSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load config from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!("Config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Frame interval in seconds
    pub fn frame_interval(&self) -> f32 {
        1.0 / self.frame_rate.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_display_names() {
        assert_eq!(RaceTrackId::DadgumTrakturs.display_name(), "Dadgum Trakturs");
        assert_eq!(RaceTrackId::all().len(), 6);
    }

    #[test]
    fn test_track_from_str() {
        assert_eq!("Real Bammer".parse::<RaceTrackId>().unwrap(), RaceTrackId::RealBammer);
        assert_eq!("yankee_shot".parse::<RaceTrackId>().unwrap(), RaceTrackId::YankeeShot);
        assert!("moon".parse::<RaceTrackId>().is_err());
    }

    #[test]
    fn settings_round_trip_through_toml() {
        let settings = GameSettings {
            control_scheme: 2,
            invert_controls: true,
            left_key: 29,
            right_key: 32,
            music_enabled: false,
            sfx_enabled: true,
        };
        let text = toml::to_string(&settings).unwrap();
        let back: GameSettings = toml::from_str(&text).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg = AppConfig::from_toml("track = \"uhmurkin\"\nseed = 7\n").unwrap();
        assert_eq!(cfg.track, RaceTrackId::Uhmurkin);
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.frame_rate, 30);
        assert!(!cfg.nitro_enabled);
        assert!(cfg.settings.sfx_enabled);
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg.track, RaceTrackId::YankeeShot);
    }

    #[test]
    fn broken_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("racer.toml");
        std::fs::write(&path, "frame_rate = \"fast\"").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn frame_interval_never_divides_by_zero() {
        let cfg = AppConfig { frame_rate: 0, ..AppConfig::default() };
        assert!((cfg.frame_interval() - 1.0).abs() < 0.001);
    }
}
