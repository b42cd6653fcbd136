//! Best race time per track
//!
//! Times are whole seconds. With a backing file the table is JSON and is
//! rewritten on every new record; a missing or unreadable file starts
//! an empty table.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use redneck_common::RaceTrackId;

#[derive(Debug, Default)]
pub struct BestTimes {
    times: BTreeMap<RaceTrackId, u32>,
    path: Option<PathBuf>,
}

impl BestTimes {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Self {
        let times = match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(times) => times,
                Err(e) => {
                    tracing::warn!("Ignoring corrupt best times {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!("Could not read best times {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        tracing::debug!("Loaded {} best times from {}", times.len(), path.display());
        Self { times, path: Some(path.to_path_buf()) }
    }

    pub fn time(&self, track: RaceTrackId) -> Option<u32> {
        self.times.get(&track).copied()
    }

    /// Record `seconds` if it beats the stored time. Returns true for a
    /// new best.
    pub fn report_time(&mut self, track: RaceTrackId, seconds: u32) -> bool {
        if self.time(track).is_some_and(|best| seconds >= best) {
            return false;
        }
        self.times.insert(track, seconds);
        tracing::info!("New best time on {}: {}s", track.display_name(), seconds);
        self.save();
        true
    }

    fn save(&self) {
        let Some(path) = &self.path else {
            return;
        };
        let result = serde_json::to_string_pretty(&self.times)
            .map_err(std::io::Error::other)
            .and_then(|json| std::fs::write(path, json));
        if let Err(e) = result {
            tracing::warn!("Could not save best times to {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_faster_times_count() {
        let mut bt = BestTimes::in_memory();
        assert_eq!(bt.time(RaceTrackId::Uhmurkin), None);
        assert!(bt.report_time(RaceTrackId::Uhmurkin, 60));
        assert!(!bt.report_time(RaceTrackId::Uhmurkin, 60));
        assert!(!bt.report_time(RaceTrackId::Uhmurkin, 75));
        assert!(bt.report_time(RaceTrackId::Uhmurkin, 59));
        assert_eq!(bt.time(RaceTrackId::Uhmurkin), Some(59));
        assert_eq!(bt.time(RaceTrackId::RealBammer), None);
    }

    #[test]
    fn records_survive_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best_times.json");
        let mut bt = BestTimes::load(&path);
        bt.report_time(RaceTrackId::Wijadidja, 42);
        drop(bt);

        let bt = BestTimes::load(&path);
        assert_eq!(bt.time(RaceTrackId::Wijadidja), Some(42));
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best_times.json");
        std::fs::write(&path, "not json").unwrap();
        let bt = BestTimes::load(&path);
        assert_eq!(bt.time(RaceTrackId::YankeeShot), None);
    }
}
