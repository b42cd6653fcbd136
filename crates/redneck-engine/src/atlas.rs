//! Texture atlas service
//!
//! The atlas is described by a JSON manifest of frame sequences. A sequence
//! with `frames: 0` is a single quad named exactly `prefix`; otherwise it
//! expands to `prefix01`, `prefix02`, ... Sequences may belong to a group
//! that has to be loaded before its quads can be handed out.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde::Deserialize;

use crate::animation::{Animation, LoopMode, Quad};
use crate::geometry::{Point, Size};
use crate::EngineError;

#[derive(Debug, Clone, Deserialize)]
struct SequenceEntry {
    prefix: String,
    #[serde(default)]
    frames: u32,
    size: [f32; 2],
    /// Defaults to the full size
    real_size: Option<[f32; 2]>,
    /// Defaults to the middle of the frame
    real_center: Option<[f32; 2]>,
    group: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AtlasManifest {
    sequences: Vec<SequenceEntry>,
}

#[derive(Debug)]
struct AtlasEntry {
    quad: Arc<Quad>,
    group: Option<String>,
}

#[derive(Debug, Default)]
pub struct TextureAtlas {
    entries: BTreeMap<String, AtlasEntry>,
    groups: HashMap<String, Vec<String>>,
    loaded: HashSet<String>,
}

impl TextureAtlas {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let manifest: AtlasManifest = serde_json::from_str(json)?;
        let mut atlas = TextureAtlas::default();
        for seq in manifest.sequences {
            let size = Size::new(seq.size[0], seq.size[1]);
            let real_size = seq.real_size.map(|s| Size::new(s[0], s[1])).unwrap_or(size);
            let real_center = seq
                .real_center
                .map(|c| Point::new(c[0], c[1]))
                .unwrap_or(Point::new(size.width / 2.0, size.height / 2.0));

            let names: Vec<String> = if seq.frames == 0 {
                vec![seq.prefix.clone()]
            } else {
                (1..=seq.frames).map(|i| format!("{}{:02}", seq.prefix, i)).collect()
            };
            for name in names {
                if let Some(group) = &seq.group {
                    atlas.groups.entry(group.clone()).or_default().push(name.clone());
                }
                let quad = Arc::new(Quad { name: name.clone(), size, real_size, real_center });
                atlas.entries.insert(name, AtlasEntry { quad, group: seq.group.clone() });
            }
        }
        tracing::debug!(
            "Atlas manifest: {} quads in {} groups",
            atlas.entries.len(),
            atlas.groups.len()
        );
        Ok(atlas)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn load_group(&mut self, group: &str) -> Result<(), EngineError> {
        let Some(names) = self.groups.get(group) else {
            return Err(EngineError::UnknownGroup(group.to_string()));
        };
        if self.loaded.insert(group.to_string()) {
            tracing::debug!("Loaded atlas group '{}' ({} quads)", group, names.len());
        }
        Ok(())
    }

    pub fn unload_group(&mut self, group: &str) -> Result<(), EngineError> {
        if !self.groups.contains_key(group) {
            return Err(EngineError::UnknownGroup(group.to_string()));
        }
        if self.loaded.remove(group) {
            tracing::debug!("Unloaded atlas group '{}'", group);
        }
        Ok(())
    }

    pub fn is_group_loaded(&self, group: &str) -> bool {
        self.loaded.contains(group)
    }

    pub fn textured_quad(&self, name: &str) -> Result<Arc<Quad>, EngineError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| EngineError::UnknownQuad(name.to_string()))?;
        match &entry.group {
            Some(group) if !self.loaded.contains(group) => Err(EngineError::GroupNotLoaded {
                quad: name.to_string(),
                group: group.clone(),
            }),
            _ => Ok(entry.quad.clone()),
        }
    }

    pub fn animation_from_keys<S: AsRef<str>>(
        &self,
        names: &[S],
        mode: LoopMode,
        fps: f32,
    ) -> Result<Animation, EngineError> {
        if names.is_empty() {
            return Err(EngineError::EmptyAnimation);
        }
        let frames = names
            .iter()
            .map(|n| self.textured_quad(n.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Animation::new(frames, mode, fps))
    }

    /// Quad names starting with `prefix`, in name order
    pub fn list_quads(&self, prefix: &str) -> Vec<String> {
        self.entries
            .range(prefix.to_string()..)
            .take_while(|(name, _)| name.starts_with(prefix))
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "sequences": [
            { "prefix": "fire_", "frames": 3, "size": [40, 60], "real_size": [30, 50], "real_center": [20, 25] },
            { "prefix": "finish_line", "size": [480, 64] },
            { "prefix": "background_", "frames": 2, "size": [480, 800], "group": "race" }
        ]
    }"#;

    #[test]
    fn sequences_expand_to_numbered_quads() {
        let atlas = TextureAtlas::from_json(MANIFEST).unwrap();
        assert_eq!(atlas.len(), 6);
        assert_eq!(atlas.list_quads("fire_"), vec!["fire_01", "fire_02", "fire_03"]);
        let q = atlas.textured_quad("fire_02").unwrap();
        assert_eq!(q.real_size, Size::new(30.0, 50.0));
        let line = atlas.textured_quad("finish_line").unwrap();
        assert_eq!(line.real_center, Point::new(240.0, 32.0));
    }

    #[test]
    fn grouped_quads_need_their_group() {
        let mut atlas = TextureAtlas::from_json(MANIFEST).unwrap();
        assert!(matches!(
            atlas.textured_quad("background_01"),
            Err(EngineError::GroupNotLoaded { .. })
        ));
        atlas.load_group("race").unwrap();
        assert!(atlas.textured_quad("background_01").is_ok());
        atlas.unload_group("race").unwrap();
        assert!(!atlas.is_group_loaded("race"));
        assert!(matches!(atlas.load_group("menu"), Err(EngineError::UnknownGroup(_))));
    }

    #[test]
    fn animation_needs_known_frames() {
        let atlas = TextureAtlas::from_json(MANIFEST).unwrap();
        let anim = atlas
            .animation_from_keys(&atlas.list_quads("fire_"), LoopMode::Loop, 10.0)
            .unwrap();
        assert_eq!(anim.frame_count(), 3);
        let empty: [&str; 0] = [];
        assert!(matches!(
            atlas.animation_from_keys(&empty, LoopMode::Loop, 10.0),
            Err(EngineError::EmptyAnimation)
        ));
        assert!(matches!(
            atlas.animation_from_keys(&["fire_09"], LoopMode::Loop, 10.0),
            Err(EngineError::UnknownQuad(_))
        ));
    }

    #[test]
    fn bad_manifest_is_an_error() {
        assert!(matches!(TextureAtlas::from_json("{"), Err(EngineError::Manifest(_))));
    }
}
