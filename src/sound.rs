use std::path::{Path, PathBuf};

use crate::cache::ResourceKey;

/// Default 3D rolloff range, in world units before the distance factor
/// is applied.
pub const DEFAULT_MIN_DISTANCE: f32 = 0.5;
pub const DEFAULT_MAX_DISTANCE: f32 = 5000.0;

/// Spatial playback block for a positional sound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spatial {
    /// World position the sound emits from.
    pub position: [f32; 3],
    /// Distance at which attenuation starts.
    pub min_distance: f32,
    /// Distance beyond which the sound no longer attenuates.
    pub max_distance: f32,
}

impl Default for Spatial {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            min_distance: DEFAULT_MIN_DISTANCE,
            max_distance: DEFAULT_MAX_DISTANCE,
        }
    }
}

/// Describes one loadable sound. A pure input descriptor: the engine never
/// writes playback state back into it, and queries (loaded, playing, length)
/// are answered from the engine's caches.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundInfo {
    key: ResourceKey,
    path: PathBuf,
    looping: bool,
    volume: f32,
    reverb: f32,
    spatial: Option<Spatial>,
}

impl SoundInfo {
    /// Describe a sound file. The identity key defaults to the path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            key: ResourceKey::from(path.as_path()),
            path,
            looping: false,
            volume: 1.0,
            reverb: 0.0,
            spatial: None,
        }
    }

    /// Override the identity key, e.g. to share one file between entries.
    pub fn with_key(mut self, key: impl Into<ResourceKey>) -> Self {
        self.key = key.into();
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Playback volume, amplitude 0.0..=1.0.
    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }

    /// Send amount into the shared reverb bus, 0.0..=1.0.
    pub fn reverb(mut self, reverb: f32) -> Self {
        self.reverb = reverb.clamp(0.0, 1.0);
        self
    }

    /// Mark the sound positional, emitting from `position`.
    pub fn positioned(mut self, position: [f32; 3]) -> Self {
        let spatial = self.spatial.get_or_insert_with(Spatial::default);
        spatial.position = position;
        self
    }

    /// Set the 3D rolloff range. Implies the sound is positional.
    pub fn rolloff(mut self, min_distance: f32, max_distance: f32) -> Self {
        let spatial = self.spatial.get_or_insert_with(Spatial::default);
        spatial.min_distance = min_distance;
        spatial.max_distance = max_distance;
        self
    }

    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn playback_volume(&self) -> f32 {
        self.volume
    }

    pub fn reverb_amount(&self) -> f32 {
        self.reverb
    }

    pub fn spatial(&self) -> Option<&Spatial> {
        self.spatial.as_ref()
    }

    pub fn is_spatial(&self) -> bool {
        self.spatial.is_some()
    }
}
