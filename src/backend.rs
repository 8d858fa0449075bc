use std::path::Path;
use std::time::Duration;

use anyhow::Result;

use crate::listener::ListenerTransform;

/// Handle for a loaded sound resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundId(pub u64);

/// Handle for an active playback channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u64);

/// Load-time settings baked into a sound resource: loop mode, reverb
/// routing, and the 3D rolloff range (already distance-factor scaled).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundSettings {
    pub looping: bool,
    /// Send amount into the reverb bus; zero keeps the sound dry.
    pub reverb: f32,
    pub spatial: Option<SpatialSettings>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialSettings {
    pub min_distance: f32,
    pub max_distance: f32,
}

/// Abstraction over the wrapped audio middleware.
/// Implementations: [`KiraDriver`](crate::KiraDriver) (production),
/// `MockBackend` (testing).
///
/// Channels returned by [`play`](AudioBackend::play) start paused so the
/// caller can position them and set volume before audio renders; call
/// [`resume`](AudioBackend::resume) to start playback. Channel setters on an
/// already-finished channel are no-ops, mirroring how the middleware treats
/// handles to stolen voices.
pub trait AudioBackend {
    /// Per-tick service hook; drives housekeeping such as reaping finished
    /// channels.
    fn update(&mut self) -> Result<()>;

    fn load_sound(&mut self, path: &Path, settings: &SoundSettings) -> Result<SoundId>;

    /// Release a loaded sound and its decoded data.
    fn release_sound(&mut self, id: SoundId) -> Result<()>;

    /// Decoded length of a loaded sound, if known.
    fn sound_duration(&self, id: SoundId) -> Option<Duration>;

    /// Create a paused channel playing `id`.
    fn play(&mut self, id: SoundId) -> Result<ChannelId>;

    fn resume(&mut self, channel: ChannelId) -> Result<()>;

    fn stop(&mut self, channel: ChannelId) -> Result<()>;

    fn is_playing(&self, channel: ChannelId) -> bool;

    /// Set channel volume (amplitude, 0.0..=1.0) immediately.
    fn set_volume(&mut self, channel: ChannelId, volume: f32) -> Result<()>;

    /// Set the playback rate multiplier (1.0 = unchanged).
    fn set_playback_rate(&mut self, channel: ChannelId, rate: f64) -> Result<()>;

    /// Move a positional channel.
    fn set_position(&mut self, channel: ChannelId, position: [f32; 3]) -> Result<()>;

    /// Current DSP clock of the channel, in samples.
    fn clock_samples(&self, channel: ChannelId) -> Result<u64>;

    /// Add a volume automation point at an absolute sample timestamp.
    /// Consecutive points describe a linear ramp between them.
    fn add_fade_point(&mut self, channel: ChannelId, at_sample: u64, volume: f32) -> Result<()>;

    fn set_listener(&mut self, transform: &ListenerTransform) -> Result<()>;

    /// Mute or unmute the master output group.
    fn set_master_mute(&mut self, muted: bool) -> Result<()>;

    /// Stop all playback and release every resource.
    fn dispose(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_equality() {
        assert_eq!(SoundId(1), SoundId(1));
        assert_ne!(SoundId(1), SoundId(2));
        assert_ne!(ChannelId(3), ChannelId(4));
    }
}
