use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Result, anyhow};
use glam::Vec3;
use kira::StartTime;
use kira::clock::{ClockHandle, ClockSpeed, ClockTime};
use kira::manager::backend::DefaultBackend;
use kira::manager::{AudioManager, AudioManagerSettings};
use kira::sound::PlaybackState;
use kira::sound::static_sound::{StaticSoundData, StaticSoundHandle};
use kira::spatial::emitter::{EmitterDistances, EmitterHandle, EmitterSettings};
use kira::spatial::listener::{ListenerHandle, ListenerSettings};
use kira::spatial::scene::{SpatialSceneHandle, SpatialSceneSettings};
use kira::effect::reverb::ReverbBuilder;
use kira::track::{TrackBuilder, TrackHandle, TrackRoutes};
use kira::tween::{Easing, Tween};
use log::debug;

use crate::backend::{AudioBackend, ChannelId, SoundId, SoundSettings};
use crate::config::AudioConfig;
use crate::listener::ListenerTransform;

/// An immediate parameter change.
fn instant() -> Tween {
    Tween {
        duration: Duration::ZERO,
        ..Default::default()
    }
}

struct LoadedSound {
    data: StaticSoundData,
    settings: SoundSettings,
}

struct Playback {
    handle: StaticSoundHandle,
    /// Present only for positional channels.
    emitter: Option<EmitterHandle>,
    /// Fade points arrive one at a time; the first of a pair is held here
    /// until its partner fixes the ramp endpoint.
    pending_fade: Option<(u64, f32)>,
}

/// Audio backend backed by kira.
///
/// The DSP clock is a kira clock ticking at the configured sample rate, all
/// 2D channels route through a private master track (which implements the
/// mute switch), sounds with a reverb send route through a reverb bus, and
/// positional channels play through per-channel emitters in a spatial scene.
pub struct KiraDriver {
    manager: AudioManager,
    clock: ClockHandle,
    master: TrackHandle,
    reverb: TrackHandle,
    scene: SpatialSceneHandle,
    listener: ListenerHandle,
    sounds: HashMap<u64, LoadedSound>,
    channels: HashMap<u64, Playback>,
    sample_rate: u32,
    next_sound_id: u64,
    next_channel_id: u64,
}

impl KiraDriver {
    /// Start the middleware and build the fixed routing: master track,
    /// reverb bus, spatial scene with one listener, and the DSP clock.
    pub fn new(config: &AudioConfig) -> Result<Self> {
        let mut manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())
            .map_err(|e| anyhow!("failed to start audio manager: {e}"))?;

        let mut clock = manager
            .add_clock(ClockSpeed::TicksPerSecond(f64::from(config.sample_rate)))
            .map_err(|e| anyhow!("failed to create DSP clock: {e}"))?;
        clock.start();

        let master = manager
            .add_sub_track(TrackBuilder::new())
            .map_err(|e| anyhow!("failed to create master track: {e}"))?;
        let reverb = manager
            .add_sub_track(
                TrackBuilder::new()
                    .routes(TrackRoutes::parent(&master))
                    .with_effect(ReverbBuilder::new().mix(config.reverb_mix)),
            )
            .map_err(|e| anyhow!("failed to create reverb bus: {e}"))?;

        let mut scene = manager
            .add_spatial_scene(SpatialSceneSettings::default())
            .map_err(|e| anyhow!("failed to create spatial scene: {e}"))?;
        let transform = ListenerTransform::default();
        let listener = scene
            .add_listener(
                Vec3::from_array(transform.position),
                transform.orientation(),
                ListenerSettings::default(),
            )
            .map_err(|e| anyhow!("failed to create listener: {e}"))?;

        Ok(Self {
            manager,
            clock,
            master,
            reverb,
            scene,
            listener,
            sounds: HashMap::new(),
            channels: HashMap::new(),
            sample_rate: config.sample_rate,
            next_sound_id: 1,
            next_channel_id: 1,
        })
    }

    fn alloc_sound_id(&mut self) -> u64 {
        let id = self.next_sound_id;
        self.next_sound_id += 1;
        id
    }

    fn alloc_channel_id(&mut self) -> u64 {
        let id = self.next_channel_id;
        self.next_channel_id += 1;
        id
    }
}

/// Ramp length between two sample timestamps.
fn fade_duration(from_sample: u64, to_sample: u64, sample_rate: u32) -> Duration {
    Duration::from_secs_f64((to_sample.saturating_sub(from_sample)) as f64 / f64::from(sample_rate))
}

impl AudioBackend for KiraDriver {
    fn update(&mut self) -> Result<()> {
        // Reap channels the middleware has finished with; dropping the
        // emitter alongside frees its spot in the scene.
        self.channels
            .retain(|_, playback| playback.handle.state() != PlaybackState::Stopped);
        Ok(())
    }

    fn load_sound(&mut self, path: &Path, settings: &SoundSettings) -> Result<SoundId> {
        let data = StaticSoundData::from_file(path)
            .map_err(|e| anyhow!("failed to load sound {}: {e}", path.display()))?;
        let id = self.alloc_sound_id();
        self.sounds.insert(
            id,
            LoadedSound {
                data,
                settings: *settings,
            },
        );
        Ok(SoundId(id))
    }

    fn release_sound(&mut self, id: SoundId) -> Result<()> {
        if self.sounds.remove(&id.0).is_none() {
            debug!("release of unknown sound {id:?}");
        }
        Ok(())
    }

    fn sound_duration(&self, id: SoundId) -> Option<Duration> {
        self.sounds.get(&id.0).map(|loaded| loaded.data.duration())
    }

    fn play(&mut self, id: SoundId) -> Result<ChannelId> {
        let loaded = self
            .sounds
            .get(&id.0)
            .ok_or_else(|| anyhow!("sound not found: {id:?}"))?;
        let mut data = loaded.data.clone();
        if loaded.settings.looping {
            data = data.loop_region(0.0..);
        }

        // Positional channels play through an emitter; the reverb send only
        // applies to 2D sounds.
        let emitter = match loaded.settings.spatial {
            Some(spatial) => {
                let emitter = self
                    .scene
                    .add_emitter(
                        Vec3::ZERO,
                        EmitterSettings::new()
                            .distances(EmitterDistances {
                                min_distance: spatial.min_distance,
                                max_distance: spatial.max_distance,
                            })
                            .attenuation_function(Easing::Linear),
                    )
                    .map_err(|e| anyhow!("failed to create emitter: {e}"))?;
                data = data.output_destination(&emitter);
                Some(emitter)
            }
            None => {
                let track = if loaded.settings.reverb > 0.0 {
                    &self.reverb
                } else {
                    &self.master
                };
                data = data.output_destination(track);
                None
            }
        };

        let mut handle = self
            .manager
            .play(data)
            .map_err(|e| anyhow!("failed to play sound {id:?}: {e}"))?;
        handle.pause(instant());

        let channel = self.alloc_channel_id();
        self.channels.insert(
            channel,
            Playback {
                handle,
                emitter,
                pending_fade: None,
            },
        );
        Ok(ChannelId(channel))
    }

    fn resume(&mut self, channel: ChannelId) -> Result<()> {
        let playback = self
            .channels
            .get_mut(&channel.0)
            .ok_or_else(|| anyhow!("channel not found: {channel:?}"))?;
        playback.handle.resume(instant());
        Ok(())
    }

    fn stop(&mut self, channel: ChannelId) -> Result<()> {
        if let Some(mut playback) = self.channels.remove(&channel.0) {
            playback.handle.stop(Tween::default());
        } else {
            debug!("stop of unknown channel {channel:?}");
        }
        Ok(())
    }

    fn is_playing(&self, channel: ChannelId) -> bool {
        self.channels.get(&channel.0).is_some_and(|playback| {
            matches!(
                playback.handle.state(),
                PlaybackState::Playing | PlaybackState::Pausing
            )
        })
    }

    fn set_volume(&mut self, channel: ChannelId, volume: f32) -> Result<()> {
        if let Some(playback) = self.channels.get_mut(&channel.0) {
            playback.handle.set_volume(f64::from(volume), instant());
        } else {
            debug!("volume set on unknown channel {channel:?}");
        }
        Ok(())
    }

    fn set_playback_rate(&mut self, channel: ChannelId, rate: f64) -> Result<()> {
        if let Some(playback) = self.channels.get_mut(&channel.0) {
            playback.handle.set_playback_rate(rate, instant());
        } else {
            debug!("playback rate set on unknown channel {channel:?}");
        }
        Ok(())
    }

    fn set_position(&mut self, channel: ChannelId, position: [f32; 3]) -> Result<()> {
        match self.channels.get_mut(&channel.0) {
            Some(playback) => {
                if let Some(emitter) = playback.emitter.as_mut() {
                    emitter.set_position(Vec3::from_array(position), instant());
                } else {
                    debug!("position set on non-positional channel {channel:?}");
                }
            }
            None => debug!("position set on unknown channel {channel:?}"),
        }
        Ok(())
    }

    fn clock_samples(&self, channel: ChannelId) -> Result<u64> {
        if !self.channels.contains_key(&channel.0) {
            return Err(anyhow!("channel not found: {channel:?}"));
        }
        Ok(self.clock.time().ticks)
    }

    fn add_fade_point(&mut self, channel: ChannelId, at_sample: u64, volume: f32) -> Result<()> {
        let Some(playback) = self.channels.get_mut(&channel.0) else {
            debug!("fade point on unknown channel {channel:?}");
            return Ok(());
        };
        match playback.pending_fade.take() {
            Some((from_sample, _)) if at_sample > from_sample => {
                // kira ramps from the channel's current volume at the start
                // time; the first point of the pair only anchors the ramp.
                playback.handle.set_volume(
                    f64::from(volume),
                    Tween {
                        start_time: StartTime::ClockTime(ClockTime {
                            clock: self.clock.id(),
                            ticks: from_sample,
                            fraction: 0.0,
                        }),
                        duration: fade_duration(from_sample, at_sample, self.sample_rate),
                        easing: Easing::Linear,
                    },
                );
            }
            _ => playback.pending_fade = Some((at_sample, volume)),
        }
        Ok(())
    }

    fn set_listener(&mut self, transform: &ListenerTransform) -> Result<()> {
        self.listener
            .set_position(Vec3::from_array(transform.position), instant());
        self.listener
            .set_orientation(transform.orientation(), instant());
        Ok(())
    }

    fn set_master_mute(&mut self, muted: bool) -> Result<()> {
        let volume = if muted { 0.0 } else { 1.0 };
        self.master.set_volume(volume, instant());
        Ok(())
    }

    fn dispose(&mut self) -> Result<()> {
        for (_, mut playback) in self.channels.drain() {
            playback.handle.stop(instant());
        }
        self.sounds.clear();
        Ok(())
    }
}
