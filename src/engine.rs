use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info, warn};

use crate::backend::{AudioBackend, ChannelId, SoundId, SoundSettings, SpatialSettings};
use crate::bank::{BankManifest, EventDefinition, ParameterTarget};
use crate::cache::{ResourceCache, ResourceKey};
use crate::config::AudioConfig;
use crate::driver::KiraDriver;
use crate::error::{AudioError, Result};
use crate::listener::ListenerTransform;
use crate::sound::SoundInfo;

/// A sound held in the load cache.
struct SoundEntry {
    id: SoundId,
    settings: SoundSettings,
}

/// An actively playing looping sound. `volume` is the authoritative current
/// volume; fades ramp from it, not from whatever the caller last passed.
struct LoopState {
    channel: ChannelId,
    volume: f32,
}

/// A loaded soundbank and the directory its sound paths resolve against.
struct Bank {
    manifest: BankManifest,
    dir: PathBuf,
}

/// The single live instance of a named event.
struct EventState {
    sound: SoundId,
    definition: EventDefinition,
    parameters: HashMap<String, f32>,
    volume: f32,
    channel: Option<ChannelId>,
}

/// Effective playback volume of an event: its instance volume scaled by
/// every volume-targeted parameter.
fn event_effective_volume(state: &EventState) -> f32 {
    let mut volume = state.volume;
    for (name, definition) in &state.definition.parameters {
        if definition.target == ParameterTarget::Volume {
            if let Some(value) = state.parameters.get(name) {
                volume *= value.max(0.0);
            }
        }
    }
    volume.clamp(0.0, 1.0)
}

/// Playback rate of an event: rate-targeted parameters are semitone offsets,
/// summed and converted as rate = 2^(semitones / 12).
fn event_playback_rate(state: &EventState) -> f64 {
    let mut semitones = 0.0_f64;
    for (name, definition) in &state.definition.parameters {
        if definition.target == ParameterTarget::PlaybackRate {
            if let Some(value) = state.parameters.get(name) {
                semitones += f64::from(*value);
            }
        }
    }
    2.0_f64.powf(semitones / 12.0)
}

/// Owns every middleware resource and exposes load, play, stop, reposition,
/// and fade operations for sounds and soundbank events.
///
/// All methods must be called from a single thread, with [`update`]
/// invoked once per application tick. Construct one engine per application;
/// it is an explicitly-owned value, not a global.
///
/// Every operation returns a typed result, and every precondition no-op or
/// middleware failure is also logged, so callers that ignore the result get
/// a console diagnostic and playback continues with whatever state resulted.
///
/// [`update`]: AudioEngine::update
pub struct AudioEngine<B: AudioBackend = KiraDriver> {
    backend: B,
    config: AudioConfig,
    sounds: ResourceCache<SoundEntry>,
    loops: ResourceCache<LoopState>,
    banks: ResourceCache<Bank>,
    events: ResourceCache<EventState>,
    listener: ListenerTransform,
    muted: bool,
}

impl AudioEngine<KiraDriver> {
    /// Start the engine on the kira driver.
    pub fn new(config: AudioConfig) -> Result<Self> {
        let backend = KiraDriver::new(&config)?;
        Ok(Self::with_backend(backend, config))
    }
}

impl<B: AudioBackend> AudioEngine<B> {
    /// Build an engine over any backend implementation.
    pub fn with_backend(backend: B, config: AudioConfig) -> Self {
        Self {
            backend,
            config,
            sounds: ResourceCache::new(),
            loops: ResourceCache::new(),
            banks: ResourceCache::new(),
            events: ResourceCache::new(),
            listener: ListenerTransform::default(),
            muted: false,
        }
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Drive the middleware's internal scheduling. Call once per tick.
    pub fn update(&mut self) -> Result<()> {
        self.backend.update()?;
        // One-shot event channels end on their own; clear them so queries
        // and later volume changes see the instance as idle.
        for event in self.events.values_mut() {
            if let Some(channel) = event.channel {
                if !self.backend.is_playing(channel) {
                    event.channel = None;
                }
            }
        }
        Ok(())
    }

    /// Stop all playback and release every middleware resource.
    pub fn shutdown(&mut self) -> Result<()> {
        info!("shutting down audio engine");
        for (_, state) in self.loops.drain() {
            self.backend.stop(state.channel)?;
        }
        for (_, event) in self.events.drain() {
            if let Some(channel) = event.channel {
                self.backend.stop(channel)?;
            }
        }
        self.sounds.clear();
        self.banks.clear();
        self.backend.dispose()?;
        Ok(())
    }

    // Sounds

    /// Load a sound from disk so it can be played later. Loading an
    /// already-cached key is a no-op reported as success.
    pub fn load_sound(&mut self, info: &SoundInfo) -> Result<()> {
        if self.sounds.contains(info.key()) {
            warn!("sound `{}` is already loaded", info.key());
            return Ok(());
        }
        info!(
            "loading sound `{}` from {}",
            info.key(),
            info.path().display()
        );
        let settings = self.sound_settings(info);
        let id = self.backend.load_sound(info.path(), &settings)?;
        self.sounds
            .insert_if_absent(info.key().clone(), SoundEntry { id, settings });
        Ok(())
    }

    /// Release a loaded sound, stopping its loop channel if one is active.
    pub fn unload_sound(&mut self, key: &ResourceKey) -> Result<()> {
        if let Some(state) = self.loops.remove(key) {
            self.backend.stop(state.channel)?;
        }
        match self.sounds.remove(key) {
            Some(entry) => {
                self.backend.release_sound(entry.id)?;
                Ok(())
            }
            None => {
                warn!("cannot unload `{key}`: not loaded");
                Err(AudioError::SoundNotLoaded(key.clone()))
            }
        }
    }

    /// Play a previously loaded sound. The channel is created paused,
    /// positioned and leveled, then unpaused; only looping sounds are
    /// tracked afterwards.
    pub fn play_sound(&mut self, info: &SoundInfo) -> Result<()> {
        let Some(entry) = self.sounds.get(info.key()) else {
            warn!("cannot play `{}`: not loaded", info.key());
            return Err(AudioError::SoundNotLoaded(info.key().clone()));
        };
        let id = entry.id;
        let looping = entry.settings.looping;
        let spatial = entry.settings.spatial.is_some();

        let channel = self.backend.play(id)?;
        if spatial {
            if let Some(block) = info.spatial() {
                self.backend
                    .set_position(channel, self.scale(block.position))?;
            }
        }
        self.backend.set_volume(channel, info.playback_volume())?;
        self.backend.resume(channel)?;

        if looping {
            // Restarting a playing loop replaces its channel.
            if let Some(previous) = self.loops.remove(info.key()) {
                self.backend.stop(previous.channel)?;
            }
            self.loops.insert_if_absent(
                info.key().clone(),
                LoopState {
                    channel,
                    volume: info.playback_volume(),
                },
            );
        }
        Ok(())
    }

    /// Stop an actively playing loop and forget its channel.
    pub fn stop_sound(&mut self, key: &ResourceKey) -> Result<()> {
        match self.loops.remove(key) {
            Some(state) => {
                self.backend.stop(state.channel)?;
                Ok(())
            }
            None => {
                warn!("cannot stop `{key}`: not an actively playing loop");
                Err(AudioError::LoopNotPlaying(key.clone()))
            }
        }
    }

    /// Change the volume of a playing loop, optionally over a fade.
    ///
    /// Fades no longer than the configured instant threshold are applied as
    /// a single immediate set. Longer fades are scheduled as two automation
    /// points bracketing the channel's DSP clock by `fade_samples`. A rising
    /// fade sets the requested volume immediately and ramps the automation
    /// to full scale rather than the requested value.
    pub fn update_loop_volume(
        &mut self,
        key: &ResourceKey,
        new_volume: f32,
        fade_samples: u64,
    ) -> Result<()> {
        let (channel, current) = match self.loops.get(key) {
            Some(state) => (state.channel, state.volume),
            None => {
                warn!("cannot change volume of `{key}`: not an actively playing loop");
                return Err(AudioError::LoopNotPlaying(key.clone()));
            }
        };

        if fade_samples <= self.config.instant_fade_samples {
            self.backend.set_volume(channel, new_volume)?;
        } else {
            let fade_up = new_volume > current;
            let clock = self.backend.clock_samples(channel)?;
            if fade_up {
                self.backend.set_volume(channel, new_volume)?;
            }
            let fade_target = if fade_up { 1.0 } else { new_volume };
            self.backend.add_fade_point(channel, clock, current)?;
            self.backend
                .add_fade_point(channel, clock + fade_samples, fade_target)?;
        }

        if let Some(state) = self.loops.get_mut(key) {
            state.volume = new_volume;
        }
        Ok(())
    }

    /// Move a playing positional loop to a new position.
    pub fn update_sound_position(&mut self, key: &ResourceKey, position: [f32; 3]) -> Result<()> {
        let Some(channel) = self.loops.get(key).map(|state| state.channel) else {
            warn!("cannot reposition `{key}`: not an actively playing loop");
            return Err(AudioError::LoopNotPlaying(key.clone()));
        };
        self.backend.set_position(channel, self.scale(position))?;
        Ok(())
    }

    /// Whether a looping sound is currently tracked as playing.
    pub fn sound_is_playing(&self, key: &ResourceKey) -> bool {
        self.loops.contains(key)
    }

    pub fn sound_is_loaded(&self, key: &ResourceKey) -> bool {
        self.sounds.contains(key)
    }

    /// Decoded length of a cached sound; zero if the key is not cached.
    pub fn sound_length(&self, key: &ResourceKey) -> Duration {
        self.sounds
            .get(key)
            .and_then(|entry| self.backend.sound_duration(entry.id))
            .unwrap_or(Duration::ZERO)
    }

    pub fn loaded_sound_count(&self) -> usize {
        self.sounds.len()
    }

    pub fn playing_loop_count(&self) -> usize {
        self.loops.len()
    }

    // Listener

    /// Place the listener. The vectors are forwarded as given, every call.
    pub fn set_listener(&mut self, transform: &ListenerTransform) -> Result<()> {
        self.listener = *transform;
        let scaled = ListenerTransform {
            position: self.scale(transform.position),
            ..*transform
        };
        self.backend.set_listener(&scaled)?;
        Ok(())
    }

    pub fn listener(&self) -> &ListenerTransform {
        &self.listener
    }

    // Master mute

    pub fn mute_all(&mut self) -> Result<()> {
        self.backend.set_master_mute(true)?;
        self.muted = true;
        Ok(())
    }

    pub fn unmute_all(&mut self) -> Result<()> {
        self.backend.set_master_mute(false)?;
        self.muted = false;
        Ok(())
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    // Banks and events

    /// Load a soundbank manifest. Loading the same path twice is a no-op
    /// reported as success.
    pub fn load_bank(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let key = ResourceKey::from(path);
        if self.banks.contains(&key) {
            warn!("bank `{key}` is already loaded");
            return Ok(());
        }
        info!("loading bank {}", path.display());
        let manifest = BankManifest::from_path(path)?;
        debug!(
            "bank `{}` defines {} events",
            manifest.name,
            manifest.events.len()
        );
        let dir = path.parent().unwrap_or(Path::new("")).to_path_buf();
        self.banks.insert_if_absent(key, Bank { manifest, dir });
        Ok(())
    }

    /// Create the single instance of a named event. Some loaded bank must
    /// define the event. Unknown names in `initial_params` are logged and
    /// skipped; known ones are clamped into their range.
    pub fn load_event(&mut self, name: &str, initial_params: &[(&str, f32)]) -> Result<()> {
        let key = ResourceKey::from(name);
        if self.events.contains(&key) {
            warn!("event `{name}` is already created");
            return Ok(());
        }
        let Some((definition, sound_path)) = self.find_event(name) else {
            warn!("no loaded bank defines event `{name}`");
            return Err(AudioError::EventNotFound(key));
        };
        info!("creating event `{name}` from {}", sound_path.display());
        debug!(
            "event `{name}`: {} parameters, looping: {}",
            definition.parameters.len(),
            definition.looping
        );

        let settings = SoundSettings {
            looping: definition.looping,
            reverb: definition.reverb,
            spatial: None,
        };
        let sound = self.backend.load_sound(&sound_path, &settings)?;

        let mut parameters: HashMap<String, f32> = definition
            .parameters
            .iter()
            .map(|(name, parameter)| (name.clone(), parameter.default))
            .collect();
        for (param_name, value) in initial_params {
            match definition.parameters.get(*param_name) {
                Some(parameter) => {
                    parameters.insert((*param_name).to_string(), parameter.clamp(*value));
                }
                None => warn!("event `{name}` has no parameter `{param_name}`"),
            }
        }

        let volume = definition.volume;
        self.events.insert_if_absent(
            key,
            EventState {
                sound,
                definition,
                parameters,
                volume,
                channel: None,
            },
        );
        Ok(())
    }

    /// Set a named parameter on an event instance, applying its target to
    /// the live channel if the event is playing.
    pub fn set_event_parameter(&mut self, name: &str, parameter: &str, value: f32) -> Result<()> {
        let key = ResourceKey::from(name);
        let Some(state) = self.events.get_mut(&key) else {
            warn!("event `{name}` has not been created, cannot set `{parameter}`");
            return Err(AudioError::EventNotCreated(key));
        };
        let Some(definition) = state.definition.parameters.get(parameter) else {
            warn!("event `{name}` has no parameter `{parameter}`");
            return Err(AudioError::UnknownParameter {
                event: key,
                parameter: parameter.to_string(),
            });
        };
        let target = definition.target;
        let clamped = definition.clamp(value);
        state.parameters.insert(parameter.to_string(), clamped);

        if let Some(channel) = state.channel {
            match target {
                ParameterTarget::Volume => {
                    let volume = event_effective_volume(state);
                    self.backend.set_volume(channel, volume)?;
                }
                ParameterTarget::PlaybackRate => {
                    let rate = event_playback_rate(state);
                    self.backend.set_playback_rate(channel, rate)?;
                }
                ParameterTarget::None => {}
            }
        }
        Ok(())
    }

    /// Start the instance of an event, restarting it if already playing.
    pub fn play_event(&mut self, name: &str) -> Result<()> {
        let key = ResourceKey::from(name);
        let Some(state) = self.events.get_mut(&key) else {
            warn!("event `{name}` has not been created, cannot play");
            return Err(AudioError::EventNotCreated(key));
        };
        if let Some(previous) = state.channel.take() {
            self.backend.stop(previous)?;
        }
        let channel = self.backend.play(state.sound)?;
        let volume = event_effective_volume(state);
        self.backend.set_volume(channel, volume)?;
        let rate = event_playback_rate(state);
        if rate != 1.0 {
            self.backend.set_playback_rate(channel, rate)?;
        }
        self.backend.resume(channel)?;
        state.channel = Some(channel);
        Ok(())
    }

    /// Stop the instance of an event if it is playing.
    pub fn stop_event(&mut self, name: &str) -> Result<()> {
        let key = ResourceKey::from(name);
        let Some(state) = self.events.get_mut(&key) else {
            warn!("event `{name}` has not been created, cannot stop");
            return Err(AudioError::EventNotCreated(key));
        };
        match state.channel.take() {
            Some(channel) => {
                self.backend.stop(channel)?;
                Ok(())
            }
            None => {
                debug!("event `{name}` is not playing");
                Ok(())
            }
        }
    }

    /// Set the instance volume of an event (0.0..=1.0).
    pub fn set_event_volume(&mut self, name: &str, volume: f32) -> Result<()> {
        let key = ResourceKey::from(name);
        let Some(state) = self.events.get_mut(&key) else {
            warn!("event `{name}` has not been created, cannot set volume");
            return Err(AudioError::EventNotCreated(key));
        };
        state.volume = volume.clamp(0.0, 1.0);
        if let Some(channel) = state.channel {
            let volume = event_effective_volume(state);
            self.backend.set_volume(channel, volume)?;
        }
        Ok(())
    }

    /// Whether the instance of an event is currently playing.
    pub fn event_is_playing(&self, name: &str) -> bool {
        self.events
            .get(&ResourceKey::from(name))
            .and_then(|state| state.channel)
            .is_some_and(|channel| self.backend.is_playing(channel))
    }

    // Internals

    fn sound_settings(&self, info: &SoundInfo) -> SoundSettings {
        SoundSettings {
            looping: info.is_looping(),
            reverb: info.reverb_amount(),
            spatial: info.spatial().map(|block| SpatialSettings {
                min_distance: block.min_distance * self.config.distance_factor,
                max_distance: block.max_distance * self.config.distance_factor,
            }),
        }
    }

    fn scale(&self, position: [f32; 3]) -> [f32; 3] {
        let factor = self.config.distance_factor;
        [
            position[0] * factor,
            position[1] * factor,
            position[2] * factor,
        ]
    }

    fn find_event(&self, name: &str) -> Option<(EventDefinition, PathBuf)> {
        self.banks.values().find_map(|bank| {
            bank.manifest
                .events
                .get(name)
                .map(|definition| (definition.clone(), bank.dir.join(&definition.sound)))
        })
    }
}
