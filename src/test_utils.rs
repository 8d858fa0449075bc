//! Test utilities: a mock audio backend that records middleware calls.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, anyhow};

use crate::backend::{AudioBackend, ChannelId, SoundId, SoundSettings};
use crate::listener::ListenerTransform;

/// One recorded middleware call.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    LoadSound(PathBuf),
    ReleaseSound(SoundId),
    Play(SoundId),
    Resume(ChannelId),
    Stop(ChannelId),
    SetVolume(ChannelId, f32),
    SetPlaybackRate(ChannelId, f64),
    SetPosition(ChannelId, [f32; 3]),
    AddFadePoint(ChannelId, u64, f32),
    SetListener([f32; 3]),
    SetMasterMute(bool),
    Dispose,
}

/// Audio backend that records every call instead of making sound.
pub struct MockBackend {
    pub calls: Vec<MockCall>,
    /// DSP clock reported to the engine; tests advance it directly.
    pub clock: u64,
    pub muted: bool,
    pub last_listener: Option<ListenerTransform>,
    durations: HashMap<PathBuf, Duration>,
    sounds: HashMap<u64, SoundSettings>,
    sound_paths: HashMap<u64, PathBuf>,
    /// Channel id -> currently audible.
    channels: HashMap<u64, bool>,
    next_sound_id: u64,
    next_channel_id: u64,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            clock: 0,
            muted: false,
            last_listener: None,
            durations: HashMap::new(),
            sounds: HashMap::new(),
            sound_paths: HashMap::new(),
            channels: HashMap::new(),
            next_sound_id: 1,
            next_channel_id: 1,
        }
    }

    /// Report `duration` for sounds loaded from `path`.
    pub fn with_duration(mut self, path: impl Into<PathBuf>, duration: Duration) -> Self {
        self.durations.insert(path.into(), duration);
        self
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn load_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, MockCall::LoadSound(_)))
            .count()
    }

    pub fn fade_points(&self) -> Vec<(ChannelId, u64, f32)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                MockCall::AddFadePoint(channel, at, volume) => Some((*channel, *at, *volume)),
                _ => None,
            })
            .collect()
    }

    /// The most recently created channel.
    pub fn last_channel(&self) -> ChannelId {
        ChannelId(self.next_channel_id - 1)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Simulate the middleware finishing a one-shot channel.
    pub fn finish_channel(&mut self, channel: ChannelId) {
        self.channels.remove(&channel.0);
    }
}

impl AudioBackend for MockBackend {
    fn update(&mut self) -> Result<()> {
        Ok(())
    }

    fn load_sound(&mut self, path: &Path, settings: &SoundSettings) -> Result<SoundId> {
        self.calls.push(MockCall::LoadSound(path.to_path_buf()));
        let id = self.next_sound_id;
        self.next_sound_id += 1;
        self.sounds.insert(id, *settings);
        self.sound_paths.insert(id, path.to_path_buf());
        Ok(SoundId(id))
    }

    fn release_sound(&mut self, id: SoundId) -> Result<()> {
        self.calls.push(MockCall::ReleaseSound(id));
        self.sounds.remove(&id.0);
        self.sound_paths.remove(&id.0);
        Ok(())
    }

    fn sound_duration(&self, id: SoundId) -> Option<Duration> {
        let path = self.sound_paths.get(&id.0)?;
        Some(self.durations.get(path).copied().unwrap_or(Duration::ZERO))
    }

    fn play(&mut self, id: SoundId) -> Result<ChannelId> {
        if !self.sounds.contains_key(&id.0) {
            return Err(anyhow!("sound not found: {id:?}"));
        }
        self.calls.push(MockCall::Play(id));
        let channel = self.next_channel_id;
        self.next_channel_id += 1;
        // Paused until resumed.
        self.channels.insert(channel, false);
        Ok(ChannelId(channel))
    }

    fn resume(&mut self, channel: ChannelId) -> Result<()> {
        self.calls.push(MockCall::Resume(channel));
        match self.channels.get_mut(&channel.0) {
            Some(playing) => {
                *playing = true;
                Ok(())
            }
            None => Err(anyhow!("channel not found: {channel:?}")),
        }
    }

    fn stop(&mut self, channel: ChannelId) -> Result<()> {
        self.calls.push(MockCall::Stop(channel));
        self.channels.remove(&channel.0);
        Ok(())
    }

    fn is_playing(&self, channel: ChannelId) -> bool {
        self.channels.get(&channel.0).copied().unwrap_or(false)
    }

    fn set_volume(&mut self, channel: ChannelId, volume: f32) -> Result<()> {
        self.calls.push(MockCall::SetVolume(channel, volume));
        Ok(())
    }

    fn set_playback_rate(&mut self, channel: ChannelId, rate: f64) -> Result<()> {
        self.calls.push(MockCall::SetPlaybackRate(channel, rate));
        Ok(())
    }

    fn set_position(&mut self, channel: ChannelId, position: [f32; 3]) -> Result<()> {
        self.calls.push(MockCall::SetPosition(channel, position));
        Ok(())
    }

    fn clock_samples(&self, channel: ChannelId) -> Result<u64> {
        if !self.channels.contains_key(&channel.0) {
            return Err(anyhow!("channel not found: {channel:?}"));
        }
        Ok(self.clock)
    }

    fn add_fade_point(&mut self, channel: ChannelId, at_sample: u64, volume: f32) -> Result<()> {
        self.calls
            .push(MockCall::AddFadePoint(channel, at_sample, volume));
        Ok(())
    }

    fn set_listener(&mut self, transform: &ListenerTransform) -> Result<()> {
        self.calls.push(MockCall::SetListener(transform.position));
        self.last_listener = Some(*transform);
        Ok(())
    }

    fn set_master_mute(&mut self, muted: bool) -> Result<()> {
        self.calls.push(MockCall::SetMasterMute(muted));
        self.muted = muted;
        Ok(())
    }

    fn dispose(&mut self) -> Result<()> {
        self.calls.push(MockCall::Dispose);
        self.channels.clear();
        self.sounds.clear();
        self.sound_paths.clear();
        Ok(())
    }
}
