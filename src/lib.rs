//! Game audio engine built on kira.
//!
//! This crate provides:
//! - [`AudioEngine`]: Sound caching, 2D/3D playback, loop fades, soundbank
//!   events, listener placement, and a master mute switch
//! - [`AudioBackend`]: The middleware boundary, so the engine can be driven
//!   against a mock in tests
//! - [`KiraDriver`]: The production backend
//! - [`SoundInfo`] / [`BankManifest`]: Input descriptors for sounds and
//!   authored event banks
//! - [`AudioConfig`]: Configuration for audio settings
//!
//! Mixing, decoding, and spatialization live inside the middleware; the
//! engine owns resource handles and forwards calls. All methods are meant to
//! be called from one thread, with [`AudioEngine::update`] invoked once per
//! application tick.

mod backend;
mod bank;
mod cache;
mod config;
mod driver;
mod engine;
mod error;
mod listener;
mod sound;

#[cfg(test)]
mod test_utils;

pub use backend::{AudioBackend, ChannelId, SoundId, SoundSettings, SpatialSettings};
pub use bank::{BankManifest, EventDefinition, ParameterDefinition, ParameterTarget};
pub use cache::{ResourceCache, ResourceKey};
pub use config::AudioConfig;
pub use driver::KiraDriver;
pub use engine::AudioEngine;
pub use error::AudioError;
pub use listener::ListenerTransform;
pub use sound::{DEFAULT_MAX_DISTANCE, DEFAULT_MIN_DISTANCE, SoundInfo, Spatial};
