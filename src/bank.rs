use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AudioError;

/// A soundbank: a manifest of pre-authored events exported by authoring
/// tooling, loaded as a unit. Sound paths are resolved relative to the
/// manifest's directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankManifest {
    pub name: String,
    #[serde(default)]
    pub events: HashMap<String, EventDefinition>,
}

impl BankManifest {
    /// Read and parse a bank manifest from disk.
    pub fn from_path(path: &Path) -> Result<Self, AudioError> {
        let text = fs::read_to_string(path).map_err(|source| AudioError::BankRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| AudioError::BankParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// A named, parameterized playback unit defined in a bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDefinition {
    /// Audio file the event plays, relative to the bank manifest.
    pub sound: PathBuf,
    #[serde(default)]
    pub looping: bool,
    /// Base volume of the event (amplitude, 0.0..=1.0).
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// Send amount into the shared reverb bus.
    #[serde(default)]
    pub reverb: f32,
    #[serde(default)]
    pub parameters: HashMap<String, ParameterDefinition>,
}

/// A named parameter of an event, with its range and what it modulates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParameterDefinition {
    #[serde(default)]
    pub default: f32,
    #[serde(default)]
    pub min: f32,
    #[serde(default = "default_max")]
    pub max: f32,
    #[serde(default)]
    pub target: ParameterTarget,
}

impl ParameterDefinition {
    /// Clamp a requested value into the parameter's range.
    pub fn clamp(&self, value: f32) -> f32 {
        value.max(self.min).min(self.max)
    }
}

/// What an event parameter modulates when it changes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterTarget {
    /// Amplitude multiplier on the event's volume.
    Volume,
    /// Semitone offset converted to a playback rate.
    PlaybackRate,
    /// Bookkeeping only; stored but applied to nothing.
    #[default]
    None,
}

fn default_volume() -> f32 {
    1.0
}

fn default_max() -> f32 {
    1.0
}
