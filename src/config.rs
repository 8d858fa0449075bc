use serde::{Deserialize, Serialize};

/// Audio engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate the DSP clock ticks at, used to schedule fades.
    pub sample_rate: u32,
    /// World units per meter. Positions and rolloff distances are scaled by
    /// this before they reach the middleware.
    pub distance_factor: f32,
    /// Wet mix of the shared reverb bus (0.0 - 1.0).
    pub reverb_mix: f64,
    /// Fades at or below this many samples are applied as an immediate
    /// volume set instead of a scheduled ramp.
    pub instant_fade_samples: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            distance_factor: 1.0,
            reverb_mix: 0.5,
            instant_fade_samples: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = AudioConfig::default();
        assert_eq!(config.sample_rate, 44_100);
        assert_eq!(config.instant_fade_samples, 64);
        assert!((config.distance_factor - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn serialization_round_trip() {
        let config = AudioConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: AudioConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.sample_rate, config.sample_rate);
        assert!((deserialized.reverb_mix - config.reverb_mix).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: AudioConfig = serde_json::from_str(r#"{"sample_rate": 48000}"#).unwrap();
        assert_eq!(config.sample_rate, 48_000);
        assert_eq!(config.instant_fade_samples, 64);
    }
}
