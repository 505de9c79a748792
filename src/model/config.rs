use serde::{Deserialize, Serialize};

/// Configuration from config.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum accepted match score (0.0 = exact, 1.0 = anything).
    /// Default: see src/templates/config.toml
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// How far from the start of the text a match may drift before the
    /// proximity penalty alone exceeds the threshold.
    #[serde(default = "default_distance")]
    pub distance: usize,
}

impl Config {
    /// Reject values that parse but make no sense.
    pub fn validate(&self) -> Result<(), String> {
        let threshold = self.search.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(format!(
                "search.threshold must be between 0.0 and 1.0, got {}",
                threshold
            ));
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            threshold: default_threshold(),
            distance: default_distance(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Speech-to-text command whose stdout is the transcript. Empty = unsupported.
    #[serde(default)]
    pub command: String,
    #[serde(default = "default_voice_timeout")]
    pub timeout_secs: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        VoiceConfig {
            command: String::new(),
            timeout_secs: default_voice_timeout(),
        }
    }
}

fn default_threshold() -> f64 {
    0.3
}

fn default_distance() -> usize {
    100
}

fn default_voice_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.search.threshold, 0.3);
        assert_eq!(config.search.distance, 100);
        assert!(config.voice.command.is_empty());
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let config: Config = toml::from_str("[search]\nthreshold = 0.5\n").unwrap();
        assert_eq!(config.search.threshold, 0.5);
        assert_eq!(config.search.distance, 100);
        assert_eq!(config.voice.timeout_secs, 30);
    }

    #[test]
    fn threshold_must_be_a_fraction() {
        assert!(Config::default().validate().is_ok());
        for bad in ["1e30", "-0.1", "1.5", "nan", "inf"] {
            let config: Config = toml::from_str(&format!("[search]\nthreshold = {}\n", bad)).unwrap();
            let err = config.validate().unwrap_err();
            assert!(err.contains("search.threshold"), "{}", err);
        }
        let edge: Config = toml::from_str("[search]\nthreshold = 1.0\n").unwrap();
        assert!(edge.validate().is_ok());
    }
}
