//! # Decoder Configuration
//!
//! Configuration for decode sessions and the hardware memory provider.

use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, Result};

/// Decode session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Log every retrieved picture with its presentation timestamp.
    ///
    /// Per-picture events are emitted at `debug` level and are noisy.
    ///
    /// Default: false.
    #[serde(default = "default_log_pictures")]
    pub log_pictures: bool,

    /// Width the hardware buffer pool is opened at.
    ///
    /// Default: 128.
    #[serde(default = "default_hardware_working_width")]
    pub hardware_working_width: u32,

    /// Height the hardware buffer pool is opened at.
    ///
    /// Default: 128.
    #[serde(default = "default_hardware_working_height")]
    pub hardware_working_height: u32,

    /// Whether a hardware memory provider may be registered.
    ///
    /// Default: true.
    #[serde(default = "default_enable_hardware_provider")]
    pub enable_hardware_provider: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            log_pictures: default_log_pictures(),
            hardware_working_width: default_hardware_working_width(),
            hardware_working_height: default_hardware_working_height(),
            enable_hardware_provider: default_enable_hardware_provider(),
        }
    }
}

impl DecoderConfig {
    /// Configuration with per-picture logging enabled.
    pub fn verbose() -> Self {
        Self {
            log_pictures: true,
            ..Default::default()
        }
    }

    /// Configuration that never registers a hardware provider.
    pub fn software_only() -> Self {
        Self {
            enable_hardware_provider: false,
            ..Default::default()
        }
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| DecodeError::InvalidConfig(e.to_string()))?;
        config.validate().map_err(DecodeError::InvalidConfig)?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.hardware_working_width == 0 {
            return Err("hardware_working_width must be > 0".to_string());
        }

        if self.hardware_working_height == 0 {
            return Err("hardware_working_height must be > 0".to_string());
        }

        Ok(())
    }
}

fn default_log_pictures() -> bool {
    false
}

fn default_hardware_working_width() -> u32 {
    128
}

fn default_hardware_working_height() -> u32 {
    128
}

fn default_enable_hardware_provider() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DecoderConfig::default();
        assert!(!config.log_pictures);
        assert_eq!(config.hardware_working_width, 128);
        assert_eq!(config.hardware_working_height, 128);
        assert!(config.enable_hardware_provider);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        assert!(DecoderConfig::verbose().log_pictures);
        assert!(!DecoderConfig::software_only().enable_hardware_provider);
    }

    #[test]
    fn test_validate_zero_resolution() {
        let config = DecoderConfig {
            hardware_working_width: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = DecoderConfig::from_json(r#"{ "log_pictures": true }"#).unwrap();
        assert!(config.log_pictures);
        assert_eq!(config.hardware_working_width, 128);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        let err = DecoderConfig::from_json(r#"{ "hardware_working_height": 0 }"#).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidConfig(_)));

        let err = DecoderConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidConfig(_)));
    }
}
