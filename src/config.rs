//! Decoder configuration

use serde::{Deserialize, Serialize};

use crate::{Result, VcrError};

/// What to do with a version number the decoder does not know
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownVersionPolicy {
    /// Read with the closest lower known layout and record a warning
    #[default]
    Fallback,
    /// Fail with `UnknownVersion`
    Reject,
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Unknown version handling
    #[serde(default)]
    pub unknown_version: UnknownVersionPolicy,
    /// Retry self-delimiting sections with older layouts when the declared
    /// one does not fit
    #[serde(default = "default_true")]
    pub layout_fallback: bool,
    /// Check the V3 trailer's frame checksum
    #[serde(default = "default_true")]
    pub verify_checksum: bool,
    /// Resource limits
    #[serde(default)]
    pub limits: LimitsConfig,
}

fn default_true() -> bool {
    true
}

/// Resource limits applied to untrusted counts and lengths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum roster size; slot 255 is reserved for "no driver"
    pub max_participants: usize,
    /// Maximum length of any length-prefixed string
    pub max_string_len: usize,
    /// Maximum number of frames decoded
    pub max_frames: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_participants: 255,
            max_string_len: 64 * 1024, // 64 KB
            max_frames: 10_000_000,
        }
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            unknown_version: UnknownVersionPolicy::default(),
            layout_fallback: true,
            verify_checksum: true,
            limits: LimitsConfig::default(),
        }
    }
}

impl DecoderConfig {
    /// Load configuration from TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VcrError::Config(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string
    ///
    /// # Errors
    ///
    /// Returns error if the text cannot be parsed or fails validation
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| VcrError::Config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if a limit is zero or out of range
    pub fn validate(&self) -> Result<()> {
        if self.limits.max_participants == 0 {
            return Err(VcrError::Config(
                "max_participants must be > 0".to_string(),
            ));
        }

        if self.limits.max_participants > 255 {
            return Err(VcrError::Config(format!(
                "max_participants cannot exceed 255, got {}",
                self.limits.max_participants
            )));
        }

        if self.limits.max_string_len == 0 {
            return Err(VcrError::Config(
                "max_string_len must be > 0".to_string(),
            ));
        }

        if self.limits.max_frames == 0 {
            return Err(VcrError::Config("max_frames must be > 0".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_parse() {
        let config_toml = r#"
            unknown_version = "reject"
            verify_checksum = false

            [limits]
            max_participants = 64
            max_string_len = 256
            max_frames = 1000
        "#;

        let config = DecoderConfig::from_toml(config_toml).unwrap();
        assert_eq!(config.unknown_version, UnknownVersionPolicy::Reject);
        assert!(config.layout_fallback);
        assert!(!config.verify_checksum);
        assert_eq!(config.limits.max_participants, 64);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = DecoderConfig::from_toml("").unwrap();
        assert_eq!(config.unknown_version, UnknownVersionPolicy::Fallback);
        assert!(config.layout_fallback);
        assert!(config.verify_checksum);
        assert_eq!(config.limits.max_participants, 255);
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        let config_toml = r#"
            layout_fallback = false
        "#;
        file.write_all(config_toml.as_bytes()).unwrap();

        let config = DecoderConfig::from_file(file.path()).unwrap();
        assert!(!config.layout_fallback);
    }

    #[test]
    fn test_invalid_limits() {
        let config_toml = r#"
            [limits]
            max_participants = 300
            max_string_len = 16
            max_frames = 10
        "#;
        assert!(matches!(
            DecoderConfig::from_toml(config_toml),
            Err(VcrError::Config(_))
        ));

        let mut config = DecoderConfig::default();
        config.limits.max_frames = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = DecoderConfig::from_file(std::path::Path::new("/nonexistent/vcr.toml"));
        assert!(matches!(result, Err(VcrError::Config(_))));
    }

    #[test]
    fn test_unknown_policy_value() {
        assert!(DecoderConfig::from_toml(r#"unknown_version = "maybe""#).is_err());
    }
}
