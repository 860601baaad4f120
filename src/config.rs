//! Profile configuration
//!
//! Every threshold the profile uses lives here with the values the railway
//! tiles are produced with. Hosts may override any subset from TOML text:
//!
//! ```toml
//! construction_cutoff = "2026-01"
//!
//! [merge]
//! min_length = 1.0
//! buffer = 8.0
//! ```

use std::str::FromStr;

use railway_common::{Error, Result};
use serde::Deserialize;

/// Opening dates sorting after this literal mark a line as under construction
pub const DEFAULT_CONSTRUCTION_CUTOFF: &str = "2025-06";

/// Tile-local line merge thresholds, all in tile pixels
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    /// Merged lines shorter than this are dropped
    pub min_length: f64,
    /// Douglas-Peucker tolerance applied after merging (0 disables)
    pub tolerance: f64,
    /// Detail further than this outside the tile is removed (negative disables)
    pub buffer: f64,
    /// Tile width and height
    pub tile_extent: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            min_length: 0.5,
            tolerance: 0.1,
            buffer: 4.0,
            tile_extent: 256.0,
        }
    }
}

impl MergeConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("merge.min_length", self.min_length),
            ("merge.tolerance", self.tolerance),
            ("merge.buffer", self.buffer),
            ("merge.tile_extent", self.tile_extent),
        ] {
            if !value.is_finite() {
                return Err(Error::InvalidConfig(format!("{name} must be finite")));
            }
        }
        if self.min_length < 0.0 {
            return Err(Error::InvalidConfig(
                "merge.min_length must not be negative".to_string(),
            ));
        }
        if self.tolerance < 0.0 {
            return Err(Error::InvalidConfig(
                "merge.tolerance must not be negative".to_string(),
            ));
        }
        if self.tile_extent <= 0.0 {
            return Err(Error::InvalidConfig(
                "merge.tile_extent must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for the railway profile
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    /// Compared as a plain string against `opening_date`, never parsed
    pub construction_cutoff: String,
    /// Minimum pixel size requested by railway lines
    pub line_min_pixel_size: f64,
    /// Minimum pixel size requested by every other feature
    pub default_min_pixel_size: f64,
    pub merge: MergeConfig,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            construction_cutoff: DEFAULT_CONSTRUCTION_CUTOFF.to_string(),
            // Short segments must survive until the merge pass joins them
            line_min_pixel_size: 0.0,
            default_min_pixel_size: 1.0,
            merge: MergeConfig::default(),
        }
    }
}

impl ProfileConfig {
    /// Parse and validate a TOML document; absent keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ProfileConfig =
            toml::from_str(text).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.construction_cutoff.is_empty() {
            return Err(Error::InvalidConfig(
                "construction_cutoff must not be empty".to_string(),
            ));
        }
        for (name, value) in [
            ("line_min_pixel_size", self.line_min_pixel_size),
            ("default_min_pixel_size", self.default_min_pixel_size),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be a non-negative number"
                )));
            }
        }
        self.merge.validate()
    }
}

impl FromStr for ProfileConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_toml_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProfileConfig::default();
        assert_eq!(config.construction_cutoff, "2025-06");
        assert_eq!(config.line_min_pixel_size, 0.0);
        assert_eq!(config.merge.min_length, 0.5);
        assert_eq!(config.merge.tolerance, 0.1);
        assert_eq!(config.merge.buffer, 4.0);
        assert_eq!(config.merge.tile_extent, 256.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document_is_default() {
        let config: ProfileConfig = "".parse().unwrap();
        assert_eq!(config, ProfileConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = ProfileConfig::from_toml_str(
            r#"
            construction_cutoff = "2026-01"

            [merge]
            buffer = 8.0
            "#,
        )
        .unwrap();

        assert_eq!(config.construction_cutoff, "2026-01");
        assert_eq!(config.merge.buffer, 8.0);
        assert_eq!(config.merge.min_length, 0.5);
        assert_eq!(config.default_min_pixel_size, 1.0);
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let err = ProfileConfig::from_toml_str("min_zoom = 4").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_bad_thresholds() {
        assert!(ProfileConfig::from_toml_str("[merge]\ntolerance = -0.1").is_err());
        assert!(ProfileConfig::from_toml_str("[merge]\ntile_extent = 0.0").is_err());
        assert!(ProfileConfig::from_toml_str("construction_cutoff = \"\"").is_err());
        assert!(ProfileConfig::from_toml_str("[merge]\nmin_length = nan").is_err());

        // A negative buffer is how trimming is switched off
        assert!(ProfileConfig::from_toml_str("[merge]\nbuffer = -1.0").is_ok());
    }
}
