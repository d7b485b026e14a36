//! Game settings
//!
//! Tunable arena and game parameters, loadable from JSON.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SettingsError;

/// Arena extents in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaSettings {
    pub width: f32,
    pub height: f32,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
        }
    }
}

/// Body spawn parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodySettings {
    /// Number of bodies in the arena
    pub count: usize,
    /// Smallest spawned radius (pixels)
    pub min_radius: u32,
    /// Largest spawned radius (pixels)
    pub max_radius: u32,
    /// Per-axis velocity is sampled from [-max_speed, max_speed]
    pub max_speed: i32,
}

impl Default for BodySettings {
    fn default() -> Self {
        Self {
            count: BODY_COUNT,
            min_radius: BODY_MIN_RADIUS,
            max_radius: BODY_MAX_RADIUS,
            max_speed: BODY_MAX_SPEED,
        }
    }
}

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Verbose logging
    pub debug: bool,
    pub arena: ArenaSettings,
    pub bodies: BodySettings,
    /// Clicks that end the game
    pub click_threshold: u32,
    /// RNG seed for body spawning (random when absent)
    pub seed: Option<u64>,
    /// Forces solo/multiplayer mode, overriding transport probing
    pub multiplayer: Option<bool>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            arena: ArenaSettings::default(),
            bodies: BodySettings::default(),
            click_threshold: CLICK_THRESHOLD,
            seed: None,
            multiplayer: None,
        }
    }
}

impl Settings {
    /// Environment variable naming a JSON settings file (native only)
    pub const ENV_PATH: &'static str = "BOUNCE_ARENA_SETTINGS";

    /// Parse and validate settings from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check that every body can fit in the arena and the game can end.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let b = &self.bodies;
        if b.min_radius == 0 || b.min_radius > b.max_radius {
            return Err(SettingsError::Invalid(format!(
                "radius range [{}, {}] is empty or non-positive",
                b.min_radius, b.max_radius
            )));
        }
        let diameter = 2.0 * b.max_radius as f32;
        if diameter > self.arena.width || diameter > self.arena.height {
            return Err(SettingsError::Invalid(format!(
                "arena {}x{} cannot contain a body of radius {}",
                self.arena.width, self.arena.height, b.max_radius
            )));
        }
        if b.max_speed < 0 {
            return Err(SettingsError::Invalid("max_speed must be >= 0".into()));
        }
        if self.click_threshold == 0 {
            return Err(SettingsError::Invalid("click_threshold must be >= 1".into()));
        }
        Ok(())
    }

    /// Seed to use for this run
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }

    /// Load settings from the file named by `BOUNCE_ARENA_SETTINGS`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let Ok(path) = std::env::var(Self::ENV_PATH) else {
            log::info!("Using default settings");
            return Self::default();
        };

        match std::fs::read_to_string(&path)
            .map_err(SettingsError::from)
            .and_then(|json| Self::from_json(&json))
        {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path);
                settings
            }
            Err(e) => {
                log::warn!("Ignoring settings file {}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Web builds always start from defaults
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.arena.width, 720.0);
        assert_eq!(settings.arena.height, 1080.0);
        assert_eq!(settings.click_threshold, 3);
        assert_eq!(settings.bodies.count, 15);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = Settings::from_json(r#"{"bodies": {"count": 4}, "seed": 7}"#).unwrap();
        assert_eq!(settings.bodies.count, 4);
        assert_eq!(settings.bodies.max_radius, BODY_MAX_RADIUS);
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.resolve_seed(), 7);
    }

    #[test]
    fn test_rejects_arena_smaller_than_body() {
        let err = Settings::from_json(r#"{"arena": {"width": 100, "height": 1000}}"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }

    #[test]
    fn test_rejects_zero_threshold() {
        let err = Settings::from_json(r#"{"click_threshold": 0}"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = Settings::from_json("{not json").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }
}
