//! Simulation options
//!
//! The handful of user preferences the core consults. Loadable from JSON or
//! from `OPTIONS=` lines in the familiar rc-file style.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rng::GameRng;

/// Options consulted by the visibility, AI and generation code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimOptions {
    /// Monsters learn the player's resistances by observation
    pub smart_monsters: bool,
    /// Monsters read the player's resistances directly
    pub smart_cheat: bool,
    /// Memorize lit floor grids on first sight
    pub remember_floors: bool,
    /// Extra hearing radius added to every species
    pub monster_flow_depth: i32,
    /// Sight radius for players who see without light
    pub unlight_radius: i32,
    /// Fixed RNG seed, if any
    pub seed: Option<u64>,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            smart_monsters: true,
            smart_cheat: false,
            remember_floors: true,
            monster_flow_depth: 0,
            unlight_radius: 2,
            seed: None,
        }
    }
}

impl SimOptions {
    /// Parse options from JSON text; missing fields keep their defaults
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// The RNG stream for a run: seeded if a seed is set
    pub fn rng(&self) -> GameRng {
        match self.seed {
            Some(seed) => GameRng::new(seed),
            None => GameRng::from_entropy(),
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load options from a file, JSON or rc-style by extension
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::parse_config(&contents),
        }
    }

    /// Parse options from rc-style text (`OPTIONS=a,!b,c:3`)
    pub fn parse_config(contents: &str) -> Result<Self, ConfigError> {
        let mut options = Self::default();

        for line in contents.lines() {
            let line = line.trim();

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(opts) = line.strip_prefix("OPTIONS=") {
                for opt in opts.split(',') {
                    options.parse_option(opt.trim())?;
                }
            }
        }

        Ok(options)
    }

    /// Parse a single option
    fn parse_option(&mut self, opt: &str) -> Result<(), ConfigError> {
        if let Some((key, value)) = opt.split_once(':').or_else(|| opt.split_once('=')) {
            return self.set_option(key.trim(), value.trim());
        }

        let (negated, name) = match opt.strip_prefix('!') {
            Some(name) => (true, name),
            None => (false, opt),
        };
        self.set_bool_option(name, !negated)
    }

    fn set_bool_option(&mut self, name: &str, value: bool) -> Result<(), ConfigError> {
        match name {
            "smart_monsters" => self.smart_monsters = value,
            "smart_cheat" => self.smart_cheat = value,
            "remember_floors" => self.remember_floors = value,
            _ => return Err(ConfigError::UnknownOption(name.to_string())),
        }
        Ok(())
    }

    fn set_option(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        };
        match name {
            "monster_flow_depth" => {
                self.monster_flow_depth = value.parse().map_err(|_| invalid())?;
            }
            "unlight_radius" => {
                self.unlight_radius = value.parse().map_err(|_| invalid())?;
            }
            "seed" => self.seed = Some(value.parse().map_err(|_| invalid())?),
            _ => return Err(ConfigError::UnknownOption(name.to_string())),
        }
        Ok(())
    }
}
