//! Error types for the simulation core
//!
//! Nothing in here is fatal to a running game. Generation errors are
//! "skip this room" signals and grid errors guard the coordinate boundary.

use thiserror::Error;

use crate::dungeon::LevelKind;

/// Coordinate outside the fixed dungeon extent
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridError {
    #[error("grid ({y}, {x}) is outside the dungeon")]
    OutOfBounds { y: i32, x: i32 },
}

/// Reasons a room, vault or level could not be generated
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenError {
    #[error("no free space for a {height}x{width} room")]
    NoSpace { height: i32, width: i32 },

    #[error("vaults are not allowed on {0} levels")]
    VaultRefused(LevelKind),

    #[error("bounding box ({y1}, {x1})-({y2}, {x2}) is unusable")]
    BadBounds { y1: i32, x1: i32, y2: i32, x2: i32 },

    #[error("template '{name}' ({height}x{width}) does not fit the level")]
    TemplateTooLarge {
        name: String,
        height: i32,
        width: i32,
    },

    #[error("template '{name}' is malformed: {reason}")]
    BadTemplate { name: String, reason: String },

    #[error("no template of kind {0:?} is available")]
    NoTemplate(crate::generate::VaultKind),

    #[error("level generation failed: {0}")]
    LevelFailed(String),
}

/// Option and data-file loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("invalid value '{value}' for option '{name}'")]
    InvalidValue { name: String, value: String },

    #[error("could not read '{path}': {reason}")]
    Io { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GridError::OutOfBounds { y: -1, x: 4 };
        assert_eq!(err.to_string(), "grid (-1, 4) is outside the dungeon");

        let err = GenError::VaultRefused(LevelKind::Mountaintop);
        assert_eq!(err.to_string(), "vaults are not allowed on mountaintop levels");
    }

    #[test]
    fn test_config_error_from_json() {
        let bad = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: ConfigError = bad.into();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
