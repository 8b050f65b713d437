//! Vault templates
//!
//! A template is a block of text rows, one character per grid:
//!
//! | Symbol | Meaning |
//! |--------|---------|
//! | space  | leave the grid alone |
//! | `.` `,` | floor, grass |
//! | `%` `#` `X` | outer wall, inner wall, permanent wall |
//! | `*` | mineral vein with treasure |
//! | `+` | secret door |
//! | `^` | floor with a trap |
//! | `<` `>` | stairs |
//! | `$` | floor with gold |
//! | `;` `:` | rubble, passable rubble |
//! | `~` `&` `_` `\|` | water, lava, void, tree |
//! | `1`..`9`, `0` | out-of-depth monster and object ladder |
//! | letters | monster with that display symbol |

use log::warn;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::error::{ConfigError, GenError};
use crate::rng::GameRng;

const BUILTIN_VAULTS: &str = include_str!("../../data/vaults.json");

/// Which builders may use a template
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VaultKind {
    Lesser,
    Greater,
    Interesting,
    Wilderness,
}

/// A fixed room layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultTemplate {
    pub name: String,
    pub kind: VaultKind,
    /// Added to the level rating when placed
    #[serde(default)]
    pub rating: i32,
    pub rows: Vec<String>,
}

impl VaultTemplate {
    pub fn height(&self) -> i32 {
        self.rows.len() as i32
    }

    pub fn width(&self) -> i32 {
        self.rows.first().map_or(0, |row| row.chars().count() as i32)
    }

    /// Check the rows form a non-empty rectangle
    pub fn validate(&self) -> Result<(), GenError> {
        let bad = |reason: &str| GenError::BadTemplate {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.rows.is_empty() || self.width() == 0 {
            return Err(bad("no rows"));
        }
        let width = self.width() as usize;
        if self.rows.iter().any(|row| row.chars().count() != width) {
            return Err(bad("rows differ in length"));
        }
        Ok(())
    }

    /// Character at a template offset
    pub fn symbol(&self, dy: i32, dx: i32) -> char {
        self.rows
            .get(dy as usize)
            .and_then(|row| row.chars().nth(dx as usize))
            .unwrap_or(' ')
    }

    /// Parse a single template from JSON
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// A set of templates to choose from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VaultLibrary {
    templates: Vec<VaultTemplate>,
}

impl VaultLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// The templates shipped with the crate
    pub fn builtin() -> Self {
        match Self::from_json(BUILTIN_VAULTS) {
            Ok(library) => library,
            Err(err) => {
                warn!("built-in vault templates failed to load: {err}");
                Self::default()
            }
        }
    }

    /// Parse a JSON list of templates
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn push(&mut self, template: VaultTemplate) {
        self.templates.push(template);
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VaultTemplate> {
        self.templates.iter()
    }

    /// Pick a random template of `kind` that fits in `max_height` x `max_width`
    pub fn pick(
        &self,
        kind: VaultKind,
        max_height: i32,
        max_width: i32,
        rng: &mut GameRng,
    ) -> Option<&VaultTemplate> {
        let fits: Vec<&VaultTemplate> = self
            .templates
            .iter()
            .filter(|t| t.kind == kind && t.height() <= max_height && t.width() <= max_width)
            .collect();
        rng.choose(&fits).copied()
    }
}
