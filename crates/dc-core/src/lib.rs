//! dc-core: Simulation core for a dungeon-crawl roguelike
//!
//! The grid store, line of sight and field of view, noise and scent
//! tracking, monster AI and the level generator. No I/O: rendering,
//! input, saving and the item model live with the embedder.

pub mod dungeon;
pub mod error;
pub mod generate;
pub mod monster;
pub mod options;
pub mod player;
pub mod turn;

mod consts;
mod rng;

pub use consts::*;
pub use error::{ConfigError, GenError, GridError};
pub use options::SimOptions;
pub use player::{PlayerState, Resists};
pub use rng::GameRng;
pub use turn::{process_world_turn, TurnReport};
