//! Dungeon system
//!
//! Contains the grid store, terrain table, geometry, field of view and the
//! noise/scent fields monsters track the player with.

mod cave;
mod cell;
mod feature;
mod flow;
mod geometry;
mod view;

pub use cave::{Cave, LevelKind, Update};
pub use cell::{Cell, CellFlags, Occupant};
pub use feature::{Feat, FeatFlags};
pub use flow::FlowState;
pub use geometry::{
    direction_of, distance, Coord, ProjectFlags, Projection, DDD, DDX, DDY, PATH_SIZE,
};
pub use view::{MapSink, NullSink, RecordingSink};
