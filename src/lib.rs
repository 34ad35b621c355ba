//! # arena_pursuit
//!
//! Real-time pursuit pathfinding for a tile arena. Every tick the estimate towards the moving
//! target is recomputed once, after which each agent runs a full
//! [A*](https://en.wikipedia.org/wiki/A*_search_algorithm) search over an 8-connected grid with
//! weighted terrain, using its own reusable search state. Obstacles are expensive rather than
//! removed by default; with [ObstaclePolicy::Hard] they become walls and pre-computed
//! [connected components](https://en.wikipedia.org/wiki/Component_(graph_theory)) avoid
//! flood-filling behaviour if no path exists.
mod agent;
mod arena_grid;
mod astar;
mod cost;
mod heuristic;
mod layout;
mod movement;
mod pursuit;
mod terrain;

pub use crate::agent::AgentPath;
pub use crate::arena_grid::{ArenaGrid, Cell, CellCoord, CellId, GridError, Rect};
pub use crate::astar::SearchContext;
pub use crate::cost::{
    base_step_cost, CostTable, ObstaclePolicy, DIAGONAL_COST, IMPASSABLE_MULTIPLIER,
    ORTHOGONAL_COST,
};
pub use crate::heuristic::HeuristicField;
pub use crate::layout::{Layout, LayoutError};
pub use crate::movement::{
    adjusted_speed, can_advance, heading_towards, speed_factor, steer, CardinalDirection,
    Heading,
};
pub use crate::pursuit::{Pursuit, PursuitConfig, PursuitError, TickSummary};
pub use crate::terrain::Terrain;

/// Inline capacity of neighbour lists, the size of a full 8-neighbourhood.
pub const N_SMALLVEC_SIZE: usize = 8;
/// Tile edge length in world units used by the arena.
pub const DEFAULT_TILE_SIZE: i32 = 30;
