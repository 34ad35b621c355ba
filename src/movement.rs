//! Turning planned paths into movement: headings towards the steer cell, terrain speed and the
//! movement veto for the player-controlled entity.
use crate::agent::AgentPath;
use crate::arena_grid::{ArenaGrid, CellCoord, Rect};
use crate::terrain::Terrain;
use serde::{Deserialize, Serialize};

/// Speed factor on grass.
pub const GRASS_SPEED_FACTOR: f32 = 1.0;
/// Speed factor on stone paths.
pub const STONE_SPEED_FACTOR: f32 = 1.35;

/// Per-axis movement direction, each component in `{-1, 0, 1}`. Positive `dy` points down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Heading {
    pub dx: i32,
    pub dy: i32,
}

impl Heading {
    pub const STOPPED: Heading = Heading { dx: 0, dy: 0 };

    pub fn new(dx: i32, dy: i32) -> Heading {
        Heading {
            dx: dx.signum(),
            dy: dy.signum(),
        }
    }
    pub fn is_stopped(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }
    pub fn is_diagonal(&self) -> bool {
        self.dx != 0 && self.dy != 0
    }
    /// Displacement per unit of time when moving at `speed`.
    pub fn velocity(&self, speed: f32) -> (f32, f32) {
        (self.dx as f32 * speed, self.dy as f32 * speed)
    }
}

/// Heading that brings `hitbox` onto `target`: horizontally by centre, vertically by bottom edge.
pub fn heading_towards(target: Rect, hitbox: Rect) -> Heading {
    Heading::new(
        target.center_x() - hitbox.center_x(),
        target.bottom() - hitbox.bottom(),
    )
}

/// Heading of an agent with the given hitbox along its current path, or `None` when it has no
/// path and should hold still.
pub fn steer(grid: &ArenaGrid, agent: &AgentPath, hitbox: Rect) -> Option<Heading> {
    let cell = grid.cell(agent.steer_cell()?);
    Some(heading_towards(cell.rect(), hitbox))
}

/// Speed factor of a terrain, or `None` if walking onto it keeps the previous factor.
pub fn speed_factor(terrain: Terrain) -> Option<f32> {
    match terrain {
        Terrain::Grass => Some(GRASS_SPEED_FACTOR),
        Terrain::Stone => Some(STONE_SPEED_FACTOR),
        _ => None,
    }
}

/// Speed along each moving axis, scaled so diagonal movement is not faster than straight
/// movement. The terrain factor is applied exactly once.
pub fn adjusted_speed(speed: f32, factor: f32, heading: Heading) -> f32 {
    let speed = speed * factor;
    if heading.is_diagonal() {
        (speed * speed / 2.0).sqrt()
    } else {
        speed
    }
}

/// Direction of a single player step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardinalDirection {
    Up,
    Down,
    Left,
    Right,
}

impl CardinalDirection {
    /// `(d_row, d_col)` of the step.
    pub fn offset(self) -> (i32, i32) {
        match self {
            CardinalDirection::Up => (-1, 0),
            CardinalDirection::Down => (1, 0),
            CardinalDirection::Left => (0, -1),
            CardinalDirection::Right => (0, 1),
        }
    }
}

/// Whether the player standing on `from` may walk into the adjacent cell in `direction`. Cells
/// off the grid count as blocked.
pub fn can_advance(grid: &ArenaGrid, from: CellCoord, direction: CardinalDirection) -> bool {
    let (d_row, d_col) = direction.offset();
    grid.get(from.offset(d_row, d_col))
        .map_or(false, |cell| !cell.terrain().blocks_movement())
}
