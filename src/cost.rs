use crate::arena_grid::{ArenaGrid, CellCoord, CellId};
use crate::terrain::Terrain;
use serde::{Deserialize, Serialize};

/// Cost of a horizontal or vertical step on standard terrain.
pub const ORTHOGONAL_COST: f32 = 10.0;
/// Cost of a diagonal step on standard terrain, 1.4 times the orthogonal cost.
pub const DIAGONAL_COST: f32 = 14.0;
/// Multiplier given to terrain that should never be walked through. Multipliers at or above this
/// value mark a terrain as an obstacle for [ObstaclePolicy::Hard].
pub const IMPASSABLE_MULTIPLIER: f32 = 10000.0;

/// How the search treats obstacle terrain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstaclePolicy {
    /// Obstacles stay in the graph and are only made very expensive, so a route through them is
    /// returned if every detour costs more.
    #[default]
    Soft,
    /// Obstacles are never entered. Targets outside the start's connected component yield an
    /// empty path without searching.
    Hard,
}

/// Movement cost multiplier per [Terrain].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostTable {
    pub enemy: f32,
    pub knight: f32,
    pub grass: f32,
    pub stone: f32,
    pub tree: f32,
    pub impassable: f32,
    pub fence: f32,
    pub spawn: f32,
    pub block: f32,
}

impl Default for CostTable {
    fn default() -> CostTable {
        CostTable {
            enemy: 1.0,
            knight: 1.0,
            grass: 1.0,
            stone: 0.7,
            tree: 1.0,
            impassable: IMPASSABLE_MULTIPLIER,
            fence: IMPASSABLE_MULTIPLIER,
            spawn: 1.0,
            block: 1.0,
        }
    }
}

impl CostTable {
    /// Every terrain costs the same, obstacles included.
    pub fn uniform() -> CostTable {
        CostTable {
            enemy: 1.0,
            knight: 1.0,
            grass: 1.0,
            stone: 1.0,
            tree: 1.0,
            impassable: 1.0,
            fence: 1.0,
            spawn: 1.0,
            block: 1.0,
        }
    }

    pub fn multiplier(&self, terrain: Terrain) -> f32 {
        match terrain {
            Terrain::Enemy => self.enemy,
            Terrain::Knight => self.knight,
            Terrain::Grass => self.grass,
            Terrain::Stone => self.stone,
            Terrain::Tree => self.tree,
            Terrain::Impassable => self.impassable,
            Terrain::Fence => self.fence,
            Terrain::Spawn => self.spawn,
            Terrain::Block => self.block,
        }
    }

    pub fn with_multiplier(mut self, terrain: Terrain, multiplier: f32) -> CostTable {
        let slot = match terrain {
            Terrain::Enemy => &mut self.enemy,
            Terrain::Knight => &mut self.knight,
            Terrain::Grass => &mut self.grass,
            Terrain::Stone => &mut self.stone,
            Terrain::Tree => &mut self.tree,
            Terrain::Impassable => &mut self.impassable,
            Terrain::Fence => &mut self.fence,
            Terrain::Spawn => &mut self.spawn,
            Terrain::Block => &mut self.block,
        };
        *slot = multiplier;
        self
    }

    /// The first terrain whose multiplier is not a finite positive number, if any. Such values
    /// break the cost ordering the search relies on.
    pub fn invalid_multiplier(&self) -> Option<(Terrain, f32)> {
        Terrain::ALL
            .into_iter()
            .map(|terrain| (terrain, self.multiplier(terrain)))
            .find(|&(_, multiplier)| !(multiplier.is_finite() && multiplier > 0.0))
    }

    pub fn is_obstacle(&self, terrain: Terrain) -> bool {
        self.multiplier(terrain) >= IMPASSABLE_MULTIPLIER
    }

    /// Cost of stepping from `from` onto the adjacent cell `to`, which has terrain `terrain`.
    pub fn step_cost(&self, from: CellCoord, to: CellCoord, terrain: Terrain) -> f32 {
        base_step_cost(from, to) * self.multiplier(terrain)
    }

    /// Sums the step costs along a path, accumulating in the same order as the search does.
    pub fn path_cost(&self, grid: &ArenaGrid, path: &[CellId]) -> f32 {
        path.windows(2)
            .map(|pair| (grid.cell(pair[0]), grid.cell(pair[1])))
            .fold(0.0, |total, (from, to)| {
                total + self.step_cost(from.coord(), to.coord(), to.terrain())
            })
    }
}

/// Orthogonal cost if the cells share a row or a column, diagonal cost otherwise.
pub fn base_step_cost(from: CellCoord, to: CellCoord) -> f32 {
    debug_assert!(from.chebyshev_distance(&to) <= 1);
    if from.row == to.row || from.col == to.col {
        ORTHOGONAL_COST
    } else {
        DIAGONAL_COST
    }
}
