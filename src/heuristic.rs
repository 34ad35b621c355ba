use crate::arena_grid::{ArenaGrid, CellCoord, CellId};
use crate::cost::ORTHOGONAL_COST;

/// Estimated remaining cost from every cell to the current target, shared by all searches of a
/// tick. Uses the [Manhattan distance](https://en.wikipedia.org/wiki/Taxicab_geometry) in
/// orthogonal step units, which overestimates diagonal moves, so search results are ranked by it
/// rather than guaranteed geometric shortest paths.
#[derive(Clone, Debug, Default)]
pub struct HeuristicField {
    target: Option<CellCoord>,
    estimates: Vec<f32>,
}

impl HeuristicField {
    /// A field with every estimate at zero and no target, sized for `grid`.
    pub fn new(grid: &ArenaGrid) -> HeuristicField {
        HeuristicField {
            target: None,
            estimates: vec![0.0; grid.len()],
        }
    }

    pub fn estimate(cell: CellCoord, target: CellCoord) -> f32 {
        cell.manhattan_distance(&target) as f32 * ORTHOGONAL_COST
    }

    /// Recomputes the estimate of every cell of `grid` towards `target`. Must run before any
    /// search of the tick.
    pub fn recompute(&mut self, grid: &ArenaGrid, target: CellCoord) {
        self.estimates.clear();
        self.estimates.extend(
            grid.cells()
                .iter()
                .map(|cell| HeuristicField::estimate(cell.coord(), target)),
        );
        self.target = Some(target);
    }

    pub fn target(&self) -> Option<CellCoord> {
        self.target
    }

    /// Estimate for the cell with id `id`, zero for cells the field was not computed for.
    pub fn get(&self, id: CellId) -> f32 {
        self.estimates.get(id).copied().unwrap_or(0.0)
    }
}
