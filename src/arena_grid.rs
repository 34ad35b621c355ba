use crate::cost::CostTable;
use crate::layout::Layout;
use crate::terrain::Terrain;
use crate::N_SMALLVEC_SIZE;
use core::fmt;
use itertools::{iproduct, Itertools};
use log::info;
use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

/// Row-major index of a cell, `row * cols + col`.
pub type CellId = usize;

/// Grid position of a cell. Signed so that neighbour offsets and world conversions can step
/// outside the grid before being bounds checked.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellCoord {
    pub row: i32,
    pub col: i32,
}

impl CellCoord {
    pub const fn new(row: i32, col: i32) -> CellCoord {
        CellCoord { row, col }
    }
    pub fn offset(&self, d_row: i32, d_col: i32) -> CellCoord {
        CellCoord::new(self.row + d_row, self.col + d_col)
    }
    pub fn manhattan_distance(&self, other: &CellCoord) -> i32 {
        (self.row - other.row).abs() + (self.col - other.col).abs()
    }
    pub fn chebyshev_distance(&self, other: &CellCoord) -> i32 {
        (self.row - other.row)
            .abs()
            .max((self.col - other.col).abs())
    }
    /// True if `other` is a diagonal neighbour of this cell.
    pub fn is_diagonal_to(&self, other: &CellCoord) -> bool {
        (self.row - other.row).abs() == 1 && (self.col - other.col).abs() == 1
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Axis-aligned rectangle in world space, y pointing down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Rect {
        Rect {
            x,
            y,
            width,
            height,
        }
    }
    pub fn right(&self) -> i32 {
        self.x + self.width
    }
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }
    pub fn center_x(&self) -> i32 {
        self.x + self.width / 2
    }
    pub fn center_y(&self) -> i32 {
        self.y + self.height / 2
    }
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum GridError {
    #[error("cell {coord} is outside the {rows}x{cols} grid")]
    OutOfBounds {
        coord: CellCoord,
        rows: usize,
        cols: usize,
    },
    #[error("world position ({x}, {y}) maps outside the {rows}x{cols} grid")]
    OutsidePlayArea {
        x: f32,
        y: f32,
        rows: usize,
        cols: usize,
    },
}

/// A single tile: identity, terrain, world rectangle and the ids of every in-bounds cell around
/// it. Search state is kept by the searches themselves, never on the cell.
#[derive(Clone, Debug)]
pub struct Cell {
    id: CellId,
    coord: CellCoord,
    terrain: Terrain,
    rect: Rect,
    neighbours: SmallVec<[CellId; N_SMALLVEC_SIZE]>,
}

impl Cell {
    pub fn id(&self) -> CellId {
        self.id
    }
    pub fn coord(&self) -> CellCoord {
        self.coord
    }
    pub fn row(&self) -> i32 {
        self.coord.row
    }
    pub fn col(&self) -> i32 {
        self.coord.col
    }
    pub fn terrain(&self) -> Terrain {
        self.terrain
    }
    pub fn rect(&self) -> Rect {
        self.rect
    }
    /// Neighbour ids in row-major order. Obstacles are included: passability is only ever
    /// expressed through cost.
    pub fn neighbours(&self) -> &[CellId] {
        &self.neighbours
    }
}

/// [ArenaGrid] owns the cells of the arena and the [CostTable] they are walked with, built once
/// from a [Layout] and read-only afterwards. In addition to the cells it maintains a [UnionFind]
/// over non-obstacle cells, used to reject unreachable targets up front when obstacles are
/// treated as hard walls.
#[derive(Clone, Debug)]
pub struct ArenaGrid {
    rows: usize,
    cols: usize,
    tile_size: i32,
    cells: Vec<Cell>,
    costs: CostTable,
    open: Vec<bool>,
    components: UnionFind<usize>,
}

impl ArenaGrid {
    /// Creates one cell per layout entry, then links every cell to its 8-neighbourhood clipped to
    /// the grid bounds. The world rectangle of cell `(row, col)` starts one tile up and left of
    /// `(col * tile_size, row * tile_size)`, leaving a one-cell margin around the play area.
    /// Obstacles and connected components follow `costs`.
    pub fn new(layout: &Layout, tile_size: i32, costs: &CostTable) -> ArenaGrid {
        assert!(tile_size > 0, "tile size must be positive, got {tile_size}");
        let rows = layout.rows();
        let cols = layout.cols();
        let mut cells = iproduct!(0..rows as i32, 0..cols as i32)
            .map(|(row, col)| {
                let coord = CellCoord::new(row, col);
                Cell {
                    id: row as usize * cols + col as usize,
                    coord,
                    terrain: layout.get(coord),
                    rect: Rect::new(
                        col * tile_size - tile_size,
                        row * tile_size - tile_size,
                        tile_size,
                        tile_size,
                    ),
                    neighbours: SmallVec::new(),
                }
            })
            .collect::<Vec<Cell>>();
        let in_bounds = |n: &CellCoord| {
            n.row >= 0 && n.col >= 0 && (n.row as usize) < rows && (n.col as usize) < cols
        };
        for cell in cells.iter_mut() {
            let coord = cell.coord;
            cell.neighbours = iproduct!(-1..=1, -1..=1)
                .filter(|&(d_row, d_col)| d_row != 0 || d_col != 0)
                .map(|(d_row, d_col)| coord.offset(d_row, d_col))
                .filter(in_bounds)
                .map(|n| n.row as usize * cols + n.col as usize)
                .collect();
        }
        info!("Built {}x{} arena grid", rows, cols);
        let mut grid = ArenaGrid {
            rows,
            cols,
            tile_size,
            cells,
            costs: costs.clone(),
            open: Vec::new(),
            components: UnionFind::new(rows * cols),
        };
        grid.generate_components();
        grid
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
    pub fn cols(&self) -> usize {
        self.cols
    }
    /// `(rows, cols)`
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
    pub fn len(&self) -> usize {
        self.cells.len()
    }
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
    pub fn tile_size(&self) -> i32 {
        self.tile_size
    }
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
    pub fn costs(&self) -> &CostTable {
        &self.costs
    }

    pub fn in_bounds(&self, coord: CellCoord) -> bool {
        coord.row >= 0
            && coord.col >= 0
            && (coord.row as usize) < self.rows
            && (coord.col as usize) < self.cols
    }
    pub fn id_of(&self, coord: CellCoord) -> Option<CellId> {
        self.in_bounds(coord)
            .then(|| coord.row as usize * self.cols + coord.col as usize)
    }
    pub fn checked_id(&self, coord: CellCoord) -> Result<CellId, GridError> {
        self.id_of(coord).ok_or(GridError::OutOfBounds {
            coord,
            rows: self.rows,
            cols: self.cols,
        })
    }
    pub fn get(&self, coord: CellCoord) -> Option<&Cell> {
        self.id_of(coord).map(|id| &self.cells[id])
    }

    /// Panics if `coord` lies outside the grid.
    pub fn cell_at(&self, coord: CellCoord) -> &Cell {
        match self.get(coord) {
            Some(cell) => cell,
            None => panic!(
                "cell {} is outside the {}x{} grid",
                coord, self.rows, self.cols
            ),
        }
    }

    /// Panics if `id` is not a cell of this grid.
    pub fn cell(&self, id: CellId) -> &Cell {
        match self.cells.get(id) {
            Some(cell) => cell,
            None => panic!(
                "cell id {} is outside the {}x{} grid",
                id, self.rows, self.cols
            ),
        }
    }

    pub fn neighbours_of(&self, id: CellId) -> &[CellId] {
        self.cell(id).neighbours()
    }

    pub fn coords(&self, path: &[CellId]) -> Vec<CellCoord> {
        path.iter().map(|&id| self.cell(id).coord).collect()
    }

    /// Converts a world position to the cell under it, undoing the one-cell margin.
    pub fn world_to_cell(&self, x: f32, y: f32) -> Result<CellCoord, GridError> {
        let tile = self.tile_size as f32;
        let row = (y / tile).floor() + 1.0;
        let col = (x / tile).floor() + 1.0;
        // Checked in float space: NaN fails every comparison and nothing out of range is cast.
        if row >= 0.0 && col >= 0.0 && row < self.rows as f32 && col < self.cols as f32 {
            Ok(CellCoord::new(row as i32, col as i32))
        } else {
            Err(GridError::OutsidePlayArea {
                x,
                y,
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    /// Spawn cells in row-major order.
    pub fn spawn_cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells
            .iter()
            .filter(|cell| cell.terrain == Terrain::Spawn)
    }

    /// Whether the cell may be entered when obstacles are hard walls.
    pub fn is_open(&self, id: CellId) -> bool {
        self.open.get(id).copied().unwrap_or(false)
    }

    /// Checks if the target can be reached from the start without entering an obstacle.
    pub fn reachable(&self, start: CellId, target: CellId) -> bool {
        !self.unreachable(start, target)
    }

    /// Checks if start and target lie on different components. A start cell that is itself an
    /// obstacle may still be left through any open neighbour.
    pub fn unreachable(&self, start: CellId, target: CellId) -> bool {
        if start == target {
            return false;
        }
        if !self.is_open(target) {
            return true;
        }
        if self.is_open(start) {
            !self.components.equiv(start, target)
        } else {
            !self.cells[start]
                .neighbours
                .iter()
                .any(|&n| self.is_open(n) && self.components.equiv(n, target))
        }
    }

    /// Total cost of walking `path` with the grid's cost table.
    pub fn path_cost(&self, path: &[CellId]) -> f32 {
        self.costs.path_cost(self, path)
    }

    /// Generates a new [UnionFind] structure and links up open cells with their open neighbours.
    fn generate_components(&mut self) {
        info!("Generating connected components");
        self.open = self
            .cells
            .iter()
            .map(|cell| !self.costs.is_obstacle(cell.terrain))
            .collect();
        self.components = UnionFind::new(self.cells.len());
        for cell in &self.cells {
            if !self.open[cell.id] {
                continue;
            }
            for &n in cell.neighbours.iter() {
                if n > cell.id && self.open[n] {
                    self.components.union(cell.id, n);
                }
            }
        }
    }
}

impl fmt::Display for ArenaGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Grid:")?;
        for row in self.cells.chunks(self.cols.max(1)) {
            writeln!(f, "{}", row.iter().map(|cell| cell.terrain).join(""))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_from(rows: &[&str]) -> ArenaGrid {
        let layout = Layout::from_rows(rows).unwrap();
        ArenaGrid::new(&layout, 30, &CostTable::default())
    }

    #[test]
    fn ids_and_rectangles() {
        let grid = grid_from(&["...", "...", "..."]);
        assert_eq!(grid.dimensions(), (3, 3));
        let cell = grid.cell_at(CellCoord::new(2, 1));
        assert_eq!(cell.id(), 7);
        assert_eq!(cell.rect(), Rect::new(0, 30, 30, 30));
        assert_eq!(grid.cell(0).rect(), Rect::new(-30, -30, 30, 30));
    }

    #[test]
    fn neighbourhoods_are_clipped_and_keep_obstacles() {
        let grid = grid_from(&["#..", ".F.", "..."]);
        assert_eq!(grid.neighbours_of(0), &[1, 3, 4]);
        assert_eq!(grid.neighbours_of(4), &[0, 1, 2, 3, 5, 6, 7, 8]);
        assert_eq!(grid.neighbours_of(8), &[4, 5, 7]);
        let edge = grid.cell_at(CellCoord::new(1, 2));
        assert_eq!(edge.neighbours(), &[1, 2, 4, 7, 8]);
    }

    #[test]
    fn bounds() {
        let grid = grid_from(&["..", ".."]);
        assert!(grid.get(CellCoord::new(-1, 0)).is_none());
        assert!(grid.get(CellCoord::new(0, 2)).is_none());
        assert_eq!(
            grid.checked_id(CellCoord::new(2, 0)),
            Err(GridError::OutOfBounds {
                coord: CellCoord::new(2, 0),
                rows: 2,
                cols: 2
            })
        );
        assert_eq!(grid.checked_id(CellCoord::new(1, 1)), Ok(3));
    }

    #[test]
    #[should_panic(expected = "outside the 2x2 grid")]
    fn cell_at_out_of_bounds_panics() {
        let grid = grid_from(&["..", ".."]);
        grid.cell_at(CellCoord::new(5, 5));
    }

    #[test]
    fn world_positions_map_through_the_margin() {
        let grid = grid_from(&["...", "...", "..."]);
        assert_eq!(grid.world_to_cell(0.0, 0.0), Ok(CellCoord::new(1, 1)));
        assert_eq!(grid.world_to_cell(29.9, 45.0), Ok(CellCoord::new(2, 1)));
        assert_eq!(grid.world_to_cell(-1.0, -1.0), Ok(CellCoord::new(0, 0)));
        assert!(grid.world_to_cell(60.0, 0.0).is_err());
        assert!(grid.world_to_cell(0.0, -31.0).is_err());
    }

    #[test]
    fn non_finite_and_huge_positions_are_outside() {
        let grid = grid_from(&["...", "...", "..."]);
        for (x, y) in [
            (f32::NAN, f32::NAN),
            (f32::NAN, 0.0),
            (0.0, f32::INFINITY),
            (f32::NEG_INFINITY, 0.0),
            (1.0e20, 0.0),
            (0.0, -1.0e20),
            (f32::MAX, f32::MAX),
        ] {
            assert!(
                matches!(
                    grid.world_to_cell(x, y),
                    Err(GridError::OutsidePlayArea {
                        rows: 3,
                        cols: 3,
                        ..
                    })
                ),
                "({x}, {y}) should be outside"
            );
        }
    }

    /// Corresponds to the following grid, where the fence column splits the grid in two:
    /// |.F.|
    /// |.F.|
    #[test]
    fn test_component_generation() {
        let grid = grid_from(&[".F.", ".F."]);
        assert!(grid.reachable(0, 3));
        assert!(grid.unreachable(0, 2));
        assert!(grid.unreachable(0, 1));
        // Leaving a fence cell is allowed, entering one is not.
        assert!(grid.reachable(1, 2));
        assert!(grid.reachable(1, 1));
    }

    /// Obstacles and components follow the cost table the grid was built with.
    #[test]
    fn components_follow_the_cost_table() {
        let layout = Layout::from_rows(&["..F.."]).unwrap();
        let walled = ArenaGrid::new(&layout, 30, &CostTable::default());
        assert!(!walled.is_open(2));
        assert!(walled.unreachable(0, 4));
        let open = ArenaGrid::new(
            &layout,
            30,
            &CostTable::default().with_multiplier(Terrain::Fence, 1.0),
        );
        assert!(open.is_open(2));
        assert!(open.reachable(0, 4));
        assert_eq!(open.costs().multiplier(Terrain::Fence), 1.0);
    }

    #[test]
    fn reachable_with_diagonals() {
        // |.#|
        // |#.|
        let grid = grid_from(&[".#", "#."]);
        assert!(grid.reachable(0, 3));
    }

    #[test]
    fn spawn_cells_in_row_major_order() {
        let grid = grid_from(&[".P.", "P.P"]);
        let spawns = grid.spawn_cells().map(|c| c.id()).collect::<Vec<_>>();
        assert_eq!(spawns, vec![1, 3, 5]);
    }

    #[test]
    fn display_renders_symbols() {
        let grid = grid_from(&[".s", "#F"]);
        assert_eq!(grid.to_string(), "Grid:\n.s\n#F\n");
    }
}
