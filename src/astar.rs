/// A* over an [ArenaGrid] in the style of
/// [pathfinding's astar function](https://docs.rs/pathfinding/latest/pathfinding/directed/astar/index.html),
/// with all per-search state held in a reusable [SearchContext] instead of on the cells, so the
/// grid stays shared read-only data.
use crate::arena_grid::{ArenaGrid, CellId};
use crate::cost::ObstaclePolicy;
use crate::heuristic::HeuristicField;
use fxhash::{FxBuildHasher, FxHashSet};
use indexmap::map::Entry::{Occupied, Vacant};
use indexmap::IndexMap;
use log::{debug, warn};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

const NO_PARENT: usize = usize::MAX;

#[derive(Debug)]
struct SmallestCostHolder {
    estimated_cost: f32,
    cost: f32,
    index: usize,
}

impl Eq for SmallestCostHolder {}

impl PartialEq for SmallestCostHolder {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for SmallestCostHolder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SmallestCostHolder {
    fn cmp(&self, other: &Self) -> Ordering {
        // Smallest estimated cost first. Equal estimates go to the cell that entered the
        // frontier first, which is its slot in the parents map.
        match other.estimated_cost.total_cmp(&self.estimated_cost) {
            Ordering::Equal => other.index.cmp(&self.index),
            s => s,
        }
    }
}

/// Frontier, visited set and scratch side table of one agent's searches. Everything is cleared at
/// the start of each search and the allocations are kept for the next one.
#[derive(Debug, Default)]
pub struct SearchContext {
    frontier: BinaryHeap<SmallestCostHolder>,
    /// Cell id to (slot of the predecessor, cost from start), in order of discovery.
    parents: FxIndexMap<CellId, (usize, f32)>,
    visited: FxHashSet<CellId>,
    expansions: usize,
}

impl SearchContext {
    pub fn new() -> SearchContext {
        SearchContext::default()
    }

    /// Number of cells finalized by the last search.
    pub fn expansions(&self) -> usize {
        self.expansions
    }
    /// Cells discovered but not finalized when the last search stopped.
    pub fn frontier_len(&self) -> usize {
        self.parents.len() - self.visited.len()
    }
    pub fn is_visited(&self, id: CellId) -> bool {
        self.visited.contains(&id)
    }
    /// Cost from the start of the last search to `id`, if the cell was discovered.
    pub fn g_cost(&self, id: CellId) -> Option<f32> {
        self.parents.get(&id).map(|&(_, g)| g)
    }
    /// Predecessor of `id` on the best known route of the last search.
    pub fn predecessor(&self, id: CellId) -> Option<CellId> {
        let &(parent, _) = self.parents.get(&id)?;
        self.parents.get_index(parent).map(|(&node, _)| node)
    }

    fn reset(&mut self) {
        self.frontier.clear();
        self.parents.clear();
        self.visited.clear();
        self.expansions = 0;
    }

    /// Computes a path from `start` to `target` (both included) and returns it, or an empty path
    /// if the target cannot be reached. Step costs and obstacles come from the grid's cost table.
    pub fn find_path(
        &mut self,
        grid: &ArenaGrid,
        heuristic: &HeuristicField,
        policy: ObstaclePolicy,
        start: CellId,
        target: CellId,
    ) -> Vec<CellId> {
        let mut path = Vec::new();
        self.find_path_into(grid, heuristic, policy, start, target, &mut path);
        path
    }

    /// Same as [find_path](Self::find_path), writing into `path` so its buffer can be reused.
    /// Returns whether the target was reached.
    pub fn find_path_into(
        &mut self,
        grid: &ArenaGrid,
        heuristic: &HeuristicField,
        policy: ObstaclePolicy,
        start: CellId,
        target: CellId,
        path: &mut Vec<CellId>,
    ) -> bool {
        self.reset();
        path.clear();
        let start_cell = grid.cell(start);
        let target_cell = grid.cell(target);
        let costs = grid.costs();
        let hard = policy == ObstaclePolicy::Hard;
        if hard && grid.unreachable(start, target) {
            debug!(
                "{} is not reachable from {}",
                target_cell.coord(),
                start_cell.coord()
            );
            return false;
        }

        self.parents.insert(start, (NO_PARENT, 0.0));
        self.frontier.push(SmallestCostHolder {
            estimated_cost: heuristic.get(start),
            cost: 0.0,
            index: 0,
        });
        while let Some(SmallestCostHolder { cost, index, .. }) = self.frontier.pop() {
            let Some((&node, &(_, g))) = self.parents.get_index(index) else {
                continue;
            };
            // A cell is pushed again whenever a cheaper route to it is found. Only the entry
            // carrying its current cost is expanded, and only once.
            if cost > g || !self.visited.insert(node) {
                continue;
            }
            self.expansions += 1;
            if node == target {
                self.reverse_path(index, path);
                return true;
            }
            let cell = grid.cell(node);
            for &neighbour in cell.neighbours() {
                if self.visited.contains(&neighbour) {
                    continue;
                }
                if hard && !grid.is_open(neighbour) {
                    continue;
                }
                let next = grid.cell(neighbour);
                let new_cost = g + costs.step_cost(cell.coord(), next.coord(), next.terrain());
                let n; // slot of the neighbour
                match self.parents.entry(neighbour) {
                    Vacant(e) => {
                        n = e.index();
                        e.insert((index, new_cost));
                    }
                    Occupied(mut e) => {
                        if new_cost < e.get().1 {
                            n = e.index();
                            e.insert((index, new_cost));
                        } else {
                            continue;
                        }
                    }
                }
                self.frontier.push(SmallestCostHolder {
                    estimated_cost: new_cost + heuristic.get(neighbour),
                    cost: new_cost,
                    index: n,
                });
            }
        }
        warn!(
            "Frontier exhausted after {} expansions, no path from {} to {}",
            self.expansions,
            start_cell.coord(),
            target_cell.coord()
        );
        false
    }

    fn reverse_path(&self, mut slot: usize, path: &mut Vec<CellId>) {
        while let Some((&node, &(parent, _))) = self.parents.get_index(slot) {
            path.push(node);
            slot = parent;
        }
        path.reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena_grid::CellCoord;
    use crate::cost::{CostTable, DIAGONAL_COST, IMPASSABLE_MULTIPLIER, ORTHOGONAL_COST};
    use crate::layout::Layout;
    use crate::terrain::Terrain;

    struct Setup {
        grid: ArenaGrid,
        heuristic: HeuristicField,
    }

    impl Setup {
        fn new(layout: &Layout, costs: CostTable, target: CellCoord) -> Setup {
            let grid = ArenaGrid::new(layout, 30, &costs);
            let mut heuristic = HeuristicField::new(&grid);
            heuristic.recompute(&grid, target);
            Setup { grid, heuristic }
        }
        fn solve(
            &self,
            ctx: &mut SearchContext,
            policy: ObstaclePolicy,
            start: CellCoord,
        ) -> Vec<CellCoord> {
            let target = self.heuristic.target().unwrap();
            let path = ctx.find_path(
                &self.grid,
                &self.heuristic,
                policy,
                self.grid.cell_at(start).id(),
                self.grid.cell_at(target).id(),
            );
            self.grid.coords(&path)
        }
    }

    /// Asserts that the case in which start and goal are equal is handled correctly.
    #[test]
    fn equal_start_goal() {
        let origin = CellCoord::new(0, 0);
        let setup = Setup::new(&Layout::new(1, 1, Terrain::Grass), CostTable::default(), origin);
        let mut ctx = SearchContext::new();
        for policy in [ObstaclePolicy::Soft, ObstaclePolicy::Hard] {
            assert_eq!(setup.solve(&mut ctx, policy, origin), vec![origin]);
            assert_eq!(ctx.expansions(), 1);
        }
    }

    /// 5x5 open grid from corner to corner: four diagonal steps.
    #[test]
    fn open_grid_goes_diagonal() {
        let target = CellCoord::new(4, 4);
        let setup = Setup::new(&Layout::new(5, 5, Terrain::Grass), CostTable::default(), target);
        let mut ctx = SearchContext::new();
        let path = setup.solve(&mut ctx, ObstaclePolicy::Soft, CellCoord::new(0, 0));
        let expected = (0..5).map(|i| CellCoord::new(i, i)).collect::<Vec<_>>();
        assert_eq!(path, expected);
        let target_id = setup.grid.cell_at(target).id();
        assert_eq!(ctx.g_cost(target_id), Some(4.0 * DIAGONAL_COST));
        assert_eq!(ctx.predecessor(target_id), Some(setup.grid.cell_at(CellCoord::new(3, 3)).id()));
    }

    /// Wall of expensive cells on the anti-diagonal with a single gap in the middle.
    #[test]
    fn detours_through_the_gap() {
        let mut layout = Layout::new(5, 5, Terrain::Grass);
        for row in 0..5 {
            if row != 2 {
                layout.set(CellCoord::new(row, 4 - row), Terrain::Impassable);
            }
        }
        let target = CellCoord::new(4, 4);
        let setup = Setup::new(&layout, CostTable::default(), target);
        let mut ctx = SearchContext::new();
        for policy in [ObstaclePolicy::Soft, ObstaclePolicy::Hard] {
            let path = setup.solve(&mut ctx, policy, CellCoord::new(0, 0));
            assert!(path.contains(&CellCoord::new(2, 2)));
            assert_eq!(path.first(), Some(&CellCoord::new(0, 0)));
            assert_eq!(path.last(), Some(&target));
        }
    }

    /// Two equally long routes around a tree line; the stone one is cheaper.
    /// |.....|
    /// |STTT.|
    /// |.sss.|
    #[test]
    fn prefers_cheaper_terrain() {
        let layout = Layout::from_rows(&[".....", "sTTT.", ".sss."]).unwrap();
        let costs = CostTable::default().with_multiplier(Terrain::Tree, IMPASSABLE_MULTIPLIER);
        let target = CellCoord::new(1, 4);
        let setup = Setup::new(&layout, costs, target);
        let mut ctx = SearchContext::new();
        let path = setup.solve(&mut ctx, ObstaclePolicy::Soft, CellCoord::new(1, 0));
        assert_eq!(
            path,
            vec![
                CellCoord::new(1, 0),
                CellCoord::new(2, 1),
                CellCoord::new(2, 2),
                CellCoord::new(2, 3),
                CellCoord::new(1, 4),
            ]
        );
    }

    /// The fence fully encloses the target. Soft obstacles still yield a route through the fence,
    /// hard obstacles yield nothing.
    /// |.....|
    /// |.FFF.|
    /// |.F.F.|
    /// |.FFF.|
    #[test]
    fn enclosed_target() {
        let layout = Layout::from_rows(&[".....", ".FFF.", ".F.F.", ".FFF."]).unwrap();
        let target = CellCoord::new(2, 2);
        let setup = Setup::new(&layout, CostTable::default(), target);
        let mut ctx = SearchContext::new();

        let soft = setup.solve(&mut ctx, ObstaclePolicy::Soft, CellCoord::new(0, 0));
        assert_eq!(
            soft,
            vec![
                CellCoord::new(0, 0),
                CellCoord::new(0, 1),
                CellCoord::new(1, 1),
                CellCoord::new(2, 2)
            ]
        );
        // Entering the fence orthogonally is the cheapest way in.
        let target_id = setup.grid.cell_at(target).id();
        assert_eq!(
            ctx.g_cost(target_id),
            Some(ORTHOGONAL_COST + ORTHOGONAL_COST * IMPASSABLE_MULTIPLIER + DIAGONAL_COST)
        );

        let hard = setup.solve(&mut ctx, ObstaclePolicy::Hard, CellCoord::new(0, 0));
        assert!(hard.is_empty());
        assert_eq!(ctx.expansions(), 0);
    }

    /// A fence column splits the grid, so the hard search gives up before expanding anything.
    /// |..F..|
    /// |..F..|
    /// |..F..|
    #[test]
    fn hard_search_rejects_other_component() {
        let layout = Layout::from_rows(&["..F..", "..F..", "..F.."]).unwrap();
        let setup = Setup::new(&layout, CostTable::default(), CellCoord::new(1, 4));
        let mut ctx = SearchContext::new();
        let path = setup.solve(&mut ctx, ObstaclePolicy::Hard, CellCoord::new(0, 0));
        assert!(path.is_empty());
        assert_eq!(ctx.expansions(), 0);
        assert_eq!(ctx.frontier_len(), 0);
    }

    /// The hard walls are the obstacles of the grid's own cost table: a fence made cheap is
    /// walked through.
    #[test]
    fn hard_walls_follow_the_grid_costs() {
        let layout = Layout::from_rows(&["..F.."]).unwrap();
        let costs = CostTable::default().with_multiplier(Terrain::Fence, 1.0);
        let setup = Setup::new(&layout, costs, CellCoord::new(0, 4));
        let mut ctx = SearchContext::new();
        let path = setup.solve(&mut ctx, ObstaclePolicy::Hard, CellCoord::new(0, 0));
        let expected = (0..5).map(|col| CellCoord::new(0, col)).collect::<Vec<_>>();
        assert_eq!(path, expected);
        assert_eq!(ctx.g_cost(4), Some(4.0 * ORTHOGONAL_COST));
    }

    #[test]
    fn no_state_leaks_between_searches() {
        let layout = Layout::arena();
        let target = CellCoord::new(9, 15);
        let setup = Setup::new(&layout, CostTable::default(), target);
        let a = CellCoord::new(2, 3);
        let b = CellCoord::new(16, 27);

        let mut shared = SearchContext::new();
        let a_first = setup.solve(&mut shared, ObstaclePolicy::Soft, a);
        let b_second = setup.solve(&mut shared, ObstaclePolicy::Soft, b);
        let b_first = setup.solve(&mut shared, ObstaclePolicy::Soft, b);
        let a_second = setup.solve(&mut shared, ObstaclePolicy::Soft, a);
        assert_eq!(a_first, a_second);
        assert_eq!(b_first, b_second);

        let mut fresh = SearchContext::new();
        assert_eq!(setup.solve(&mut fresh, ObstaclePolicy::Soft, a), a_first);
    }

    #[test]
    fn straight_line_uses_orthogonal_steps() {
        let target = CellCoord::new(0, 6);
        let setup = Setup::new(&Layout::new(3, 7, Terrain::Grass), CostTable::default(), target);
        let mut ctx = SearchContext::new();
        let path = setup.solve(&mut ctx, ObstaclePolicy::Soft, CellCoord::new(0, 0));
        assert_eq!(path.len(), 7);
        assert!(path.iter().all(|c| c.row == 0));
        let target_id = setup.grid.cell_at(target).id();
        assert_eq!(ctx.g_cost(target_id), Some(6.0 * ORTHOGONAL_COST));
    }
}
