use crate::arena_grid::{ArenaGrid, CellId};
use crate::astar::SearchContext;
use crate::cost::ObstaclePolicy;
use crate::heuristic::HeuristicField;

/// Path and search state owned by a single agent. Each replan overwrites the previous path and
/// reuses the buffers of the last search.
#[derive(Debug, Default)]
pub struct AgentPath {
    path: Vec<CellId>,
    context: SearchContext,
}

impl AgentPath {
    pub fn new() -> AgentPath {
        AgentPath::default()
    }

    /// Current path from the agent's cell to the target, both included. Empty if the last search
    /// found no route, in which case the agent should hold still.
    pub fn path(&self) -> &[CellId] {
        &self.path
    }
    pub fn has_path(&self) -> bool {
        !self.path.is_empty()
    }
    /// The cell the agent occupied when the path was planned.
    pub fn current_cell(&self) -> Option<CellId> {
        self.path.first().copied()
    }
    /// Cell the agent should move towards: the next step if there is one, otherwise the cell it
    /// is already on.
    pub fn steer_cell(&self) -> Option<CellId> {
        self.path.get(1).or_else(|| self.path.first()).copied()
    }
    pub fn context(&self) -> &SearchContext {
        &self.context
    }

    /// Replaces the path with a fresh search from `start` to `target`. Returns whether a path was
    /// found.
    pub fn replan(
        &mut self,
        grid: &ArenaGrid,
        heuristic: &HeuristicField,
        policy: ObstaclePolicy,
        start: CellId,
        target: CellId,
    ) -> bool {
        self.context
            .find_path_into(grid, heuristic, policy, start, target, &mut self.path)
    }
}
