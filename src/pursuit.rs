use crate::agent::AgentPath;
use crate::arena_grid::{ArenaGrid, CellCoord, CellId, GridError};
use crate::cost::{CostTable, ObstaclePolicy};
use crate::heuristic::HeuristicField;
use crate::layout::Layout;
use crate::movement::{can_advance, CardinalDirection};
use crate::terrain::Terrain;
use crate::DEFAULT_TILE_SIZE;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Static settings of a pursuit session, fixed at startup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PursuitConfig {
    /// Edge length of a tile in world units.
    pub tile_size: i32,
    pub obstacle_policy: ObstaclePolicy,
    pub costs: CostTable,
}

impl Default for PursuitConfig {
    fn default() -> PursuitConfig {
        PursuitConfig {
            tile_size: DEFAULT_TILE_SIZE,
            obstacle_policy: ObstaclePolicy::default(),
            costs: CostTable::default(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PursuitError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("tile size must be positive, got {0}")]
    InvalidTileSize(i32),
    #[error("cost multiplier of {terrain:?} must be finite and positive, got {multiplier}")]
    InvalidMultiplier { terrain: Terrain, multiplier: f32 },
    #[error("no target has been set")]
    NoTarget,
}

/// Outcome of one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub target: CellCoord,
    pub agents: usize,
    pub paths_found: usize,
    /// Cells finalized over all searches of the tick.
    pub expansions: usize,
}

/// Drives the per-tick pursuit: one shared grid and estimate field, one search per agent.
#[derive(Clone, Debug)]
pub struct Pursuit {
    grid: ArenaGrid,
    heuristic: HeuristicField,
    config: PursuitConfig,
}

impl Pursuit {
    pub fn new(layout: &Layout, config: PursuitConfig) -> Result<Pursuit, PursuitError> {
        if config.tile_size <= 0 {
            return Err(PursuitError::InvalidTileSize(config.tile_size));
        }
        if let Some((terrain, multiplier)) = config.costs.invalid_multiplier() {
            return Err(PursuitError::InvalidMultiplier {
                terrain,
                multiplier,
            });
        }
        Ok(Pursuit::build(layout, config))
    }

    /// The default arena with the default configuration.
    pub fn arena() -> Pursuit {
        Pursuit::build(&Layout::arena(), PursuitConfig::default())
    }

    fn build(layout: &Layout, config: PursuitConfig) -> Pursuit {
        let grid = ArenaGrid::new(layout, config.tile_size, &config.costs);
        let heuristic = HeuristicField::new(&grid);
        info!(
            "Pursuit ready on a {}x{} grid with {:?} obstacles",
            grid.rows(),
            grid.cols(),
            config.obstacle_policy
        );
        Pursuit {
            grid,
            heuristic,
            config,
        }
    }

    pub fn grid(&self) -> &ArenaGrid {
        &self.grid
    }
    pub fn heuristic(&self) -> &HeuristicField {
        &self.heuristic
    }
    pub fn config(&self) -> &PursuitConfig {
        &self.config
    }
    pub fn target(&self) -> Option<CellCoord> {
        self.heuristic.target()
    }

    /// Cell under a world position.
    pub fn locate(&self, x: f32, y: f32) -> Result<CellCoord, GridError> {
        self.grid.world_to_cell(x, y)
    }

    /// Moves the target to `target`, recomputing the estimate field if the cell changed.
    pub fn retarget(&mut self, target: CellCoord) -> Result<(), PursuitError> {
        self.grid.checked_id(target)?;
        if self.heuristic.target() != Some(target) {
            self.heuristic.recompute(&self.grid, target);
        }
        Ok(())
    }

    /// Replans a single agent standing on `start` towards the current target.
    pub fn plan(&self, start: CellCoord, agent: &mut AgentPath) -> Result<bool, PursuitError> {
        let target = self.heuristic.target().ok_or(PursuitError::NoTarget)?;
        let start = self.grid.checked_id(start)?;
        let target = self.grid.checked_id(target)?;
        Ok(self.search(start, target, agent))
    }

    fn search(&self, start: CellId, target: CellId, agent: &mut AgentPath) -> bool {
        agent.replan(
            &self.grid,
            &self.heuristic,
            self.config.obstacle_policy,
            start,
            target,
        )
    }

    /// Runs one tick on grid coordinates: retargets, then replans every agent in order. All
    /// coordinates are validated before any agent is touched.
    pub fn tick<'a, I>(&mut self, target: CellCoord, agents: I) -> Result<TickSummary, PursuitError>
    where
        I: IntoIterator<Item = (CellCoord, &'a mut AgentPath)>,
    {
        let target_id = self.grid.checked_id(target)?;
        let agents = agents
            .into_iter()
            .map(|(coord, agent)| Ok((self.grid.checked_id(coord)?, agent)))
            .collect::<Result<Vec<(CellId, &mut AgentPath)>, GridError>>()?;
        self.retarget(target)?;

        let mut summary = TickSummary {
            target,
            agents: agents.len(),
            ..TickSummary::default()
        };
        for (start, agent) in agents {
            if self.search(start, target_id, agent) {
                summary.paths_found += 1;
            }
            summary.expansions += agent.context().expansions();
        }
        debug!(
            "Tick towards {}: {}/{} agents have a path, {} expansions",
            summary.target, summary.paths_found, summary.agents, summary.expansions
        );
        Ok(summary)
    }

    /// Same as [tick](Self::tick) with world positions for the target and every agent.
    pub fn tick_world<'a, I>(
        &mut self,
        target: (f32, f32),
        agents: I,
    ) -> Result<TickSummary, PursuitError>
    where
        I: IntoIterator<Item = ((f32, f32), &'a mut AgentPath)>,
    {
        let target = self.locate(target.0, target.1)?;
        let agents = agents
            .into_iter()
            .map(|((x, y), agent)| Ok((self.locate(x, y)?, agent)))
            .collect::<Result<Vec<_>, GridError>>()?;
        self.tick(target, agents)
    }

    /// Total cost of the agent's current path.
    pub fn path_cost(&self, agent: &AgentPath) -> f32 {
        self.grid.path_cost(agent.path())
    }

    /// Whether the player at world position `(x, y)` may step in `direction`.
    pub fn player_can_advance(
        &self,
        x: f32,
        y: f32,
        direction: CardinalDirection,
    ) -> Result<bool, GridError> {
        Ok(can_advance(&self.grid, self.locate(x, y)?, direction))
    }
}
