#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bounded breadth-first path planning over a grid surface.
//!
//! The planner explores the 4-connected grid from the start cell, expanding
//! only into passable cells and visiting each cell once, so the first time the
//! goal is dequeued the recorded parents describe a route with the fewest cell
//! transitions. Neighbours are always expanded up, down, left, right, which
//! makes the choice between equally short routes reproducible.

use std::collections::{hash_map::Entry, HashMap, VecDeque};

use chase_core::{CellCoord, GridSurface, Path};
use glam::Vec2;

/// Plans a path between two world positions with a fresh search workspace.
///
/// Returns an empty path when both positions share a cell, when the goal is
/// unreachable, or when the goal is not dequeued within `max_iterations`
/// expansions.
#[must_use]
pub fn find_path<S>(start: Vec2, goal: Vec2, surface: &S, max_iterations: usize) -> Path
where
    S: GridSurface + ?Sized,
{
    PathPlanner::default().plan(start, goal, surface, max_iterations)
}

/// How the most recent search terminated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SearchOutcome {
    /// No search has run yet.
    #[default]
    Idle,
    /// Start and goal share a cell; nothing to plan.
    Arrived,
    /// The goal was dequeued and a route reconstructed.
    Found,
    /// Every reachable cell was expanded without meeting the goal.
    Exhausted,
    /// The expansion budget ran out before the goal was dequeued.
    IterationCapReached,
}

impl SearchOutcome {
    /// Reports whether the search produced a usable route.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Arrived | Self::Found)
    }
}

/// Breadth-first planner that keeps its frontier and parent map between
/// searches to avoid reallocating on every replan.
#[derive(Debug, Default)]
pub struct PathPlanner {
    frontier: VecDeque<CellCoord>,
    parents: HashMap<CellCoord, CellCoord>,
    expansions: usize,
    outcome: SearchOutcome,
}

impl PathPlanner {
    /// Creates a planner with empty workspaces.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plans between two world positions and converts the route into cell
    /// centre waypoints.
    #[must_use]
    pub fn plan<S>(&mut self, start: Vec2, goal: Vec2, surface: &S, max_iterations: usize) -> Path
    where
        S: GridSurface + ?Sized,
    {
        let start_cell = surface.world_to_cell(start);
        let goal_cell = surface.world_to_cell(goal);

        match self.plan_cells(start_cell, goal_cell, surface, max_iterations) {
            Some(route) => Path::new(
                route
                    .into_iter()
                    .map(|cell| surface.cell_center(cell))
                    .collect(),
            ),
            None => Path::empty(),
        }
    }

    /// Searches for the shortest 4-connected route between two cells.
    ///
    /// The returned cells exclude `start` and end with `goal`. `Some` with an
    /// empty route means the cells coincide; `None` means no route was found
    /// within the budget.
    pub fn plan_cells<S>(
        &mut self,
        start: CellCoord,
        goal: CellCoord,
        surface: &S,
        max_iterations: usize,
    ) -> Option<Vec<CellCoord>>
    where
        S: GridSurface + ?Sized,
    {
        self.frontier.clear();
        self.parents.clear();
        self.expansions = 0;

        if start == goal {
            self.outcome = SearchOutcome::Arrived;
            return Some(Vec::new());
        }

        let _ = self.parents.insert(start, start);
        self.frontier.push_back(start);

        while let Some(cell) = self.frontier.pop_front() {
            if self.expansions >= max_iterations {
                self.outcome = SearchOutcome::IterationCapReached;
                log::trace!(
                    "search from {start:?} to {goal:?} hit the cap of {max_iterations} expansions"
                );
                return None;
            }
            self.expansions += 1;

            if cell == goal {
                self.outcome = SearchOutcome::Found;
                return Some(self.reconstruct(start, goal));
            }

            for neighbor in cell.cardinal_neighbors() {
                if !surface.is_passable(neighbor) {
                    continue;
                }

                if let Entry::Vacant(slot) = self.parents.entry(neighbor) {
                    let _ = slot.insert(cell);
                    self.frontier.push_back(neighbor);
                }
            }
        }

        self.outcome = SearchOutcome::Exhausted;
        log::trace!(
            "search from {start:?} to {goal:?} exhausted its frontier after {} expansions",
            self.expansions
        );
        None
    }

    /// Number of cells dequeued by the most recent search.
    #[must_use]
    pub fn last_expansions(&self) -> usize {
        self.expansions
    }

    /// Termination reason of the most recent search.
    #[must_use]
    pub fn last_outcome(&self) -> SearchOutcome {
        self.outcome
    }

    fn reconstruct(&self, start: CellCoord, goal: CellCoord) -> Vec<CellCoord> {
        let mut route = Vec::new();
        let mut cell = goal;

        while cell != start {
            route.push(cell);
            match self.parents.get(&cell) {
                Some(parent) => cell = *parent,
                None => break,
            }
        }

        route.reverse();
        route
    }
}
