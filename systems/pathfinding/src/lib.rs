#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Four-directional A* path search over the battlefield grid.

use std::{cmp::Reverse, collections::BinaryHeap};

use glam::Vec2;
use tank_defence_core::{CellCoord, GridModel, ObstacleIndex};
use tracing::trace;

/// Number of rings searched around an unwalkable goal by default.
pub const DEFAULT_SEARCH_RADIUS: u32 = 5;

/// A* path finder that reuses its search buffers between queries.
///
/// Edge cost is one per orthogonal step and the heuristic is the Manhattan
/// distance, so returned paths are shortest paths. Among open nodes with equal
/// `f` the search prefers the smaller heuristic and then the node inserted
/// first, which keeps results stable across runs.
#[derive(Debug)]
pub struct PathFinder {
    search_radius: u32,
    g_scores: Vec<u32>,
    came_from: Vec<Option<usize>>,
    closed: Vec<bool>,
    open: BinaryHeap<Reverse<OpenNode>>,
}

impl PathFinder {
    /// Creates a path finder that searches `search_radius` rings for a fallback goal.
    #[must_use]
    pub fn new(search_radius: u32) -> Self {
        Self {
            search_radius,
            g_scores: Vec::new(),
            came_from: Vec::new(),
            closed: Vec::new(),
            open: BinaryHeap::new(),
        }
    }

    /// Number of rings searched around an unwalkable goal.
    #[must_use]
    pub fn search_radius(&self) -> u32 {
        self.search_radius
    }

    /// Reports whether the cell is walkable, treating `transient` as blocked.
    #[must_use]
    pub fn is_walkable(
        index: &ObstacleIndex,
        cell: CellCoord,
        transient: Option<CellCoord>,
    ) -> bool {
        index.is_walkable_with(cell, transient)
    }

    /// Finds the walkable cell closest to `goal`.
    ///
    /// Returns `goal` itself when it is walkable. Otherwise rings of growing
    /// Chebyshev radius are searched up to the configured search radius; within
    /// the first ring containing a walkable cell the one with the smallest
    /// Euclidean distance wins, ties resolved in row-major order.
    #[must_use]
    pub fn nearest_walkable(
        &self,
        index: &ObstacleIndex,
        goal: CellCoord,
        transient: Option<CellCoord>,
    ) -> Option<CellCoord> {
        if index.is_walkable_with(goal, transient) {
            return Some(goal);
        }

        let max_radius = i32::try_from(self.search_radius).unwrap_or(i32::MAX);
        for radius in 1..=max_radius {
            let mut best: Option<(i64, CellCoord)> = None;
            for row_offset in -radius..=radius {
                for column_offset in -radius..=radius {
                    if row_offset.abs() != radius && column_offset.abs() != radius {
                        continue;
                    }
                    let (Some(column), Some(row)) = (
                        goal.column().checked_add(column_offset),
                        goal.row().checked_add(row_offset),
                    ) else {
                        continue;
                    };
                    let candidate = CellCoord::new(column, row);
                    if !index.is_walkable_with(candidate, transient) {
                        continue;
                    }
                    let distance_sq =
                        i64::from(column_offset).pow(2) + i64::from(row_offset).pow(2);
                    if best.map_or(true, |(current, _)| distance_sq < current) {
                        best = Some((distance_sq, candidate));
                    }
                }
            }
            if let Some((_, cell)) = best {
                return Some(cell);
            }
        }
        None
    }

    /// Computes a path between two world positions.
    ///
    /// The result holds the centres of every cell from the cell containing
    /// `start` to the cell containing the effective goal, inclusive. An empty
    /// result means the start is unwalkable, no walkable goal exists within
    /// the search radius, or the goal cannot be reached.
    pub fn find_path(
        &mut self,
        index: &ObstacleIndex,
        start: Vec2,
        goal: Vec2,
        transient: Option<CellCoord>,
    ) -> Vec<Vec2> {
        let grid = *index.grid();
        let start_cell = grid.world_to_grid(start);
        let goal_cell = grid.world_to_grid(goal);
        self.find_cell_path(index, start_cell, goal_cell, transient)
            .into_iter()
            .map(|cell| grid.grid_to_world(cell))
            .collect()
    }

    /// Computes a path between two cells, returning the visited cells in order.
    pub fn find_cell_path(
        &mut self,
        index: &ObstacleIndex,
        start: CellCoord,
        goal: CellCoord,
        transient: Option<CellCoord>,
    ) -> Vec<CellCoord> {
        if !index.is_walkable_with(start, transient) {
            trace!(?start, "path search rejected: start is not walkable");
            return Vec::new();
        }

        let Some(goal) = self.nearest_walkable(index, goal, transient) else {
            trace!(?goal, "path search rejected: no walkable goal nearby");
            return Vec::new();
        };

        if start == goal {
            return vec![start];
        }

        let grid = index.grid();
        let (Some(start_index), Some(goal_index)) = (grid.index(start), grid.index(goal)) else {
            return Vec::new();
        };

        self.reset(grid.cell_count());
        self.g_scores[start_index] = 0;
        let mut sequence = 0_u64;
        let start_h = start.manhattan_distance(goal);
        self.open.push(Reverse(OpenNode {
            f: start_h,
            h: start_h,
            sequence,
            index: start_index,
        }));

        let mut expanded = 0_usize;
        while let Some(Reverse(node)) = self.open.pop() {
            if self.closed[node.index] {
                continue;
            }
            self.closed[node.index] = true;
            expanded += 1;

            if node.index == goal_index {
                trace!(expanded, "path search reached goal");
                return self.reconstruct(grid, goal_index);
            }

            let Some(cell) = grid.cell_at(node.index) else {
                continue;
            };
            let next_g = self.g_scores[node.index].saturating_add(1);

            for neighbor in cell.neighbors() {
                if !index.is_walkable_with(neighbor, transient) {
                    continue;
                }
                let Some(neighbor_index) = grid.index(neighbor) else {
                    continue;
                };
                if self.closed[neighbor_index] || next_g >= self.g_scores[neighbor_index] {
                    continue;
                }

                self.g_scores[neighbor_index] = next_g;
                self.came_from[neighbor_index] = Some(node.index);
                let h = neighbor.manhattan_distance(goal);
                sequence += 1;
                self.open.push(Reverse(OpenNode {
                    f: next_g.saturating_add(h),
                    h,
                    sequence,
                    index: neighbor_index,
                }));
            }
        }

        trace!(?start, ?goal, expanded, "path search exhausted the open set");
        Vec::new()
    }

    fn reset(&mut self, cell_count: usize) {
        self.open.clear();
        self.g_scores.clear();
        self.g_scores.resize(cell_count, u32::MAX);
        self.came_from.clear();
        self.came_from.resize(cell_count, None);
        self.closed.clear();
        self.closed.resize(cell_count, false);
    }

    fn reconstruct(&self, grid: &GridModel, goal_index: usize) -> Vec<CellCoord> {
        let mut cells = Vec::new();
        let mut cursor = Some(goal_index);
        while let Some(current) = cursor {
            if let Some(cell) = grid.cell_at(current) {
                cells.push(cell);
            }
            cursor = self.came_from[current];
        }
        cells.reverse();
        cells
    }
}

impl Default for PathFinder {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_RADIUS)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenNode {
    f: u32,
    h: u32,
    sequence: u64,
    index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(columns: u32, rows: u32, obstacles: &[CellCoord]) -> ObstacleIndex {
        ObstacleIndex::new(
            GridModel::new(columns, rows, 10.0),
            obstacles.to_vec(),
            Vec::new(),
        )
    }

    fn assert_valid(index: &ObstacleIndex, cells: &[CellCoord]) {
        for cell in cells {
            assert!(index.is_walkable(*cell), "{cell:?} is not walkable");
        }
        for pair in cells.windows(2) {
            assert!(pair[0].is_adjacent(pair[1]), "{pair:?} are not adjacent");
        }
    }

    #[test]
    fn open_grid_path_is_manhattan_optimal() {
        let index = index(6, 5, &[]);
        let mut finder = PathFinder::default();
        let start = CellCoord::new(0, 0);
        let goal = CellCoord::new(4, 3);

        let cells = finder.find_cell_path(&index, start, goal, None);

        assert_eq!(cells.len(), start.manhattan_distance(goal) as usize + 1);
        assert_eq!(cells.first(), Some(&start));
        assert_eq!(cells.last(), Some(&goal));
        assert_valid(&index, &cells);
    }

    #[test]
    fn path_routes_around_wall() {
        let wall = [
            CellCoord::new(2, 0),
            CellCoord::new(2, 1),
            CellCoord::new(2, 2),
        ];
        let index = index(5, 4, &wall);
        let mut finder = PathFinder::default();

        let cells = finder.find_cell_path(&index, CellCoord::new(0, 0), CellCoord::new(4, 0), None);

        assert_eq!(cells.len(), 11);
        assert!(cells.contains(&CellCoord::new(2, 3)));
        assert_valid(&index, &cells);
    }

    #[test]
    fn enclosed_goal_is_unreachable() {
        let ring = [
            CellCoord::new(2, 1),
            CellCoord::new(1, 2),
            CellCoord::new(3, 2),
            CellCoord::new(2, 3),
        ];
        let index = index(5, 5, &ring);
        let mut finder = PathFinder::default();

        let cells = finder.find_cell_path(&index, CellCoord::new(0, 0), CellCoord::new(2, 2), None);

        assert!(cells.is_empty());
    }

    #[test]
    fn same_cell_yields_single_centre() {
        let index = index(4, 4, &[]);
        let mut finder = PathFinder::default();

        let path = finder.find_path(&index, Vec2::new(11.0, 12.0), Vec2::new(19.0, 18.0), None);

        assert_eq!(path, vec![Vec2::new(15.0, 15.0)]);
    }

    #[test]
    fn unwalkable_start_fails_closed() {
        let index = index(4, 4, &[CellCoord::new(0, 0)]);
        let mut finder = PathFinder::default();

        assert!(finder
            .find_cell_path(&index, CellCoord::new(0, 0), CellCoord::new(3, 3), None)
            .is_empty());
        assert!(finder
            .find_cell_path(&index, CellCoord::new(-1, 0), CellCoord::new(3, 3), None)
            .is_empty());
    }

    #[test]
    fn blocked_goal_falls_back_to_nearest_ring_cell() {
        let index = index(10, 6, &[CellCoord::new(9, 3)]);
        let finder = PathFinder::default();

        assert_eq!(
            finder.nearest_walkable(&index, CellCoord::new(9, 3), None),
            Some(CellCoord::new(9, 2))
        );
    }

    #[test]
    fn blocked_goal_without_walkable_ring_is_unreachable() {
        let mut blocked = Vec::new();
        for row in 0..3 {
            for column in 0..3 {
                blocked.push(CellCoord::new(column, row));
            }
        }
        let index = index(3, 3, &blocked);
        let finder = PathFinder::new(1);

        assert_eq!(finder.nearest_walkable(&index, CellCoord::new(1, 1), None), None);
    }

    #[test]
    fn transient_obstacle_blocks_single_lane() {
        let index = index(5, 1, &[]);
        let mut finder = PathFinder::default();
        let start = CellCoord::new(0, 0);
        let goal = CellCoord::new(4, 0);

        assert_eq!(finder.find_cell_path(&index, start, goal, None).len(), 5);
        assert!(finder
            .find_cell_path(&index, start, goal, Some(CellCoord::new(2, 0)))
            .is_empty());
        assert!(!PathFinder::is_walkable(&index, CellCoord::new(2, 0), Some(CellCoord::new(2, 0))));
        assert!(PathFinder::is_walkable(&index, CellCoord::new(2, 0), None));
    }

    #[test]
    fn repeated_searches_give_identical_paths() {
        let index = index(8, 8, &[CellCoord::new(3, 3), CellCoord::new(4, 3)]);
        let mut finder = PathFinder::default();

        let start = CellCoord::new(0, 3);
        let goal = CellCoord::new(7, 3);
        let first = finder.find_cell_path(&index, start, goal, None);
        let second = finder.find_cell_path(&index, start, goal, None);

        assert_eq!(first, second);
        assert_eq!(first.len(), 10);
    }
}
