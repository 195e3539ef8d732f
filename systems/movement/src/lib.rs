#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that follows planned paths toward the base.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use tank_defence_core::{
    CellCoord, Command, EnemyId, EnemyPhase, EnemySnapshot, EnemyView, ObstacleIndex,
};
use tank_defence_system_pathfinding::PathFinder;
use tracing::debug;

/// Distance under which an enemy snaps onto its current waypoint.
pub const DEFAULT_SNAP_EPSILON: f32 = 0.5;

/// Layout inputs shared by every enemy during one movement pass.
#[derive(Clone, Copy, Debug)]
pub struct MovementContext<'a> {
    /// Walkability index captured for this tick.
    pub obstacles: &'a ObstacleIndex,
    /// World position enemies are heading for.
    pub goal: Vec2,
    /// Layout revision the index was captured at.
    pub layout_revision: u64,
}

/// Pure system that advances moving enemies and emits movement commands.
#[derive(Debug)]
pub struct Movement {
    snap_epsilon: f32,
    routes: BTreeMap<EnemyId, Route>,
}

impl Movement {
    /// Creates a movement system with the provided snap distance.
    #[must_use]
    pub fn new(snap_epsilon: f32) -> Self {
        Self {
            snap_epsilon,
            routes: BTreeMap::new(),
        }
    }

    /// Remaining waypoints of the enemy's current route, if one is planned.
    #[must_use]
    pub fn remaining_route(&self, enemy: EnemyId) -> Option<&[Vec2]> {
        self.routes
            .get(&enemy)
            .map(|route| &route.waypoints[route.cursor.min(route.waypoints.len())..])
    }

    /// Advances every enemy in the `Moving` phase by `dt`.
    ///
    /// Paths are requested when an enemy has none, when its next waypoint is
    /// no longer walkable, or when the goal moved into another cell. A failed
    /// search is retried once the layout revision changes or the enemy enters
    /// another cell; meanwhile the enemy heads straight for the goal. Without a path finder
    /// enemies drive rightward at their move speed.
    pub fn handle(
        &mut self,
        dt: Duration,
        enemies: &EnemyView,
        context: &MovementContext<'_>,
        mut path_finder: Option<&mut PathFinder>,
        out: &mut Vec<Command>,
    ) {
        self.routes.retain(|enemy, _| enemies.get(*enemy).is_some());

        let seconds = dt.as_secs_f32();
        if seconds <= 0.0 {
            return;
        }

        for enemy in enemies.iter() {
            if enemy.phase != EnemyPhase::Moving {
                continue;
            }
            let budget = enemy.profile().move_speed * seconds;

            let destination = match path_finder.as_deref_mut() {
                Some(finder) => self.follow_route(enemy, budget, context, finder),
                None => enemy.position + Vec2::X * budget,
            };

            let travelled = destination - enemy.position;
            if travelled == Vec2::ZERO {
                continue;
            }
            out.push(Command::MoveEnemy {
                enemy: enemy.id,
                position: destination,
                facing: travelled.normalize_or_zero(),
            });
        }
    }

    fn follow_route(
        &mut self,
        enemy: &EnemySnapshot,
        budget: f32,
        context: &MovementContext<'_>,
        finder: &mut PathFinder,
    ) -> Vec2 {
        let grid = context.obstacles.grid();
        let goal_cell = grid.world_to_grid(context.goal);
        let start_cell = grid.world_to_grid(enemy.position);

        let needs_path = match self.routes.get(&enemy.id) {
            None => true,
            Some(route) => route.is_stale(context, start_cell, goal_cell),
        };
        if needs_path {
            let waypoints =
                finder.find_path(context.obstacles, enemy.position, context.goal, None);
            if waypoints.is_empty() {
                debug!(enemy = enemy.id.get(), "goal unreachable; heading straight for it");
            } else {
                debug!(enemy = enemy.id.get(), waypoints = waypoints.len(), "path planned");
            }
            let _ = self.routes.insert(
                enemy.id,
                Route {
                    waypoints,
                    cursor: 0,
                    start_cell,
                    goal_cell,
                    layout_revision: context.layout_revision,
                },
            );
        }

        let snap_epsilon = self.snap_epsilon;
        match self.routes.get_mut(&enemy.id) {
            Some(route) if !route.waypoints.is_empty() => {
                route.advance(enemy.position, budget, snap_epsilon, context.goal)
            }
            _ => step_toward(enemy.position, context.goal, budget, snap_epsilon),
        }
    }
}

impl Default for Movement {
    fn default() -> Self {
        Self::new(DEFAULT_SNAP_EPSILON)
    }
}

#[derive(Clone, Debug)]
struct Route {
    waypoints: Vec<Vec2>,
    cursor: usize,
    start_cell: CellCoord,
    goal_cell: CellCoord,
    layout_revision: u64,
}

impl Route {
    fn is_stale(
        &self,
        context: &MovementContext<'_>,
        start_cell: CellCoord,
        goal_cell: CellCoord,
    ) -> bool {
        if self.goal_cell != goal_cell {
            return true;
        }
        if self.waypoints.is_empty() {
            return self.layout_revision != context.layout_revision
                || self.start_cell != start_cell;
        }
        let obstacles = context.obstacles;
        self.waypoints.get(self.cursor).is_some_and(|waypoint| {
            let cell = obstacles.grid().world_to_grid(*waypoint);
            !obstacles.is_walkable(cell)
        })
    }

    fn advance(&mut self, from: Vec2, budget: f32, snap_epsilon: f32, goal: Vec2) -> Vec2 {
        let mut position = from;
        let mut remaining = budget;

        while let Some(waypoint) = self.waypoints.get(self.cursor).copied() {
            let distance = position.distance(waypoint);
            if distance <= snap_epsilon || distance <= remaining {
                position = waypoint;
                remaining -= distance;
                self.cursor += 1;
                if remaining <= 0.0 {
                    return position;
                }
                continue;
            }
            return position + (waypoint - position) / distance * remaining;
        }

        step_toward(position, goal, remaining, snap_epsilon)
    }
}

fn step_toward(from: Vec2, to: Vec2, budget: f32, snap_epsilon: f32) -> Vec2 {
    let distance = from.distance(to);
    if distance <= snap_epsilon || distance <= budget {
        return to;
    }
    from + (to - from) / distance * budget
}
