use std::time::Duration;

use glam::Vec2;
use tank_defence_core::{CellCoord, Command, EnemyKind, Event, WeaponKind};
use tank_defence_system_movement::{Movement, MovementContext};
use tank_defence_system_pathfinding::PathFinder;
use tank_defence_world::{self as world, query, World, WorldConfig};

const TICK: Duration = Duration::from_millis(100);

fn battlefield(obstacles: &[CellCoord]) -> World {
    let mut world = World::new(WorldConfig {
        spawn_duration: Duration::ZERO,
        ..WorldConfig::default()
    });
    let mut events = Vec::new();
    for cell in obstacles {
        world::apply(&mut world, Command::PlaceObstacle { cell: *cell }, &mut events);
    }
    world::apply(
        &mut world,
        Command::SpawnEnemy {
            kind: EnemyKind::FastTank,
            row: 3,
        },
        &mut events,
    );
    world
}

fn step(world: &mut World, movement: &mut Movement, finder: &mut PathFinder) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, Command::Tick { dt: TICK }, &mut events);

    let enemies = query::enemy_view(world);
    let obstacles = query::obstacle_index(world);
    let context = MovementContext {
        obstacles: &obstacles,
        goal: query::base(world).center(),
        layout_revision: query::layout_revision(world),
    };
    let mut commands = Vec::new();
    movement.handle(TICK, &enemies, &context, Some(finder), &mut commands);
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

fn walk(obstacles: &[CellCoord], ticks: usize) -> Vec<Vec2> {
    let mut world = battlefield(obstacles);
    let mut movement = Movement::default();
    let mut finder = PathFinder::default();
    let mut trail = Vec::new();
    for _ in 0..ticks {
        let _ = step(&mut world, &mut movement, &mut finder);
        if let Some(enemy) = query::enemy_view(&world).iter().next() {
            trail.push(enemy.position);
        }
    }
    trail
}

#[test]
fn enemy_walks_around_obstacle_to_base() {
    let trail = walk(&[CellCoord::new(5, 3)], 200);
    let grid = tank_defence_core::GridModel::new(10, 6, 64.0);

    let cells: Vec<CellCoord> = trail.iter().map(|point| grid.world_to_grid(*point)).collect();
    assert!(!cells.contains(&CellCoord::new(5, 3)));
    assert!(cells.contains(&CellCoord::new(5, 2)) || cells.contains(&CellCoord::new(5, 4)));
    assert_eq!(trail.last(), Some(&Vec2::new(608.0, 224.0)));

    for pair in trail.windows(2) {
        let travelled = pair[0].distance(pair[1]);
        assert!(travelled <= 7.0 + 1e-3, "moved {travelled} in one tick");
    }
}

#[test]
fn obstacle_dropped_in_front_of_enemy_forces_detour() {
    let mut world = battlefield(&[]);
    let mut movement = Movement::default();
    let mut finder = PathFinder::default();

    for _ in 0..5 {
        let _ = step(&mut world, &mut movement, &mut finder);
    }
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::PlaceObstacle {
            cell: CellCoord::new(2, 3),
        },
        &mut events,
    );

    let grid = *query::grid(&world);
    for _ in 0..200 {
        let _ = step(&mut world, &mut movement, &mut finder);
        if let Some(enemy) = query::enemy_view(&world).iter().next() {
            assert_ne!(grid.world_to_grid(enemy.position), CellCoord::new(2, 3));
        }
    }
    let enemy = query::enemy_view(&world).into_vec()[0];
    assert_eq!(enemy.position, query::base(&world).center());
}

#[test]
fn weapon_built_on_enemy_cell_does_not_open_the_obstacles() {
    let mut world = battlefield(&[CellCoord::new(5, 3)]);
    let mut movement = Movement::default();
    let mut finder = PathFinder::default();
    let grid = *query::grid(&world);
    let blocked = CellCoord::new(2, 3);

    for _ in 0..40 {
        let _ = step(&mut world, &mut movement, &mut finder);
        let enemy = query::enemy_view(&world).into_vec()[0];
        if grid.world_to_grid(enemy.position) == blocked {
            break;
        }
    }
    let enemy = query::enemy_view(&world).into_vec()[0];
    assert_eq!(grid.world_to_grid(enemy.position), blocked);

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::PlaceWeapon {
            kind: WeaponKind::MachineGun,
            cell: blocked,
        },
        &mut events,
    );
    assert!(query::weapon_at(&world, blocked).is_some());

    let mut visited = Vec::new();
    for _ in 0..200 {
        let _ = step(&mut world, &mut movement, &mut finder);
        if let Some(enemy) = query::enemy_view(&world).iter().next() {
            let cell = grid.world_to_grid(enemy.position);
            if visited.last() != Some(&cell) {
                visited.push(cell);
            }
        }
    }

    assert!(
        !visited.contains(&CellCoord::new(5, 3)),
        "enemy crossed the obstacle: {visited:?}"
    );
    let enemy = query::enemy_view(&world).into_vec()[0];
    assert_eq!(enemy.position, query::base(&world).center());
}

#[test]
fn repeated_runs_produce_identical_trails() {
    let obstacles = [CellCoord::new(3, 2), CellCoord::new(3, 3), CellCoord::new(6, 4)];
    let first = walk(&obstacles, 150);
    let second = walk(&obstacles, 150);

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.len(), 150);
}
