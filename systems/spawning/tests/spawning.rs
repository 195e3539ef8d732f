use std::time::Duration;

use tank_defence_core::{CellCoord, Command, EnemyKind, Event};
use tank_defence_system_spawning::{Spawning, Wave, WaveManager, WavePlan};
use tank_defence_world::{self as world, query, World};

fn run_ticks(
    world: &mut World,
    spawning: &mut Spawning,
    waves: &mut WavePlan,
    ticks: usize,
) -> Vec<Event> {
    let dt = Duration::from_millis(250);
    let mut log = Vec::new();
    for _ in 0..ticks {
        let mut events = Vec::new();
        world::apply(world, Command::Tick { dt }, &mut events);

        let rows = query::spawn_rows(world);
        let mut commands = Vec::new();
        spawning.handle(dt, waves, &rows, query::live_enemy_count(world), &mut commands);
        for command in commands {
            world::apply(world, command, &mut events);
        }
        log.extend(events);
    }
    log
}

#[test]
fn spawned_enemies_enter_on_walkable_left_edge_rows() {
    let mut world = World::default();
    let mut events = Vec::new();
    for row in [0, 1, 2, 4, 5] {
        world::apply(
            &mut world,
            Command::PlaceObstacle {
                cell: CellCoord::new(0, row),
            },
            &mut events,
        );
    }

    let mut waves = WavePlan::new(vec![Wave {
        enemies: vec![EnemyKind::Tank, EnemyKind::HeavyTank, EnemyKind::FastTank],
        spawn_interval: Duration::from_millis(500),
    }]);
    let mut spawning = Spawning::new(0x5eed);
    let log = run_ticks(&mut world, &mut spawning, &mut waves, 8);

    let spawned: Vec<EnemyKind> = log
        .iter()
        .filter_map(|event| match event {
            Event::EnemySpawned { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect();
    assert_eq!(
        spawned,
        vec![EnemyKind::Tank, EnemyKind::HeavyTank, EnemyKind::FastTank]
    );

    let grid = *query::grid(&world);
    for enemy in query::enemy_view(&world).iter() {
        assert_eq!(grid.world_to_grid(enemy.position), CellCoord::new(0, 3));
    }
}

#[test]
fn next_wave_waits_for_the_battlefield_to_clear() {
    let mut world = World::default();
    let mut waves = WavePlan::new(vec![
        Wave {
            enemies: vec![EnemyKind::FastTank],
            spawn_interval: Duration::from_millis(250),
        },
        Wave {
            enemies: vec![EnemyKind::Boss],
            spawn_interval: Duration::from_millis(250),
        },
    ]);
    let mut spawning = Spawning::new(3);

    let _ = run_ticks(&mut world, &mut spawning, &mut waves, 10);
    assert_eq!(waves.wave_level(), 1, "the first enemy is still alive");
    assert_eq!(query::live_enemy_count(&world), 1);
    assert!(!spawning.is_finished());
}
