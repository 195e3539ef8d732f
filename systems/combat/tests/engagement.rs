use std::time::Duration;

use glam::Vec2;
use tank_defence_core::{CellCoord, CombatStance, Combatant, Command, EnemyKind, Event, WeaponKind};
use tank_defence_system_combat::Combat;
use tank_defence_system_targeting::Targeting;
use tank_defence_world::{self as world, query, World, WorldConfig};

const TICK: Duration = Duration::from_millis(100);

struct Harness {
    world: World,
    targeting: Targeting,
    combat: Combat,
    log: Vec<Event>,
}

impl Harness {
    fn new() -> Self {
        Self {
            world: World::new(WorldConfig {
                spawn_duration: Duration::ZERO,
                ..WorldConfig::default()
            }),
            targeting: Targeting::new(),
            combat: Combat::new(),
            log: Vec::new(),
        }
    }

    fn apply(&mut self, command: Command) {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        self.log.extend(events);
    }

    fn step(&mut self) {
        self.apply(Command::Tick { dt: TICK });

        let mut assignments = Vec::new();
        let mut commands = Vec::new();
        let enemies = query::enemy_view(&self.world);
        let weapons = query::weapon_view(&self.world);
        let base = query::base(&self.world);

        self.targeting
            .handle_enemies(&enemies, &weapons, &base, &mut assignments);
        self.combat
            .handle(TICK, &assignments, &enemies, &weapons, &mut commands);
        self.targeting
            .handle_weapons(&weapons, &enemies, &mut assignments);
        self.combat
            .handle(TICK, &assignments, &enemies, &weapons, &mut commands);

        for command in commands {
            self.apply(command);
        }
        self.apply(Command::AdvanceProjectiles { dt: TICK });
    }
}

#[test]
fn enemy_in_range_of_base_holds_position_and_damages_it() {
    let mut harness = Harness::new();
    harness.apply(Command::SpawnEnemy {
        kind: EnemyKind::Tank,
        row: 3,
    });
    harness.step();
    let enemy = query::enemy_view(&harness.world).into_vec()[0].id;
    harness.apply(Command::MoveEnemy {
        enemy,
        position: Vec2::new(500.0, 224.0),
        facing: Vec2::X,
    });

    for _ in 0..30 {
        harness.step();
    }

    let snapshot = query::enemy_view(&harness.world).into_vec()[0];
    assert!(snapshot.phase.is_engaged());
    assert_eq!(snapshot.position, Vec2::new(500.0, 224.0));
    let hits = harness
        .log
        .iter()
        .filter(|event| matches!(event, Event::BaseDamaged { .. }))
        .count();
    assert!(hits >= 1, "base should take damage: {:?}", harness.log);
}

#[test]
fn weapon_destroys_enemy_and_releases_lock() {
    let mut harness = Harness::new();
    harness.apply(Command::PlaceWeapon {
        kind: WeaponKind::Cannon,
        cell: CellCoord::new(3, 1),
    });
    harness.apply(Command::SpawnEnemy {
        kind: EnemyKind::FastTank,
        row: 1,
    });

    for _ in 0..60 {
        harness.step();
    }

    assert!(harness
        .log
        .iter()
        .any(|event| matches!(event, Event::EnemyKilled { reward: 8, .. })));
    assert_eq!(query::live_enemy_count(&harness.world), 0);

    let weapon = query::weapon_view(&harness.world).into_vec()[0].id;
    let stance_events: Vec<_> = harness
        .log
        .iter()
        .filter_map(|event| match event {
            Event::StanceChanged { combatant, stance }
                if *combatant == Combatant::Weapon(weapon) =>
            {
                Some(*stance)
            }
            _ => None,
        })
        .collect();
    assert_eq!(stance_events.last(), Some(&CombatStance::Idle));
}
