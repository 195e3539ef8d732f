#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! One battlefield session: owns the world, drives the systems every tick and
//! keeps the player's gold and play state.

mod config;

use std::time::Duration;

use glam::Vec2;
use tank_defence_core::{
    BaseSnapshot, BulletSnapshot, CellCoord, Command, EnemyView, EntityRef, Event, PlacementError,
    PlayState, TargetAssignment, WeaponActionError, WeaponId, WeaponKind, WeaponView,
};
use tank_defence_system_combat::Combat;
use tank_defence_system_movement::{Movement, MovementContext};
use tank_defence_system_pathfinding::PathFinder;
use tank_defence_system_spawning::{Spawning, WaveManager, WavePlan};
use tank_defence_system_targeting::Targeting;
use tank_defence_world::{self as world, query, World};
use tracing::{debug, info, warn};

pub use config::{BaseConfig, BulletConfig, ConfigError, SessionConfig, WaveConfig};

/// Receives notifications about entity lifecycle moments for presentation.
///
/// Every method defaults to doing nothing; the unit type is a no-op sink.
pub trait EffectHooks {
    /// An entity appeared on the battlefield.
    fn on_spawn(&mut self, _entity: EntityRef) {}

    /// An entity took damage.
    fn on_hit(&mut self, _entity: EntityRef) {}

    /// An entity was destroyed.
    fn on_death(&mut self, _entity: EntityRef) {}
}

impl EffectHooks for () {}

/// Running totals collected over a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Ticks simulated while running.
    pub ticks: u64,
    /// Enemies that entered the battlefield.
    pub enemies_spawned: u32,
    /// Enemies destroyed by weapons.
    pub enemies_killed: u32,
    /// Enemies that left the battlefield on the far side.
    pub enemies_exited: u32,
    /// Projectiles fired by either faction.
    pub bullets_fired: u32,
    /// Gold granted for destroyed enemies.
    pub gold_earned: u32,
}

/// A single battlefield session.
#[derive(Debug)]
pub struct Session {
    world: World,
    path_finder: PathFinder,
    movement: Movement,
    targeting: Targeting,
    combat: Combat,
    spawning: Spawning,
    waves: Box<dyn WaveManager>,
    gold: u32,
    play_state: PlayState,
    stats: SessionStats,
    assignments: Vec<TargetAssignment>,
    commands: Vec<Command>,
    events: Vec<Event>,
}

impl Session {
    /// Creates a session that plays the configured waves.
    pub fn new(config: &SessionConfig) -> Result<Self, ConfigError> {
        let waves = Box::new(WavePlan::new(config.waves()));
        Self::with_wave_manager(config, waves)
    }

    /// Creates a session whose waves come from the provided manager.
    pub fn with_wave_manager(
        config: &SessionConfig,
        waves: Box<dyn WaveManager>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut world = World::new(config.world_config());
        let mut events = Vec::new();
        for cell in &config.obstacles {
            world::apply(&mut world, Command::PlaceObstacle { cell: *cell }, &mut events);
        }
        for event in events.drain(..) {
            if let Event::ObstaclePlacementRejected { cell, reason } = event {
                warn!(?cell, %reason, "configured obstacle skipped");
            }
        }

        Ok(Self {
            world,
            path_finder: PathFinder::new(config.search_radius),
            movement: Movement::new(config.snap_epsilon),
            targeting: Targeting::new(),
            combat: Combat::new(),
            spawning: Spawning::new(config.seed),
            waves,
            gold: config.starting_gold,
            play_state: PlayState::NotStarted,
            stats: SessionStats::default(),
            assignments: Vec::new(),
            commands: Vec::new(),
            events,
        })
    }

    /// Starts or resumes the simulation.
    pub fn start(&mut self) {
        if matches!(self.play_state, PlayState::NotStarted | PlayState::Paused) {
            self.play_state = PlayState::Running;
            info!(banner = query::welcome_banner(&self.world), "session running");
        }
    }

    /// Pauses a running simulation.
    pub fn pause(&mut self) {
        if self.play_state == PlayState::Running {
            self.play_state = PlayState::Paused;
        }
    }

    /// Current play state.
    #[must_use]
    pub fn play_state(&self) -> PlayState {
        self.play_state
    }

    /// Gold currently available to the player.
    #[must_use]
    pub fn gold(&self) -> u32 {
        self.gold
    }

    /// Statistics gathered so far.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// One-based number of the wave being played.
    #[must_use]
    pub fn wave_level(&self) -> u32 {
        self.waves.wave_level()
    }

    /// Fraction of the current wave already spawned.
    #[must_use]
    pub fn wave_progress(&self) -> f32 {
        self.waves.wave_progress()
    }

    /// Reports whether every configured wave was spawned and cleared.
    #[must_use]
    pub fn waves_cleared(&self) -> bool {
        self.spawning.is_finished()
    }

    /// Read-only access to the underlying world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Every live enemy.
    #[must_use]
    pub fn enemies(&self) -> EnemyView {
        query::enemy_view(&self.world)
    }

    /// Every placed weapon.
    #[must_use]
    pub fn weapons(&self) -> WeaponView {
        query::weapon_view(&self.world)
    }

    /// Every live projectile.
    #[must_use]
    pub fn bullets(&self) -> Vec<BulletSnapshot> {
        query::bullets(&self.world)
    }

    /// Current state of the base.
    #[must_use]
    pub fn base(&self) -> BaseSnapshot {
        query::base(&self.world)
    }

    /// Reports whether a static obstacle occupies the cell.
    #[must_use]
    pub fn has_obstacle_at(&self, cell: CellCoord) -> bool {
        query::has_obstacle_at(&self.world, cell)
    }

    /// Reports whether enemies may walk through the cell.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        query::is_walkable(&self.world, cell, None)
    }

    /// Computes a path between two world positions on the current layout.
    pub fn find_path(
        &mut self,
        start: Vec2,
        goal: Vec2,
        transient: Option<CellCoord>,
    ) -> Vec<Vec2> {
        let obstacles = query::obstacle_index(&self.world);
        self.path_finder.find_path(&obstacles, start, goal, transient)
    }

    /// Validates a weapon placement without performing it.
    pub fn check_placement(
        &mut self,
        kind: WeaponKind,
        cell: CellCoord,
    ) -> Result<(), PlacementError> {
        let grid = query::grid(&self.world);
        if !grid.is_in_bounds(cell) {
            return Err(PlacementError::OutOfBounds);
        }
        if query::is_base_cell(&self.world, cell) {
            return Err(PlacementError::BaseCell);
        }
        if query::has_obstacle_at(&self.world, cell)
            || query::weapon_at(&self.world, cell).is_some()
        {
            return Err(PlacementError::Occupied);
        }
        if self.gold < kind.build_cost() {
            return Err(PlacementError::InsufficientGold);
        }
        if self.cuts_every_route(cell) {
            return Err(PlacementError::BlocksPath);
        }
        Ok(())
    }

    /// Places a weapon, debiting its build cost.
    pub fn place_weapon(
        &mut self,
        kind: WeaponKind,
        cell: CellCoord,
    ) -> Result<WeaponId, PlacementError> {
        self.check_placement(kind, cell)?;

        let mut events = Vec::new();
        world::apply(&mut self.world, Command::PlaceWeapon { kind, cell }, &mut events);
        for event in events {
            match event {
                Event::WeaponPlaced { weapon, .. } => {
                    self.gold -= kind.build_cost();
                    debug!(weapon = weapon.get(), gold = self.gold, "weapon purchased");
                    return Ok(weapon);
                }
                Event::WeaponPlacementRejected { reason, .. } => return Err(reason),
                _ => {}
            }
        }
        Err(PlacementError::Occupied)
    }

    /// Raises a weapon by one level, debiting the upgrade cost.
    pub fn upgrade_weapon(&mut self, weapon: WeaponId) -> Result<u8, WeaponActionError> {
        let snapshot = query::weapon_view(&self.world)
            .get(weapon)
            .copied()
            .ok_or(WeaponActionError::MissingWeapon)?;
        let cost = snapshot
            .kind
            .upgrade_cost(snapshot.level)
            .ok_or(WeaponActionError::MaxLevel)?;
        if self.gold < cost {
            return Err(WeaponActionError::InsufficientGold);
        }

        let mut events = Vec::new();
        world::apply(&mut self.world, Command::UpgradeWeapon { weapon }, &mut events);
        for event in events {
            match event {
                Event::WeaponUpgraded { level, .. } => {
                    self.gold -= cost;
                    return Ok(level);
                }
                Event::WeaponActionRejected { reason, .. } => return Err(reason),
                _ => {}
            }
        }
        Err(WeaponActionError::MissingWeapon)
    }

    /// Removes a weapon and refunds half of the gold invested in it.
    pub fn sell_weapon(&mut self, weapon: WeaponId) -> Result<u32, WeaponActionError> {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::SellWeapon { weapon }, &mut events);
        for event in events {
            match event {
                Event::WeaponSold { refund, .. } => {
                    self.gold = self.gold.saturating_add(refund);
                    return Ok(refund);
                }
                Event::WeaponActionRejected { reason, .. } => return Err(reason),
                _ => {}
            }
        }
        Err(WeaponActionError::MissingWeapon)
    }

    /// Advances the simulation by `dt` and returns the events it produced.
    ///
    /// Nothing happens unless the session is running. Within a tick enemies
    /// are spawned, then enemy combat decides locks, unlocked enemies move,
    /// weapons fight, and finally projectiles are resolved.
    pub fn update(&mut self, dt: Duration, hooks: &mut dyn EffectHooks) -> &[Event] {
        self.events.clear();
        if !self.play_state.can_update() {
            return &self.events;
        }
        self.stats.ticks += 1;

        self.apply(Command::Tick { dt });

        let spawn_rows = query::spawn_rows(&self.world);
        let live_enemies = query::live_enemy_count(&self.world);
        self.spawning.handle(
            dt,
            self.waves.as_mut(),
            &spawn_rows,
            live_enemies,
            &mut self.commands,
        );
        self.flush_commands();

        let enemies = query::enemy_view(&self.world);
        let weapons = query::weapon_view(&self.world);
        let base = query::base(&self.world);
        self.targeting
            .handle_enemies(&enemies, &weapons, &base, &mut self.assignments);
        self.combat
            .handle(dt, &self.assignments, &enemies, &weapons, &mut self.commands);
        self.flush_commands();

        let enemies = query::enemy_view(&self.world);
        let obstacles = query::obstacle_index(&self.world);
        let context = MovementContext {
            obstacles: &obstacles,
            goal: query::base(&self.world).center(),
            layout_revision: query::layout_revision(&self.world),
        };
        self.movement.handle(
            dt,
            &enemies,
            &context,
            Some(&mut self.path_finder),
            &mut self.commands,
        );
        self.flush_commands();

        let enemies = query::enemy_view(&self.world);
        let weapons = query::weapon_view(&self.world);
        self.targeting
            .handle_weapons(&weapons, &enemies, &mut self.assignments);
        self.combat
            .handle(dt, &self.assignments, &enemies, &weapons, &mut self.commands);
        self.flush_commands();

        self.apply(Command::AdvanceProjectiles { dt });

        self.settle_events(hooks);
        &self.events
    }

    fn apply(&mut self, command: Command) {
        world::apply(&mut self.world, command, &mut self.events);
    }

    fn flush_commands(&mut self) {
        let commands = std::mem::take(&mut self.commands);
        for command in commands {
            self.apply(command);
        }
    }

    fn settle_events(&mut self, hooks: &mut dyn EffectHooks) {
        for event in &self.events {
            match *event {
                Event::EnemySpawned { enemy, .. } => {
                    self.stats.enemies_spawned += 1;
                    hooks.on_spawn(EntityRef::Enemy(enemy));
                }
                Event::BulletFired { bullet, .. } => {
                    self.stats.bullets_fired += 1;
                    hooks.on_spawn(EntityRef::Bullet(bullet));
                }
                Event::EnemyDamaged { enemy, .. } => hooks.on_hit(EntityRef::Enemy(enemy)),
                Event::BaseDamaged { .. } => hooks.on_hit(EntityRef::Base),
                Event::EnemyKilled { enemy, reward } => {
                    self.gold = self.gold.saturating_add(reward);
                    self.stats.enemies_killed += 1;
                    self.stats.gold_earned = self.stats.gold_earned.saturating_add(reward);
                    hooks.on_death(EntityRef::Enemy(enemy));
                }
                Event::EnemyExited { .. } => self.stats.enemies_exited += 1,
                Event::BaseDestroyed => {
                    self.play_state = PlayState::GameOver;
                    info!(wave = self.waves.wave_level(), "game over");
                    hooks.on_death(EntityRef::Base);
                }
                _ => {}
            }
        }
    }

    fn cuts_every_route(&mut self, cell: CellCoord) -> bool {
        let grid = *query::grid(&self.world);
        let goal = query::base(&self.world).center();
        let obstacles = query::obstacle_index(&self.world);
        let rows = query::spawn_rows(&self.world);

        let mut reachable_before = false;
        for row in rows {
            let Ok(row) = i32::try_from(row) else {
                continue;
            };
            let start = grid.grid_to_world(CellCoord::new(0, row));
            if self.path_finder.find_path(&obstacles, start, goal, None).is_empty() {
                continue;
            }
            reachable_before = true;
            if !self
                .path_finder
                .find_path(&obstacles, start, goal, Some(cell))
                .is_empty()
            {
                return false;
            }
        }
        reachable_before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tank_defence_core::EnemyKind;
    use tank_defence_system_spawning::Wave;

    const TICK: Duration = Duration::from_millis(100);

    fn quiet_config() -> SessionConfig {
        SessionConfig {
            obstacles: Vec::new(),
            waves: vec![WaveConfig {
                enemies: vec![EnemyKind::Tank],
                spawn_interval_ms: 100,
            }],
            spawn_duration_ms: 0,
            ..SessionConfig::default()
        }
    }

    #[derive(Default)]
    struct Recorder {
        spawned: Vec<EntityRef>,
        hit: Vec<EntityRef>,
        died: Vec<EntityRef>,
    }

    impl EffectHooks for Recorder {
        fn on_spawn(&mut self, entity: EntityRef) {
            self.spawned.push(entity);
        }

        fn on_hit(&mut self, entity: EntityRef) {
            self.hit.push(entity);
        }

        fn on_death(&mut self, entity: EntityRef) {
            self.died.push(entity);
        }
    }

    #[test]
    fn not_started_session_does_not_advance() {
        let mut session = Session::new(&quiet_config()).expect("valid config");
        assert!(session.update(TICK, &mut ()).is_empty());
        assert_eq!(session.stats().ticks, 0);

        session.start();
        assert!(!session.update(TICK, &mut ()).is_empty());
        session.pause();
        assert!(session.update(TICK, &mut ()).is_empty());
        assert_eq!(session.play_state(), PlayState::Paused);
    }

    #[test]
    fn placement_debits_gold_and_rejects_when_poor() {
        let mut session = Session::new(&SessionConfig {
            starting_gold: 120,
            ..quiet_config()
        })
        .expect("valid config");

        let weapon = session
            .place_weapon(WeaponKind::Cannon, CellCoord::new(3, 1))
            .expect("affordable placement");
        assert_eq!(session.gold(), 20);
        assert_eq!(
            session.check_placement(WeaponKind::MachineGun, CellCoord::new(3, 2)),
            Err(PlacementError::InsufficientGold)
        );
        assert_eq!(
            session.check_placement(WeaponKind::MachineGun, CellCoord::new(3, 1)),
            Err(PlacementError::Occupied)
        );
        assert_eq!(
            session.check_placement(WeaponKind::MachineGun, CellCoord::new(9, 3)),
            Err(PlacementError::BaseCell)
        );
        assert_eq!(
            session.check_placement(WeaponKind::MachineGun, CellCoord::new(-1, 0)),
            Err(PlacementError::OutOfBounds)
        );
        assert!(!session.is_walkable(CellCoord::new(3, 1)));

        assert_eq!(session.upgrade_weapon(weapon), Err(WeaponActionError::InsufficientGold));
        assert_eq!(session.sell_weapon(weapon), Ok(50));
        assert_eq!(session.gold(), 70);
        assert_eq!(session.sell_weapon(weapon), Err(WeaponActionError::MissingWeapon));
    }

    #[test]
    fn upgrades_stop_at_max_level() {
        let mut session = Session::new(&SessionConfig {
            starting_gold: 1_000,
            ..quiet_config()
        })
        .expect("valid config");
        let weapon = session
            .place_weapon(WeaponKind::MachineGun, CellCoord::new(2, 2))
            .expect("placement");

        assert_eq!(session.upgrade_weapon(weapon), Ok(2));
        assert_eq!(session.upgrade_weapon(weapon), Ok(3));
        assert_eq!(session.upgrade_weapon(weapon), Err(WeaponActionError::MaxLevel));
        assert_eq!(session.gold(), 1_000 - 50 - 40 - 80);
        assert_eq!(session.sell_weapon(weapon), Ok((50 + 40 + 80) / 2));
    }

    #[test]
    fn placement_that_seals_the_base_is_rejected() {
        let walls: Vec<CellCoord> = (0..6)
            .filter(|row| *row != 4)
            .map(|row| CellCoord::new(6, row))
            .collect();
        let mut session = Session::new(&SessionConfig {
            obstacles: walls,
            ..quiet_config()
        })
        .expect("valid config");

        assert_eq!(
            session.check_placement(WeaponKind::MachineGun, CellCoord::new(6, 4)),
            Err(PlacementError::BlocksPath)
        );
        assert_eq!(
            session.check_placement(WeaponKind::MachineGun, CellCoord::new(5, 4)),
            Ok(())
        );
        assert!(session.has_obstacle_at(CellCoord::new(6, 0)));
    }

    #[test]
    fn path_queries_use_current_layout() {
        let mut session = Session::new(&SessionConfig::default()).expect("valid config");
        let start = Vec2::new(32.0, 224.0);
        let goal = session.base().center();

        let path = session.find_path(start, goal, None);
        assert_eq!(path.len(), 12);
        assert!(session.find_path(start, start, None) == vec![start]);
    }

    #[test]
    fn hooks_observe_spawns() {
        let mut session = Session::with_wave_manager(
            &quiet_config(),
            Box::new(WavePlan::new(vec![Wave {
                enemies: vec![EnemyKind::FastTank, EnemyKind::FastTank],
                spawn_interval: Duration::from_millis(100),
            }])),
        )
        .expect("valid config");
        session.start();

        let mut recorder = Recorder::default();
        for _ in 0..3 {
            let _ = session.update(TICK, &mut recorder);
        }

        assert_eq!(session.stats().enemies_spawned, 2);
        assert_eq!(recorder.spawned.len(), 2);
        assert!(recorder.hit.is_empty());
        assert!(recorder.died.is_empty());
        assert_eq!(session.enemies().len(), 2);
    }
}
