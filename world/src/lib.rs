#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative battlefield state management for Tank Defence.

pub mod collision;
mod registry;

use std::time::Duration;

use glam::Vec2;
use tank_defence_core::{
    BulletId, BulletTemplate, CellCoord, CombatStance, Combatant, Command, EnemyId, EnemyKind,
    EnemyPhase, Event, Faction, GridModel, ObstacleId, PlacementError, WeaponActionError,
    WeaponId, WeaponKind, MAX_WEAPON_LEVEL, WELCOME_BANNER,
};
use tracing::{debug, warn};

use crate::registry::Registry;

const DEFAULT_GRID_COLUMNS: u32 = 10;
const DEFAULT_GRID_ROWS: u32 = 6;
const DEFAULT_CELL_SIZE: f32 = 64.0;
const DEFAULT_BASE_HEALTH: u32 = 500;
const DEFAULT_SPAWN_DURATION: Duration = Duration::from_millis(500);

/// Projectile parameters bound per faction.
///
/// A missing template disables firing for that faction; fire requests are
/// logged and dropped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BulletTemplates {
    /// Template used for projectiles fired by enemies.
    pub enemy: Option<BulletTemplate>,
    /// Template used for projectiles fired by weapons.
    pub tower: Option<BulletTemplate>,
}

impl BulletTemplates {
    fn for_faction(&self, faction: Faction) -> Option<BulletTemplate> {
        match faction {
            Faction::Enemy => self.enemy,
            Faction::Tower => self.tower,
        }
    }
}

impl Default for BulletTemplates {
    fn default() -> Self {
        Self {
            enemy: Some(BulletTemplate {
                speed: 240.0,
                radius: 5.0,
            }),
            tower: Some(BulletTemplate {
                speed: 420.0,
                radius: 5.0,
            }),
        }
    }
}

/// Parameters required to set up a battlefield.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldConfig {
    /// Grid describing the battlefield extent.
    pub grid: GridModel,
    /// Upper-left cell covered by the base.
    pub base_cell: CellCoord,
    /// Number of columns covered by the base.
    pub base_columns: u32,
    /// Number of rows covered by the base.
    pub base_rows: u32,
    /// Health the base starts with.
    pub base_health: u32,
    /// Length of the enemy entry animation.
    pub spawn_duration: Duration,
    /// Projectile templates per faction.
    pub bullet_templates: BulletTemplates,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            grid: GridModel::new(DEFAULT_GRID_COLUMNS, DEFAULT_GRID_ROWS, DEFAULT_CELL_SIZE),
            base_cell: CellCoord::new(9, 3),
            base_columns: 1,
            base_rows: 1,
            base_health: DEFAULT_BASE_HEALTH,
            spawn_duration: DEFAULT_SPAWN_DURATION,
            bullet_templates: BulletTemplates::default(),
        }
    }
}

/// Represents the authoritative Tank Defence battlefield.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    grid: GridModel,
    base: Base,
    enemies: Registry<EnemyId, Enemy>,
    weapons: Registry<WeaponId, Weapon>,
    bullets: Registry<BulletId, Bullet>,
    obstacles: Registry<ObstacleId, Obstacle>,
    bullet_templates: BulletTemplates,
    spawn_duration: Duration,
    layout_revision: u64,
    tick_index: u64,
}

impl World {
    /// Creates a battlefield from the provided configuration.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        let base = Base::covering(
            &config.grid,
            config.base_cell,
            config.base_columns,
            config.base_rows,
            config.base_health,
        );
        Self {
            banner: WELCOME_BANNER,
            grid: config.grid,
            base,
            enemies: Registry::new(),
            weapons: Registry::new(),
            bullets: Registry::new(),
            obstacles: Registry::new(),
            bullet_templates: config.bullet_templates,
            spawn_duration: config.spawn_duration,
            layout_revision: 0,
            tick_index: 0,
        }
    }

    fn validate_placement(&self, cell: CellCoord) -> Result<(), PlacementError> {
        if !self.grid.is_in_bounds(cell) {
            return Err(PlacementError::OutOfBounds);
        }
        if self.base.covers(cell) {
            return Err(PlacementError::BaseCell);
        }
        let occupied = self.obstacles.iter().any(|(_, obstacle)| obstacle.cell == cell)
            || self.weapons.iter().any(|(_, weapon)| weapon.cell == cell);
        if occupied {
            return Err(PlacementError::Occupied);
        }
        Ok(())
    }

    fn advance_spawn_animations(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let spawn_duration = self.spawn_duration;
        for enemy_id in self.enemies.live_ids() {
            let Some(enemy) = self.enemies.get_mut(enemy_id) else {
                continue;
            };
            if enemy.phase != EnemyPhase::Spawning {
                continue;
            }
            enemy.spawn_elapsed = enemy.spawn_elapsed.saturating_add(dt);
            if enemy.spawn_elapsed >= spawn_duration {
                enemy.phase = EnemyPhase::Moving;
                out_events.push(Event::EnemyReady { enemy: enemy_id });
            }
        }
    }

    fn spawn_enemy(&mut self, kind: EnemyKind, row: u32, out_events: &mut Vec<Event>) {
        if row >= self.grid.rows() {
            debug!(row, "spawn row outside battlefield ignored");
            return;
        }
        let Ok(row) = i32::try_from(row) else {
            return;
        };
        let position = self.grid.grid_to_world(CellCoord::new(0, row));
        let enemy = self.enemies.insert(Enemy::spawned(kind, position));
        debug!(enemy = enemy.get(), ?kind, row, "enemy spawned");
        out_events.push(Event::EnemySpawned {
            enemy,
            kind,
            position,
        });
    }

    fn set_stance(
        &mut self,
        combatant: Combatant,
        stance: CombatStance,
        facing: Vec2,
        out_events: &mut Vec<Event>,
    ) {
        let facing = facing.normalize_or_zero();
        match combatant {
            Combatant::Enemy(enemy_id) => {
                let Some(enemy) = self.enemies.get_mut(enemy_id) else {
                    return;
                };
                if enemy.phase == EnemyPhase::Spawning {
                    return;
                }
                if facing != Vec2::ZERO {
                    enemy.facing = facing;
                }
                let phase = match stance {
                    CombatStance::Idle => EnemyPhase::Moving,
                    CombatStance::Locked => EnemyPhase::Locked,
                    CombatStance::Attacking => EnemyPhase::Attacking,
                };
                if enemy.phase != phase {
                    enemy.phase = phase;
                    out_events.push(Event::StanceChanged { combatant, stance });
                }
            }
            Combatant::Weapon(weapon_id) => {
                let Some(weapon) = self.weapons.get_mut(weapon_id) else {
                    return;
                };
                if facing != Vec2::ZERO {
                    weapon.facing = facing;
                }
                if weapon.stance != stance {
                    weapon.stance = stance;
                    out_events.push(Event::StanceChanged { combatant, stance });
                }
            }
        }
    }

    fn move_enemy(
        &mut self,
        enemy_id: EnemyId,
        position: Vec2,
        facing: Vec2,
        out_events: &mut Vec<Event>,
    ) {
        let battlefield_width = self.grid.width();
        let Some(enemy) = self.enemies.get_mut(enemy_id) else {
            return;
        };
        if enemy.phase != EnemyPhase::Moving {
            return;
        }

        enemy.position = position;
        let facing = facing.normalize_or_zero();
        if facing != Vec2::ZERO {
            enemy.facing = facing;
        }

        let left_edge = enemy.position.x - enemy.kind.profile().width / 2.0;
        if left_edge >= battlefield_width && self.enemies.mark_for_removal(enemy_id) {
            debug!(enemy = enemy_id.get(), "enemy left the battlefield");
            out_events.push(Event::EnemyExited { enemy: enemy_id });
        }
    }

    fn fire_bullet(
        &mut self,
        owner: Combatant,
        direction: Vec2,
        damage: u32,
        max_distance: f32,
        out_events: &mut Vec<Event>,
    ) {
        let origin = match owner {
            Combatant::Enemy(enemy_id) => self
                .enemies
                .get(enemy_id)
                .filter(|enemy| enemy.phase != EnemyPhase::Spawning)
                .map(|enemy| enemy.position),
            Combatant::Weapon(weapon_id) => {
                self.weapons.get(weapon_id).map(|weapon| weapon.position)
            }
        };
        let Some(origin) = origin else {
            debug!(?owner, "fire request from an inactive owner ignored");
            return;
        };

        let faction = owner.faction();
        let Some(template) = self.bullet_templates.for_faction(faction) else {
            warn!(?owner, ?faction, "no projectile template bound; shot dropped");
            return;
        };

        let direction = direction.normalize_or_zero();
        if direction == Vec2::ZERO {
            return;
        }

        let bullet = self.bullets.insert(Bullet {
            faction,
            position: origin,
            direction,
            damage,
            distance_traveled: 0.0,
            max_distance,
            speed: template.speed,
            radius: template.radius,
        });
        out_events.push(Event::BulletFired { bullet, owner });
    }

    fn place_obstacle(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        if let Err(reason) = self.validate_placement(cell) {
            out_events.push(Event::ObstaclePlacementRejected { cell, reason });
            return;
        }
        let obstacle = self.obstacles.insert(Obstacle { cell });
        self.layout_revision = self.layout_revision.wrapping_add(1);
        out_events.push(Event::ObstaclePlaced { obstacle, cell });
    }

    fn place_weapon(&mut self, kind: WeaponKind, cell: CellCoord, out_events: &mut Vec<Event>) {
        if let Err(reason) = self.validate_placement(cell) {
            out_events.push(Event::WeaponPlacementRejected { kind, cell, reason });
            return;
        }
        let position = self.grid.grid_to_world(cell);
        let weapon = self.weapons.insert(Weapon {
            kind,
            cell,
            position,
            level: 1,
            invested: kind.build_cost(),
            facing: Vec2::X,
            stance: CombatStance::Idle,
        });
        self.layout_revision = self.layout_revision.wrapping_add(1);
        debug!(weapon = weapon.get(), ?kind, ?cell, "weapon placed");
        out_events.push(Event::WeaponPlaced { weapon, kind, cell });
    }

    fn upgrade_weapon(&mut self, weapon_id: WeaponId, out_events: &mut Vec<Event>) {
        let Some(weapon) = self.weapons.get_mut(weapon_id) else {
            out_events.push(Event::WeaponActionRejected {
                weapon: weapon_id,
                reason: WeaponActionError::MissingWeapon,
            });
            return;
        };
        let Some(cost) = weapon.kind.upgrade_cost(weapon.level) else {
            out_events.push(Event::WeaponActionRejected {
                weapon: weapon_id,
                reason: WeaponActionError::MaxLevel,
            });
            return;
        };
        weapon.level = (weapon.level + 1).min(MAX_WEAPON_LEVEL);
        weapon.invested = weapon.invested.saturating_add(cost);
        out_events.push(Event::WeaponUpgraded {
            weapon: weapon_id,
            level: weapon.level,
        });
    }

    fn sell_weapon(&mut self, weapon_id: WeaponId, out_events: &mut Vec<Event>) {
        let Some(weapon) = self.weapons.get(weapon_id) else {
            out_events.push(Event::WeaponActionRejected {
                weapon: weapon_id,
                reason: WeaponActionError::MissingWeapon,
            });
            return;
        };
        let cell = weapon.cell;
        let refund = weapon.invested / 2;
        if self.weapons.mark_for_removal(weapon_id) {
            self.layout_revision = self.layout_revision.wrapping_add(1);
            out_events.push(Event::WeaponSold {
                weapon: weapon_id,
                cell,
                refund,
            });
        }
    }

    fn reap_destroyed(&mut self) {
        let removed = self.enemies.reap()
            + self.weapons.reap()
            + self.bullets.reap()
            + self.obstacles.reap();
        if removed > 0 {
            debug!(removed, tick = self.tick_index, "reaped destroyed entities");
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::PlaceObstacle { cell } => world.place_obstacle(cell, out_events),
        Command::PlaceWeapon { kind, cell } => world.place_weapon(kind, cell, out_events),
        Command::UpgradeWeapon { weapon } => world.upgrade_weapon(weapon, out_events),
        Command::SellWeapon { weapon } => world.sell_weapon(weapon, out_events),
        Command::SpawnEnemy { kind, row } => world.spawn_enemy(kind, row, out_events),
        Command::Tick { dt } => {
            world.reap_destroyed();
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
            world.advance_spawn_animations(dt, out_events);
        }
        Command::SetStance {
            combatant,
            stance,
            facing,
        } => world.set_stance(combatant, stance, facing, out_events),
        Command::MoveEnemy {
            enemy,
            position,
            facing,
        } => world.move_enemy(enemy, position, facing, out_events),
        Command::FireBullet {
            owner,
            direction,
            damage,
            max_distance,
        } => world.fire_bullet(owner, direction, damage, max_distance, out_events),
        Command::AdvanceProjectiles { dt } => collision::resolve_projectiles(
            &world.grid,
            &mut world.bullets,
            &mut world.enemies,
            &mut world.base,
            dt,
            out_events,
        ),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use tank_defence_core::{
        BaseSnapshot, BulletSnapshot, CellCoord, EnemySnapshot, EnemyView, GridModel,
        ObstacleIndex, WeaponId, WeaponSnapshot, WeaponView,
    };

    use super::World;

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the battlefield grid.
    #[must_use]
    pub fn grid(world: &World) -> &GridModel {
        &world.grid
    }

    /// Captures the current state of the base.
    #[must_use]
    pub fn base(world: &World) -> BaseSnapshot {
        BaseSnapshot {
            origin: world.base.origin,
            size: world.base.size,
            health: world.base.health,
            max_health: world.base.max_health,
        }
    }

    /// Reports whether the base covers the provided cell.
    #[must_use]
    pub fn is_base_cell(world: &World, cell: CellCoord) -> bool {
        world.base.covers(cell)
    }

    /// Captures a read-only view of every live enemy.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let snapshots = world
            .enemies
            .iter()
            .map(|(id, enemy)| EnemySnapshot {
                id,
                kind: enemy.kind,
                position: enemy.position,
                facing: enemy.facing,
                phase: enemy.phase,
                health: enemy.health,
            })
            .collect();
        EnemyView::from_snapshots(snapshots)
    }

    /// Number of enemies currently alive on the battlefield.
    #[must_use]
    pub fn live_enemy_count(world: &World) -> usize {
        world.enemies.live_count()
    }

    /// Captures a read-only view of every placed weapon.
    #[must_use]
    pub fn weapon_view(world: &World) -> WeaponView {
        let snapshots = world
            .weapons
            .iter()
            .map(|(id, weapon)| WeaponSnapshot {
                id,
                kind: weapon.kind,
                cell: weapon.cell,
                position: weapon.position,
                level: weapon.level,
                facing: weapon.facing,
            })
            .collect();
        WeaponView::from_snapshots(snapshots)
    }

    /// Identifier of the weapon occupying the provided cell, if any.
    #[must_use]
    pub fn weapon_at(world: &World, cell: CellCoord) -> Option<WeaponId> {
        world
            .weapons
            .iter()
            .find(|(_, weapon)| weapon.cell == cell)
            .map(|(id, _)| id)
    }

    /// Captures every live projectile in registration order.
    #[must_use]
    pub fn bullets(world: &World) -> Vec<BulletSnapshot> {
        world
            .bullets
            .iter()
            .map(|(id, bullet)| BulletSnapshot {
                id,
                faction: bullet.faction,
                position: bullet.position,
                direction: bullet.direction,
                damage: bullet.damage,
                distance_traveled: bullet.distance_traveled,
                max_distance: bullet.max_distance,
            })
            .collect()
    }

    /// Reports whether a static obstacle occupies the provided cell.
    #[must_use]
    pub fn has_obstacle_at(world: &World, cell: CellCoord) -> bool {
        world
            .obstacles
            .iter()
            .any(|(_, obstacle)| obstacle.cell == cell)
    }

    /// Captures the walkability index from the obstacle and weapon registries.
    #[must_use]
    pub fn obstacle_index(world: &World) -> ObstacleIndex {
        let obstacles = world
            .obstacles
            .iter()
            .map(|(_, obstacle)| obstacle.cell)
            .collect();
        let weapons = world.weapons.iter().map(|(_, weapon)| weapon.cell).collect();
        ObstacleIndex::new(world.grid, obstacles, weapons)
    }

    /// Reports whether the cell is walkable, optionally treating `transient` as blocked.
    #[must_use]
    pub fn is_walkable(world: &World, cell: CellCoord, transient: Option<CellCoord>) -> bool {
        obstacle_index(world).is_walkable_with(cell, transient)
    }

    /// Rows whose left-edge cell is walkable and can therefore host a spawn.
    #[must_use]
    pub fn spawn_rows(world: &World) -> Vec<u32> {
        let index = obstacle_index(world);
        (0..world.grid.rows())
            .filter(|row| {
                i32::try_from(*row)
                    .map(|row| index.is_walkable(CellCoord::new(0, row)))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Counter bumped whenever obstacles or weapons change.
    #[must_use]
    pub fn layout_revision(world: &World) -> u64 {
        world.layout_revision
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

#[derive(Clone, Debug)]
struct Enemy {
    kind: EnemyKind,
    position: Vec2,
    facing: Vec2,
    phase: EnemyPhase,
    health: u32,
    spawn_elapsed: Duration,
}

impl Enemy {
    fn spawned(kind: EnemyKind, position: Vec2) -> Self {
        Self {
            kind,
            position,
            facing: Vec2::X,
            phase: EnemyPhase::Spawning,
            health: kind.profile().max_health,
            spawn_elapsed: Duration::ZERO,
        }
    }

    fn radius(&self) -> f32 {
        self.kind.profile().radius()
    }
}

#[derive(Clone, Debug)]
struct Weapon {
    kind: WeaponKind,
    cell: CellCoord,
    position: Vec2,
    level: u8,
    invested: u32,
    facing: Vec2,
    stance: CombatStance,
}

#[derive(Clone, Debug)]
struct Bullet {
    faction: Faction,
    position: Vec2,
    direction: Vec2,
    damage: u32,
    distance_traveled: f32,
    max_distance: f32,
    speed: f32,
    radius: f32,
}

#[derive(Clone, Copy, Debug)]
struct Obstacle {
    cell: CellCoord,
}

#[derive(Clone, Debug)]
struct Base {
    first_cell: CellCoord,
    columns: u32,
    rows: u32,
    origin: Vec2,
    size: Vec2,
    health: u32,
    max_health: u32,
}

impl Base {
    fn covering(
        grid: &GridModel,
        first_cell: CellCoord,
        columns: u32,
        rows: u32,
        health: u32,
    ) -> Self {
        let cell_size = grid.cell_size();
        let origin = Vec2::new(
            first_cell.column() as f32 * cell_size,
            first_cell.row() as f32 * cell_size,
        );
        Self {
            first_cell,
            columns,
            rows,
            origin,
            size: Vec2::new(columns as f32 * cell_size, rows as f32 * cell_size),
            health,
            max_health: health,
        }
    }

    fn covers(&self, cell: CellCoord) -> bool {
        let column_offset = i64::from(cell.column()) - i64::from(self.first_cell.column());
        let row_offset = i64::from(cell.row()) - i64::from(self.first_cell.row());
        column_offset >= 0
            && row_offset >= 0
            && column_offset < i64::from(self.columns)
            && row_offset < i64::from(self.rows)
    }
}
