#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tank Defence engine.
//!
//! This crate defines the message surface that connects the session driver,
//! the authoritative battlefield world, and pure systems. Drivers submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems and collaborators to react to deterministically. Systems
//! consume immutable views and respond exclusively with new command batches.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Tank Defence.";

/// Highest level a weapon can be upgraded to.
pub const MAX_WEAPON_LEVEL: u8 = 3;

/// Describes whether the session driver is allowed to advance the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayState {
    /// The battlefield was set up but the first tick has not been requested.
    NotStarted,
    /// Ticks advance every component of the simulation.
    Running,
    /// Ticks are ignored until the session resumes.
    Paused,
    /// The base was destroyed; the simulation never advances again.
    GameOver,
}

impl PlayState {
    /// Reports whether the tick loop may run while in this state.
    #[must_use]
    pub const fn can_update(self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Registers a static obstacle occupying a single cell.
    PlaceObstacle {
        /// Cell the obstacle occupies for the remainder of the session.
        cell: CellCoord,
    },
    /// Requests construction of a weapon on the provided cell.
    PlaceWeapon {
        /// Type of weapon to construct.
        kind: WeaponKind,
        /// Cell the weapon will occupy.
        cell: CellCoord,
    },
    /// Requests that an existing weapon gains one level.
    UpgradeWeapon {
        /// Identifier of the weapon to upgrade.
        weapon: WeaponId,
    },
    /// Requests that an existing weapon is sold and removed.
    SellWeapon {
        /// Identifier of the weapon to sell.
        weapon: WeaponId,
    },
    /// Requests that a new enemy enters the battlefield on the given row.
    SpawnEnemy {
        /// Archetype of the enemy to create.
        kind: EnemyKind,
        /// Battlefield row the enemy enters on, at the left edge.
        row: u32,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Records a combat stance transition decided by the combat controller.
    SetStance {
        /// Entity whose stance changed.
        combatant: Combatant,
        /// Stance the entity entered.
        stance: CombatStance,
        /// Normalised facing direction the entity should adopt.
        facing: Vec2,
    },
    /// Moves an enemy to a new continuous position.
    MoveEnemy {
        /// Identifier of the enemy being moved.
        enemy: EnemyId,
        /// Position the enemy occupies after moving.
        position: Vec2,
        /// Normalised facing direction derived from the movement vector.
        facing: Vec2,
    },
    /// Fires a projectile from the owner's current position.
    FireBullet {
        /// Entity that fired the projectile.
        owner: Combatant,
        /// Normalised direction of travel.
        direction: Vec2,
        /// Damage applied on impact.
        damage: u32,
        /// Distance after which the projectile expires.
        max_distance: f32,
    },
    /// Advances live projectiles and resolves their collisions.
    AdvanceProjectiles {
        /// Duration of simulated time the projectiles travel for.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a static obstacle was registered.
    ObstaclePlaced {
        /// Identifier assigned to the obstacle.
        obstacle: ObstacleId,
        /// Cell occupied by the obstacle.
        cell: CellCoord,
    },
    /// Reports that an obstacle could not be registered.
    ObstaclePlacementRejected {
        /// Cell provided in the request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a weapon was placed on the battlefield.
    WeaponPlaced {
        /// Identifier assigned to the weapon.
        weapon: WeaponId,
        /// Type of weapon that was placed.
        kind: WeaponKind,
        /// Cell occupied by the weapon.
        cell: CellCoord,
    },
    /// Reports that a weapon placement request was rejected.
    WeaponPlacementRejected {
        /// Type of weapon requested for placement.
        kind: WeaponKind,
        /// Cell provided in the placement request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a weapon gained a level.
    WeaponUpgraded {
        /// Identifier of the upgraded weapon.
        weapon: WeaponId,
        /// Level reached after the upgrade.
        level: u8,
    },
    /// Confirms that a weapon was sold and removed.
    WeaponSold {
        /// Identifier of the sold weapon.
        weapon: WeaponId,
        /// Cell the weapon vacated.
        cell: CellCoord,
        /// Gold returned to the player.
        refund: u32,
    },
    /// Reports that an upgrade or sell request was rejected.
    WeaponActionRejected {
        /// Identifier provided in the request.
        weapon: WeaponId,
        /// Specific reason the request failed.
        reason: WeaponActionError,
    },
    /// Confirms that an enemy entered the battlefield.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Archetype of the enemy.
        kind: EnemyKind,
        /// Position the enemy appeared at.
        position: Vec2,
    },
    /// Announces that an enemy finished its entry animation and may act.
    EnemyReady {
        /// Identifier of the enemy.
        enemy: EnemyId,
    },
    /// Announces that an enemy left the battlefield through the far edge.
    EnemyExited {
        /// Identifier of the enemy that left.
        enemy: EnemyId,
    },
    /// Announces a combat stance transition.
    StanceChanged {
        /// Entity whose stance changed.
        combatant: Combatant,
        /// Stance the entity entered.
        stance: CombatStance,
    },
    /// Confirms that a projectile was created.
    BulletFired {
        /// Identifier assigned to the projectile.
        bullet: BulletId,
        /// Entity that fired the projectile.
        owner: Combatant,
    },
    /// Announces that a projectile travelled its maximum distance.
    BulletExpired {
        /// Identifier of the expired projectile.
        bullet: BulletId,
    },
    /// Announces that a projectile damaged an enemy.
    EnemyDamaged {
        /// Identifier of the damaged enemy.
        enemy: EnemyId,
        /// Damage applied by the hit.
        damage: u32,
        /// Health remaining after the hit.
        remaining: u32,
    },
    /// Announces that an enemy was destroyed by damage.
    EnemyKilled {
        /// Identifier of the destroyed enemy.
        enemy: EnemyId,
        /// Gold granted for the kill.
        reward: u32,
    },
    /// Announces that a projectile damaged the base.
    BaseDamaged {
        /// Damage applied by the hit.
        damage: u32,
        /// Health remaining after the hit.
        remaining: u32,
    },
    /// Announces that the base health reached zero.
    BaseDestroyed,
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a weapon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WeaponId(u32);

impl WeaponId {
    /// Creates a new weapon identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the weapon identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BulletId(u32);

impl BulletId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the projectile identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a static obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObstacleId(u32);

impl ObstacleId {
    /// Creates a new obstacle identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the obstacle identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Coordinates are signed so that positions left of or above the battlefield
/// map to representable, out-of-bounds cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: i32,
    row: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }

    /// Reports whether two cells share an edge.
    #[must_use]
    pub fn is_adjacent(self, other: CellCoord) -> bool {
        self.manhattan_distance(other) == 1
    }

    /// Orthogonal neighbours in north, east, south, west order.
    #[must_use]
    pub const fn neighbors(self) -> [CellCoord; 4] {
        [
            CellCoord::new(self.column, self.row - 1),
            CellCoord::new(self.column + 1, self.row),
            CellCoord::new(self.column, self.row + 1),
            CellCoord::new(self.column - 1, self.row),
        ]
    }
}

/// Converts between continuous world coordinates and discrete grid cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridModel {
    columns: u32,
    rows: u32,
    cell_size: f32,
}

impl GridModel {
    /// Creates a grid description of `columns` × `rows` square cells.
    #[must_use]
    pub const fn new(columns: u32, rows: u32, cell_size: f32) -> Self {
        Self {
            columns,
            rows,
            cell_size,
        }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a single square cell expressed in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Total width of the battlefield measured in world units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.cell_size
    }

    /// Total height of the battlefield measured in world units.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.cell_size
    }

    /// Cell containing the provided world position.
    #[must_use]
    pub fn world_to_grid(&self, position: Vec2) -> CellCoord {
        CellCoord::new(
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
        )
    }

    /// World position of the centre of the provided cell.
    #[must_use]
    pub fn grid_to_world(&self, cell: CellCoord) -> Vec2 {
        Vec2::new(
            (cell.column() as f32 + 0.5) * self.cell_size,
            (cell.row() as f32 + 0.5) * self.cell_size,
        )
    }

    /// Reports whether the cell lies within the battlefield.
    #[must_use]
    pub fn is_in_bounds(&self, cell: CellCoord) -> bool {
        cell.column() >= 0
            && cell.row() >= 0
            && (cell.column() as u32) < self.columns
            && (cell.row() as u32) < self.rows
    }

    /// Row-major index of an in-bounds cell.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.is_in_bounds(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Cell stored at the provided row-major index.
    #[must_use]
    pub fn cell_at(&self, index: usize) -> Option<CellCoord> {
        let width = usize::try_from(self.columns).ok()?;
        if width == 0 || index >= self.cell_count() {
            return None;
        }
        let column = i32::try_from(index % width).ok()?;
        let row = i32::try_from(index / width).ok()?;
        Some(CellCoord::new(column, row))
    }

    /// Number of cells covered by the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let columns = usize::try_from(self.columns).unwrap_or(0);
        let rows = usize::try_from(self.rows).unwrap_or(0);
        columns.saturating_mul(rows)
    }
}

/// Walkability snapshot built from the obstacle and weapon registries.
///
/// No per-cell bitmap is kept: every query scans the captured occupant lists,
/// which stay small on a battlefield of tens of cells per axis.
#[derive(Clone, Debug)]
pub struct ObstacleIndex {
    grid: GridModel,
    obstacles: Vec<CellCoord>,
    weapons: Vec<CellCoord>,
}

impl ObstacleIndex {
    /// Captures an index over the provided obstacle and weapon cells.
    #[must_use]
    pub fn new(grid: GridModel, obstacles: Vec<CellCoord>, weapons: Vec<CellCoord>) -> Self {
        Self {
            grid,
            obstacles,
            weapons,
        }
    }

    /// Grid model the index was captured for.
    #[must_use]
    pub const fn grid(&self) -> &GridModel {
        &self.grid
    }

    /// Reports whether a static obstacle occupies the cell.
    #[must_use]
    pub fn has_obstacle_at(&self, cell: CellCoord) -> bool {
        self.obstacles.contains(&cell)
    }

    /// Reports whether a weapon occupies the cell.
    #[must_use]
    pub fn has_weapon_at(&self, cell: CellCoord) -> bool {
        self.weapons.contains(&cell)
    }

    /// Reports whether the cell is in bounds and unoccupied.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.is_walkable_with(cell, None)
    }

    /// Walkability query that additionally treats `transient` as blocked.
    ///
    /// The override lets callers test a hypothetical placement without
    /// mutating any registry.
    #[must_use]
    pub fn is_walkable_with(&self, cell: CellCoord, transient: Option<CellCoord>) -> bool {
        if transient == Some(cell) {
            return false;
        }
        self.grid.is_in_bounds(cell) && !self.has_obstacle_at(cell) && !self.has_weapon_at(cell)
    }
}

/// Side an entity fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Faction {
    /// Attacking tanks.
    Enemy,
    /// Player-placed weapons.
    Tower,
}

/// Handle to an entity able to acquire targets and fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Combatant {
    /// An enemy tank.
    Enemy(EnemyId),
    /// A placed weapon.
    Weapon(WeaponId),
}

impl Combatant {
    /// Faction the combatant belongs to.
    #[must_use]
    pub const fn faction(self) -> Faction {
        match self {
            Self::Enemy(_) => Faction::Enemy,
            Self::Weapon(_) => Faction::Tower,
        }
    }
}

/// Handle to an entity that can be targeted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetRef {
    /// An enemy tank.
    Enemy(EnemyId),
    /// A placed weapon.
    Weapon(WeaponId),
    /// The player base.
    Base,
}

/// Handle to any entity collaborators may present effects for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityRef {
    /// An enemy tank.
    Enemy(EnemyId),
    /// A placed weapon.
    Weapon(WeaponId),
    /// A projectile.
    Bullet(BulletId),
    /// The player base.
    Base,
}

/// Combat controller state shared with the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CombatStance {
    /// No target is locked.
    Idle,
    /// A target is locked and the attack interval is accumulating.
    Locked,
    /// A shot was fired and the attack duration window is running.
    Attacking,
}

/// Lifecycle phase of an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnemyPhase {
    /// Entry animation; the enemy neither moves nor attacks.
    Spawning,
    /// Following its path toward the base.
    Moving,
    /// Holding position while locked onto a target.
    Locked,
    /// Holding position inside an attack duration window.
    Attacking,
}

impl EnemyPhase {
    /// Reports whether the enemy is engaged in combat and must not move.
    #[must_use]
    pub const fn is_engaged(self) -> bool {
        matches!(self, Self::Locked | Self::Attacking)
    }
}

/// Closed set of enemy archetypes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Baseline tank.
    Tank,
    /// Lightly armoured, quick tank.
    FastTank,
    /// Slow, durable tank with a heavy gun.
    HeavyTank,
    /// Wave finisher with long range and very high health.
    Boss,
}

impl EnemyKind {
    /// Every archetype in declaration order.
    pub const ALL: [EnemyKind; 4] = [Self::Tank, Self::FastTank, Self::HeavyTank, Self::Boss];

    /// Static statistics describing the archetype.
    #[must_use]
    pub const fn profile(self) -> EnemyProfile {
        match self {
            Self::Tank => EnemyProfile {
                max_health: 100,
                move_speed: 40.0,
                attack_range: 120.0,
                attack_interval: Duration::from_millis(1_500),
                attack_duration: Duration::from_millis(300),
                damage: 10,
                reward: 10,
                width: 40.0,
                height: 40.0,
            },
            Self::FastTank => EnemyProfile {
                max_health: 60,
                move_speed: 70.0,
                attack_range: 100.0,
                attack_interval: Duration::from_millis(1_200),
                attack_duration: Duration::from_millis(200),
                damage: 6,
                reward: 8,
                width: 32.0,
                height: 32.0,
            },
            Self::HeavyTank => EnemyProfile {
                max_health: 250,
                move_speed: 25.0,
                attack_range: 140.0,
                attack_interval: Duration::from_millis(2_000),
                attack_duration: Duration::from_millis(400),
                damage: 20,
                reward: 25,
                width: 48.0,
                height: 48.0,
            },
            Self::Boss => EnemyProfile {
                max_health: 1_000,
                move_speed: 18.0,
                attack_range: 180.0,
                attack_interval: Duration::from_millis(2_500),
                attack_duration: Duration::from_millis(600),
                damage: 40,
                reward: 100,
                width: 64.0,
                height: 64.0,
            },
        }
    }
}

/// Per-archetype enemy statistics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyProfile {
    /// Health the enemy spawns with.
    pub max_health: u32,
    /// Travel speed in world units per second.
    pub move_speed: f32,
    /// Radius within which targets can be acquired.
    pub attack_range: f32,
    /// Locked time that must accumulate before each shot.
    pub attack_interval: Duration,
    /// Busy window following each shot.
    pub attack_duration: Duration,
    /// Damage carried by each projectile.
    pub damage: u32,
    /// Gold granted when the enemy is destroyed.
    pub reward: u32,
    /// Width of the bounding box in world units.
    pub width: f32,
    /// Height of the bounding box in world units.
    pub height: f32,
}

impl EnemyProfile {
    /// Collision radius: half of the larger bounding box side.
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.width.max(self.height) / 2.0
    }
}

/// Types of weapons that can be placed on the battlefield.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Rapid-fire, low-damage weapon.
    MachineGun,
    /// Slow, long-range, high-damage weapon.
    Cannon,
}

impl WeaponKind {
    /// Gold required to place the weapon.
    #[must_use]
    pub const fn build_cost(self) -> u32 {
        match self {
            Self::MachineGun => 50,
            Self::Cannon => 100,
        }
    }

    /// Gold required to raise the weapon from `level` to the next level.
    ///
    /// Returns `None` once [`MAX_WEAPON_LEVEL`] is reached.
    #[must_use]
    pub const fn upgrade_cost(self, level: u8) -> Option<u32> {
        if level >= MAX_WEAPON_LEVEL {
            return None;
        }
        let per_level = match self {
            Self::MachineGun => 40,
            Self::Cannon => 80,
        };
        Some(per_level * level as u32)
    }

    /// Combat statistics at the provided level.
    ///
    /// Levels are clamped to `1..=MAX_WEAPON_LEVEL`.
    #[must_use]
    pub fn stats(self, level: u8) -> WeaponStats {
        let steps = u32::from(level.clamp(1, MAX_WEAPON_LEVEL) - 1);
        match self {
            Self::MachineGun => WeaponStats {
                range: 160.0 + 20.0 * steps as f32,
                attack_interval: Duration::from_millis(400),
                attack_duration: Duration::from_millis(100),
                damage: 8 + 4 * steps,
            },
            Self::Cannon => WeaponStats {
                range: 200.0 + 25.0 * steps as f32,
                attack_interval: Duration::from_millis(1_500),
                attack_duration: Duration::from_millis(300),
                damage: 40 + 20 * steps,
            },
        }
    }
}

/// Level-dependent weapon statistics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeaponStats {
    /// Radius within which targets can be acquired.
    pub range: f32,
    /// Locked time that must accumulate before each shot.
    pub attack_interval: Duration,
    /// Busy window following each shot.
    pub attack_duration: Duration,
    /// Damage carried by each projectile.
    pub damage: u32,
}

/// Projectile parameters bound to a faction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BulletTemplate {
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Collision radius in world units.
    pub radius: f32,
}

/// Reasons a placement request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum PlacementError {
    /// The requested cell lies outside the battlefield.
    #[error("cell lies outside the battlefield")]
    OutOfBounds,
    /// The requested cell holds an obstacle or a weapon.
    #[error("cell is already occupied")]
    Occupied,
    /// The requested cell is covered by the base.
    #[error("cell is covered by the base")]
    BaseCell,
    /// The placement would leave no route from a spawn row to the base.
    #[error("placement would block every route to the base")]
    BlocksPath,
    /// The player cannot afford the placement.
    #[error("not enough gold")]
    InsufficientGold,
}

/// Reasons an upgrade or sell request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum WeaponActionError {
    /// No weapon with the provided identifier exists.
    #[error("weapon does not exist")]
    MissingWeapon,
    /// The weapon already reached its maximum level.
    #[error("weapon is already at its maximum level")]
    MaxLevel,
    /// The player cannot afford the upgrade.
    #[error("not enough gold")]
    InsufficientGold,
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Archetype of the enemy.
    pub kind: EnemyKind,
    /// Current continuous position of the enemy's centre.
    pub position: Vec2,
    /// Normalised facing direction.
    pub facing: Vec2,
    /// Lifecycle phase of the enemy.
    pub phase: EnemyPhase,
    /// Remaining health.
    pub health: u32,
}

impl EnemySnapshot {
    /// Static statistics of the enemy's archetype.
    #[must_use]
    pub const fn profile(&self) -> EnemyProfile {
        self.kind.profile()
    }
}

/// Read-only snapshot describing all live enemies in registration order.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot captured for the provided enemy.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of captured enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no enemies were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single weapon's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeaponSnapshot {
    /// Identifier allocated to the weapon by the world.
    pub id: WeaponId,
    /// Kind of weapon that was constructed.
    pub kind: WeaponKind,
    /// Cell occupied by the weapon.
    pub cell: CellCoord,
    /// World position of the weapon's cell centre.
    pub position: Vec2,
    /// Current upgrade level.
    pub level: u8,
    /// Normalised facing direction.
    pub facing: Vec2,
}

impl WeaponSnapshot {
    /// Combat statistics at the weapon's current level.
    #[must_use]
    pub fn stats(&self) -> WeaponStats {
        self.kind.stats(self.level)
    }
}

/// Read-only snapshot describing all weapons in registration order.
#[derive(Clone, Debug, Default)]
pub struct WeaponView {
    snapshots: Vec<WeaponSnapshot>,
}

impl WeaponView {
    /// Creates a new weapon view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<WeaponSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured weapon snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &WeaponSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot captured for the provided weapon.
    #[must_use]
    pub fn get(&self, id: WeaponId) -> Option<&WeaponSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of captured weapons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no weapons were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<WeaponSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a live projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BulletSnapshot {
    /// Identifier allocated to the projectile.
    pub id: BulletId,
    /// Faction of the entity that fired the projectile.
    pub faction: Faction,
    /// Current position of the projectile.
    pub position: Vec2,
    /// Normalised direction of travel.
    pub direction: Vec2,
    /// Damage applied on impact.
    pub damage: u32,
    /// Distance covered since the projectile was fired.
    pub distance_traveled: f32,
    /// Distance after which the projectile expires.
    pub max_distance: f32,
}

/// Read-only snapshot of the base.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BaseSnapshot {
    /// Corner anchoring the base rectangle.
    pub origin: Vec2,
    /// Extent of the base rectangle.
    pub size: Vec2,
    /// Remaining health.
    pub health: u32,
    /// Health the base started with.
    pub max_health: u32,
}

impl BaseSnapshot {
    /// Centre of the base rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.origin + self.size / 2.0
    }

    /// Reports whether the base has been destroyed.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.health == 0
    }
}

/// Target selected for a combatant during the current tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetLock {
    /// Handle of the selected target.
    pub target: TargetRef,
    /// Aim point of the target at acquisition time.
    pub position: Vec2,
}

/// Outcome of target acquisition for a single combatant.
///
/// Every combatant able to fight this tick receives an assignment, including
/// those that found nothing, so controllers can drop stale locks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetAssignment {
    /// Combatant the assignment belongs to.
    pub combatant: Combatant,
    /// Position the combatant fires from.
    pub origin: Vec2,
    /// Nearest valid target, if any.
    pub lock: Option<TargetLock>,
}
