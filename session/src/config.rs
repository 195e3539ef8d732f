//! Battlefield session configuration loaded from TOML.

use std::time::Duration;

use serde::Deserialize;
use tank_defence_core::{BulletTemplate, CellCoord, EnemyKind, GridModel};
use tank_defence_system_movement::DEFAULT_SNAP_EPSILON;
use tank_defence_system_pathfinding::DEFAULT_SEARCH_RADIUS;
use tank_defence_system_spawning::Wave;
use tank_defence_world::{BulletTemplates, WorldConfig};
use thiserror::Error;

/// Reasons a configuration may be rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed into a configuration.
    #[error("failed to parse session configuration")]
    Parse(#[from] toml::de::Error),
    /// The battlefield has no cells.
    #[error("battlefield must have at least one column and one row, got {columns}x{rows}")]
    EmptyBattlefield {
        /// Configured column count.
        columns: u32,
        /// Configured row count.
        rows: u32,
    },
    /// The cell size is not a positive finite number.
    #[error("cell size must be positive, got {0}")]
    InvalidCellSize(f32),
    /// Part of the base lies outside the battlefield or the base has no extent.
    #[error("base at {cell:?} does not fit inside the battlefield")]
    BaseOutOfBounds {
        /// Configured upper-left base cell.
        cell: CellCoord,
    },
    /// An obstacle lies outside the battlefield or on the base.
    #[error("obstacle at {cell:?} is outside the battlefield or on the base")]
    InvalidObstacle {
        /// Offending obstacle cell.
        cell: CellCoord,
    },
    /// No wave was configured.
    #[error("at least one wave must be configured")]
    NoWaves,
    /// A configured wave contains no enemies.
    #[error("wave {index} contains no enemies")]
    EmptyWave {
        /// Zero-based index of the offending wave.
        index: usize,
    },
}

/// Placement and durability of the base.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BaseConfig {
    /// Upper-left cell covered by the base.
    pub cell: CellCoord,
    /// Columns covered by the base.
    pub columns: u32,
    /// Rows covered by the base.
    pub rows: u32,
    /// Starting health.
    pub health: u32,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            cell: CellCoord::new(9, 3),
            columns: 1,
            rows: 1,
            health: 500,
        }
    }
}

/// Projectile templates per faction.
///
/// When the table is present every faction missing from it fires nothing.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BulletConfig {
    /// Template for enemy projectiles.
    pub enemy: Option<BulletTemplate>,
    /// Template for weapon projectiles.
    pub tower: Option<BulletTemplate>,
}

impl Default for BulletConfig {
    fn default() -> Self {
        let templates = BulletTemplates::default();
        Self {
            enemy: templates.enemy,
            tower: templates.tower,
        }
    }
}

/// A single wave as written in the configuration file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaveConfig {
    /// Enemy archetypes in spawn order.
    pub enemies: Vec<EnemyKind>,
    /// Delay between spawns in milliseconds.
    pub spawn_interval_ms: u64,
}

impl WaveConfig {
    fn new(enemies: Vec<EnemyKind>, spawn_interval_ms: u64) -> Self {
        Self {
            enemies,
            spawn_interval_ms,
        }
    }

    fn to_wave(&self) -> Wave {
        Wave {
            enemies: self.enemies.clone(),
            spawn_interval: Duration::from_millis(self.spawn_interval_ms),
        }
    }
}

/// Everything required to set up one battlefield session.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Battlefield width in cells.
    pub columns: u32,
    /// Battlefield height in cells.
    pub rows: u32,
    /// Side length of a cell in world units.
    pub cell_size: f32,
    /// Base placement.
    pub base: BaseConfig,
    /// Cells holding static obstacles.
    pub obstacles: Vec<CellCoord>,
    /// Gold available when the session starts.
    pub starting_gold: u32,
    /// Length of the enemy entry animation in milliseconds.
    pub spawn_duration_ms: u64,
    /// Rings searched around an unwalkable path goal.
    pub search_radius: u32,
    /// Distance under which enemies snap onto waypoints.
    pub snap_epsilon: f32,
    /// Seed for spawn row selection.
    pub seed: u64,
    /// Projectile templates.
    pub bullets: BulletConfig,
    /// Waves played in order.
    pub waves: Vec<WaveConfig>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        use EnemyKind::{Boss, FastTank, HeavyTank, Tank};

        Self {
            columns: 10,
            rows: 6,
            cell_size: 64.0,
            base: BaseConfig::default(),
            obstacles: vec![CellCoord::new(5, 3)],
            starting_gold: 200,
            spawn_duration_ms: 500,
            search_radius: DEFAULT_SEARCH_RADIUS,
            snap_epsilon: DEFAULT_SNAP_EPSILON,
            seed: 0x7a4c_d3f1,
            bullets: BulletConfig::default(),
            waves: vec![
                WaveConfig::new(vec![Tank, Tank, Tank], 2_000),
                WaveConfig::new(vec![Tank, FastTank, FastTank, FastTank], 1_500),
                WaveConfig::new(vec![HeavyTank, FastTank, HeavyTank, FastTank], 1_500),
                WaveConfig::new(vec![Tank, Boss, Tank], 2_500),
            ],
        }
    }
}

impl SessionConfig {
    /// Parses and validates a TOML configuration document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns == 0 || self.rows == 0 {
            return Err(ConfigError::EmptyBattlefield {
                columns: self.columns,
                rows: self.rows,
            });
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(ConfigError::InvalidCellSize(self.cell_size));
        }

        let grid = self.grid();
        let base = &self.base;
        let far_corner = i32::try_from(base.columns.saturating_sub(1))
            .ok()
            .zip(i32::try_from(base.rows.saturating_sub(1)).ok())
            .and_then(|(columns, rows)| {
                Some(CellCoord::new(
                    base.cell.column().checked_add(columns)?,
                    base.cell.row().checked_add(rows)?,
                ))
            });
        let base_fits = base.columns > 0
            && base.rows > 0
            && grid.is_in_bounds(base.cell)
            && far_corner.is_some_and(|corner| grid.is_in_bounds(corner));
        if !base_fits {
            return Err(ConfigError::BaseOutOfBounds { cell: base.cell });
        }

        for cell in &self.obstacles {
            if !grid.is_in_bounds(*cell) || self.base_covers(*cell) {
                return Err(ConfigError::InvalidObstacle { cell: *cell });
            }
        }

        if self.waves.is_empty() {
            return Err(ConfigError::NoWaves);
        }
        if let Some(index) = self.waves.iter().position(|wave| wave.enemies.is_empty()) {
            return Err(ConfigError::EmptyWave { index });
        }
        Ok(())
    }

    /// Grid described by the battlefield dimensions.
    #[must_use]
    pub fn grid(&self) -> GridModel {
        GridModel::new(self.columns, self.rows, self.cell_size)
    }

    /// World parameters derived from this configuration.
    #[must_use]
    pub fn world_config(&self) -> WorldConfig {
        WorldConfig {
            grid: self.grid(),
            base_cell: self.base.cell,
            base_columns: self.base.columns,
            base_rows: self.base.rows,
            base_health: self.base.health,
            spawn_duration: Duration::from_millis(self.spawn_duration_ms),
            bullet_templates: BulletTemplates {
                enemy: self.bullets.enemy,
                tower: self.bullets.tower,
            },
        }
    }

    /// Waves converted for the spawning system.
    #[must_use]
    pub fn waves(&self) -> Vec<Wave> {
        self.waves.iter().map(WaveConfig::to_wave).collect()
    }

    fn base_covers(&self, cell: CellCoord) -> bool {
        let column = i64::from(cell.column()) - i64::from(self.base.cell.column());
        let row = i64::from(cell.row()) - i64::from(self.base.cell.row());
        (0..i64::from(self.base.columns)).contains(&column)
            && (0..i64::from(self.base.rows)).contains(&row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_demo_field() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.grid(), GridModel::new(10, 6, 64.0));
        assert_eq!(config.waves().len(), 4);
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = SessionConfig::from_toml_str("").expect("defaults parse");
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn toml_overrides_selected_fields() {
        let config = SessionConfig::from_toml_str(
            r#"
            columns = 12
            starting_gold = 75
            obstacles = [{ column = 2, row = 1 }]

            [base]
            cell = { column = 11, row = 2 }
            health = 40

            [[waves]]
            enemies = ["FastTank", "Boss"]
            spawn_interval_ms = 750
            "#,
        )
        .expect("valid configuration");

        assert_eq!(config.columns, 12);
        assert_eq!(config.rows, 6);
        assert_eq!(config.starting_gold, 75);
        assert_eq!(config.obstacles, vec![CellCoord::new(2, 1)]);
        assert_eq!(config.base.cell, CellCoord::new(11, 2));
        assert_eq!(config.base.columns, 1);
        assert_eq!(
            config.waves(),
            vec![Wave {
                enemies: vec![EnemyKind::FastTank, EnemyKind::Boss],
                spawn_interval: Duration::from_millis(750),
            }]
        );
    }

    #[test]
    fn partial_bullet_table_disables_missing_faction() {
        let config = SessionConfig::from_toml_str(
            r#"
            [bullets]
            tower = { speed = 300.0, radius = 4.0 }
            "#,
        )
        .expect("valid configuration");

        assert_eq!(config.bullets.enemy, None);
        assert_eq!(
            config.world_config().bullet_templates.tower,
            Some(BulletTemplate {
                speed: 300.0,
                radius: 4.0
            })
        );
    }

    #[test]
    fn unknown_enemy_kind_is_a_parse_error() {
        let error = SessionConfig::from_toml_str(
            r#"
            [[waves]]
            enemies = ["Helicopter"]
            spawn_interval_ms = 100
            "#,
        )
        .unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn invalid_layouts_are_rejected() {
        let zero = SessionConfig {
            rows: 0,
            ..SessionConfig::default()
        };
        assert!(matches!(
            zero.validate(),
            Err(ConfigError::EmptyBattlefield { columns: 10, rows: 0 })
        ));

        let base = SessionConfig {
            base: BaseConfig {
                columns: 2,
                ..BaseConfig::default()
            },
            ..SessionConfig::default()
        };
        assert!(matches!(base.validate(), Err(ConfigError::BaseOutOfBounds { .. })));

        let obstacle = SessionConfig {
            obstacles: vec![CellCoord::new(9, 3)],
            ..SessionConfig::default()
        };
        assert!(matches!(
            obstacle.validate(),
            Err(ConfigError::InvalidObstacle { .. })
        ));

        let waves = SessionConfig {
            waves: vec![WaveConfig::new(Vec::new(), 100)],
            ..SessionConfig::default()
        };
        assert!(matches!(waves.validate(), Err(ConfigError::EmptyWave { index: 0 })));
    }
}
