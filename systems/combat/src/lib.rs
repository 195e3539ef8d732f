#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that runs the lock, fire and cooldown cycle of every combatant.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use tank_defence_core::{
    CombatStance, Combatant, Command, EnemyView, TargetAssignment, TargetRef, WeaponView,
};
use tracing::debug;

/// Multiplier applied to attack range to obtain projectile travel distance.
pub const BULLET_RANGE_FACTOR: f32 = 1.2;

/// Combat parameters resolved for a combatant this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CombatProfile {
    /// Maximum acquisition distance.
    pub range: f32,
    /// Cadence at which shots become available while locked.
    pub attack_interval: Duration,
    /// Busy window that follows every shot.
    pub attack_duration: Duration,
    /// Damage carried by each projectile.
    pub damage: u32,
    /// Facing restored when a lock is released.
    pub rest_facing: Vec2,
}

/// Lock/attack controller that emits stance and firing commands.
///
/// Two timers gate firing. The interval timer accumulates only while locked
/// and resets on every shot; the duration timer starts with each shot and the
/// combatant cannot accumulate toward its next shot until it has elapsed.
#[derive(Debug, Default)]
pub struct Combat {
    states: BTreeMap<Combatant, ControllerState>,
    scratch: Vec<Command>,
}

impl Combat {
    /// Creates a combat system with no tracked combatants.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current stance tracked for the combatant.
    #[must_use]
    pub fn stance(&self, combatant: Combatant) -> CombatStance {
        self.states
            .get(&combatant)
            .map_or(CombatStance::Idle, |state| state.stance)
    }

    /// Advances every assigned combatant by `dt` and queues resulting commands.
    ///
    /// Combatants missing from both views are forgotten. The assignments must
    /// come from the targeting pass of the same tick.
    pub fn handle(
        &mut self,
        dt: Duration,
        assignments: &[TargetAssignment],
        enemies: &EnemyView,
        weapons: &WeaponView,
        out: &mut Vec<Command>,
    ) {
        self.states.retain(|combatant, _| match combatant {
            Combatant::Enemy(id) => enemies.get(*id).is_some(),
            Combatant::Weapon(id) => weapons.get(*id).is_some(),
        });

        self.scratch.clear();
        for assignment in assignments {
            let Some(profile) = resolve_profile(assignment.combatant, enemies, weapons) else {
                continue;
            };
            let state = self.states.entry(assignment.combatant).or_default();
            state.advance(dt, assignment, &profile, &mut self.scratch);
        }

        if self.scratch.is_empty() {
            return;
        }
        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

/// Looks up the combat parameters of a live combatant.
#[must_use]
pub fn resolve_profile(
    combatant: Combatant,
    enemies: &EnemyView,
    weapons: &WeaponView,
) -> Option<CombatProfile> {
    match combatant {
        Combatant::Enemy(id) => enemies.get(id).map(|enemy| {
            let profile = enemy.profile();
            CombatProfile {
                range: profile.attack_range,
                attack_interval: profile.attack_interval,
                attack_duration: profile.attack_duration,
                damage: profile.damage,
                rest_facing: Vec2::X,
            }
        }),
        Combatant::Weapon(id) => weapons.get(id).map(|weapon| {
            let stats = weapon.stats();
            CombatProfile {
                range: stats.range,
                attack_interval: stats.attack_interval,
                attack_duration: stats.attack_duration,
                damage: stats.damage,
                rest_facing: weapon.facing,
            }
        }),
    }
}

#[derive(Clone, Copy, Debug)]
struct ControllerState {
    stance: CombatStance,
    target: Option<TargetRef>,
    interval_elapsed: Duration,
    attack_elapsed: Duration,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            stance: CombatStance::Idle,
            target: None,
            interval_elapsed: Duration::ZERO,
            attack_elapsed: Duration::ZERO,
        }
    }
}

impl ControllerState {
    fn advance(
        &mut self,
        dt: Duration,
        assignment: &TargetAssignment,
        profile: &CombatProfile,
        out: &mut Vec<Command>,
    ) {
        let combatant = assignment.combatant;
        let lock = assignment.lock;
        let aim = |position: Vec2| {
            let direction = (position - assignment.origin).normalize_or_zero();
            if direction == Vec2::ZERO {
                profile.rest_facing
            } else {
                direction
            }
        };

        match self.stance {
            CombatStance::Idle => {
                let Some(lock) = lock else {
                    return;
                };
                self.stance = CombatStance::Locked;
                self.target = Some(lock.target);
                self.interval_elapsed = Duration::ZERO;
                debug!(?combatant, target = ?lock.target, "lock acquired");
                out.push(Command::SetStance {
                    combatant,
                    stance: CombatStance::Locked,
                    facing: aim(lock.position),
                });
            }
            CombatStance::Locked => {
                if lock.map(|lock| lock.target) != self.target {
                    self.release(combatant, profile, out);
                    return;
                }
            }
            CombatStance::Attacking => {
                self.attack_elapsed = self.attack_elapsed.saturating_add(dt);
                if self.attack_elapsed < profile.attack_duration {
                    return;
                }
                match lock.filter(|lock| Some(lock.target) == self.target) {
                    Some(lock) => {
                        self.stance = CombatStance::Locked;
                        self.interval_elapsed = Duration::ZERO;
                        out.push(Command::SetStance {
                            combatant,
                            stance: CombatStance::Locked,
                            facing: aim(lock.position),
                        });
                    }
                    None => self.release(combatant, profile, out),
                }
                return;
            }
        }

        let Some(lock) = lock else {
            return;
        };
        self.interval_elapsed = self.interval_elapsed.saturating_add(dt);
        if self.interval_elapsed < profile.attack_interval {
            return;
        }

        self.interval_elapsed = Duration::ZERO;
        self.attack_elapsed = Duration::ZERO;
        self.stance = CombatStance::Attacking;
        let direction = aim(lock.position);
        out.push(Command::SetStance {
            combatant,
            stance: CombatStance::Attacking,
            facing: direction,
        });
        out.push(Command::FireBullet {
            owner: combatant,
            direction,
            damage: profile.damage,
            max_distance: profile.range * BULLET_RANGE_FACTOR,
        });
    }

    fn release(&mut self, combatant: Combatant, profile: &CombatProfile, out: &mut Vec<Command>) {
        debug!(?combatant, "lock released");
        *self = Self::default();
        out.push(Command::SetStance {
            combatant,
            stance: CombatStance::Idle,
            facing: profile.rest_facing,
        });
    }
}
