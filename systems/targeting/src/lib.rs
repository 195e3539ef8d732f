#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that selects the nearest valid target for every combatant.

use glam::Vec2;
use tank_defence_core::{
    BaseSnapshot, Combatant, EnemyPhase, EnemyView, TargetAssignment, TargetLock, TargetRef,
    WeaponView,
};

/// Restricts which side of the attacker a target may be on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DirectionFilter {
    /// Targets in every direction are admitted.
    Any,
    /// Only targets whose x coordinate is not behind the attacker.
    Forward,
}

impl DirectionFilter {
    /// Reports whether `target` passes the filter when seen from `origin`.
    #[must_use]
    pub fn admits(self, origin: Vec2, target: Vec2) -> bool {
        match self {
            Self::Any => true,
            Self::Forward => target.x >= origin.x,
        }
    }
}

/// Selects the nearest admissible candidate within `range` of `origin`.
///
/// Candidates are visited in the order given; when two candidates are equally
/// near the one seen first is kept.
#[must_use]
pub fn acquire(
    origin: Vec2,
    range: f32,
    filter: DirectionFilter,
    candidates: &[TargetLock],
) -> Option<TargetLock> {
    let mut best: Option<(f32, TargetLock)> = None;
    for candidate in candidates {
        if !filter.admits(origin, candidate.position) {
            continue;
        }
        let distance = origin.distance(candidate.position);
        if distance > range {
            continue;
        }
        if best.map_or(true, |(nearest, _)| distance < nearest) {
            best = Some((distance, *candidate));
        }
    }
    best.map(|(_, lock)| lock)
}

/// Targeting system that reuses its candidate buffer between ticks.
#[derive(Debug, Default)]
pub struct Targeting {
    candidates: Vec<TargetLock>,
}

impl Targeting {
    /// Creates a targeting system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes assignments for every enemy that finished its entry animation.
    ///
    /// Enemies fire only forward, at weapons or at the base. The output buffer
    /// is cleared before the assignments are written.
    pub fn handle_enemies(
        &mut self,
        enemies: &EnemyView,
        weapons: &WeaponView,
        base: &BaseSnapshot,
        out: &mut Vec<TargetAssignment>,
    ) {
        out.clear();

        self.candidates.clear();
        self.candidates.extend(weapons.iter().map(|weapon| TargetLock {
            target: TargetRef::Weapon(weapon.id),
            position: weapon.position,
        }));
        if !base.is_destroyed() {
            self.candidates.push(TargetLock {
                target: TargetRef::Base,
                position: base.center(),
            });
        }

        for enemy in enemies.iter() {
            if enemy.phase == EnemyPhase::Spawning {
                continue;
            }
            let range = enemy.profile().attack_range;
            out.push(TargetAssignment {
                combatant: Combatant::Enemy(enemy.id),
                origin: enemy.position,
                lock: acquire(
                    enemy.position,
                    range,
                    DirectionFilter::Forward,
                    &self.candidates,
                ),
            });
        }
    }

    /// Computes assignments for every placed weapon.
    ///
    /// Weapons may fire in any direction. The output buffer is cleared before
    /// the assignments are written.
    pub fn handle_weapons(
        &mut self,
        weapons: &WeaponView,
        enemies: &EnemyView,
        out: &mut Vec<TargetAssignment>,
    ) {
        out.clear();

        self.candidates.clear();
        self.candidates.extend(enemies.iter().map(|enemy| TargetLock {
            target: TargetRef::Enemy(enemy.id),
            position: enemy.position,
        }));

        for weapon in weapons.iter() {
            out.push(TargetAssignment {
                combatant: Combatant::Weapon(weapon.id),
                origin: weapon.position,
                lock: acquire(
                    weapon.position,
                    weapon.stats().range,
                    DirectionFilter::Any,
                    &self.candidates,
                ),
            });
        }
    }
}
