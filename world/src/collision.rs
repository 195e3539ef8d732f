//! Projectile advancement and the collision & damage resolver.

use std::time::Duration;

use glam::Vec2;
use tank_defence_core::{BulletId, EnemyId, Event, Faction, GridModel};
use tracing::{debug, info};

use crate::{registry::Registry, Base, Bullet, Enemy};

/// Reports whether two circles overlap.
///
/// Touching circles do not count as a hit: the distance between centres must
/// be strictly smaller than the sum of the radii.
#[must_use]
pub fn circles_overlap(first: Vec2, first_radius: f32, second: Vec2, second_radius: f32) -> bool {
    first.distance(second) < first_radius + second_radius
}

/// Reports whether a circle overlaps a corner-anchored rectangle.
///
/// The rectangle is inflated by the circle radius on every side and the
/// circle centre is tested against the inflated bounds.
#[must_use]
pub fn circle_overlaps_rect(center: Vec2, radius: f32, origin: Vec2, size: Vec2) -> bool {
    let min = origin - Vec2::splat(radius);
    let max = origin + size + Vec2::splat(radius);
    center.x >= min.x && center.x <= max.x && center.y >= min.y && center.y <= max.y
}

/// Advances every live projectile and resolves hits for this tick.
///
/// Projectiles are visited in registration order. A tower projectile damages
/// the first enemy it overlaps in enemy registration order; an enemy
/// projectile can only damage the base. Spent projectiles and destroyed
/// enemies are marked for removal and reaped on the following tick.
pub(crate) fn resolve_projectiles(
    grid: &GridModel,
    bullets: &mut Registry<BulletId, Bullet>,
    enemies: &mut Registry<EnemyId, Enemy>,
    base: &mut Base,
    dt: Duration,
    out_events: &mut Vec<Event>,
) {
    let seconds = dt.as_secs_f32();

    for bullet_id in bullets.live_ids() {
        let Some(bullet) = bullets.get_mut(bullet_id) else {
            continue;
        };

        let step = bullet.speed * seconds;
        bullet.position += bullet.direction * step;
        bullet.distance_traveled += step;

        if bullet.distance_traveled >= bullet.max_distance
            || !inside_battlefield(grid, bullet.position)
        {
            let _ = bullets.mark_for_removal(bullet_id);
            out_events.push(Event::BulletExpired { bullet: bullet_id });
            continue;
        }

        let position = bullet.position;
        let radius = bullet.radius;
        let damage = bullet.damage;

        let hit = match bullet.faction {
            Faction::Tower => strike_first_enemy(enemies, position, radius, damage, out_events),
            Faction::Enemy => strike_base(base, position, radius, damage, out_events),
        };

        if hit {
            let _ = bullets.mark_for_removal(bullet_id);
        }
    }
}

fn strike_first_enemy(
    enemies: &mut Registry<EnemyId, Enemy>,
    position: Vec2,
    radius: f32,
    damage: u32,
    out_events: &mut Vec<Event>,
) -> bool {
    let victim = enemies
        .iter()
        .find(|(_, enemy)| circles_overlap(position, radius, enemy.position, enemy.radius()))
        .map(|(id, _)| id);

    let Some(enemy_id) = victim else {
        return false;
    };
    let Some(enemy) = enemies.get_mut(enemy_id) else {
        return false;
    };

    enemy.health = enemy.health.saturating_sub(damage);
    let remaining = enemy.health;
    let reward = enemy.kind.profile().reward;
    out_events.push(Event::EnemyDamaged {
        enemy: enemy_id,
        damage,
        remaining,
    });

    if remaining == 0 && enemies.mark_for_removal(enemy_id) {
        debug!(enemy = enemy_id.get(), reward, "enemy destroyed");
        out_events.push(Event::EnemyKilled {
            enemy: enemy_id,
            reward,
        });
    }

    true
}

fn strike_base(
    base: &mut Base,
    position: Vec2,
    radius: f32,
    damage: u32,
    out_events: &mut Vec<Event>,
) -> bool {
    if base.health == 0 || !circle_overlaps_rect(position, radius, base.origin, base.size) {
        return false;
    }

    base.health = base.health.saturating_sub(damage);
    out_events.push(Event::BaseDamaged {
        damage,
        remaining: base.health,
    });
    if base.health == 0 {
        info!("base destroyed");
        out_events.push(Event::BaseDestroyed);
    }
    true
}

fn inside_battlefield(grid: &GridModel, position: Vec2) -> bool {
    position.x >= 0.0
        && position.y >= 0.0
        && position.x <= grid.width()
        && position.y <= grid.height()
}
