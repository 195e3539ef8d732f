#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave-driven spawning system that emits enemy spawn commands at a fixed cadence.

use std::{fmt::Debug, time::Duration};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tank_defence_core::{Command, EnemyKind};
use tracing::{debug, info};

/// A scheduled batch of enemies spawned in sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wave {
    /// Enemy archetypes in spawn order.
    pub enemies: Vec<EnemyKind>,
    /// Delay between consecutive spawns.
    pub spawn_interval: Duration,
}

/// Source of wave composition and progression.
pub trait WaveManager: Debug {
    /// One-based number of the current wave.
    fn wave_level(&self) -> u32;

    /// Fraction of the current wave already spawned, in `0.0..=1.0`.
    fn wave_progress(&self) -> f32;

    /// Enemies of the current wave that have not been spawned yet.
    fn remaining_in_wave(&self) -> usize;

    /// Delay between spawns in the current wave.
    fn spawn_interval(&self) -> Duration;

    /// Takes the next enemy of the current wave, if any remain.
    fn next_enemy(&mut self) -> Option<EnemyKind>;

    /// Moves on to the following wave.
    ///
    /// Returns `false` when no further wave exists.
    fn advance_wave(&mut self) -> bool;
}

/// Fixed list of waves played in order.
#[derive(Clone, Debug)]
pub struct WavePlan {
    waves: Vec<Wave>,
    current: usize,
    spawned: usize,
}

impl WavePlan {
    /// Creates a plan that starts at the first of `waves`.
    #[must_use]
    pub fn new(waves: Vec<Wave>) -> Self {
        Self {
            waves,
            current: 0,
            spawned: 0,
        }
    }

    fn current_wave(&self) -> Option<&Wave> {
        self.waves.get(self.current)
    }
}

impl WaveManager for WavePlan {
    fn wave_level(&self) -> u32 {
        u32::try_from(self.current.min(self.waves.len().saturating_sub(1)))
            .unwrap_or(u32::MAX)
            .saturating_add(1)
    }

    fn wave_progress(&self) -> f32 {
        match self.current_wave() {
            Some(wave) if !wave.enemies.is_empty() => {
                self.spawned as f32 / wave.enemies.len() as f32
            }
            _ => 1.0,
        }
    }

    fn remaining_in_wave(&self) -> usize {
        self.current_wave()
            .map_or(0, |wave| wave.enemies.len().saturating_sub(self.spawned))
    }

    fn spawn_interval(&self) -> Duration {
        self.current_wave()
            .map_or(Duration::ZERO, |wave| wave.spawn_interval)
    }

    fn next_enemy(&mut self) -> Option<EnemyKind> {
        let kind = self.current_wave()?.enemies.get(self.spawned).copied()?;
        self.spawned += 1;
        Some(kind)
    }

    fn advance_wave(&mut self) -> bool {
        if self.current + 1 >= self.waves.len() {
            return false;
        }
        self.current += 1;
        self.spawned = 0;
        true
    }
}

/// Pure system that paces enemy spawns and advances waves once they are cleared.
#[derive(Debug)]
pub struct Spawning {
    accumulator: Duration,
    rng: ChaCha8Rng,
    finished: bool,
}

impl Spawning {
    /// Creates a spawning system whose row choices derive from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            accumulator: Duration::ZERO,
            rng: ChaCha8Rng::seed_from_u64(seed),
            finished: false,
        }
    }

    /// Reports whether the final wave has been spawned and cleared.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advances the spawn cadence by `dt` and queues `SpawnEnemy` commands.
    ///
    /// A spawn happens every time the accumulated time reaches the current
    /// wave's interval; the row is picked uniformly from `spawn_rows`. Once the
    /// wave has no enemies left to spawn and `live_enemies` is zero, the wave
    /// manager is advanced and the cadence restarts.
    pub fn handle(
        &mut self,
        dt: Duration,
        waves: &mut dyn WaveManager,
        spawn_rows: &[u32],
        live_enemies: usize,
        out: &mut Vec<Command>,
    ) {
        if self.finished {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        let interval = waves.spawn_interval();
        let mut spawned = 0_usize;

        while self.accumulator >= interval && waves.remaining_in_wave() > 0 {
            if spawn_rows.is_empty() {
                self.accumulator = interval;
                break;
            }
            let Some(kind) = waves.next_enemy() else {
                break;
            };
            let row = spawn_rows[self.rng.gen_range(0..spawn_rows.len())];
            debug!(?kind, row, wave = waves.wave_level(), "spawn scheduled");
            out.push(Command::SpawnEnemy { kind, row });
            spawned += 1;
            self.accumulator = self.accumulator.saturating_sub(interval);
            if interval.is_zero() {
                break;
            }
        }

        if spawned > 0 || waves.remaining_in_wave() > 0 || live_enemies > 0 {
            return;
        }

        self.accumulator = Duration::ZERO;
        if waves.advance_wave() {
            info!(wave = waves.wave_level(), "wave started");
        } else {
            info!(wave = waves.wave_level(), "final wave cleared");
            self.finished = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> WavePlan {
        WavePlan::new(vec![
            Wave {
                enemies: vec![EnemyKind::Tank, EnemyKind::FastTank],
                spawn_interval: Duration::from_millis(500),
            },
            Wave {
                enemies: vec![EnemyKind::Boss],
                spawn_interval: Duration::from_secs(1),
            },
        ])
    }

    fn kinds(commands: &[Command]) -> Vec<EnemyKind> {
        commands
            .iter()
            .filter_map(|command| match command {
                Command::SpawnEnemy { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn wave_plan_reports_progress() {
        let mut plan = plan();
        assert_eq!(plan.wave_level(), 1);
        assert_eq!(plan.wave_progress(), 0.0);
        assert_eq!(plan.next_enemy(), Some(EnemyKind::Tank));
        assert_eq!(plan.wave_progress(), 0.5);
        assert_eq!(plan.next_enemy(), Some(EnemyKind::FastTank));
        assert_eq!(plan.next_enemy(), None);
        assert_eq!(plan.remaining_in_wave(), 0);

        assert!(plan.advance_wave());
        assert_eq!(plan.wave_level(), 2);
        assert_eq!(plan.remaining_in_wave(), 1);
        assert!(!plan.advance_wave());
        assert_eq!(plan.wave_level(), 2);
    }

    #[test]
    fn spawns_follow_wave_cadence() {
        let mut waves = plan();
        let mut spawning = Spawning::new(7);
        let mut out = Vec::new();

        spawning.handle(Duration::from_millis(400), &mut waves, &[0, 1, 2], 0, &mut out);
        assert!(out.is_empty());
        spawning.handle(Duration::from_millis(100), &mut waves, &[0, 1, 2], 0, &mut out);
        assert_eq!(kinds(&out), vec![EnemyKind::Tank]);

        spawning.handle(Duration::from_secs(2), &mut waves, &[0, 1, 2], 1, &mut out);
        assert_eq!(kinds(&out), vec![EnemyKind::Tank, EnemyKind::FastTank]);
    }

    #[test]
    fn wave_advances_only_after_enemies_are_cleared() {
        let mut waves = plan();
        let mut spawning = Spawning::new(7);
        let mut out = Vec::new();

        spawning.handle(Duration::from_secs(1), &mut waves, &[3], 0, &mut out);
        assert_eq!(out.len(), 2);

        spawning.handle(Duration::from_secs(5), &mut waves, &[3], 2, &mut out);
        assert_eq!(waves.wave_level(), 1);

        spawning.handle(Duration::from_millis(100), &mut waves, &[3], 0, &mut out);
        assert_eq!(waves.wave_level(), 2);
        assert_eq!(out.len(), 2, "new wave restarts its cadence");

        spawning.handle(Duration::from_secs(1), &mut waves, &[3], 0, &mut out);
        assert_eq!(kinds(&out).last(), Some(&EnemyKind::Boss));
        assert!(!spawning.is_finished());

        spawning.handle(Duration::from_millis(100), &mut waves, &[3], 0, &mut out);
        assert!(spawning.is_finished());
    }

    #[test]
    fn spawn_rows_come_from_available_rows() {
        let mut waves = WavePlan::new(vec![Wave {
            enemies: vec![EnemyKind::Tank; 32],
            spawn_interval: Duration::from_millis(10),
        }]);
        let mut spawning = Spawning::new(99);
        let mut out = Vec::new();

        spawning.handle(Duration::from_secs(1), &mut waves, &[1, 4], 0, &mut out);

        assert_eq!(out.len(), 32);
        for command in &out {
            match command {
                Command::SpawnEnemy { row, .. } => assert!(*row == 1 || *row == 4),
                other => panic!("unexpected command: {other:?}"),
            }
        }
    }

    #[test]
    fn no_spawn_rows_hold_the_enemy_back() {
        let mut waves = plan();
        let mut spawning = Spawning::new(1);
        let mut out = Vec::new();

        spawning.handle(Duration::from_secs(3), &mut waves, &[], 0, &mut out);
        assert!(out.is_empty());
        assert_eq!(waves.remaining_in_wave(), 2);

        spawning.handle(Duration::ZERO, &mut waves, &[2], 0, &mut out);
        assert_eq!(kinds(&out), vec![EnemyKind::Tank]);
    }

    #[test]
    fn equal_seeds_pick_equal_rows() {
        let rows = [0, 1, 2, 3, 4, 5];
        let run = |seed| {
            let mut waves = WavePlan::new(vec![Wave {
                enemies: vec![EnemyKind::FastTank; 10],
                spawn_interval: Duration::from_millis(100),
            }]);
            let mut spawning = Spawning::new(seed);
            let mut out = Vec::new();
            spawning.handle(Duration::from_secs(1), &mut waves, &rows, 0, &mut out);
            out
        };
        assert_eq!(run(42), run(42));
    }
}
