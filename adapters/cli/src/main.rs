#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a Tank Defence session headlessly.

mod placement;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use placement::WeaponPlacement;
use tank_defence_core::{EntityRef, PlayState};
use tank_defence_session::{EffectHooks, Session, SessionConfig};
use tracing::{info, trace};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about = "Runs a headless Tank Defence session", long_about = None)]
struct Cli {
    /// TOML file describing the battlefield and its waves.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Simulated seconds to run before stopping.
    #[arg(long, default_value_t = 180)]
    seconds: u64,
    /// Length of a single simulation tick in milliseconds.
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,
    /// Overrides the spawn seed from the configuration.
    #[arg(long)]
    seed: Option<u64>,
    /// Weapon to build before the first tick, written as `kind@column,row`.
    #[arg(long = "weapon")]
    weapons: Vec<WeaponPlacement>,
}

#[derive(Debug, Default)]
struct EffectTrace {
    hits: u32,
}

impl EffectHooks for EffectTrace {
    fn on_spawn(&mut self, entity: EntityRef) {
        trace!(?entity, "spawn");
    }

    fn on_hit(&mut self, entity: EntityRef) {
        self.hits += 1;
        trace!(?entity, "hit");
    }

    fn on_death(&mut self, entity: EntityRef) {
        trace!(?entity, "death");
    }
}

/// Entry point for the Tank Defence command-line interface.
fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let mut session = Session::new(&config).context("failed to set up session")?;
    for placement in &cli.weapons {
        let weapon = session
            .place_weapon(placement.kind, placement.cell)
            .with_context(|| {
                format!("could not build {:?} at {:?}", placement.kind, placement.cell)
            })?;
        info!(
            weapon = weapon.get(),
            kind = ?placement.kind,
            cell = ?placement.cell,
            "weapon built"
        );
    }

    let tick = Duration::from_millis(cli.tick_ms.max(1));
    let ticks = cli.seconds.saturating_mul(1_000) / tick.as_millis().max(1) as u64;
    let mut effects = EffectTrace::default();

    session.start();
    for _ in 0..ticks {
        let _ = session.update(tick, &mut effects);
        if session.play_state() == PlayState::GameOver || session.waves_cleared() {
            break;
        }
    }

    print_summary(&session, &effects);
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration {}", path.display()))?;
    SessionConfig::from_toml_str(&contents)
        .with_context(|| format!("invalid configuration {}", path.display()))
}

fn print_summary(session: &Session, effects: &EffectTrace) {
    let stats = session.stats();
    let base = session.base();
    let outcome = match session.play_state() {
        PlayState::GameOver => "base destroyed",
        _ if session.waves_cleared() => "all waves cleared",
        _ => "time limit reached",
    };

    println!("outcome:          {outcome}");
    println!("wave:             {}", session.wave_level());
    println!("base health:      {}/{}", base.health, base.max_health);
    println!("gold:             {}", session.gold());
    println!("ticks:            {}", stats.ticks);
    println!("enemies spawned:  {}", stats.enemies_spawned);
    println!("enemies killed:   {}", stats.enemies_killed);
    println!("enemies exited:   {}", stats.enemies_exited);
    println!("bullets fired:    {}", stats.bullets_fired);
    println!("hits:             {}", effects.hits);
}
