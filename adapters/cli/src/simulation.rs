//! Headless chase session: one scripted player and one pursuer per enemy spawn.

use std::{fmt, time::Duration};

use anyhow::{ensure, Context, Result};
use chase_core::{AgentId, DamageSink, Facing, MovementIntent, PursuitMode};
use chase_system_movement::PlayerDriver;
use chase_system_pursuit::{Pursuit, SeededDiskSampler};
use chase_world::Level;
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::settings::Settings;

/// Simulation time between two rerolls of the scripted player's intent.
const INTENT_INTERVAL: Duration = Duration::from_secs(1);

/// Golden-ratio increment used to derive per-pursuer sampler seeds.
const SEED_STRIDE: u64 = 0x9e37_79b9_7f4a_7c15;

/// Damage sink that tallies the contacts reported by one pursuer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct ContactCounter {
    contacts: u32,
    damage: f32,
}

impl DamageSink for ContactCounter {
    fn apply_effect(&mut self, magnitude: f32) {
        self.contacts += 1;
        self.damage += magnitude;
    }
}

#[derive(Debug)]
struct Pursuer {
    agent: Pursuit,
    sampler: SeededDiskSampler,
    counter: ContactCounter,
    replans: u32,
    seen_replan: Option<Duration>,
}

/// Fixed-step session driving every agent of a level.
#[derive(Debug)]
pub(crate) struct Simulation {
    level: Level,
    fixed_step: Duration,
    player: PlayerDriver,
    intents: ChaCha8Rng,
    intent_age: Duration,
    elapsed: Duration,
    frames: u64,
    pursuers: Vec<Pursuer>,
}

impl Simulation {
    /// Places the player and one pursuer per enemy spawn of `level`.
    pub(crate) fn new(
        level: Level,
        settings: &Settings,
        seed: u64,
        fixed_step: Duration,
    ) -> Result<Self> {
        ensure!(!fixed_step.is_zero(), "fixed step must be longer than zero");

        let mut pursuers = Vec::with_capacity(level.enemy_spawns().len());
        for (index, spawn) in level.enemy_spawn_positions().enumerate() {
            let id = u32::try_from(index).context("too many enemy spawns")?;
            let agent = Pursuit::new(AgentId::new(id), settings.pursuit.clone(), spawn)
                .with_context(|| format!("failed to configure pursuer {id}"))?;
            let sampler_seed = seed ^ u64::from(id + 1).wrapping_mul(SEED_STRIDE);
            pursuers.push(Pursuer {
                agent,
                sampler: SeededDiskSampler::new(sampler_seed),
                counter: ContactCounter::default(),
                replans: 0,
                seen_replan: None,
            });
        }

        let player = PlayerDriver::new(settings.driver, level.player_spawn_position());
        log::info!(
            "session on a {}x{} level with {} pursuers, seed {seed:#x}",
            level.surface().width(),
            level.surface().height(),
            pursuers.len()
        );

        Ok(Self {
            level,
            fixed_step,
            player,
            intents: ChaCha8Rng::seed_from_u64(seed),
            intent_age: INTENT_INTERVAL,
            elapsed: Duration::ZERO,
            frames: 0,
            pursuers,
        })
    }

    /// Advances every agent by one fixed step.
    pub(crate) fn step(&mut self) {
        let dt = self.fixed_step;

        if self.intent_age >= INTENT_INTERVAL {
            let direction = Vec2::new(
                self.intents.gen_range(-1.0..=1.0),
                self.intents.gen_range(-1.0..=1.0),
            );
            let intent = MovementIntent::new(direction);
            log::debug!("player intent {:?} at {:?}", intent.direction(), self.elapsed);
            self.player.tick(intent);
            self.intent_age = Duration::ZERO;
        }

        let surface = self.level.surface();
        let _ = self.player.fixed_tick(dt, Some(surface));
        self.player.integrate(dt);
        let target = self.player.position();

        for pursuer in &mut self.pursuers {
            let _ = pursuer.agent.tick(dt, &target, &mut pursuer.counter);
            let _ = pursuer
                .agent
                .fixed_tick(dt, Some(surface), &target, &mut pursuer.sampler);
            pursuer.agent.integrate(dt);

            let replanned = pursuer.agent.last_replan();
            if replanned.is_some() && replanned != pursuer.seen_replan {
                pursuer.replans += 1;
                pursuer.seen_replan = replanned;
            }
        }

        self.elapsed += dt;
        self.intent_age += dt;
        self.frames += 1;
    }

    /// Simulation time covered so far.
    pub(crate) fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Current state of every agent.
    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            time: self.elapsed.as_secs_f32(),
            player: self.player.position().to_array(),
            pursuers: self
                .pursuers
                .iter()
                .map(|pursuer| PursuerSnapshot {
                    id: pursuer.agent.id().get(),
                    mode: pursuer.agent.mode(),
                    position: pursuer.agent.position().to_array(),
                    facing: pursuer.agent.facing(),
                    path_len: pursuer.agent.path().len(),
                    contacts: pursuer.counter.contacts,
                })
                .collect(),
        }
    }

    /// Totals accumulated over the session.
    pub(crate) fn summary(&self) -> Summary {
        Summary {
            frames: self.frames,
            time: self.elapsed.as_secs_f32(),
            pursuers: self
                .pursuers
                .iter()
                .map(|pursuer| PursuerSummary {
                    id: pursuer.agent.id().get(),
                    final_mode: pursuer.agent.mode(),
                    contacts: pursuer.counter.contacts,
                    damage: pursuer.counter.damage,
                    replans: pursuer.replans,
                })
                .collect(),
        }
    }
}

/// Per-second trace record.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct Snapshot {
    time: f32,
    player: [f32; 2],
    pursuers: Vec<PursuerSnapshot>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
struct PursuerSnapshot {
    id: u32,
    mode: PursuitMode,
    position: [f32; 2],
    facing: Facing,
    path_len: usize,
    contacts: u32,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>6.2}s player=({:.2}, {:.2})",
            self.time, self.player[0], self.player[1]
        )?;
        for pursuer in &self.pursuers {
            write!(
                f,
                " | #{} {:?} ({:.2}, {:.2}) path={} contacts={}",
                pursuer.id,
                pursuer.mode,
                pursuer.position[0],
                pursuer.position[1],
                pursuer.path_len,
                pursuer.contacts
            )?;
        }
        Ok(())
    }
}

/// End-of-session totals.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct Summary {
    frames: u64,
    time: f32,
    pursuers: Vec<PursuerSummary>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
struct PursuerSummary {
    id: u32,
    final_mode: PursuitMode,
    contacts: u32,
    damage: f32,
    replans: u32,
}

impl Summary {
    /// Contacts summed over every pursuer.
    pub(crate) fn total_contacts(&self) -> u32 {
        self.pursuers.iter().map(|pursuer| pursuer.contacts).sum()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} frames over {:.2}s, {} contacts in total",
            self.frames,
            self.time,
            self.total_contacts()
        )?;
        for pursuer in &self.pursuers {
            writeln!(
                f,
                "  pursuer #{}: {:?}, {} contacts ({:.1} damage), {} replans",
                pursuer.id, pursuer.final_mode, pursuer.contacts, pursuer.damage, pursuer.replans
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chase_world::{DEFAULT_LAYOUT, DEFAULT_TILE_LENGTH};

    const STEP: Duration = Duration::from_millis(20);

    fn simulation(layout: &str, settings: &Settings, seed: u64) -> Simulation {
        let level = Level::parse(layout, DEFAULT_TILE_LENGTH).expect("valid layout");
        Simulation::new(level, settings, seed, STEP).expect("valid session")
    }

    #[test]
    fn zero_fixed_step_is_rejected() {
        let level = Level::parse(DEFAULT_LAYOUT, DEFAULT_TILE_LENGTH).expect("valid layout");

        assert!(Simulation::new(level, &Settings::default(), 1, Duration::ZERO).is_err());
    }

    #[test]
    fn one_pursuer_spawns_per_enemy_marker() {
        let session = simulation(DEFAULT_LAYOUT, &Settings::default(), 1);

        assert_eq!(session.snapshot().pursuers.len(), 2);
        assert_eq!(session.summary().total_contacts(), 0);
    }

    #[test]
    fn steps_accumulate_simulation_time() {
        let mut session = simulation(DEFAULT_LAYOUT, &Settings::default(), 2);

        for _ in 0..50 {
            session.step();
        }

        assert_eq!(session.elapsed(), Duration::from_secs(1));
        assert_eq!(session.summary().frames, 50);
    }

    #[test]
    fn equal_seeds_replay_identically() {
        let run = |seed| {
            let mut session = simulation(DEFAULT_LAYOUT, &Settings::default(), seed);
            for _ in 0..600 {
                session.step();
            }
            (session.snapshot(), session.summary())
        };

        assert_eq!(run(7), run(7));
    }

    #[test]
    fn adjacent_pursuer_catches_a_stationary_player() {
        let mut settings = Settings::default();
        settings.driver.speed = 0.0;
        let mut session = simulation("#####\n#PE.#\n#####\n", &settings, 3);

        for _ in 0..50 {
            session.step();
        }

        let summary = session.summary();
        assert_eq!(summary.total_contacts(), 1);
        assert_eq!(summary.pursuers[0].final_mode, PursuitMode::Chasing);
        assert_eq!(summary.pursuers[0].replans, 2);
        assert!(session.snapshot().to_string().contains("Chasing"));
    }
}
