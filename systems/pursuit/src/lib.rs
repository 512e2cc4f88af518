#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wander/chase state machine for enemy agents pursuing the player.
//!
//! Each [`Pursuit`] owns one agent's state exclusively. The host drives it with
//! two entry points: [`Pursuit::tick`] on every frame advances the agent's
//! clock, refreshes its orientation and runs the contact-effect check, while
//! [`Pursuit::fixed_tick`] on the fixed timestep evaluates the pursuit mode,
//! replans when due and returns the constrained velocity for the step. The
//! host integrates that velocity and may feed the resulting position back
//! through [`Pursuit::set_position`].

mod config;
mod sampler;

use std::time::Duration;

use chase_core::{
    AgentId, DamageSink, DiskSampler, Facing, GridSurface, Path, PursuitMode, TargetLocator,
};
use chase_system_movement::{resolve, KinematicBody};
use chase_system_pathfinding::PathPlanner;
use glam::Vec2;

pub use config::{ConfigError, PursuitConfig};
pub use sampler::SeededDiskSampler;

/// Per-agent pursuit controller.
#[derive(Debug)]
pub struct Pursuit {
    id: AgentId,
    config: PursuitConfig,
    path_update_interval: Duration,
    damage_cooldown: Duration,
    spawn: Vec2,
    state: AgentState,
    planner: PathPlanner,
}

#[derive(Clone, Debug)]
struct AgentState {
    body: KinematicBody,
    heading: Vec2,
    facing: Facing,
    path: Path,
    waypoint_index: usize,
    clock: Duration,
    last_replan: Option<Duration>,
    last_effect: Option<Duration>,
    mode: PursuitMode,
    wander_target: Vec2,
}

impl AgentState {
    fn at_spawn(spawn: Vec2) -> Self {
        Self {
            body: KinematicBody::at(spawn),
            heading: Vec2::ZERO,
            facing: Facing::default(),
            path: Path::empty(),
            waypoint_index: 0,
            clock: Duration::ZERO,
            last_replan: None,
            last_effect: None,
            mode: PursuitMode::Wandering,
            wander_target: spawn,
        }
    }

    fn clear_path(&mut self) {
        self.path = Path::empty();
        self.waypoint_index = 0;
    }
}

impl Pursuit {
    /// Creates a wandering agent resting at its spawn position.
    ///
    /// The first wander target is the spawn itself, so the agent picks a fresh
    /// one on its first fixed tick.
    pub fn new(id: AgentId, config: PursuitConfig, spawn: Vec2) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            id,
            path_update_interval: config.path_update_interval(),
            damage_cooldown: config.damage_cooldown_interval(),
            config,
            spawn,
            state: AgentState::at_spawn(spawn),
            planner: PathPlanner::new(),
        })
    }

    /// Frame-rate tick: advances the clock, updates orientation and fires the
    /// contact effect when the target is close and the cooldown has elapsed.
    ///
    /// Returns `true` when an effect was handed to the sink.
    pub fn tick<T, D>(&mut self, dt: Duration, target: &T, sink: &mut D) -> bool
    where
        T: TargetLocator + ?Sized,
        D: DamageSink + ?Sized,
    {
        self.state.clock = self.state.clock.saturating_add(dt);

        if let Some(facing) =
            Facing::from_horizontal(self.state.heading.x, self.config.orientation_deadzone)
        {
            self.state.facing = facing;
        }

        let Some(target) = target.locate() else {
            return false;
        };
        if self.state.body.position.distance(target) > self.config.contact_damage_radius {
            return false;
        }

        let cooled_down = self
            .state
            .last_effect
            .map_or(true, |last| self.state.clock.saturating_sub(last) >= self.damage_cooldown);
        if !cooled_down {
            return false;
        }

        sink.apply_effect(self.config.contact_damage);
        self.state.last_effect = Some(self.state.clock);
        log::debug!(
            "agent {} applied contact effect {} at {:?}",
            self.id.get(),
            self.config.contact_damage,
            self.state.clock
        );
        true
    }

    /// Fixed-timestep tick: evaluates the pursuit mode, replans when due and
    /// returns the velocity the host should apply for this step.
    pub fn fixed_tick<S, T, R>(
        &mut self,
        dt: Duration,
        surface: Option<&S>,
        target: &T,
        sampler: &mut R,
    ) -> Vec2
    where
        S: GridSurface + ?Sized,
        T: TargetLocator + ?Sized,
        R: DiskSampler + ?Sized,
    {
        let target = target.locate();
        self.update_mode(target, surface);

        let direction = match self.state.mode {
            PursuitMode::Chasing => self.chase_direction(surface, target, sampler),
            PursuitMode::Wandering => self.wander_direction(surface, sampler),
        };

        let velocity = resolve(
            self.state.body.position,
            direction,
            self.config.speed,
            dt,
            self.config.edge_offset,
            surface,
        );
        self.state.body.velocity = velocity;
        self.state.heading = if self.config.speed > 0.0 {
            velocity / self.config.speed
        } else {
            Vec2::ZERO
        };
        velocity
    }

    /// Integrates the last resolved velocity for hosts without a physics body.
    pub fn integrate(&mut self, dt: Duration) {
        self.state.body.integrate(dt);
    }

    /// Overrides the position with one integrated by the host.
    pub fn set_position(&mut self, position: Vec2) {
        self.state.body.position = position;
    }

    /// Returns the agent to its spawn at rest and immediately picks a new
    /// wander target.
    ///
    /// The path is discarded, the agent wanders again and the next contact
    /// may fire without waiting for the old cooldown.
    pub fn reset<S, R>(&mut self, surface: Option<&S>, sampler: &mut R)
    where
        S: GridSurface + ?Sized,
        R: DiskSampler + ?Sized,
    {
        self.state.body = KinematicBody::at(self.spawn);
        self.state.heading = Vec2::ZERO;
        self.state.clear_path();
        self.state.last_replan = None;
        self.state.last_effect = None;
        self.state.mode = PursuitMode::Wandering;
        self.state.wander_target = self.pick_wander_target(surface, sampler);
        log::debug!("agent {} reset to spawn {:?}", self.id.get(), self.spawn);
    }

    /// Identifier assigned at construction.
    #[must_use]
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Configuration supplied at construction.
    #[must_use]
    pub fn config(&self) -> &PursuitConfig {
        &self.config
    }

    /// Current pursuit mode.
    #[must_use]
    pub fn mode(&self) -> PursuitMode {
        self.state.mode
    }

    /// Path currently being followed; empty while wandering.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.state.path
    }

    /// Index of the waypoint being steered toward. Equal to the path length
    /// once the path is exhausted.
    #[must_use]
    pub fn waypoint_index(&self) -> usize {
        self.state.waypoint_index
    }

    /// Waypoint being steered toward, if the path is not exhausted.
    #[must_use]
    pub fn current_waypoint(&self) -> Option<Vec2> {
        self.state.path.get(self.state.waypoint_index)
    }

    /// Current world-space position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.state.body.position
    }

    /// Velocity resolved on the last fixed tick.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.state.body.velocity
    }

    /// Horizontal orientation flag.
    #[must_use]
    pub fn facing(&self) -> Facing {
        self.state.facing
    }

    /// Position the agent roams toward while wandering.
    #[must_use]
    pub fn wander_target(&self) -> Vec2 {
        self.state.wander_target
    }

    /// Spawn position the agent wanders around and resets to.
    #[must_use]
    pub fn spawn(&self) -> Vec2 {
        self.spawn
    }

    /// Simulation time accumulated through [`Pursuit::tick`].
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.state.clock
    }

    /// Simulation time of the most recent replan.
    #[must_use]
    pub fn last_replan(&self) -> Option<Duration> {
        self.state.last_replan
    }

    /// Cells dequeued by the most recent path search.
    #[must_use]
    pub fn last_expansions(&self) -> usize {
        self.planner.last_expansions()
    }

    fn update_mode<S>(&mut self, target: Option<Vec2>, surface: Option<&S>)
    where
        S: GridSurface + ?Sized,
    {
        let in_range = target.filter(|target| {
            self.state.body.position.distance(*target) <= self.config.chase_range
        });

        match (self.state.mode, in_range) {
            (PursuitMode::Wandering, Some(target)) => {
                self.state.mode = PursuitMode::Chasing;
                log::debug!("agent {} started chasing", self.id.get());
                self.replan(target, surface);
            }
            (PursuitMode::Chasing, None) => {
                self.state.mode = PursuitMode::Wandering;
                self.state.clear_path();
                log::debug!("agent {} lost the target and resumed wandering", self.id.get());
            }
            (PursuitMode::Chasing, Some(target)) => {
                let due = self.state.last_replan.map_or(true, |last| {
                    self.state.clock.saturating_sub(last) >= self.path_update_interval
                });
                if due {
                    self.replan(target, surface);
                }
            }
            (PursuitMode::Wandering, None) => {}
        }
    }

    fn replan<S>(&mut self, target: Vec2, surface: Option<&S>)
    where
        S: GridSurface + ?Sized,
    {
        let path = match surface {
            Some(surface) => self.planner.plan(
                self.state.body.position,
                target,
                surface,
                self.config.max_iterations,
            ),
            None => Path::empty(),
        };

        self.state.path = path;
        self.state.waypoint_index = 0;
        self.state.last_replan = Some(self.state.clock);
        log::debug!(
            "agent {} replanned: {} waypoints after {} expansions",
            self.id.get(),
            self.state.path.len(),
            self.planner.last_expansions()
        );
    }

    fn chase_direction<S, R>(
        &mut self,
        surface: Option<&S>,
        target: Option<Vec2>,
        sampler: &mut R,
    ) -> Vec2
    where
        S: GridSurface + ?Sized,
        R: DiskSampler + ?Sized,
    {
        let position = self.state.body.position;

        if self.state.path.is_empty() {
            // Sharing a cell with the target leaves nothing to plan; close in directly.
            if let (Some(surface), Some(target)) = (surface, target) {
                if surface.world_to_cell(position) == surface.world_to_cell(target) {
                    if position.distance(target) < self.config.waypoint_reach_distance {
                        return Vec2::ZERO;
                    }
                    return (target - position).normalize_or_zero();
                }
            }
            return self.wander_direction(surface, sampler);
        }

        if let Some(waypoint) = self.state.path.get(self.state.waypoint_index) {
            if position.distance(waypoint) < self.config.waypoint_reach_distance {
                self.state.waypoint_index += 1;
            }
        }

        match self.state.path.get(self.state.waypoint_index) {
            Some(waypoint) => (waypoint - position).normalize_or_zero(),
            None => Vec2::ZERO,
        }
    }

    fn wander_direction<S, R>(&mut self, surface: Option<&S>, sampler: &mut R) -> Vec2
    where
        S: GridSurface + ?Sized,
        R: DiskSampler + ?Sized,
    {
        let position = self.state.body.position;
        if position.distance(self.state.wander_target) < self.config.waypoint_reach_distance {
            self.state.wander_target = self.pick_wander_target(surface, sampler);
            return Vec2::ZERO;
        }

        (self.state.wander_target - position).normalize_or_zero()
    }

    fn pick_wander_target<S, R>(&self, surface: Option<&S>, sampler: &mut R) -> Vec2
    where
        S: GridSurface + ?Sized,
        R: DiskSampler + ?Sized,
    {
        for _ in 0..self.config.wander_sample_attempts {
            let candidate = self.spawn + sampler.sample_disk(self.config.wander_radius);
            match surface {
                Some(surface) if !surface.is_passable(surface.world_to_cell(candidate)) => {}
                _ => return candidate,
            }
        }

        log::debug!(
            "agent {} found no passable wander target, falling back to spawn",
            self.id.get()
        );
        self.spawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chase_core::CellCoord;

    const FRAME: Duration = Duration::from_millis(20);
    const NO_TARGET: Option<Vec2> = None;

    /// Unit-tile surface bounded to `[0, size) x [0, size)`.
    struct OpenSurface {
        size: i32,
    }

    impl GridSurface for OpenSurface {
        fn is_passable(&self, cell: CellCoord) -> bool {
            (0..self.size).contains(&cell.x()) && (0..self.size).contains(&cell.y())
        }

        fn world_to_cell(&self, position: Vec2) -> CellCoord {
            CellCoord::new(position.x.floor() as i32, position.y.floor() as i32)
        }

        fn cell_center(&self, cell: CellCoord) -> Vec2 {
            Vec2::new(cell.x() as f32 + 0.5, cell.y() as f32 + 0.5)
        }
    }

    /// Sampler that replays a fixed list of offsets, then repeats the last one.
    struct ScriptedSampler {
        offsets: Vec<Vec2>,
        cursor: usize,
    }

    impl ScriptedSampler {
        fn new(offsets: Vec<Vec2>) -> Self {
            Self { offsets, cursor: 0 }
        }
    }

    impl DiskSampler for ScriptedSampler {
        fn sample_disk(&mut self, _radius: f32) -> Vec2 {
            let index = self.cursor.min(self.offsets.len().saturating_sub(1));
            self.cursor += 1;
            self.offsets.get(index).copied().unwrap_or(Vec2::ZERO)
        }
    }

    fn pursuer(spawn: Vec2) -> Pursuit {
        Pursuit::new(AgentId::new(1), PursuitConfig::default(), spawn).expect("valid config")
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = PursuitConfig {
            speed: -2.0,
            ..PursuitConfig::default()
        };

        assert!(Pursuit::new(AgentId::new(1), config, Vec2::ZERO).is_err());
    }

    #[test]
    fn out_of_range_interval_is_rejected_at_construction() {
        let config = PursuitConfig {
            path_update_rate: 1e20,
            ..PursuitConfig::default()
        };

        assert!(matches!(
            Pursuit::new(AgentId::new(1), config, Vec2::ZERO),
            Err(ConfigError::InvalidParameter {
                name: "path_update_rate",
                ..
            })
        ));
    }

    #[test]
    fn wander_target_falls_back_to_spawn_when_samples_fail() {
        let surface = OpenSurface { size: 4 };
        let spawn = Vec2::new(1.5, 1.5);
        let mut agent = pursuer(spawn);
        let mut sampler = ScriptedSampler::new(vec![Vec2::new(50.0, 50.0)]);

        let velocity = agent.fixed_tick(FRAME, Some(&surface), &NO_TARGET, &mut sampler);

        assert_eq!(velocity, Vec2::ZERO);
        assert_eq!(agent.wander_target(), spawn);
        assert_eq!(sampler.cursor, 10);
    }

    #[test]
    fn wander_target_accepts_first_passable_sample() {
        let surface = OpenSurface { size: 8 };
        let spawn = Vec2::new(1.5, 1.5);
        let mut agent = pursuer(spawn);
        let mut sampler =
            ScriptedSampler::new(vec![Vec2::new(-5.0, 0.0), Vec2::new(2.0, 1.0)]);

        let _ = agent.fixed_tick(FRAME, Some(&surface), &NO_TARGET, &mut sampler);

        assert_eq!(agent.wander_target(), Vec2::new(3.5, 2.5));
        assert_eq!(agent.mode(), PursuitMode::Wandering);
    }

    #[test]
    fn wandering_steers_toward_target_at_full_speed() {
        let surface = OpenSurface { size: 8 };
        let mut agent = pursuer(Vec2::new(1.5, 1.5));
        let mut sampler = ScriptedSampler::new(vec![Vec2::new(3.0, 0.0)]);

        let _ = agent.fixed_tick(FRAME, Some(&surface), &NO_TARGET, &mut sampler);
        let velocity = agent.fixed_tick(FRAME, Some(&surface), &NO_TARGET, &mut sampler);

        assert_eq!(velocity, Vec2::new(3.0, 0.0));
    }

    #[test]
    fn exhausted_path_holds_position_until_next_replan() {
        let surface = OpenSurface { size: 8 };
        let mut agent = pursuer(Vec2::new(1.5, 1.5));
        let mut sampler = ScriptedSampler::new(vec![Vec2::ZERO]);
        let target = Vec2::new(2.5, 1.5);

        let _ = agent.fixed_tick(FRAME, Some(&surface), &target, &mut sampler);
        assert_eq!(agent.path().len(), 1);

        agent.set_position(Vec2::new(2.45, 1.5));
        let velocity = agent.fixed_tick(FRAME, Some(&surface), &target, &mut sampler);

        assert_eq!(agent.waypoint_index(), 1);
        assert_eq!(agent.current_waypoint(), None);
        assert_eq!(velocity, Vec2::ZERO);
    }

    #[test]
    fn chasing_inside_the_target_cell_closes_in_directly() {
        let surface = OpenSurface { size: 8 };
        let mut agent = pursuer(Vec2::new(1.2, 1.5));
        let mut sampler = ScriptedSampler::new(vec![Vec2::new(-1.0, 0.0)]);
        let target = Vec2::new(1.8, 1.5);

        let velocity = agent.fixed_tick(FRAME, Some(&surface), &target, &mut sampler);

        assert_eq!(agent.mode(), PursuitMode::Chasing);
        assert!(agent.path().is_empty());
        assert_eq!(velocity, Vec2::new(3.0, 0.0));
    }

    #[test]
    fn chasing_holds_once_on_top_of_the_target() {
        let surface = OpenSurface { size: 8 };
        let mut agent = pursuer(Vec2::new(1.5, 1.5));
        let mut sampler = ScriptedSampler::new(vec![Vec2::new(-1.0, 0.0)]);
        let target = Vec2::new(1.6, 1.5);

        for _ in 0..30 {
            let velocity = agent.fixed_tick(FRAME, Some(&surface), &target, &mut sampler);
            agent.integrate(FRAME);
            assert_eq!(velocity, Vec2::ZERO);
        }

        assert_eq!(agent.position(), Vec2::new(1.5, 1.5));
    }

    #[test]
    fn chasing_without_surface_falls_back_to_wandering_steering() {
        let mut agent = pursuer(Vec2::new(1.5, 1.5));
        let mut sampler = ScriptedSampler::new(vec![Vec2::new(0.0, 2.0)]);
        let target = Vec2::new(4.0, 1.5);

        let first = agent.fixed_tick::<OpenSurface, _, _>(FRAME, None, &target, &mut sampler);
        assert_eq!(agent.mode(), PursuitMode::Chasing);
        assert!(agent.path().is_empty());
        assert_eq!(first, Vec2::ZERO);

        let second = agent.fixed_tick::<OpenSurface, _, _>(FRAME, None, &target, &mut sampler);
        assert_eq!(second, Vec2::new(0.0, 3.0));
    }

    #[test]
    fn orientation_follows_resolved_heading_outside_deadzone() {
        let surface = OpenSurface { size: 8 };
        let mut agent = pursuer(Vec2::new(4.5, 4.5));
        let mut sampler = ScriptedSampler::new(vec![Vec2::new(-2.0, 0.0)]);
        let mut sink: Vec<f32> = Vec::new();

        let _ = agent.fixed_tick(FRAME, Some(&surface), &NO_TARGET, &mut sampler);
        let _ = agent.fixed_tick(FRAME, Some(&surface), &NO_TARGET, &mut sampler);
        let _ = agent.tick(FRAME, &NO_TARGET, &mut sink);
        assert_eq!(agent.facing(), Facing::Left);

        agent.set_position(Vec2::new(4.5, 4.5));
        let mut sampler = ScriptedSampler::new(vec![Vec2::new(0.0, 2.0)]);
        agent.reset(Some(&surface), &mut sampler);
        let _ = agent.fixed_tick(FRAME, Some(&surface), &NO_TARGET, &mut sampler);
        let _ = agent.tick(FRAME, &NO_TARGET, &mut sink);
        assert_eq!(agent.facing(), Facing::Left, "vertical motion keeps orientation");
    }

    #[test]
    fn reset_restores_spawn_and_picks_new_target() {
        let surface = OpenSurface { size: 8 };
        let spawn = Vec2::new(2.5, 2.5);
        let mut agent = pursuer(spawn);
        let mut sampler = ScriptedSampler::new(vec![Vec2::new(1.0, 0.0)]);
        let target = Vec2::new(5.5, 2.5);

        let _ = agent.fixed_tick(FRAME, Some(&surface), &target, &mut sampler);
        agent.integrate(Duration::from_millis(200));
        assert_eq!(agent.mode(), PursuitMode::Chasing);
        assert!(!agent.path().is_empty());

        let mut sampler = ScriptedSampler::new(vec![Vec2::new(0.0, -1.0)]);
        agent.reset(Some(&surface), &mut sampler);

        assert_eq!(agent.position(), spawn);
        assert_eq!(agent.velocity(), Vec2::ZERO);
        assert!(agent.path().is_empty());
        assert_eq!(agent.mode(), PursuitMode::Wandering);
        assert_eq!(agent.wander_target(), Vec2::new(2.5, 1.5));
    }
}
