#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tile-constrained movement resolution for agents driving on a grid surface.
//!
//! [`resolve`] turns a desired direction into a velocity that never carries the
//! agent's leading edge onto an impassable cell. When the full step is blocked
//! each axis is tested on its own, so an agent pushing diagonally into a wall
//! keeps sliding along whichever axis is still open. The resolver only returns
//! velocities; integrating them into positions is left to the host.

use std::time::Duration;

use chase_core::{Facing, GridSurface, MovementIntent};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Computes the constrained velocity for one fixed simulation step.
///
/// The desired direction is clamped to unit length and non-finite input is
/// treated as a request to stand still. The collision probe sits
/// `edge_offset` world units ahead of `position` along the direction of
/// travel. Without a surface movement is unconstrained.
#[must_use]
pub fn resolve<S>(
    position: Vec2,
    desired_direction: Vec2,
    speed: f32,
    dt: Duration,
    edge_offset: f32,
    surface: Option<&S>,
) -> Vec2
where
    S: GridSurface + ?Sized,
{
    let direction = if desired_direction.is_finite() {
        desired_direction.clamp_length_max(1.0)
    } else {
        Vec2::ZERO
    };

    let Some(surface) = surface else {
        return direction * speed;
    };

    let probe = position + direction.normalize_or_zero() * edge_offset;
    let step = speed * dt.as_secs_f32();
    let passable = |target: Vec2| surface.is_passable(surface.world_to_cell(target));

    if passable(probe + direction * step) {
        return direction * speed;
    }

    let kept_x = if passable(probe + Vec2::new(direction.x * step, 0.0)) {
        direction.x
    } else {
        0.0
    };
    let kept_y = if passable(probe + Vec2::new(0.0, direction.y * step)) {
        direction.y
    } else {
        0.0
    };

    Vec2::new(kept_x, kept_y) * speed
}

/// Position and velocity of a body integrated by the host.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KinematicBody {
    /// World-space position of the body's center.
    pub position: Vec2,
    /// Velocity applied during the next integration step.
    pub velocity: Vec2,
}

impl KinematicBody {
    /// Creates a body at rest at the provided position.
    #[must_use]
    pub const fn at(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
        }
    }

    /// Advances the position by one explicit Euler step.
    pub fn integrate(&mut self, dt: Duration) {
        self.position += self.velocity * dt.as_secs_f32();
    }
}

/// Tuning for the player-controlled agent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Top speed in world units per second.
    pub speed: f32,
    /// Distance from the body's center to its leading edge.
    pub edge_offset: f32,
    /// Horizontal intent below which the orientation is left unchanged.
    pub orientation_deadzone: f32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            speed: 4.0,
            edge_offset: 0.3,
            orientation_deadzone: 0.01,
        }
    }
}

/// Player-controlled agent that stays on the passable surface.
///
/// Input is sampled on the frame tick, while velocity is resolved on the fixed
/// tick so integration stays stable across frame rates.
#[derive(Clone, Debug)]
pub struct PlayerDriver {
    config: DriverConfig,
    spawn: Vec2,
    body: KinematicBody,
    intent: MovementIntent,
    facing: Facing,
}

impl PlayerDriver {
    /// Creates a driver resting at its spawn position.
    #[must_use]
    pub fn new(config: DriverConfig, spawn: Vec2) -> Self {
        Self {
            config,
            spawn,
            body: KinematicBody::at(spawn),
            intent: MovementIntent::IDLE,
            facing: Facing::default(),
        }
    }

    /// Records the intent for the coming fixed steps.
    pub fn tick(&mut self, intent: MovementIntent) {
        self.intent = intent;
    }

    /// Resolves the stored intent into a velocity for this fixed step.
    ///
    /// Orientation follows the resolved velocity, so pushing into a wall does
    /// not turn the driver toward it.
    pub fn fixed_tick<S>(&mut self, dt: Duration, surface: Option<&S>) -> Vec2
    where
        S: GridSurface + ?Sized,
    {
        self.body.velocity = resolve(
            self.body.position,
            self.intent.direction(),
            self.config.speed,
            dt,
            self.config.edge_offset,
            surface,
        );

        if self.config.speed > 0.0 {
            let heading = self.body.velocity / self.config.speed;
            if let Some(facing) =
                Facing::from_horizontal(heading.x, self.config.orientation_deadzone)
            {
                self.facing = facing;
            }
        }
        self.body.velocity
    }

    /// Integrates the last resolved velocity into the position.
    pub fn integrate(&mut self, dt: Duration) {
        self.body.integrate(dt);
    }

    /// Overrides the position with one integrated by the host.
    pub fn set_position(&mut self, position: Vec2) {
        self.body.position = position;
    }

    /// Returns the driver to its spawn at rest with no pending intent.
    pub fn reset(&mut self) {
        self.body = KinematicBody::at(self.spawn);
        self.intent = MovementIntent::IDLE;
    }

    /// Current world-space position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    /// Velocity resolved on the last fixed tick.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.body.velocity
    }

    /// Intent recorded on the last frame tick.
    #[must_use]
    pub fn intent(&self) -> MovementIntent {
        self.intent
    }

    /// Horizontal orientation flag.
    #[must_use]
    pub fn facing(&self) -> Facing {
        self.facing
    }
}
