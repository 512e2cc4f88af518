#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the chase simulation.
//!
//! This crate defines the value types and collaborator seams that connect the
//! host, the grid surface, and the pure systems. Systems never construct a
//! surface or look up the player themselves: the host hands them a
//! [`GridSurface`] to query, a [`TargetLocator`] to read the player position
//! from, and receives velocities and one-shot effects back through return
//! values and a [`DamageSink`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Unique identifier assigned to an agent by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
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

/// Location of a single grid cell expressed as integer `x` and `y` coordinates.
///
/// Coordinates may be negative; surfaces decide which cells exist and report
/// everything else as impassable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: i32,
    y: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal index of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical index of the cell. Larger values lie further up.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the cell displaced by the provided offsets, saturating at the
    /// integer bounds.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// The four edge-adjacent cells in fixed order: up, down, left, right.
    ///
    /// Searches rely on this order to break ties between equally short routes
    /// the same way on every run.
    #[must_use]
    pub const fn cardinal_neighbors(self) -> [CellCoord; 4] {
        [
            self.offset(0, 1),
            self.offset(0, -1),
            self.offset(-1, 0),
            self.offset(1, 0),
        ]
    }
}

/// Passability oracle over integer cells with world/cell conversion.
///
/// Implementations must be deterministic and free of side effects for a given
/// static level. Systems only ever read from a surface, so a single surface may
/// be shared between agents.
pub trait GridSurface {
    /// Reports whether an agent may occupy or traverse the cell.
    fn is_passable(&self, cell: CellCoord) -> bool;

    /// Converts a world-space position into the cell that contains it.
    fn world_to_cell(&self, position: Vec2) -> CellCoord;

    /// World-space position of the cell's center.
    fn cell_center(&self, cell: CellCoord) -> Vec2;
}

impl<S> GridSurface for &S
where
    S: GridSurface + ?Sized,
{
    fn is_passable(&self, cell: CellCoord) -> bool {
        (**self).is_passable(cell)
    }

    fn world_to_cell(&self, position: Vec2) -> CellCoord {
        (**self).world_to_cell(position)
    }

    fn cell_center(&self, cell: CellCoord) -> Vec2 {
        (**self).cell_center(cell)
    }
}

/// Source of the pursued target's current world position.
pub trait TargetLocator {
    /// Position of the target this tick, or `None` when it cannot be found.
    fn locate(&self) -> Option<Vec2>;
}

impl TargetLocator for Vec2 {
    fn locate(&self) -> Option<Vec2> {
        Some(*self)
    }
}

impl TargetLocator for Option<Vec2> {
    fn locate(&self) -> Option<Vec2> {
        *self
    }
}

/// Receiver of one-shot contact effects.
///
/// The pursuit controller only decides when an effect fires; what the effect
/// does to the target is up to the sink.
pub trait DamageSink {
    /// Applies a single effect of the given magnitude.
    fn apply_effect(&mut self, magnitude: f32);
}

impl DamageSink for Vec<f32> {
    fn apply_effect(&mut self, magnitude: f32) {
        self.push(magnitude);
    }
}

/// Produces offsets uniformly distributed within a disk.
pub trait DiskSampler {
    /// Draws an offset whose length never exceeds `radius`.
    fn sample_disk(&mut self, radius: f32) -> Vec2;
}

/// Behavioural mode of a pursuing agent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PursuitMode {
    /// Idle roaming around the agent's spawn position.
    #[default]
    Wandering,
    /// Active pursuit of the target along a planned path.
    Chasing,
}

/// Horizontal orientation flag consumed by presentation layers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Facing toward decreasing `x`.
    Left,
    /// Facing toward increasing `x`.
    #[default]
    Right,
}

impl Facing {
    /// Derives the orientation from a horizontal velocity component.
    ///
    /// Returns `None` while the component stays within the deadzone so callers
    /// keep their previous orientation.
    #[must_use]
    pub fn from_horizontal(x: f32, deadzone: f32) -> Option<Self> {
        if x > deadzone {
            Some(Self::Right)
        } else if x < -deadzone {
            Some(Self::Left)
        } else {
            None
        }
    }
}

/// Desired movement direction for one tick, clamped to at most unit length.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MovementIntent {
    direction: Vec2,
}

impl MovementIntent {
    /// Intent that requests no movement.
    pub const IDLE: Self = Self {
        direction: Vec2::ZERO,
    };

    /// Creates an intent from a raw direction, clamping its magnitude to one.
    ///
    /// Non-finite input collapses to [`MovementIntent::IDLE`].
    #[must_use]
    pub fn new(direction: Vec2) -> Self {
        if !direction.is_finite() {
            return Self::IDLE;
        }

        Self {
            direction: direction.clamp_length_max(1.0),
        }
    }

    /// Clamped direction vector.
    #[must_use]
    pub const fn direction(&self) -> Vec2 {
        self.direction
    }

    /// Reports whether the intent requests no movement.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.direction == Vec2::ZERO
    }
}

/// Ordered world-space waypoints leading from an agent toward a goal.
///
/// The start cell is never part of the path while the goal cell always ends
/// it. Paths are replaced wholesale on replanning and cannot be edited.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    waypoints: Vec<Vec2>,
}

impl Path {
    /// Wraps an ordered list of waypoints.
    #[must_use]
    pub fn new(waypoints: Vec<Vec2>) -> Self {
        Self { waypoints }
    }

    /// Path that contains no waypoints.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            waypoints: Vec::new(),
        }
    }

    /// Number of waypoints in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Reports whether the path holds no waypoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Waypoint at the provided index, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Vec2> {
        self.waypoints.get(index).copied()
    }

    /// Final waypoint of the path.
    #[must_use]
    pub fn last(&self) -> Option<Vec2> {
        self.waypoints.last().copied()
    }

    /// All waypoints in travel order.
    #[must_use]
    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }
}

#[cfg(test)]
mod tests {
    use super::{CellCoord, Facing, MovementIntent, Path};
    use glam::Vec2;

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, -3);
        assert_eq!(origin.manhattan_distance(destination), 7);
        assert_eq!(destination.manhattan_distance(origin), 7);
    }

    #[test]
    fn cardinal_neighbors_follow_up_down_left_right() {
        let origin = CellCoord::new(3, 3);
        assert_eq!(
            origin.cardinal_neighbors(),
            [
                CellCoord::new(3, 4),
                CellCoord::new(3, 2),
                CellCoord::new(2, 3),
                CellCoord::new(4, 3),
            ]
        );
    }

    #[test]
    fn cell_coord_round_trips_through_bincode() {
        let cell = CellCoord::new(-5, 7);
        let bytes = bincode::serialize(&cell).expect("serialize");
        let restored: CellCoord = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, cell);
    }

    #[test]
    fn intent_clamps_diagonal_input() {
        let intent = MovementIntent::new(Vec2::new(1.0, 1.0));
        assert!((intent.direction().length() - 1.0).abs() < 1e-6);

        let short = MovementIntent::new(Vec2::new(0.25, 0.0));
        assert_eq!(short.direction(), Vec2::new(0.25, 0.0));
    }

    #[test]
    fn intent_rejects_non_finite_input() {
        assert!(MovementIntent::new(Vec2::new(f32::NAN, 1.0)).is_idle());
    }

    #[test]
    fn facing_respects_deadzone() {
        assert_eq!(Facing::from_horizontal(0.05, 0.1), None);
        assert_eq!(Facing::from_horizontal(-0.5, 0.1), Some(Facing::Left));
        assert_eq!(Facing::from_horizontal(0.5, 0.1), Some(Facing::Right));
    }

    #[test]
    fn empty_path_has_no_waypoints() {
        let path = Path::empty();
        assert!(path.is_empty());
        assert_eq!(path.get(0), None);
        assert_eq!(path.last(), None);
    }
}
