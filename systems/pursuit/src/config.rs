//! Tuning knobs for pursuing agents.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a [`PursuitConfig`] is rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A scalar parameter is negative, not finite, or too large to express
    /// as an interval.
    #[error("`{name}` is out of range, got {value}")]
    InvalidParameter {
        /// Name of the offending field.
        name: &'static str,
        /// Value supplied for the field.
        value: f32,
    },
    /// The search budget would stop every replan before it starts.
    #[error("`max_iterations` must be at least one")]
    ZeroIterationCap,
    /// The TOML document could not be decoded.
    #[error("failed to decode pursuit configuration")]
    Decode(#[from] toml::de::Error),
}

/// Named scalar parameters supplied when a pursuing agent is constructed.
///
/// Distances are in world units and intervals in seconds. The controller
/// validates the configuration once and never changes it afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PursuitConfig {
    /// Top speed in world units per second.
    pub speed: f32,
    /// Distance from the agent's center to its leading edge, used as the
    /// collision probe offset.
    pub edge_offset: f32,
    /// Distance at or below which the agent starts chasing the target.
    pub chase_range: f32,
    /// Seconds of simulation time between two path recomputations while chasing.
    pub path_update_rate: f32,
    /// Distance below which a waypoint or wander target counts as reached.
    pub waypoint_reach_distance: f32,
    /// Radius around the spawn position within which wander targets are drawn.
    pub wander_radius: f32,
    /// Number of random samples tried before wandering falls back to the spawn.
    pub wander_sample_attempts: u32,
    /// Distance at or below which contact with the target triggers an effect.
    pub contact_damage_radius: f32,
    /// Minimum seconds of simulation time between two contact effects.
    pub damage_cooldown: f32,
    /// Magnitude handed to the damage sink per contact effect.
    pub contact_damage: f32,
    /// Cap on cells dequeued by a single path search.
    pub max_iterations: usize,
    /// Horizontal direction component below which orientation is left unchanged.
    pub orientation_deadzone: f32,
}

impl Default for PursuitConfig {
    fn default() -> Self {
        Self {
            speed: 3.0,
            edge_offset: 0.3,
            chase_range: 8.0,
            path_update_rate: 0.5,
            waypoint_reach_distance: 0.2,
            wander_radius: 3.0,
            wander_sample_attempts: 10,
            contact_damage_radius: 0.6,
            damage_cooldown: 1.0,
            contact_damage: 10.0,
            max_iterations: 2_000,
            orientation_deadzone: 0.01,
        }
    }
}

impl PursuitConfig {
    /// Decodes and validates a configuration from a TOML document.
    ///
    /// Missing keys keep their default values.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every scalar is usable by the controller.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scalars = [
            ("speed", self.speed),
            ("edge_offset", self.edge_offset),
            ("chase_range", self.chase_range),
            ("path_update_rate", self.path_update_rate),
            ("waypoint_reach_distance", self.waypoint_reach_distance),
            ("wander_radius", self.wander_radius),
            ("contact_damage_radius", self.contact_damage_radius),
            ("damage_cooldown", self.damage_cooldown),
            ("contact_damage", self.contact_damage),
            ("orientation_deadzone", self.orientation_deadzone),
        ];

        for (name, value) in scalars {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidParameter { name, value });
            }
        }

        let intervals = [
            ("path_update_rate", self.path_update_rate),
            ("damage_cooldown", self.damage_cooldown),
        ];
        for (name, value) in intervals {
            if Duration::try_from_secs_f32(value).is_err() {
                return Err(ConfigError::InvalidParameter { name, value });
            }
        }

        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroIterationCap);
        }

        Ok(())
    }

    /// Replanning cadence as a duration.
    ///
    /// Rates that [`PursuitConfig::validate`] rejects saturate to
    /// [`Duration::MAX`].
    #[must_use]
    pub fn path_update_interval(&self) -> Duration {
        seconds(self.path_update_rate)
    }

    /// Contact effect cooldown as a duration, saturating like
    /// [`PursuitConfig::path_update_interval`].
    #[must_use]
    pub fn damage_cooldown_interval(&self) -> Duration {
        seconds(self.damage_cooldown)
    }
}

fn seconds(value: f32) -> Duration {
    Duration::try_from_secs_f32(value).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PursuitConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_documents_keep_defaults() {
        let config = PursuitConfig::from_toml_str("chase_range = 12.5\nmax_iterations = 64\n")
            .expect("valid document");

        assert_eq!(config.chase_range, 12.5);
        assert_eq!(config.max_iterations, 64);
        assert_eq!(config.speed, PursuitConfig::default().speed);
    }

    #[test]
    fn toml_round_trip_preserves_values() {
        let config = PursuitConfig {
            wander_sample_attempts: 3,
            damage_cooldown: 0.25,
            ..PursuitConfig::default()
        };
        let document = toml::to_string(&config).expect("serialize");

        assert_eq!(PursuitConfig::from_toml_str(&document).expect("decode"), config);
    }

    #[test]
    fn negative_parameters_are_rejected() {
        let config = PursuitConfig {
            chase_range: -1.0,
            ..PursuitConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter {
                name: "chase_range",
                ..
            })
        ));
    }

    #[test]
    fn non_finite_parameters_are_rejected() {
        let config = PursuitConfig {
            path_update_rate: f32::NAN,
            ..PursuitConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter {
                name: "path_update_rate",
                ..
            })
        ));
    }

    #[test]
    fn intervals_beyond_duration_range_are_rejected() {
        let slow_replans = PursuitConfig {
            path_update_rate: 1e20,
            ..PursuitConfig::default()
        };
        let long_cooldown = PursuitConfig {
            damage_cooldown: 1e20,
            ..PursuitConfig::default()
        };

        assert!(matches!(
            slow_replans.validate(),
            Err(ConfigError::InvalidParameter {
                name: "path_update_rate",
                ..
            })
        ));
        assert!(matches!(
            long_cooldown.validate(),
            Err(ConfigError::InvalidParameter {
                name: "damage_cooldown",
                ..
            })
        ));
        assert_eq!(slow_replans.path_update_interval(), Duration::MAX);
    }

    #[test]
    fn zero_iteration_cap_is_rejected() {
        let config = PursuitConfig {
            max_iterations: 0,
            ..PursuitConfig::default()
        };

        assert!(matches!(config.validate(), Err(ConfigError::ZeroIterationCap)));
    }

    #[test]
    fn malformed_documents_report_decode_errors() {
        assert!(matches!(
            PursuitConfig::from_toml_str("speed = \"fast\""),
            Err(ConfigError::Decode(_))
        ));
    }

    #[test]
    fn intervals_convert_seconds() {
        let config = PursuitConfig {
            path_update_rate: 0.5,
            damage_cooldown: 2.0,
            ..PursuitConfig::default()
        };

        assert_eq!(config.path_update_interval(), Duration::from_millis(500));
        assert_eq!(config.damage_cooldown_interval(), Duration::from_secs(2));
    }
}
