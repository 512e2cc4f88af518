//! Optional TOML settings file for the headless simulation.

use std::{fs, path::Path};

use anyhow::{ensure, Context, Result};
use chase_system_movement::DriverConfig;
use chase_system_pursuit::PursuitConfig;
use serde::{Deserialize, Serialize};

/// Tuning for every agent in a session.
///
/// Both tables are optional; missing keys keep their defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    /// Parameters shared by every pursuer.
    pub(crate) pursuit: PursuitConfig,
    /// Parameters of the scripted player.
    pub(crate) driver: DriverConfig,
}

impl Settings {
    /// Reads settings from `path`, or returns the defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let document = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        Self::parse(&document).with_context(|| format!("invalid settings in {}", path.display()))
    }

    fn parse(document: &str) -> Result<Self> {
        let settings: Self = toml::from_str(document).context("malformed settings document")?;
        settings.pursuit.validate()?;

        let driver = [
            ("speed", settings.driver.speed),
            ("edge_offset", settings.driver.edge_offset),
            ("orientation_deadzone", settings.driver.orientation_deadzone),
        ];
        for (name, value) in driver {
            ensure!(
                value.is_finite() && value >= 0.0,
                "driver `{name}` must be finite and non-negative, got {value}"
            );
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_yields_defaults() {
        assert_eq!(Settings::load(None).expect("defaults"), Settings::default());
    }

    #[test]
    fn tables_override_selected_keys() {
        let settings = Settings::parse(
            "[pursuit]\nchase_range = 4.0\n\n[driver]\nspeed = 6.5\n",
        )
        .expect("valid settings");

        assert_eq!(settings.pursuit.chase_range, 4.0);
        assert_eq!(settings.pursuit.speed, PursuitConfig::default().speed);
        assert_eq!(settings.driver.speed, 6.5);
    }

    #[test]
    fn invalid_pursuit_values_are_rejected() {
        assert!(Settings::parse("[pursuit]\nwander_radius = -1.0\n").is_err());
        assert!(Settings::parse("[pursuit]\nmax_iterations = 0\n").is_err());
    }

    #[test]
    fn invalid_driver_values_are_rejected() {
        assert!(Settings::parse("[driver]\nspeed = -3.0\n").is_err());
        assert!(Settings::parse("[driver]\norientation_deadzone = -0.5\n").is_err());
    }

    #[test]
    fn oversized_pursuit_intervals_are_reported_not_panicked() {
        let error = Settings::parse("[pursuit]\npath_update_rate = 1e20\n")
            .expect_err("interval out of range");

        assert!(error.to_string().contains("path_update_rate"));
    }

    #[test]
    fn missing_file_reports_its_path() {
        let error = Settings::load(Some(Path::new("/definitely/not/here.toml")))
            .expect_err("missing file");

        assert!(error.to_string().contains("/definitely/not/here.toml"));
    }
}
