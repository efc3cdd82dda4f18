use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// Startup configuration, read once from the agent's JSON config file.
///
/// Only the arbiter endpoint is required in the file; every other option
/// falls back to its default.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Config {
    /// Arbiter endpoint
    pub server_address: String,
    pub server_port: u16,

    /// Loop actions back to the arbiter instead of driving a robot
    pub simulation_mode: bool,

    /// Downstream controller endpoint
    pub robot_address: String,
    pub robot_port: u16,

    /// Whether the dispatcher retransmits unacknowledged actions
    pub reliability_enabled: bool,

    /// Expected arbiter tick rate, used to pace the outbound dispatcher
    #[serde(rename = "GameFPS")]
    pub game_fps: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_address: "localhost".into(),
            server_port: 3002,
            simulation_mode: false,
            robot_address: "localhost".into(),
            robot_port: 5005,
            reliability_enabled: true,
            game_fps: 24,
        }
    }
}

impl Config {
    /// Read the configuration file at `path`
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_parses() {
        let config: Config = serde_json::from_str(
            r#"{
                "ServerAddress": "10.0.0.2",
                "ServerPort": 3000,
                "SimulationMode": true,
                "RobotAddress": "10.0.0.3",
                "RobotPort": 9000,
                "ReliabilityEnabled": false,
                "GameFPS": 30
            }"#,
        )
        .unwrap();

        assert_eq!(config.server_address, "10.0.0.2");
        assert_eq!(config.server_port, 3000);
        assert!(config.simulation_mode);
        assert_eq!(config.robot_address, "10.0.0.3");
        assert_eq!(config.robot_port, 9000);
        assert!(!config.reliability_enabled);
        assert_eq!(config.game_fps, 30);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "ServerAddress": "arbiter.local" }"#).unwrap();
        assert_eq!(config.server_address, "arbiter.local");
        assert_eq!(config.server_port, 3002);
        assert_eq!(config.game_fps, 24);
        assert!(!config.simulation_mode);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::load("/nonexistent/config.json").is_err());
    }
}
