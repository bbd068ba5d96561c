//! Runtime settings

use std::{path::PathBuf, time::Duration};

use crate::config::{CliArgs, cli::Command};

/// Runtime configuration settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub state_file: PathBuf,
    pub camera_root: PathBuf,
    pub frame_interval: Duration,
    pub command: Command,
}

impl From<CliArgs> for Settings {
    fn from(args: CliArgs) -> Self {
        // A zero interval would spin the sampler
        let frame_interval = Duration::from_millis(args.frame_interval_ms.max(1));

        Settings {
            state_file: args.state_file,
            camera_root: args.camera_root,
            frame_interval,
            command: args.command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_frame_interval_is_clamped() {
        let args = CliArgs::parse_from(["wifi-qr", "--frame-interval-ms", "0", "devices"]);
        let settings = Settings::from(args);
        assert_eq!(settings.frame_interval, Duration::from_millis(1));
    }

    #[test]
    fn test_settings_from_defaults() {
        let settings = Settings::from(CliArgs::parse_from(["wifi-qr", "devices"]));
        assert_eq!(settings.frame_interval, Duration::from_millis(16));
        assert_eq!(settings.state_file, PathBuf::from("wifi-qr-state.json"));
        assert_eq!(settings.command, Command::Devices);
    }
}
