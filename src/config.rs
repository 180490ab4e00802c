use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clock_core::{parse_seconds, ClockConfig, DelayType, SideConfig, TimeControl, TICK_MS};
use serde::Deserialize;

use crate::alerts::AlertConfig;
use crate::cli::Cli;

const DEFAULT_TIME_CONTROL: &str = "10+0";

/// Defaults read from `--config`. Command-line flags win over every field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    pub white: Option<String>,
    pub black: Option<String>,
    pub white_increment: Option<u32>,
    pub black_increment: Option<u32>,
    pub delay_type: Option<String>,
    pub delay_seconds: Option<u32>,
    pub tick_ms: Option<u64>,
    pub export_dir: Option<PathBuf>,
    pub bell: Option<bool>,
    pub notification: Option<bool>,
}

pub fn load_file(path: &Path) -> Result<FileSettings> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

pub struct AppSettings {
    pub clock: ClockConfig,
    pub alerts: AlertConfig,
    pub export_dir: PathBuf,
}

pub fn resolve(cli: &Cli, file: FileSettings) -> Result<AppSettings> {
    let white_token = cli
        .white
        .clone()
        .or(file.white)
        .unwrap_or_else(|| DEFAULT_TIME_CONTROL.to_string());
    let white_tc = TimeControl::parse(&white_token).context("invalid white time control")?;

    let black_tc = match cli.black.clone().or(file.black) {
        Some(token) => TimeControl::parse(&token).context("invalid black time control")?,
        None => white_tc,
    };

    let white_increment = match &cli.white_increment {
        Some(text) => parse_seconds(text).context("invalid white increment")?,
        None => file.white_increment.unwrap_or(white_tc.increment_sec),
    };
    let black_increment = match &cli.black_increment {
        Some(text) => parse_seconds(text).context("invalid black increment")?,
        None => file.black_increment.unwrap_or(black_tc.increment_sec),
    };

    let delay_type = match cli.delay_type.clone().or(file.delay_type) {
        Some(text) => text.parse::<DelayType>().context("invalid delay type")?,
        None if white_increment > 0 || black_increment > 0 => DelayType::Fischer,
        None => DelayType::None,
    };
    let delay_seconds = match &cli.delay_seconds {
        Some(text) => parse_seconds(text).context("invalid delay")?,
        None => file.delay_seconds.unwrap_or(0),
    };
    if delay_type == DelayType::Bronstein && delay_seconds == 0 {
        log::warn!("bronstein delay selected with a zero-second delay");
    }

    let clock = ClockConfig {
        white: SideConfig {
            time_control: white_tc,
            increment_sec: white_increment,
        },
        black: SideConfig {
            time_control: black_tc,
            increment_sec: black_increment,
        },
        delay_type,
        delay_seconds,
        tick_ms: cli.tick_ms.or(file.tick_ms).unwrap_or(TICK_MS),
    };
    clock.validate()?;

    let defaults = AlertConfig::default();
    let alerts = AlertConfig {
        bell: file.bell.unwrap_or(defaults.bell),
        notification: file.notification.unwrap_or(defaults.notification),
    };

    let export_dir = cli
        .export_dir
        .clone()
        .or(file.export_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(AppSettings {
        clock,
        alerts,
        export_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clock_core::{Side, MAX_TICK_MS};

    #[test]
    fn test_defaults() {
        let settings = resolve(&Cli::default(), FileSettings::default()).unwrap();
        assert_eq!(settings.clock, ClockConfig::default());
        assert_eq!(settings.export_dir, PathBuf::from("."));
        assert!(settings.alerts.bell);
    }

    #[test]
    fn test_increment_token_selects_fischer() {
        let cli = Cli {
            white: Some("3+2".into()),
            ..Cli::default()
        };
        let settings = resolve(&cli, FileSettings::default()).unwrap();
        assert_eq!(settings.clock.delay_type, DelayType::Fischer);
        assert_eq!(settings.clock.side(Side::Black).increment_sec, 2);
        assert_eq!(settings.clock.black.time_control.to_string(), "3+2");
    }

    #[test]
    fn test_cli_overrides_file() {
        let file: FileSettings = serde_json::from_str(
            r#"{ "white": "5+0", "black": "15+10", "delay_type": "bronstein",
                 "delay_seconds": 3, "bell": false }"#,
        )
        .unwrap();
        let cli = Cli {
            white: Some("1+0".into()),
            delay_seconds: Some("2".into()),
            ..Cli::default()
        };
        let settings = resolve(&cli, file).unwrap();
        assert_eq!(settings.clock.white.time_control.to_string(), "1+0");
        assert_eq!(settings.clock.black.time_control.to_string(), "15+10");
        assert_eq!(settings.clock.black.increment_sec, 10);
        assert_eq!(settings.clock.delay_type, DelayType::Bronstein);
        assert_eq!(settings.clock.delay_seconds, 2);
        assert!(!settings.alerts.bell);
    }

    #[test]
    fn test_rejects_bad_input() {
        let bad_token = Cli {
            white: Some("abc".into()),
            ..Cli::default()
        };
        assert!(resolve(&bad_token, FileSettings::default()).is_err());

        let negative = Cli {
            black_increment: Some("-5".into()),
            ..Cli::default()
        };
        assert!(resolve(&negative, FileSettings::default()).is_err());

        let zero_tick = Cli {
            tick_ms: Some(0),
            ..Cli::default()
        };
        assert!(resolve(&zero_tick, FileSettings::default()).is_err());
    }

    #[test]
    fn test_rejects_oversized_tick_period() {
        let huge = Cli {
            tick_ms: Some(u64::MAX),
            ..Cli::default()
        };
        assert!(resolve(&huge, FileSettings::default()).is_err());

        let file = FileSettings {
            tick_ms: Some(MAX_TICK_MS + 1),
            ..FileSettings::default()
        };
        assert!(resolve(&Cli::default(), file).is_err());

        let longest = Cli {
            tick_ms: Some(MAX_TICK_MS),
            ..Cli::default()
        };
        let settings = resolve(&longest, FileSettings::default()).unwrap();
        assert_eq!(settings.clock.tick_ms, MAX_TICK_MS);
    }

    #[test]
    fn test_file_rejects_unknown_fields() {
        let parsed = serde_json::from_str::<FileSettings>(r#"{ "whit": "5+0" }"#);
        assert!(parsed.is_err());
    }
}
