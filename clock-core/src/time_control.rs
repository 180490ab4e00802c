use std::fmt;
use std::str::FromStr;

use crate::ClockError;

/// A "minutes+incrementSeconds" time control token.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TimeControl {
    pub minutes: u32,
    pub increment_sec: u32,
}

impl TimeControl {
    pub const fn new(minutes: u32, increment_sec: u32) -> Self {
        Self { minutes, increment_sec }
    }

    pub fn parse(token: &str) -> Result<Self, ClockError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ClockError::EmptyToken);
        }
        let (minutes, increment) = token
            .split_once('+')
            .ok_or_else(|| ClockError::MissingSeparator(token.to_string()))?;
        let minutes: u32 = minutes
            .trim()
            .parse()
            .map_err(|_| ClockError::InvalidMinutes(token.to_string()))?;
        let increment_sec: u32 = increment
            .trim()
            .parse()
            .map_err(|_| ClockError::InvalidIncrement(token.to_string()))?;
        if minutes == 0 {
            return Err(ClockError::ZeroStartTime(token.to_string()));
        }
        Ok(Self { minutes, increment_sec })
    }

    pub fn start_ms(&self) -> u64 {
        self.minutes as u64 * 60_000
    }
}

impl FromStr for TimeControl {
    type Err = ClockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TimeControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.minutes, self.increment_sec)
    }
}

/// Parse a seconds field (increment, delay) as a non-negative integer.
pub fn parse_seconds(text: &str) -> Result<u32, ClockError> {
    text.trim()
        .parse()
        .map_err(|_| ClockError::InvalidNumber(text.to_string()))
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum DelayType {
    #[default]
    None,
    Bronstein,
    Fischer,
}

impl DelayType {
    pub fn label(self) -> &'static str {
        match self {
            DelayType::None => "none",
            DelayType::Bronstein => "bronstein",
            DelayType::Fischer => "fischer",
        }
    }

    /// Next value in settings order, wrapping.
    pub fn cycle(self) -> Self {
        match self {
            DelayType::None => DelayType::Bronstein,
            DelayType::Bronstein => DelayType::Fischer,
            DelayType::Fischer => DelayType::None,
        }
    }
}

impl FromStr for DelayType {
    type Err = ClockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(DelayType::None),
            "bronstein" => Ok(DelayType::Bronstein),
            "fischer" => Ok(DelayType::Fischer),
            _ => Err(ClockError::UnknownDelayType(s.to_string())),
        }
    }
}

impl fmt::Display for DelayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PresetCategory {
    Bullet,
    Blitz,
    Rapid,
}

impl PresetCategory {
    pub fn label(self) -> &'static str {
        match self {
            PresetCategory::Bullet => "Bullet",
            PresetCategory::Blitz => "Blitz",
            PresetCategory::Rapid => "Rapid",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Preset {
    pub category: PresetCategory,
    pub time_control: TimeControl,
}

const fn preset(category: PresetCategory, minutes: u32, increment_sec: u32) -> Preset {
    Preset {
        category,
        time_control: TimeControl::new(minutes, increment_sec),
    }
}

pub const PRESETS: &[Preset] = &[
    preset(PresetCategory::Bullet, 1, 0),
    preset(PresetCategory::Bullet, 1, 1),
    preset(PresetCategory::Bullet, 2, 1),
    preset(PresetCategory::Blitz, 3, 0),
    preset(PresetCategory::Blitz, 3, 2),
    preset(PresetCategory::Blitz, 5, 0),
    preset(PresetCategory::Blitz, 5, 2),
    preset(PresetCategory::Blitz, 5, 5),
    preset(PresetCategory::Rapid, 10, 0),
    preset(PresetCategory::Rapid, 10, 5),
    preset(PresetCategory::Rapid, 15, 0),
    preset(PresetCategory::Rapid, 15, 10),
    preset(PresetCategory::Rapid, 30, 0),
];

pub fn presets(category: PresetCategory) -> impl Iterator<Item = &'static Preset> {
    PRESETS.iter().filter(move |p| p.category == category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens() {
        for (token, minutes, inc) in [("1+0", 1, 0), ("10+5", 10, 5), ("15+10", 15, 10), ("90+30", 90, 30)] {
            let tc = TimeControl::parse(token).unwrap();
            assert_eq!(tc.start_ms(), minutes * 60_000);
            assert_eq!(tc.increment_sec, inc);
        }
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let tc: TimeControl = " 3 + 2 ".parse().unwrap();
        assert_eq!(tc, TimeControl::new(3, 2));
        assert_eq!(tc.to_string(), "3+2");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(TimeControl::parse(""), Err(ClockError::EmptyToken));
        assert_eq!(
            TimeControl::parse("10"),
            Err(ClockError::MissingSeparator("10".into()))
        );
        assert_eq!(
            TimeControl::parse("ten+5"),
            Err(ClockError::InvalidMinutes("ten+5".into()))
        );
        assert_eq!(
            TimeControl::parse("-1+5"),
            Err(ClockError::InvalidMinutes("-1+5".into()))
        );
        assert_eq!(
            TimeControl::parse("10+"),
            Err(ClockError::InvalidIncrement("10+".into()))
        );
        assert_eq!(
            TimeControl::parse("0+5"),
            Err(ClockError::ZeroStartTime("0+5".into()))
        );
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("5"), Ok(5));
        assert_eq!(parse_seconds(" 0 "), Ok(0));
        assert!(parse_seconds("-3").is_err());
        assert!(parse_seconds("2.5").is_err());
        assert!(parse_seconds("").is_err());
    }

    #[test]
    fn test_delay_type_parse_and_cycle() {
        assert_eq!("Bronstein".parse::<DelayType>(), Ok(DelayType::Bronstein));
        assert_eq!("fischer".parse::<DelayType>(), Ok(DelayType::Fischer));
        assert!("simple".parse::<DelayType>().is_err());
        assert_eq!(DelayType::None.cycle().cycle().cycle(), DelayType::None);
    }

    #[test]
    fn test_presets_by_category() {
        let bullet: Vec<String> = presets(PresetCategory::Bullet)
            .map(|p| p.time_control.to_string())
            .collect();
        assert_eq!(bullet, ["1+0", "1+1", "2+1"]);
        assert_eq!(presets(PresetCategory::Blitz).count(), 5);
        assert_eq!(presets(PresetCategory::Rapid).count(), 5);
        assert_eq!(PRESETS.len(), 13);
    }
}
