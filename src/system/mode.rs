//! Run mode, fixed for the lifetime of a process.

use std::fmt;
use std::str::FromStr;

/// Whether the run learns the map or localizes against a fixed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Start from an empty map, register new tags, persist on shutdown.
    Setup,
    /// Load a map once and treat it as read-only.
    #[default]
    Navigation,
}

impl RunMode {
    /// New tags may be added to the World Model.
    pub fn registers_tags(self) -> bool {
        self == Self::Setup
    }

    /// The World Model is written out on graceful shutdown.
    pub fn persists_map(self) -> bool {
        self == Self::Setup
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown run mode {0:?} (expected setup or navigation)")]
pub struct ParseRunModeError(String);

impl FromStr for RunMode {
    type Err = ParseRunModeError;

    /// Accepts `setup` / `navigation`, and the boolean `true` / `false`
    /// setup flag.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "setup" | "true" => Ok(Self::Setup),
            "navigation" | "nav" | "false" => Ok(Self::Navigation),
            _ => Err(ParseRunModeError(s.to_string())),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup => write!(f, "setup"),
            Self::Navigation => write!(f, "navigation"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_navigation() {
        assert_eq!(RunMode::default(), RunMode::Navigation);
    }

    #[test]
    fn test_parse() {
        assert_eq!("setup".parse::<RunMode>().unwrap(), RunMode::Setup);
        assert_eq!("True".parse::<RunMode>().unwrap(), RunMode::Setup);
        assert_eq!("NAVIGATION".parse::<RunMode>().unwrap(), RunMode::Navigation);
        assert_eq!("false".parse::<RunMode>().unwrap(), RunMode::Navigation);
        assert!("maybe".parse::<RunMode>().is_err());
    }

    #[test]
    fn test_only_setup_writes() {
        assert!(RunMode::Setup.registers_tags());
        assert!(RunMode::Setup.persists_map());
        assert!(!RunMode::Navigation.registers_tags());
        assert!(!RunMode::Navigation.persists_map());
    }
}
