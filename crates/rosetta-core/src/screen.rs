//! Top-level screen and orchestrator phase.

use std::fmt;

use serde::Serialize;

/// Which presentation screen is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    #[default]
    Input,
    Processing,
    Results,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Input => "input",
            Self::Processing => "processing",
            Self::Results => "results",
        })
    }
}

/// Orchestrator state machine: `Idle -> Dispatching -> Settling -> Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    #[default]
    Idle,
    Dispatching,
    Settling,
    Done,
}

impl RunPhase {
    /// A run has been started and not all of its tasks have settled.
    #[must_use]
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Dispatching | Self::Settling)
    }

    /// Screen shown for this phase once a run has started.
    #[must_use]
    pub fn screen(self) -> Screen {
        match self {
            Self::Idle | Self::Dispatching | Self::Settling => Screen::Processing,
            Self::Done => Screen::Results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_screen_mapping() {
        assert_eq!(RunPhase::Idle.screen(), Screen::Processing);
        assert_eq!(RunPhase::Settling.screen(), Screen::Processing);
        assert_eq!(RunPhase::Done.screen(), Screen::Results);
    }

    #[test]
    fn in_flight_phases() {
        assert!(!RunPhase::Idle.is_in_flight());
        assert!(RunPhase::Dispatching.is_in_flight());
        assert!(RunPhase::Settling.is_in_flight());
        assert!(!RunPhase::Done.is_in_flight());
    }

    #[test]
    fn screen_defaults_to_input() {
        assert_eq!(Screen::default(), Screen::Input);
        assert_eq!(Screen::Results.to_string(), "results");
    }
}
