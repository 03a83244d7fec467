//! Wizard phase — which tier of the state machine the session is in.

use serde::{Deserialize, Serialize};

/// The phases of an enrollment session.
///
/// `Active` covers every visible step (the cursor says which one).
/// `Submitting` is the loading sub-state while the backend runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WizardPhase {
    #[default]
    Active,
    Submitting,
    Submitted,
}

impl WizardPhase {
    /// Check if a transition from `self` to `target` is valid.
    ///
    /// Any phase may go back to `Active` through a reset; `Submitting`
    /// also returns there when the backend fails.
    pub fn can_transition_to(&self, target: WizardPhase) -> bool {
        use WizardPhase::*;
        matches!(
            (self, target),
            (Active, Submitting)
                | (Submitting, Submitted)
                | (Submitting, Active)
                | (Submitted, Active)
                | (Active, Active)
        )
    }

    /// Whether this phase is terminal (the enrollment is done).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Submitted)
    }

    /// Whether field edits and navigation are accepted.
    pub fn accepts_input(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for WizardPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Submitting => "submitting",
            Self::Submitted => "submitted",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        use WizardPhase::*;
        for (from, to) in [
            (Active, Submitting),
            (Submitting, Submitted),
            (Submitting, Active),
            (Submitted, Active),
        ] {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use WizardPhase::*;
        assert!(!Active.can_transition_to(Submitted));
        assert!(!Submitting.can_transition_to(Submitting));
        assert!(!Submitted.can_transition_to(Submitting));
        assert!(!Submitted.can_transition_to(Submitted));
    }

    #[test]
    fn only_active_accepts_input() {
        assert!(WizardPhase::Active.accepts_input());
        assert!(!WizardPhase::Submitting.accepts_input());
        assert!(!WizardPhase::Submitted.accepts_input());
        assert!(WizardPhase::Submitted.is_terminal());
        assert!(!WizardPhase::Active.is_terminal());
    }

    #[test]
    fn display_matches_serde() {
        for phase in [WizardPhase::Active, WizardPhase::Submitting, WizardPhase::Submitted] {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(format!("\"{phase}\""), json);
        }
    }
}
