//! Core types for desired-state reconciliation

use crate::diff::MatchReport;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mutation the enforcer decided on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Resource is absent and must exist
    Create,
    /// Resource exists and must be brought in line with the request
    Update,
    /// Resource exists and must not
    Remove,
    /// Resource is absent and must stay absent
    None,
}

impl Action {
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Remove => "delete",
            Self::None => "leave",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Result of applying a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// No changes needed
    NoChange,
    /// Resource was created
    Created,
    /// Resource was modified
    Modified,
    /// Resource was removed
    Removed,
    /// Nothing was executed (what-if)
    Skipped { reason: String },
}

impl ApplyResult {
    /// Check if the result represents a change
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Modified | Self::Removed)
    }
}

/// What observe-and-match concluded about a resource
#[derive(Debug, Clone, PartialEq)]
pub enum Observation<S> {
    /// The underlying resource does not exist
    Absent,
    /// Exists and satisfies every requested property (or none were requested)
    Satisfied(S),
    /// Exists but at least one requested property differs
    Unsatisfied { current: S, report: MatchReport },
}

impl<S> Observation<S> {
    /// The `_exist` value reported for this observation
    ///
    /// False both for an absent resource and for one that is present but not
    /// in the desired state.
    pub fn in_desired_state(&self) -> bool {
        matches!(self, Self::Satisfied(_))
    }

    /// Current state, if the resource exists at all
    pub fn current(&self) -> Option<&S> {
        match self {
            Self::Absent => None,
            Self::Satisfied(current) | Self::Unsatisfied { current, .. } => Some(current),
        }
    }
}

/// Plan produced by the enforcer, executed unless running what-if
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub resource_id: String,
    pub action: Action,
}

impl Plan {
    /// Prose used by what-if reporting
    pub fn describe(&self) -> String {
        match self.action {
            Action::Create => format!(
                "{} does not exist and will be created.",
                self.resource_id
            ),
            Action::Update => format!("{} exists and will be updated.", self.resource_id),
            Action::Remove => format!("{} exists and will be deleted.", self.resource_id),
            Action::None => format!(
                "{} does not exist; nothing to delete.",
                self.resource_id
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_describe() {
        let plan = Plan {
            resource_id: "User 'alice'".into(),
            action: Action::Create,
        };
        assert_eq!(
            plan.describe(),
            "User 'alice' does not exist and will be created."
        );

        let plan = Plan {
            resource_id: "User 'alice'".into(),
            action: Action::Update,
        };
        assert_eq!(plan.describe(), "User 'alice' exists and will be updated.");
    }

    #[test]
    fn test_observation_existence_flag() {
        let absent: Observation<u8> = Observation::Absent;
        assert!(!absent.in_desired_state());
        assert!(absent.current().is_none());

        let unsatisfied = Observation::Unsatisfied {
            current: 7u8,
            report: MatchReport::new(),
        };
        assert!(!unsatisfied.in_desired_state());
        assert_eq!(unsatisfied.current(), Some(&7));

        assert!(Observation::Satisfied(1u8).in_desired_state());
    }

    #[test]
    fn test_apply_result_is_change() {
        assert!(ApplyResult::Created.is_change());
        assert!(ApplyResult::Removed.is_change());
        assert!(!ApplyResult::NoChange.is_change());
        assert!(
            !ApplyResult::Skipped {
                reason: "what-if".into()
            }
            .is_change()
        );
    }
}
