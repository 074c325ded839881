//! Property-by-property comparison of requested against current state

use serde::Serialize;
use std::fmt;

/// Result of checking one requested property
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PropertyCheck {
    /// Current value equals the requested value
    Match { name: String },
    /// Current state has no value for a property the caller specified
    Missing { name: String, requested: String },
    /// Current value differs from the requested value
    Mismatch {
        name: String,
        requested: String,
        current: String,
    },
}

impl PropertyCheck {
    pub fn name(&self) -> &str {
        match self {
            Self::Match { name } | Self::Missing { name, .. } | Self::Mismatch { name, .. } => {
                name
            }
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match { .. })
    }
}

impl fmt::Display for PropertyCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Match { name } => write!(f, "{name} matches"),
            Self::Missing { name, requested } => {
                write!(f, "{name} not found in current state (requested: {requested})")
            }
            Self::Mismatch {
                name,
                requested,
                current,
            } => write!(f, "{name} mismatch - requested: {requested}, found: {current}"),
        }
    }
}

/// Compare a requested value against the current one
///
/// A missing current value is a mismatch whenever a value was requested.
pub fn compare<T>(name: &str, requested: &T, current: Option<&T>) -> PropertyCheck
where
    T: PartialEq + fmt::Debug + ?Sized,
{
    match current {
        None => PropertyCheck::Missing {
            name: name.to_string(),
            requested: format!("{requested:?}"),
        },
        Some(current) if current == requested => PropertyCheck::Match {
            name: name.to_string(),
        },
        Some(current) => PropertyCheck::Mismatch {
            name: name.to_string(),
            requested: format!("{requested:?}"),
            current: format!("{current:?}"),
        },
    }
}

/// All checks performed for one observation
///
/// Every requested property is evaluated, even after the first mismatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchReport {
    pub checks: Vec<PropertyCheck>,
}

impl MatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, check: PropertyCheck) {
        self.checks.push(check);
    }

    /// True when no requested property failed
    pub fn is_match(&self) -> bool {
        self.checks.iter().all(PropertyCheck::is_match)
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &PropertyCheck> {
        self.checks.iter().filter(|c| !c.is_match())
    }

    /// Log every check at debug level under the given target
    pub fn log(&self, target: &str) {
        for check in &self.checks {
            if check.is_match() {
                log::debug!(target: target, "{check}");
            } else {
                log::info!(target: target, "{check}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_equal_values_match() {
        let check = compare("updateFrequency", &30i64, Some(&30));
        assert!(check.is_match());
        assert_eq!(check.name(), "updateFrequency");
    }

    #[test]
    fn test_compare_missing_current_is_mismatch() {
        let check = compare("updateAutomatically", &true, None);
        assert_eq!(
            check,
            PropertyCheck::Missing {
                name: "updateAutomatically".into(),
                requested: "true".into(),
            }
        );
        assert!(!check.is_match());
    }

    #[test]
    fn test_compare_unequal_values_record_both() {
        let check = compare("uid", &2000u32, Some(&1000));
        assert_eq!(
            check.to_string(),
            "uid mismatch - requested: 2000, found: 1000"
        );
    }

    #[test]
    fn test_report_evaluates_all_checks() {
        let mut report = MatchReport::new();
        report.push(compare("uid", &2000u32, Some(&1000)));
        report.push(compare("shell", "/bin/zsh", Some("/bin/zsh")));
        report.push(compare("home", "/home/a", None));

        assert!(!report.is_match());
        assert_eq!(report.checks.len(), 3);
        let failed: Vec<_> = report.mismatches().map(PropertyCheck::name).collect();
        assert_eq!(failed, vec!["uid", "home"]);
    }

    #[test]
    fn test_empty_report_matches() {
        assert!(MatchReport::new().is_match());
    }
}
