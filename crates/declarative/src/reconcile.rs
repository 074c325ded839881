//! The reconciliation state machine
//!
//! `observe` answers "is the resource in the desired state?" and is used by
//! `get`. `enforce` decides and executes the mutation for `set`/`delete`.

use crate::error::Result;
use crate::resource::{CurrentState, Resource};
use crate::types::{Action, ApplyResult, Observation, Plan};

/// Probe the resource and match it against the requested properties
pub fn observe<R: Resource + ?Sized>(resource: &R) -> Result<Observation<R::State>> {
    let current = resource.probe()?;
    Ok(classify(resource, current))
}

/// Match an already probed state against the requested properties
///
/// - absent resource: [`Observation::Absent`]
/// - nothing requested beyond identity and `_exist`: satisfied as-is
/// - otherwise every requested property is checked; any failure yields
///   [`Observation::Unsatisfied`] carrying the current values
pub fn classify<R: Resource + ?Sized>(resource: &R, current: R::State) -> Observation<R::State> {
    let target = resource.resource_type();

    if !current.exists() {
        log::info!(target: target, "{} does not exist", resource.id());
        return Observation::Absent;
    }

    let provided = resource.provided();
    if !provided.has_requested(resource.identity_key(), resource.unobservable()) {
        log::info!(
            target: target,
            "No properties to validate for {}, returning current state",
            resource.id()
        );
        return Observation::Satisfied(current);
    }

    let report = resource.compare(&current);
    report.log(target);

    if report.is_match() {
        log::info!(target: target, "All requested properties match for {}", resource.id());
        Observation::Satisfied(current)
    } else {
        log::info!(
            target: target,
            "{} is not in the desired state ({} mismatched)",
            resource.id(),
            report.mismatches().count()
        );
        Observation::Unsatisfied { current, report }
    }
}

/// Decide which action converges the resource
pub fn plan<R: Resource + ?Sized>(resource: &R, current: &R::State) -> Plan {
    let action = match (resource.desired_exist(), current.occupied()) {
        (false, true) => Action::Remove,
        (false, false) => Action::None,
        (true, _) if current.exists() => Action::Update,
        (true, _) => Action::Create,
    };

    Plan {
        resource_id: resource.id(),
        action,
    }
}

/// Outcome of [`enforce`]
#[derive(Debug, Clone)]
pub struct Enforcement<S> {
    pub plan: Plan,
    pub before: S,
    pub result: ApplyResult,
}

/// Probe, plan and (unless `what_if`) apply
///
/// Removing an already absent resource succeeds without doing anything.
/// Failures are returned as-is; nothing is rolled back.
pub fn enforce<R: Resource + ?Sized>(resource: &R, what_if: bool) -> Result<Enforcement<R::State>> {
    let target = resource.resource_type();
    let before = resource.probe()?;
    let plan = plan(resource, &before);

    log::debug!(target: target, "Planned {} for {}", plan.action, plan.resource_id);

    let result = if what_if {
        ApplyResult::Skipped {
            reason: plan.describe(),
        }
    } else if plan.action == Action::None {
        log::info!(target: target, "{} already absent", plan.resource_id);
        ApplyResult::NoChange
    } else {
        resource.apply(plan.action, &before)?
    };

    Ok(Enforcement {
        plan,
        before,
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{MatchReport, compare};
    use crate::property::ProvidedProperties;
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq)]
    struct ToyState {
        exists: bool,
        color: Option<String>,
    }

    impl CurrentState for ToyState {
        fn exists(&self) -> bool {
            self.exists
        }
    }

    #[derive(Debug)]
    struct Toy {
        provided: ProvidedProperties,
        exist: bool,
        color: Option<String>,
        state: RefCell<ToyState>,
        applied: RefCell<Vec<Action>>,
    }

    impl Toy {
        fn new(provided: &[&str], color: Option<&str>, state: ToyState) -> Self {
            Self {
                provided: provided.iter().copied().collect(),
                exist: true,
                color: color.map(str::to_string),
                state: RefCell::new(state),
                applied: RefCell::new(Vec::new()),
            }
        }
    }

    impl Resource for Toy {
        type State = ToyState;

        fn id(&self) -> String {
            "toy".into()
        }

        fn resource_type(&self) -> &'static str {
            "toy"
        }

        fn identity_key(&self) -> &'static str {
            "name"
        }

        fn provided(&self) -> &ProvidedProperties {
            &self.provided
        }

        fn desired_exist(&self) -> bool {
            self.exist
        }

        fn probe(&self) -> Result<ToyState> {
            Ok(self.state.borrow().clone())
        }

        fn compare(&self, current: &ToyState) -> MatchReport {
            let mut report = MatchReport::new();
            if let Some(color) = &self.color {
                report.push(compare("color", color, current.color.as_ref()));
            }
            report
        }

        fn apply(&self, action: Action, _current: &ToyState) -> Result<ApplyResult> {
            self.applied.borrow_mut().push(action);
            let mut state = self.state.borrow_mut();
            Ok(match action {
                Action::Create => {
                    state.exists = true;
                    ApplyResult::Created
                }
                Action::Update => ApplyResult::Modified,
                Action::Remove => {
                    state.exists = false;
                    ApplyResult::Removed
                }
                Action::None => ApplyResult::NoChange,
            })
        }
    }

    fn present(color: Option<&str>) -> ToyState {
        ToyState {
            exists: true,
            color: color.map(str::to_string),
        }
    }

    fn absent() -> ToyState {
        ToyState {
            exists: false,
            color: None,
        }
    }

    #[test]
    fn test_observe_absent() {
        let toy = Toy::new(&["name", "color"], Some("red"), absent());
        assert_eq!(observe(&toy).unwrap(), Observation::Absent);
    }

    #[test]
    fn test_observe_identity_only_is_satisfied_regardless_of_values() {
        let toy = Toy::new(&["name"], None, present(Some("blue")));
        assert_eq!(
            observe(&toy).unwrap(),
            Observation::Satisfied(present(Some("blue")))
        );
    }

    #[test]
    fn test_observe_mismatch_keeps_current_values() {
        let toy = Toy::new(&["name", "color"], Some("red"), present(Some("blue")));
        match observe(&toy).unwrap() {
            Observation::Unsatisfied { current, report } => {
                assert_eq!(current.color.as_deref(), Some("blue"));
                assert_eq!(report.mismatches().count(), 1);
            }
            other => panic!("expected unsatisfied, got {other:?}"),
        }
    }

    #[test]
    fn test_observe_missing_current_value_is_unsatisfied() {
        let toy = Toy::new(&["name", "color"], Some("red"), present(None));
        assert!(!observe(&toy).unwrap().in_desired_state());
    }

    #[test]
    fn test_observe_all_match() {
        let toy = Toy::new(&["name", "_exist", "color"], Some("red"), present(Some("red")));
        assert!(observe(&toy).unwrap().in_desired_state());
    }

    #[test]
    fn test_enforce_creates_absent_resource() {
        let toy = Toy::new(&["name"], None, absent());
        let enforcement = enforce(&toy, false).unwrap();
        assert_eq!(enforcement.plan.action, Action::Create);
        assert_eq!(enforcement.result, ApplyResult::Created);
        assert!(!enforcement.before.exists);
    }

    #[test]
    fn test_enforce_updates_existing_resource() {
        let toy = Toy::new(&["name", "color"], Some("red"), present(Some("blue")));
        let enforcement = enforce(&toy, false).unwrap();
        assert_eq!(enforcement.plan.action, Action::Update);
        assert_eq!(*toy.applied.borrow(), vec![Action::Update]);
    }

    #[test]
    fn test_enforce_remove_absent_is_noop() {
        let mut toy = Toy::new(&["name", "_exist"], None, absent());
        toy.exist = false;
        let enforcement = enforce(&toy, false).unwrap();
        assert_eq!(enforcement.plan.action, Action::None);
        assert_eq!(enforcement.result, ApplyResult::NoChange);
        assert!(toy.applied.borrow().is_empty());
    }

    #[test]
    fn test_enforce_removes_existing() {
        let mut toy = Toy::new(&["name", "_exist"], None, present(None));
        toy.exist = false;
        let enforcement = enforce(&toy, false).unwrap();
        assert_eq!(enforcement.result, ApplyResult::Removed);
        assert!(!toy.state.borrow().exists);
    }

    #[test]
    fn test_enforce_what_if_never_applies() {
        let toy = Toy::new(&["name"], None, absent());
        let enforcement = enforce(&toy, true).unwrap();
        assert_eq!(
            enforcement.result,
            ApplyResult::Skipped {
                reason: "toy does not exist and will be created.".into()
            }
        );
        assert!(toy.applied.borrow().is_empty());
    }
}
