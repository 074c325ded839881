//! Resource trait for desired-state reconciliation
//!
//! A Resource couples a desired state (what the caller asked for, plus which
//! properties were actually supplied) with the means to probe and converge
//! the real thing.

use crate::diff::MatchReport;
use crate::error::Result;
use crate::property::ProvidedProperties;
use crate::types::{Action, ApplyResult};
use std::fmt;

/// Observed state of a resource
pub trait CurrentState: Clone + fmt::Debug {
    /// Whether the resource exists for matching and reporting
    fn exists(&self) -> bool;

    /// Whether something physically occupies the resource slot
    ///
    /// Differs from [`exists`](CurrentState::exists) when a provider degrades
    /// an unreadable resource to "absent" but still has to clean it up on
    /// removal.
    fn occupied(&self) -> bool {
        self.exists()
    }
}

/// Core trait for DSC resources
///
/// # Example
///
/// ```ignore
/// use declarative::{Resource, reconcile};
///
/// let observation = reconcile::observe(&settings)?;
/// let enforcement = reconcile::enforce(&settings, false)?;
/// ```
pub trait Resource: fmt::Debug {
    /// State returned by [`probe`](Resource::probe)
    type State: CurrentState;

    /// Human-readable identifier (e.g. "user scope settings", "User 'alice'")
    fn id(&self) -> String;

    /// Resource type category used as the log target
    fn resource_type(&self) -> &'static str;

    /// Name of the property that identifies the resource (`scope`, `username`)
    fn identity_key(&self) -> &'static str;

    /// Requestable properties that cannot be read back from current state
    fn unobservable(&self) -> &'static [&'static str] {
        &[]
    }

    /// Properties explicitly supplied by the caller
    fn provided(&self) -> &ProvidedProperties;

    /// Requested `_exist`; unspecified means the resource must exist
    fn desired_exist(&self) -> bool {
        true
    }

    /// Read the current state. Must not mutate anything.
    fn probe(&self) -> Result<Self::State>;

    /// Check every requested property against the current state
    fn compare(&self, current: &Self::State) -> MatchReport;

    /// Execute the decided action
    fn apply(&self, action: Action, current: &Self::State) -> Result<ApplyResult>;
}
