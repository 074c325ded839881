//! # Declarative
//!
//! Desired-state reconciliation for DSC resource providers.
//!
//! ## Core Concepts
//!
//! - **Resource**: something with state that can be probed and converged
//!   (a settings file, an OS account)
//! - **ProvidedProperties**: which properties the caller actually supplied;
//!   only those are checked against current state
//! - **Observation**: the answer to "is the resource in the desired state?"
//! - **Plan**: the mutation `enforce` decided on (create, update, remove)
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{Observation, reconcile};
//!
//! match reconcile::observe(&resource)? {
//!     Observation::Absent => println!("absent"),
//!     Observation::Satisfied(current) => println!("in desired state: {current:?}"),
//!     Observation::Unsatisfied { current, report } => {
//!         for mismatch in report.mismatches() {
//!             eprintln!("{mismatch}");
//!         }
//!     }
//! }
//!
//! let enforcement = reconcile::enforce(&resource, /* what_if */ false)?;
//! ```

pub mod diff;
pub mod error;
pub mod property;
pub mod reconcile;
pub mod resource;
pub mod schema;
pub mod types;

// Re-export main types at crate root
pub use diff::{MatchReport, PropertyCheck, compare};
pub use error::{Error, Result};
pub use property::{EXIST, ProvidedProperties};
pub use reconcile::{Enforcement, enforce, observe};
pub use resource::{CurrentState, Resource};
pub use schema::{JsonType, Property, Schema, Validator};
pub use types::{Action, ApplyResult, Observation, Plan};
