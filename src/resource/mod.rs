//! Resources managed by the providers
//!
//! Each implements [`declarative::Resource`]: probe the current state,
//! compare it against the provided properties, apply an action.

pub mod settings;
pub mod user;

pub use settings::{Scope, Settings, SettingsFile, SettingsRecord, SettingsRequest};
pub use user::{User, UserRecord, UserRequest, WhatIfRecord};
