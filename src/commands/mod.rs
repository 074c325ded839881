//! Command handlers for the two providers

pub mod settings;
pub mod user;
