//! Fixed input schemas for the two resource kinds

use declarative::{EXIST, JsonType, Property, Schema};
use serde_json::json;

use crate::resource::settings::{DEFAULT_UPDATE_AUTOMATICALLY, DEFAULT_UPDATE_FREQUENCY};

// ============================================================================
// Settings
// ============================================================================

pub fn settings() -> Schema {
    Schema {
        title: "TSToy Settings",
        required: &["scope"],
        properties: vec![
            Property::new("scope", &[JsonType::String])
                .titled(
                    "Target configuration scope",
                    "Defines which of TSToy's config files to manage.",
                )
                .one_of(&["machine", "user"]),
            Property::new(EXIST, &[JsonType::Boolean])
                .titled(
                    "Should exist",
                    "Defines whether the config file should exist.",
                )
                .default_value(json!(true)),
            Property::new("updateAutomatically", &[JsonType::Boolean])
                .titled(
                    "Should update automatically",
                    "Indicates whether TSToy should check for updates when it starts.",
                )
                .default_value(json!(DEFAULT_UPDATE_AUTOMATICALLY)),
            Property::new("updateFrequency", &[JsonType::Integer])
                .titled(
                    "Update check frequency",
                    "Indicates how many days TSToy should wait before checking for updates.",
                )
                .range(1, 180)
                .default_value(json!(DEFAULT_UPDATE_FREQUENCY)),
        ],
    }
}

// ============================================================================
// User
// ============================================================================

pub fn user() -> Schema {
    Schema {
        title: "Linux User",
        required: &["username"],
        properties: vec![
            Property::new("username", &[JsonType::String])
                .titled("Username", "The login name of the account."),
            Property::new("password", &[JsonType::String, JsonType::Null])
                .titled("Password", "The account password. Never returned.")
                .write_only(),
            Property::new("uid", &[JsonType::Integer, JsonType::Null])
                .titled("User ID", "The numeric user ID."),
            Property::new("gid", &[JsonType::Integer, JsonType::Null])
                .titled("Group ID", "The numeric ID of the primary group."),
            Property::new("home", &[JsonType::String, JsonType::Null])
                .titled("Home directory", "The account's home directory."),
            Property::new("shell", &[JsonType::String])
                .titled("Login shell", "The account's login shell."),
            Property::new("groups", &[JsonType::Array])
                .titled("Groups", "Groups the account belongs to.")
                .items(JsonType::String)
                .read_only(),
            Property::new(EXIST, &[JsonType::Boolean])
                .titled(
                    "Should exist",
                    "Defines whether the account should exist.",
                )
                .default_value(json!(true)),
        ],
    }
}
