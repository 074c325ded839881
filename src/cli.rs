use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value, json};

use crate::resource::Scope;

/// Flags shared by both providers
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct Verbosity {
    /// Verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

fn insert<T: serde::Serialize>(flags: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        flags.insert(key.to_string(), json!(value));
    }
}

// ============================================================================
// tstoy-dsc
// ============================================================================

#[derive(Parser)]
#[command(name = "tstoy-dsc")]
#[command(version)]
#[command(about = "DSC resource provider for TSToy settings", long_about = None)]
#[command(propagate_version = true)]
pub struct SettingsCli {
    #[command(flatten)]
    pub verbosity: Verbosity,

    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Report whether a settings file is in the desired state
    Get(SettingsArgs),

    /// Converge a settings file to the desired state
    Set(SettingsArgs),

    /// Print the settings of the user and machine scopes
    Export,

    /// Print the JSON Schema for settings input
    Schema,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Desired state as inline JSON or a path to a JSON file
    #[arg(long)]
    pub input: Option<String>,

    /// Which config file to manage
    #[arg(long, value_enum)]
    pub scope: Option<Scope>,

    /// Whether the config file should exist (--exist=false removes it)
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub exist: Option<bool>,

    /// Check for updates when TSToy starts
    #[arg(long = "updateAutomatically", value_parser = BoolishValueParser::new())]
    pub update_automatically: Option<bool>,

    /// Days between update checks (1-180)
    #[arg(long = "updateFrequency", allow_negative_numbers = true)]
    pub update_frequency: Option<i64>,
}

impl SettingsArgs {
    /// Flag values as input properties; unset flags are omitted
    pub fn flags(&self) -> Map<String, Value> {
        let mut flags = Map::new();
        insert(&mut flags, "scope", self.scope);
        insert(&mut flags, "_exist", self.exist);
        insert(&mut flags, "updateAutomatically", self.update_automatically);
        insert(&mut flags, "updateFrequency", self.update_frequency);
        flags
    }
}

// ============================================================================
// user-dsc
// ============================================================================

#[derive(Parser)]
#[command(name = "user-dsc")]
#[command(version)]
#[command(about = "DSC resource provider for Linux user accounts", long_about = None)]
#[command(propagate_version = true)]
pub struct UserCli {
    #[command(flatten)]
    pub verbosity: Verbosity,

    #[command(subcommand)]
    pub command: UserCommand,
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// Report whether an account is in the desired state
    Get(UserArgs),

    /// Create, update or delete an account (requires root)
    Set(UserSetArgs),

    /// Delete an account (requires root)
    Delete(UserDeleteArgs),

    /// Print every account as a JSON array
    Export,

    /// Print the JSON Schema for user input
    Schema,
}

#[derive(Args, Debug, Clone, Default)]
pub struct UserArgs {
    /// Desired state as inline JSON or a path to a JSON file
    #[arg(long)]
    pub input: Option<String>,

    /// Login name
    #[arg(short, long)]
    pub username: Option<String>,

    /// Password (applied by set, never printed)
    #[arg(long)]
    pub password: Option<String>,

    /// Numeric user ID
    #[arg(long)]
    pub uid: Option<u32>,

    /// Numeric primary group ID
    #[arg(long)]
    pub gid: Option<u32>,

    /// Home directory
    #[arg(long)]
    pub home: Option<String>,

    /// Login shell
    #[arg(long)]
    pub shell: Option<String>,

    /// Whether the account should exist (--exist=false deletes it)
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub exist: Option<bool>,
}

impl UserArgs {
    /// Flag values as input properties; unset flags are omitted
    pub fn flags(&self) -> Map<String, Value> {
        let mut flags = Map::new();
        insert(&mut flags, "username", self.username.as_deref());
        insert(&mut flags, "password", self.password.as_deref());
        insert(&mut flags, "uid", self.uid);
        insert(&mut flags, "gid", self.gid);
        insert(&mut flags, "home", self.home.as_deref());
        insert(&mut flags, "shell", self.shell.as_deref());
        insert(&mut flags, "_exist", self.exist);
        flags
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct UserSetArgs {
    #[command(flatten)]
    pub user: UserArgs,

    /// Report what would change without changing anything
    #[arg(short, long)]
    pub what_if: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct UserDeleteArgs {
    /// Account as inline JSON or a path to a JSON file
    #[arg(long)]
    pub input: Option<String>,

    /// Login name
    #[arg(short, long)]
    pub username: Option<String>,

    /// Report what would be deleted without deleting
    #[arg(short, long)]
    pub what_if: bool,
}

impl UserDeleteArgs {
    pub fn flags(&self) -> Map<String, Value> {
        let mut flags = Map::new();
        insert(&mut flags, "username", self.username.as_deref());
        flags
    }
}
