// src/config/mod.rs

//! Workspace configuration.
//!
//! - `model.rs`: the TOML-backed data model.
//! - `loader.rs`: reading `.pylings.toml` and locating the workspace.
//! - `validate.rs`: invariants serde defaults cannot express.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{CONFIG_FILE_NAME, find_config, load_and_validate, load_from_path, workspace_root};
pub use model::{
    ConfigFile, PathsSection, RawConfigFile, RunnerSection, SettingsSection, WatchSection,
    WorkspaceSection,
};
pub use validate::validate_config;
