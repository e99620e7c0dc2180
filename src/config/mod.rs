// src/config/mod.rs

//! Configuration loading and validation.
//!
//! This is an external collaborator from the execution runtime's point of
//! view (see the specification's §1 scope note: config loading is outside
//! the core), but is carried here as the ambient entry point the CLI uses
//! to build `UnitTask`s and their dependency order.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, GlobalConfig, RawConfigFile, TaskConfig};
