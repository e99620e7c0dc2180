// src/config/model.rs

//! Configuration document model: `[config]` globals plus `[task.<name>]`
//! entries describing the process tasks this crate's CLI entry point runs.
//!
//! This mirrors the teacher's raw-then-validated split (`RawConfigFile` is
//! what `serde` deserializes; `ConfigFile` is only constructible via
//! `TryFrom<RawConfigFile>`, i.e. after validation in `config::validate`).

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::task::ResourceSpec;

/// Global `[config]` section.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Per-task poll timeout, in milliseconds, used by the CLI driving loop.
    pub poll_timeout_ms: u64,
    /// If true, a non-`Succeeded` terminal status is still reported as
    /// completed successfully (`TaskRunner::poll`'s `failed_are_completed`).
    pub failed_are_completed: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: 1000,
            failed_are_completed: false,
        }
    }
}

/// One `[task.<name>]` entry, as deserialized from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Shell command to run as an external process.
    pub cmd: String,
    /// Names of tasks that must be submitted (and completed, at the CLI
    /// driving-loop level) before this one.
    #[serde(default)]
    pub after: Vec<String>,
    #[serde(default)]
    pub cpu_weight: u32,
    #[serde(default)]
    pub memory_mb: u32,
}

impl TaskConfig {
    pub fn resources(&self) -> ResourceSpec {
        ResourceSpec {
            cpu_weight: self.cpu_weight,
            memory_mb: self.memory_mb,
        }
    }
}

/// Raw, not-yet-validated deserialization target.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: GlobalConfig,
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated configuration. Only constructible via `TryFrom<RawConfigFile>`
/// (see `config::validate`), which checks for unknown `after` references
/// and dependency cycles.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: GlobalConfig,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: GlobalConfig,
        task: BTreeMap<String, TaskConfig>,
    ) -> Self {
        Self { config, task }
    }
}
