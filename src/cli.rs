// src/cli.rs

//! Command-line entry point: a thin `clap` wrapper that loads a config file,
//! builds a `TaskRunner`, and drives it to completion.

use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "taskrunner", about = "Run a DAG of process tasks to completion")]
pub struct CliArgs {
    /// Path to the config file.
    #[arg(long, default_value = "Taskrunner.toml")]
    pub config: String,

    /// Substitute a no-op supervisor for every task instead of actually
    /// running it (dry-run / planning mode).
    #[arg(long)]
    pub simulate: bool,

    /// Override the log level (otherwise read from `TASKRUNNER_LOG`, or
    /// default to `info`).
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}
