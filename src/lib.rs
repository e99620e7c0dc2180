// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod runner;
pub mod supervisor;
pub mod task;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, TaskConfig};
use crate::runner::{TaskExecutionInfo, TaskId, TaskIdAllocator, TaskRunner};
use crate::task::{exit_code_zero_is_success, ProcessTask, TaskFlavor, UnitTask};

/// High-level entry point used by `main.rs`.
///
/// This wires together config loading and a `TaskRunner`, submitting tasks
/// in dependency order and polling to completion. It is a runnable
/// demonstration harness for the library, not a scheduler reimplementation:
/// dependency resolution here is a single "submit whatever is ready" loop,
/// not the topological DAG scheduler this crate's core sits below.
pub async fn run(args: CliArgs) -> Result<()> {
    logging::init_logging(args.log_level)?;

    let cfg = load_and_validate(&args.config)?;
    info!(tasks = cfg.task.len(), "configuration loaded");

    let work_dir = std::env::temp_dir().join(format!("taskrunner-{}", std::process::id()));
    std::fs::create_dir_all(&work_dir)?;

    let mut runner = TaskRunner::new();
    let mut allocator = TaskIdAllocator::default();

    let mut remaining: BTreeMap<String, TaskConfig> = cfg.task.clone();
    let mut succeeded: HashSet<String> = HashSet::new();
    let mut failed: HashSet<String> = HashSet::new();
    let mut id_to_name: HashMap<TaskId, String> = HashMap::new();

    loop {
        let ready: Vec<String> = remaining
            .iter()
            .filter(|(_, task_cfg)| task_cfg.after.iter().all(|dep| succeeded.contains(dep)))
            .map(|(name, _)| name.clone())
            .collect();

        for name in ready {
            let task_cfg = remaining.remove(&name).expect("name came from remaining");
            let id = allocator.next();
            let script = work_dir.join(format!("{name}.script"));
            let log_file = work_dir.join(format!("{name}.log"));

            let unit = UnitTask::new(
                name.clone(),
                TaskFlavor::Process(ProcessTask::shell(task_cfg.cmd.clone())),
                exit_code_zero_is_success(),
            );
            let info = TaskExecutionInfo::new(id, unit, task_cfg.resources(), script, log_file);

            runner.submit(info, args.simulate)?;
            id_to_name.insert(id, name);
        }

        if runner.running_ids().is_empty() {
            break;
        }

        let poll_timeout = Duration::from_millis(cfg.config.poll_timeout_ms);
        let results = runner.poll(poll_timeout, cfg.config.failed_are_completed).await;

        for (id, result) in results {
            let name = id_to_name.remove(&id).unwrap_or_else(|| format!("task#{id}"));
            if result.exit_code == 0 && result.hook_succeeded {
                info!(task = %name, "task succeeded");
                succeeded.insert(name);
            } else {
                warn!(
                    task = %name,
                    exit_code = result.exit_code,
                    hook_succeeded = result.hook_succeeded,
                    "task did not succeed",
                );
                failed.insert(name);
            }
        }
    }

    if !remaining.is_empty() {
        for name in remaining.keys() {
            warn!(task = %name, "task never ran; a dependency failed or is missing");
        }
        failed.extend(remaining.into_keys());
    }

    if failed.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("{} task(s) did not complete successfully: {:?}", failed.len(), failed)
    }
}
