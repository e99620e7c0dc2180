// src/supervisor/mod.rs

//! Supervisor variants: the concurrent workers that run one task's body to
//! completion and report back through a shared record.
//!
//! Each variant is a short-lived worker whose outputs (`exit_code`,
//! `on_complete_successful`, `error`) are only read by the orchestrator
//! after the worker is observed dead. `on_complete_successful` going from
//! absent to present is the happens-before edge the orchestrator relies on:
//! a worker is considered finished iff its join handle is done *and* this
//! field is set (see `TaskRunner::poll`).

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::task::{TaskFlavor, UnitTask};

/// Sentinel exit code meaning "not yet observed".
pub const EXIT_CODE_UNSET: i32 = -1;

/// Exit code the runtime synthesizes for interruption or an unexpected
/// worker error (as opposed to a process genuinely exiting with status 1).
pub const EXIT_CODE_SYNTHESIZED_FAILURE: i32 = 1;

/// Per-live-task record. Written only by that task's own supervisor worker;
/// read only by the orchestrator after the worker is observed not-alive.
#[derive(Debug)]
pub struct SupervisorRecord {
    pub exit_code: i32,
    pub on_complete_successful: Option<bool>,
    pub error: Option<String>,
}

impl Default for SupervisorRecord {
    fn default() -> Self {
        Self {
            exit_code: EXIT_CODE_UNSET,
            on_complete_successful: None,
            error: None,
        }
    }
}

pub type SharedRecord = Arc<Mutex<SupervisorRecord>>;

/// Cooperative-interruption handle held by `TaskRunner::cancel`.
///
/// Firing it more than once, or after the worker has already consumed it,
/// is a harmless no-op (`fire` just returns `false`).
pub struct CancelHandle {
    tx: Option<oneshot::Sender<()>>,
}

impl CancelHandle {
    pub fn fire(&mut self) -> bool {
        match self.tx.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }
}

/// Spawn the supervisor worker appropriate for `task`'s flavor, or a
/// `NoOpSupervisor` if `simulate` is set regardless of flavor.
///
/// Returns the shared record the worker will write to, its join handle, and
/// a cancel handle for cooperative interruption.
pub fn spawn_supervisor(
    task: UnitTask,
    script: PathBuf,
    log_file: PathBuf,
    simulate: bool,
) -> (SharedRecord, tokio::task::JoinHandle<()>, CancelHandle) {
    let record: SharedRecord = Arc::new(Mutex::new(SupervisorRecord::default()));

    if simulate {
        spawn_no_op(record)
    } else {
        match task.flavor.clone() {
            TaskFlavor::Process(proc_task) => {
                spawn_process(task, proc_task, script, log_file, record)
            }
            TaskFlavor::InRuntime(rt_task) => {
                spawn_in_runtime(task, rt_task, script, log_file, record)
            }
        }
    }
}

/// NoOpSupervisor: records exit code 0 and presets `on_complete_successful
/// = true` before doing anything else, so it appears complete and
/// successful even if harvested immediately. Its body is empty.
fn spawn_no_op(
    record: SharedRecord,
) -> (SharedRecord, tokio::task::JoinHandle<()>, CancelHandle) {
    {
        let mut rec = record.lock().expect("supervisor record poisoned");
        rec.exit_code = 0;
        rec.on_complete_successful = Some(true);
    }
    let handle = tokio::spawn(async {});
    (record, handle, CancelHandle { tx: None })
}

/// ProcessSupervisor: spawns an OS process and blocks until it exits, or
/// until cancelled, whichever comes first.
fn spawn_process(
    task: UnitTask,
    proc_task: crate::task::ProcessTask,
    script: PathBuf,
    log_file: PathBuf,
    record: SharedRecord,
) -> (SharedRecord, tokio::task::JoinHandle<()>, CancelHandle) {
    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
    let rec = Arc::clone(&record);

    let handle = tokio::spawn(async move {
        run_process_body(&task, &proc_task, &script, &log_file, &rec, cancel_rx).await;
        run_hook(&task, &rec);
    });

    (record, handle, CancelHandle { tx: Some(cancel_tx) })
}

async fn run_process_body(
    task: &UnitTask,
    proc_task: &crate::task::ProcessTask,
    script: &std::path::Path,
    log_file: &std::path::Path,
    record: &SharedRecord,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    let mut command = proc_task.launch_command(script, log_file);
    command.kill_on_drop(true);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) => {
            warn!(task = %task.name, error = %err, "failed to spawn task process");
            let mut rec = record.lock().expect("supervisor record poisoned");
            rec.exit_code = EXIT_CODE_SYNTHESIZED_FAILURE;
            rec.error = Some(format!("spawning process for task '{}': {err}", task.name));
            return;
        }
    };

    tokio::select! {
        status_res = child.wait() => {
            let mut rec = record.lock().expect("supervisor record poisoned");
            match status_res {
                Ok(status) => {
                    rec.exit_code = status.code().unwrap_or(EXIT_CODE_SYNTHESIZED_FAILURE);
                    info!(
                        task = %task.name,
                        exit_code = rec.exit_code,
                        "task process exited",
                    );
                }
                Err(err) => {
                    error!(task = %task.name, error = %err, "waiting for task process failed");
                    rec.exit_code = EXIT_CODE_SYNTHESIZED_FAILURE;
                    rec.error = Some(format!("waiting for process of task '{}': {err}", task.name));
                }
            }
        }
        cancel = &mut cancel_rx => {
            if cancel.is_ok() {
                info!(task = %task.name, "cancellation requested; killing task process");
                if let Err(err) = child.kill().await {
                    warn!(task = %task.name, error = %err, "failed to kill task process on cancellation");
                }
            }
            let mut rec = record.lock().expect("supervisor record poisoned");
            rec.exit_code = EXIT_CODE_SYNTHESIZED_FAILURE;
            rec.error = Some(format!("task '{}' interrupted by cancel request", task.name));
        }
    }
}

/// InRuntimeSupervisor: invokes the task's in-runtime callable, racing it
/// against cancellation the same way `ProcessSupervisor` races the child
/// process.
fn spawn_in_runtime(
    task: UnitTask,
    rt_task: crate::task::InRuntimeTask,
    script: PathBuf,
    log_file: PathBuf,
    record: SharedRecord,
) -> (SharedRecord, tokio::task::JoinHandle<()>, CancelHandle) {
    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
    let rec = Arc::clone(&record);

    let handle = tokio::spawn(async move {
        run_in_runtime_body(&task, &rt_task, script, log_file, &rec, cancel_rx).await;
        run_hook(&task, &rec);
    });

    (record, handle, CancelHandle { tx: Some(cancel_tx) })
}

async fn run_in_runtime_body(
    task: &UnitTask,
    rt_task: &crate::task::InRuntimeTask,
    script: PathBuf,
    log_file: PathBuf,
    record: &SharedRecord,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    let body = rt_task.call(script, log_file);

    tokio::select! {
        result = body => {
            let mut rec = record.lock().expect("supervisor record poisoned");
            match result {
                Ok(code) => {
                    rec.exit_code = code;
                    info!(task = %task.name, exit_code = code, "in-runtime task finished");
                }
                Err(err) => {
                    error!(task = %task.name, error = %err, "in-runtime task body failed");
                    rec.exit_code = EXIT_CODE_SYNTHESIZED_FAILURE;
                    rec.error = Some(format!("{err:#}"));
                }
            }
        }
        cancel = &mut cancel_rx => {
            if cancel.is_ok() {
                info!(task = %task.name, "cancellation requested for in-runtime task");
            }
            let mut rec = record.lock().expect("supervisor record poisoned");
            rec.exit_code = EXIT_CODE_SYNTHESIZED_FAILURE;
            rec.error = Some(format!("task '{}' interrupted by cancel request", task.name));
        }
    }
}

/// Run the task's own post-completion hook and store its boolean result.
/// The hook is the task author's own computation and may itself fail; a
/// failure is treated as a hook failure, recorded alongside (not
/// overwriting) any body error.
fn run_hook(task: &UnitTask, record: &SharedRecord) {
    let exit_code = record.lock().expect("supervisor record poisoned").exit_code;

    let outcome = task.run_hook(exit_code);

    let mut rec = record.lock().expect("supervisor record poisoned");
    match outcome {
        Ok(successful) => {
            rec.on_complete_successful = Some(successful);
        }
        Err(err) => {
            debug!(task = %task.name, error = %err, "post-completion hook failed");
            if rec.error.is_none() {
                rec.error = Some(format!("post-completion hook for '{}': {err:#}", task.name));
            }
            rec.on_complete_successful = Some(false);
        }
    }
}
