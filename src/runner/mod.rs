// src/runner/mod.rs

//! `TaskRunner`: the registry, lifecycle, and join protocol over
//! supervisors (see `crate::supervisor`).
//!
//! All methods are called from a single orchestrator thread/task; only the
//! bodies of supervisor workers run concurrently, and they only ever write
//! their own `SupervisorRecord` — never the runner's tables.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::errors::Result;
use crate::supervisor::{spawn_supervisor, CancelHandle, SharedRecord};
use crate::task::{ResourceSpec, UnitTask};

/// Stable, monotonically unique identifier for a submitted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic `TaskId` allocator. Owned by callers of `TaskRunner` (typically
/// the DAG scheduler), not by the runner itself.
#[derive(Debug, Default)]
pub struct TaskIdAllocator {
    next: u64,
}

impl TaskIdAllocator {
    pub fn next(&mut self) -> TaskId {
        let id = TaskId(self.next);
        self.next += 1;
        id
    }
}

/// `PENDING -> STARTED -> {SUCCEEDED, FAILED_COMMAND, FAILED_ON_COMPLETE,
/// FAILED_SCHEDULING}`. `STARTED` is the only non-terminal state this
/// runtime sets. Transitions are one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    Started,
    Succeeded,
    FailedCommand,
    FailedOnComplete,
    FailedScheduling,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Status::Pending | Status::Started)
    }
}

/// The mutable record the runtime manipulates for one submitted task.
#[derive(Debug, Clone)]
pub struct TaskExecutionInfo {
    pub id: TaskId,
    pub task: UnitTask,
    pub resources: ResourceSpec,
    pub script: PathBuf,
    pub log_file: PathBuf,
    pub status: Status,
    pub start_date: Option<Instant>,
    pub end_date: Option<Instant>,
}

impl TaskExecutionInfo {
    pub fn new(
        id: TaskId,
        task: UnitTask,
        resources: ResourceSpec,
        script: PathBuf,
        log_file: PathBuf,
    ) -> Self {
        Self {
            id,
            task,
            resources,
            script,
            log_file,
            status: Status::Pending,
            start_date: None,
            end_date: None,
        }
    }
}

/// One live task's bookkeeping: its supervisor worker handle, its
/// supervisor record, and its mutable execution info, all removed together.
struct RunningTask {
    handle: JoinHandle<()>,
    cancel: CancelHandle,
    record: SharedRecord,
    info: TaskExecutionInfo,
}

/// The outcome `poll` reports for one harvested task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskResult {
    pub exit_code: i32,
    pub hook_succeeded: bool,
}

/// Registry, lifecycle, and join protocol over supervisors.
///
/// Conceptually holds three parallel tables keyed by `TaskId`: live
/// supervisor worker handles, their supervisor records, and mutable
/// execution infos. They are kept in a single `HashMap<TaskId, RunningTask>`
/// here rather than three separate maps — the split gains nothing and only
/// invites desynchronization (see design note in the execution-runtime
/// specification this crate implements).
#[derive(Default)]
pub struct TaskRunner {
    running: HashMap<TaskId, RunningTask>,
}

impl TaskRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a task for execution.
    ///
    /// - Applies resources to the task exactly once.
    /// - Picks the supervisor variant: `simulate=true` always gets a
    ///   no-op supervisor; otherwise the variant follows the task's flavor.
    /// - Registers and starts the supervisor.
    /// - Sets `info.status = Started`, `info.start_date = now()`.
    ///
    /// On any failure before the worker starts, sets
    /// `info.status = FailedScheduling`, logs, and returns `Ok(false)`
    /// without retaining any partial registration.
    ///
    /// The "`info.task` must be a unit task" precondition is enforced by
    /// the type system (`TaskExecutionInfo::task` is a `UnitTask`, the only
    /// task type this API accepts) rather than checked at runtime.
    pub fn submit(&mut self, mut info: TaskExecutionInfo, simulate: bool) -> Result<bool> {
        if let Err(err) = info.task.apply_resources(info.resources) {
            warn!(task = %info.task.name, id = %info.id, error = %err, "scheduling failure applying resources");
            info.status = Status::FailedScheduling;
            return Ok(false);
        }

        let (record, handle, cancel) = spawn_supervisor(
            info.task.clone(),
            info.script.clone(),
            info.log_file.clone(),
            simulate,
        );

        info.status = Status::Started;
        info.start_date = Some(Instant::now());

        self.running.insert(
            info.id,
            RunningTask {
                handle,
                cancel,
                record,
                info,
            },
        );

        Ok(true)
    }

    /// Sweep the supervisor table once. For each registered worker, wait up
    /// to `timeout` for it to finish; harvest every worker observed dead,
    /// writing terminal status/timestamps and removing it from all tables.
    /// Workers still live remain registered for a later sweep.
    pub async fn poll(
        &mut self,
        timeout: Duration,
        failed_are_completed: bool,
    ) -> HashMap<TaskId, TaskResult> {
        let mut finished = Vec::new();

        // Each handle is awaited to completion at most once across its
        // lifetime in this map: `cancel` only ever peeks at
        // `JoinHandle::is_finished` (non-consuming), so the `.await` below
        // is the sole place a handle's Future is ever driven to `Ready`.
        for (&id, running) in self.running.iter_mut() {
            match tokio::time::timeout(timeout, &mut running.handle).await {
                Ok(Ok(())) => finished.push(id),
                Ok(Err(join_err)) if join_err.is_panic() => {
                    // Kind 6 programmer error: the supervisor worker itself
                    // panicked (e.g. the "finished without a hook result"
                    // invariant check below). Intentionally unrecovered.
                    std::panic::resume_unwind(join_err.into_panic());
                }
                Ok(Err(_cancelled)) => finished.push(id),
                Err(_elapsed) => {
                    // Still alive; leave it registered for a later sweep.
                }
            }
        }

        let mut results = HashMap::with_capacity(finished.len());

        for id in finished {
            let Some(mut running) = self.running.remove(&id) else {
                continue;
            };

            let (exit_code, hook_succeeded, error) = {
                let rec = running.record.lock().expect("supervisor record poisoned");
                let hook_succeeded = rec.on_complete_successful.unwrap_or_else(|| {
                    // Fatal runtime invariant violation: the worker finished
                    // without running its post-completion hook.
                    panic!(
                        "task '{}' (id {}) supervisor finished without a hook result",
                        running.info.task.name, id
                    );
                });
                (rec.exit_code, hook_succeeded, rec.error.clone())
            };

            let status = Self::derive_status(exit_code, hook_succeeded, failed_are_completed);

            running.info.end_date = Some(Instant::now());
            running.info.status = status;

            if let Some(error) = error {
                error!(
                    task = %running.info.task.name,
                    id = %id,
                    error = %error,
                    "task completed with a captured error",
                );
            }

            results.insert(
                id,
                TaskResult {
                    exit_code,
                    hook_succeeded,
                },
            );
        }

        results
    }

    /// Given observed `(exit_code, hook_succeeded, failed_are_completed)`,
    /// compute the terminal status.
    fn derive_status(exit_code: i32, hook_succeeded: bool, failed_are_completed: bool) -> Status {
        if (exit_code == 0 && hook_succeeded) || failed_are_completed {
            Status::Succeeded
        } else if exit_code != 0 {
            Status::FailedCommand
        } else {
            Status::FailedOnComplete
        }
    }

    /// A snapshot of currently-registered task ids. No ordering guarantee.
    pub fn running_ids(&self) -> std::collections::HashSet<TaskId> {
        self.running.keys().copied().collect()
    }

    /// Attempt to terminate a single live task.
    ///
    /// Waits briefly for voluntary completion, then signals cooperative
    /// interruption and waits again. Sets `info.end_date` and
    /// `info.status = FailedCommand` unconditionally once a live task is
    /// found, regardless of whether the worker actually died — status
    /// reflects operator intent, not observed liveness. Does **not** remove
    /// the task from the registry; a subsequent `poll` harvests it through
    /// the normal path, keeping a single removal path.
    pub async fn cancel(&mut self, id: TaskId) -> bool {
        let Some(running) = self.running.get_mut(&id) else {
            return false;
        };

        // Only ever *peek* at the handle here (`is_finished`), never await
        // it to completion: the handle's `Future` is consumed exactly once,
        // during harvest in `poll`, and a later `poll` call must still be
        // able to await it fresh.
        tokio::time::sleep(Duration::from_millis(1)).await;
        if !running.handle.is_finished() {
            running.cancel.fire();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        let still_alive = !running.handle.is_finished();

        running.info.end_date = Some(Instant::now());
        running.info.status = Status::FailedCommand;

        !still_alive
    }

    /// Look up a task's current execution info, if still registered.
    pub fn info(&self, id: TaskId) -> Option<&TaskExecutionInfo> {
        self.running.get(&id).map(|r| &r.info)
    }
}
