// tests/support/mod.rs

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tempfile::TempDir;

use taskrunner::runner::{TaskExecutionInfo, TaskId, TaskResult, TaskRunner};
use taskrunner::task::{InRuntimeTask, ProcessTask, ResourceSpec, TaskFlavor, UnitTask};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

pub fn next_id() -> TaskId {
    TaskId::new(NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

/// Per-test scratch directory for script/log-file fixtures, mirroring the
/// teacher's tempfile-backed integration fixtures.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create tempdir fixture"),
        }
    }

    pub fn script_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(format!("{name}.script"))
    }

    pub fn log_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(format!("{name}.log"))
    }
}

/// A process task running `cmd` via a shell, with the default
/// exit-code-zero-is-success hook.
pub fn process_info(fixture: &Fixture, name: &str, cmd: &str) -> TaskExecutionInfo {
    let unit = UnitTask::new(
        name,
        TaskFlavor::Process(ProcessTask::shell(cmd)),
        taskrunner::task::exit_code_zero_is_success(),
    );
    TaskExecutionInfo::new(
        next_id(),
        unit,
        ResourceSpec::default(),
        fixture.script_path(name),
        fixture.log_path(name),
    )
}

/// An in-runtime task that sleeps for `sleep` then returns `exit_code`, with
/// a hook that reports `hook_ok`.
pub fn in_runtime_info(
    fixture: &Fixture,
    name: &str,
    sleep: Duration,
    exit_code: i32,
    hook_ok: bool,
) -> TaskExecutionInfo {
    let body = move |_script: PathBuf, _log_file: PathBuf| async move {
        tokio::time::sleep(sleep).await;
        Ok(exit_code)
    };
    let unit = UnitTask::new(
        name,
        TaskFlavor::InRuntime(InRuntimeTask::new(body)),
        move |_code: i32| Ok(hook_ok),
    );
    TaskExecutionInfo::new(
        next_id(),
        unit,
        ResourceSpec::default(),
        fixture.script_path(name),
        fixture.log_path(name),
    )
}

/// Poll `runner` repeatedly until `id` shows up in a harvested batch.
pub async fn poll_until_done(
    runner: &mut TaskRunner,
    id: TaskId,
    failed_are_completed: bool,
) -> TaskResult {
    loop {
        let results = runner
            .poll(Duration::from_millis(20), failed_are_completed)
            .await;
        if let Some(result) = results.get(&id) {
            return *result;
        }
    }
}
