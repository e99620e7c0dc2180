// src/task/mod.rs

//! Authored task definitions.
//!
//! A [`UnitTask`] is the umbrella type this runtime can execute: a name, a
//! resource requirement applied exactly once at submission, a body in one
//! of two flavors ([`ProcessTask`] or [`InRuntimeTask`]), and a
//! post-completion hook mapping an exit code to a success boolean.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;
use std::sync::{Arc, Mutex};

use tokio::process::Command;

/// Opaque resource requirement, applied exactly once to a task at submission
/// time (see [`UnitTask::apply_resources`]). The runtime does not interpret,
/// track, or reclaim this value; an external resource manager owns that.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceSpec {
    pub cpu_weight: u32,
    pub memory_mb: u32,
}

/// Produces an OS process launch description given a script path and a
/// log-file path.
pub trait ProcessLaunch: Send + Sync {
    fn launch(&self, script: &Path, log_file: &Path) -> Command;
}

impl<F> ProcessLaunch for F
where
    F: Fn(&Path, &Path) -> Command + Send + Sync,
{
    fn launch(&self, script: &Path, log_file: &Path) -> Command {
        self(script, log_file)
    }
}

/// A task whose body is an external OS process.
#[derive(Clone)]
pub struct ProcessTask {
    launch: Arc<dyn ProcessLaunch>,
}

impl ProcessTask {
    pub fn new(launch: impl ProcessLaunch + 'static) -> Self {
        Self {
            launch: Arc::new(launch),
        }
    }

    /// Build the shell-invoked launch description for a plain command
    /// string, redirecting both stdout and stderr to `log_file`. This is
    /// the default a config-loaded `[task.<name>]` entry gets; callers
    /// embedding this crate as a library may supply their own
    /// [`ProcessLaunch`] instead.
    pub fn shell(cmd: impl Into<String>) -> Self {
        let cmd = cmd.into();
        Self::new(move |_script: &Path, log_file: &Path| {
            let mut command = if cfg!(windows) {
                let mut c = Command::new("cmd");
                c.arg("/C").arg(&cmd);
                c
            } else {
                let mut c = Command::new("sh");
                c.arg("-c").arg(&cmd);
                c
            };

            if let Ok(file) = std::fs::File::create(log_file) {
                let stderr_file = file
                    .try_clone()
                    .unwrap_or_else(|_| std::fs::File::create(log_file).unwrap());
                command.stdout(Stdio::from(file)).stderr(Stdio::from(stderr_file));
            } else {
                command.stdout(Stdio::null()).stderr(Stdio::null());
            }

            command
        })
    }

    pub fn launch_command(&self, script: &Path, log_file: &Path) -> Command {
        self.launch.launch(script, log_file)
    }
}

/// A callable `(script, log_file) -> exit_code`, permitted to fail.
pub trait InRuntimeBody: Send + Sync {
    fn call(
        &self,
        script: PathBuf,
        log_file: PathBuf,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<i32>> + Send>>;
}

impl<F, Fut> InRuntimeBody for F
where
    F: Fn(PathBuf, PathBuf) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<i32>> + Send + 'static,
{
    fn call(
        &self,
        script: PathBuf,
        log_file: PathBuf,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<i32>> + Send>> {
        Box::pin(self(script, log_file))
    }
}

/// A task whose body is executed in-process rather than as a child OS
/// process.
#[derive(Clone)]
pub struct InRuntimeTask {
    body: Arc<dyn InRuntimeBody>,
}

impl InRuntimeTask {
    pub fn new(body: impl InRuntimeBody + 'static) -> Self {
        Self { body: Arc::new(body) }
    }

    pub fn call(
        &self,
        script: PathBuf,
        log_file: PathBuf,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<i32>> + Send>> {
        self.body.call(script, log_file)
    }
}

/// Either of the two concrete task flavors the runtime distinguishes.
#[derive(Clone)]
pub enum TaskFlavor {
    Process(ProcessTask),
    InRuntime(InRuntimeTask),
}

/// Task-supplied function mapping an exit code to a success boolean. May
/// itself fail; a failure and a `false` result both surface downstream as
/// `FAILED_ON_COMPLETE`.
pub trait PostCompleteHook: Send + Sync {
    fn on_complete(&self, exit_code: i32) -> anyhow::Result<bool>;
}

impl<F> PostCompleteHook for F
where
    F: Fn(i32) -> anyhow::Result<bool> + Send + Sync,
{
    fn on_complete(&self, exit_code: i32) -> anyhow::Result<bool> {
        self(exit_code)
    }
}

/// Hook that treats exit code 0 as success and anything else as failure,
/// never itself failing. The common case for config-defined tasks that
/// don't need custom post-completion logic.
pub fn exit_code_zero_is_success() -> impl PostCompleteHook {
    |exit_code: i32| Ok(exit_code == 0)
}

/// An authored unit of work runnable by this crate's `TaskRunner`.
#[derive(Clone)]
pub struct UnitTask {
    pub name: String,
    resources: Arc<Mutex<Option<ResourceSpec>>>,
    pub flavor: TaskFlavor,
    hook: Arc<dyn PostCompleteHook>,
}

impl UnitTask {
    pub fn new(
        name: impl Into<String>,
        flavor: TaskFlavor,
        hook: impl PostCompleteHook + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            resources: Arc::new(Mutex::new(None)),
            flavor,
            hook: Arc::new(hook),
        }
    }

    /// Apply resources exactly once. Returns an error (surfaced by
    /// `TaskRunner::submit` as a scheduling failure) if resources were
    /// already applied to this task instance.
    pub fn apply_resources(&self, resources: ResourceSpec) -> anyhow::Result<()> {
        let mut slot = self.resources.lock().expect("resource lock poisoned");
        if slot.is_some() {
            anyhow::bail!("resources already applied to task '{}'", self.name);
        }
        *slot = Some(resources);
        Ok(())
    }

    pub fn resources(&self) -> Option<ResourceSpec> {
        *self.resources.lock().expect("resource lock poisoned")
    }

    pub fn run_hook(&self, exit_code: i32) -> anyhow::Result<bool> {
        self.hook.on_complete(exit_code)
    }
}
