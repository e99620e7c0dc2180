// tests/run_entrypoint_failure.rs

use std::io::Write;

use taskrunner::cli::CliArgs;

#[tokio::test]
async fn run_reports_failure_when_a_task_fails_and_leaves_its_dependents_unrun() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    write!(
        file,
        r#"
        [config]
        poll_timeout_ms = 20

        [task.build]
        cmd = "exit 1"

        [task.test]
        cmd = "exit 0"
        after = ["build"]
        "#
    )
    .expect("write config");

    let args = CliArgs {
        config: file.path().to_str().unwrap().to_string(),
        simulate: false,
        log_level: None,
    };

    let result = taskrunner::run(args).await;
    assert!(result.is_err(), "a failing upstream task must fail the whole run");
}

#[tokio::test]
async fn simulate_mode_never_runs_the_underlying_commands() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    write!(
        file,
        r#"
        [config]
        poll_timeout_ms = 20

        [task.would-fail]
        cmd = "exit 1"
        "#
    )
    .expect("write config");

    let args = CliArgs {
        config: file.path().to_str().unwrap().to_string(),
        simulate: true,
        log_level: None,
    };

    taskrunner::run(args)
        .await
        .expect("simulate mode substitutes a no-op supervisor that always succeeds");
}
