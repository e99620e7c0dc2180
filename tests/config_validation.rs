// tests/config_validation.rs

use std::io::Write;

use taskrunner::config::load_and_validate;
use taskrunner::errors::RunnerError;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn a_valid_dag_loads_cleanly() {
    let file = write_config(
        r#"
        [task.build]
        cmd = "echo build"

        [task.test]
        cmd = "echo test"
        after = ["build"]
        "#,
    );

    let cfg = load_and_validate(file.path()).expect("valid config must load");
    assert_eq!(cfg.task.len(), 2);
    assert_eq!(cfg.task["test"].after, vec!["build".to_string()]);
}

#[test]
fn an_empty_task_table_is_rejected() {
    let file = write_config("[config]\n");
    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, RunnerError::ConfigError(_)));
}

#[test]
fn an_unknown_dependency_is_rejected() {
    let file = write_config(
        r#"
        [task.build]
        cmd = "echo build"
        after = ["does-not-exist"]
        "#,
    );

    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, RunnerError::ConfigError(_)));
}

#[test]
fn a_self_dependency_is_rejected() {
    let file = write_config(
        r#"
        [task.build]
        cmd = "echo build"
        after = ["build"]
        "#,
    );

    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, RunnerError::ConfigError(_)));
}

#[test]
fn a_dependency_cycle_is_rejected() {
    let file = write_config(
        r#"
        [task.a]
        cmd = "echo a"
        after = ["b"]

        [task.b]
        cmd = "echo b"
        after = ["a"]
        "#,
    );

    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, RunnerError::DagCycle(_)));
}

#[test]
fn global_config_defaults_apply_when_the_section_is_absent() {
    let file = write_config(
        r#"
        [task.only]
        cmd = "echo hi"
        "#,
    );

    let cfg = load_and_validate(file.path()).expect("valid config must load");
    assert_eq!(cfg.config.poll_timeout_ms, 1000);
    assert!(!cfg.config.failed_are_completed);
}
