// tests/resources_exactly_once.rs

mod support;

use taskrunner::runner::TaskRunner;
use taskrunner::task::ResourceSpec;

#[tokio::test]
async fn applying_resources_twice_to_the_same_task_errors() {
    let fixture = support::Fixture::new();
    let info = support::process_info(&fixture, "twice", "exit 0");

    let first = info.task.apply_resources(ResourceSpec { cpu_weight: 1, memory_mb: 64 });
    assert!(first.is_ok());

    let second = info.task.apply_resources(ResourceSpec { cpu_weight: 2, memory_mb: 128 });
    assert!(second.is_err(), "applying resources a second time must be rejected");

    // The first application must win; nothing overwrote it.
    assert_eq!(
        info.task.resources(),
        Some(ResourceSpec { cpu_weight: 1, memory_mb: 64 }),
    );
}

#[tokio::test]
async fn a_double_apply_surfaces_as_a_scheduling_failure_through_submit() {
    let fixture = support::Fixture::new();
    let mut runner = TaskRunner::new();

    let info = support::process_info(&fixture, "pre-applied", "exit 0");
    info.task
        .apply_resources(ResourceSpec::default())
        .expect("first apply must succeed");

    // submit() applies resources again internally; since this task's
    // resources were already applied above, scheduling must fail cleanly.
    let submitted = runner.submit(info, false).unwrap();
    assert!(!submitted, "submit must report scheduling failure, not panic");
    assert!(runner.running_ids().is_empty(), "a scheduling failure must not register a worker");
}
