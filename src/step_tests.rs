// SPDX-License-Identifier: MIT

use super::*;
use crate::clock::FakeClock;
use crate::state::{register_fields, snapshot, FieldSpec, ObservedState};
use std::cell::Cell;
use std::collections::HashMap;
use std::time::Duration;

struct Sample {
    progress: Cell<u32>,
}

impl ObservedState for Sample {
    fn observed_values(&self) -> HashMap<&'static str, serde_json::Value> {
        let mut m = HashMap::new();
        m.insert("progress", serde_json::Value::from(self.progress.get()));
        m
    }
}

fn sample_base() -> (WorkflowBase, Rc<FakeClock>) {
    let clock = Rc::new(FakeClock::new());
    let base = WorkflowBase::with_clock("root", None, clock.clone()).unwrap();
    (base, clock)
}

#[test]
fn happy_path_emits_bracketed_events_and_snapshot() {
    register_fields::<Sample>([("progress", FieldSpec::VISIBLE)]);
    let (base, clock) = sample_base();
    let sample = Sample { progress: Cell::new(0) };

    let opts = StepOptions { snapshot_state: true, track_timing: true, ..Default::default() };
    let result = futures::executor::block_on(run_step(&base, "s", opts, Some(&|| {
        clock.advance(Duration::from_millis(5));
        sample.progress.set(50);
        snapshot(&sample)
    }), || async {
        sample.progress.set(50);
        Ok::<_, anyhow::Error>(())
    }));

    assert!(result.is_ok());
    let events = base.node().events();
    let names: Vec<&str> = events.iter().map(|e| e.name()).collect();
    assert_eq!(names[0], "stepStart");
    assert_eq!(names[1], "stateSnapshot");
    assert_eq!(names[2], "treeUpdated");
    assert_eq!(names[3], "stepEnd");
    assert_eq!(
        base.node().state_snapshot().unwrap().get("progress"),
        Some(&serde_json::Value::from(50))
    );
    match &events[3] {
        WorkflowEvent::StepEnd { duration, .. } => assert!(*duration >= Duration::from_millis(5)),
        other => panic!("expected StepEnd, got {other:?}"),
    }
}

#[test]
fn default_options_skip_snapshot_and_track_timing() {
    let (base, _clock) = sample_base();

    let result = futures::executor::block_on(run_step(
        &base,
        "s",
        StepOptions::default(),
        None,
        || async { Ok::<_, anyhow::Error>(42) },
    ));

    assert_eq!(result.unwrap(), 42);
    let events = base.node().events();
    let names: Vec<String> = events.iter().map(|e| e.name().to_string()).collect();
    assert_eq!(names, vec!["stepStart".to_string(), "stepEnd".to_string()]);
}

#[test]
fn failure_wraps_error_with_state_and_log_copy() {
    register_fields::<Sample>([("progress", FieldSpec::VISIBLE)]);
    let (base, _clock) = sample_base();
    let sample = Sample { progress: Cell::new(25) };

    base.logger().info("before failure");

    let opts = StepOptions { snapshot_state: false, ..Default::default() };
    let result = futures::executor::block_on(run_step(
        &base,
        "s",
        opts,
        Some(&|| snapshot(&sample)),
        || async { anyhow::bail!("boom") },
    ));

    let err = result.unwrap_err();
    assert_eq!(err.message, "boom");
    assert_eq!(err.state.as_ref().unwrap().get("progress"), Some(&serde_json::Value::from(25)));
    let logs_at_throw = err.logs.len();
    assert_eq!(logs_at_throw, base.node().logs().len());

    base.logger().info("after failure");
    assert_eq!(err.logs.len(), logs_at_throw, "error's log copy must not see later appends");
    assert!(base.node().logs().len() > logs_at_throw);

    let events = base.node().events();
    assert_eq!(events.last().unwrap().name(), "error");
}

#[test]
fn snapshot_is_skipped_on_success_when_flag_is_off() {
    register_fields::<Sample>([("progress", FieldSpec::VISIBLE)]);
    let (base, _clock) = sample_base();
    let sample = Sample { progress: Cell::new(50) };

    let opts = StepOptions { snapshot_state: false, ..Default::default() };
    futures::executor::block_on(run_step(&base, "s", opts, Some(&|| snapshot(&sample)), || async {
        Ok::<_, anyhow::Error>(())
    }))
    .unwrap();

    assert!(base.node().state_snapshot().is_none());
}
