// SPDX-License-Identifier: MIT

use super::*;
use crate::error::WorkflowError;
use crate::node::{WorkflowNode, WorkflowStatus};
use crate::step::{run_step, StepOptions};
use crate::workflow::{Workflow, WorkflowBase, WorkflowHandle};
use async_trait::async_trait;
use std::cell::RefCell;

struct TestWorkflow {
    base: WorkflowBase,
    should_fail: bool,
}

impl TestWorkflow {
    fn spawn(name: &str, parent: Option<&WorkflowNode>, should_fail: bool) -> WorkflowHandle {
        let base = WorkflowBase::new(name, parent).unwrap();
        Rc::new(RefCell::new(TestWorkflow { base, should_fail }))
    }
}

#[async_trait(?Send)]
impl Workflow for TestWorkflow {
    fn base(&self) -> &WorkflowBase {
        &self.base
    }

    async fn run(&self) -> Result<serde_json::Value, Rc<WorkflowError>> {
        if self.should_fail {
            let outcome = run_step(&self.base, "work", StepOptions::default(), None, || async {
                Err(anyhow::anyhow!("child failed"))
            })
            .await;
            return match outcome {
                Ok(()) => unreachable!("body always fails in this test"),
                Err(e) => Err(e),
            };
        }
        run_step(&self.base, "work", StepOptions::default(), None, || async { Ok(()) }).await?;
        Ok(serde_json::json!({ "ok": true }))
    }
}

fn status_of(handle: &WorkflowHandle) -> WorkflowStatus {
    handle.borrow().base().status()
}

#[test]
fn sequential_task_runs_children_already_attached_via_constructor() {
    let base = WorkflowBase::new("root", None).unwrap();
    let a = TestWorkflow::spawn("a", Some(base.node()), false);
    let b = TestWorkflow::spawn("b", Some(base.node()), false);
    let children = vec![a.clone(), b.clone()];

    let result = futures::executor::block_on(run_task(&base, "t", TaskOptions::default(), || async move {
        TaskOutput::from(children)
    }));

    assert!(result.is_ok());
    assert_eq!(base.children().len(), 2, "already-attached children must not be attached twice");
    assert_eq!(status_of(&a), WorkflowStatus::Completed);
    assert_eq!(status_of(&b), WorkflowStatus::Completed);

    let names: Vec<&str> = base.node().events().iter().map(|e| e.name()).collect();
    assert_eq!(names.first(), Some(&"taskStart"));
    assert_eq!(names.last(), Some(&"taskEnd"));
}

#[test]
fn sequential_task_stops_at_first_failure() {
    let base = WorkflowBase::new("root", None).unwrap();
    let failing = TestWorkflow::spawn("failing", Some(base.node()), true);
    let never_runs = TestWorkflow::spawn("never-runs", Some(base.node()), false);
    let children = vec![failing.clone(), never_runs.clone()];

    let result = futures::executor::block_on(run_task(&base, "t", TaskOptions::default(), || async move {
        TaskOutput::from(children)
    }));

    assert!(matches!(result, Err(TaskError::Workflow(_))));
    assert_eq!(status_of(&failing), WorkflowStatus::Failed);
    assert_eq!(status_of(&never_runs), WorkflowStatus::Idle, "sequential join must not run later siblings after a failure");
}

#[test]
fn concurrent_task_runs_every_child_to_completion_before_rethrowing() {
    let base = WorkflowBase::new("root", None).unwrap();
    let a = TestWorkflow::spawn("a", Some(base.node()), false);
    let b = TestWorkflow::spawn("b", Some(base.node()), false);
    let c = TestWorkflow::spawn("c", Some(base.node()), true);
    let d = TestWorkflow::spawn("d", Some(base.node()), false);
    let children = vec![a.clone(), b.clone(), c.clone(), d.clone()];

    let opts = TaskOptions { concurrent: true };
    let result = futures::executor::block_on(run_task(&base, "t", opts, || async move {
        TaskOutput::from(children)
    }));

    let err = match result {
        Err(TaskError::Workflow(e)) => e,
        other => panic!("expected a workflow failure, got {other:?}"),
    };
    assert_eq!(err.workflow_id, c.borrow().base().id());

    assert_eq!(status_of(&a), WorkflowStatus::Completed);
    assert_eq!(status_of(&b), WorkflowStatus::Completed);
    assert_eq!(status_of(&c), WorkflowStatus::Failed);
    assert_eq!(status_of(&d), WorkflowStatus::Completed);

    let names: Vec<&str> = base.node().events().iter().map(|e| e.name()).collect();
    assert_eq!(names.last(), Some(&"taskEnd"));
}

#[test]
fn attaching_a_child_with_a_conflicting_parent_is_a_fatal_validation_error() {
    let base = WorkflowBase::new("root", None).unwrap();
    let other_root = WorkflowBase::new("other", None).unwrap();
    let stray = TestWorkflow::spawn("stray", Some(other_root.node()), false);
    let children = vec![stray];

    let result = futures::executor::block_on(run_task(&base, "t", TaskOptions::default(), || async move {
        TaskOutput::from(children)
    }));

    assert!(matches!(result, Err(TaskError::Validation(ValidationError::AlreadyHasParent { .. }))));
}

#[test]
fn task_returning_a_plain_value_attaches_nothing() {
    let base = WorkflowBase::new("root", None).unwrap();

    let result = futures::executor::block_on(run_task(&base, "t", TaskOptions::default(), || async {
        TaskOutput::from(serde_json::json!({ "answer": 42 }))
    }));

    match result.unwrap() {
        TaskOutput::Value(v) => assert_eq!(v, serde_json::json!({ "answer": 42 })),
        TaskOutput::Workflows(_) => panic!("expected a plain value"),
    }
    assert!(base.children().is_empty());
}
