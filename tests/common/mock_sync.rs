//! Mock external sync hook and progress recorder
//!
//! These are test utilities - not all may be used in current tests but are
//! available for future test development.

#![allow(dead_code)]

use async_trait::async_trait;
use ff_submit::outcome::Outcome;
use ff_submit::strategy::{Phase, SubmitProgress};
use ff_submit::sync::{HookRequest, HookResult, SyncHook};
use ff_submit::types::CommitId;
use std::collections::HashMap;
use std::sync::Mutex;

type Callback = Box<dyn Fn(&HookRequest) + Send + Sync>;

/// Hand-written mock of [`SyncHook`]
///
/// Features:
/// - Succeeds with empty output unless told otherwise
/// - Per-commit responses (exit code + output, or "could not run")
/// - Call tracking for verification
/// - A callback run on every call, for injecting faults mid-run
pub struct MockHook {
    responses: Mutex<HashMap<CommitId, Option<HookResult>>>,
    calls: Mutex<Vec<HookRequest>>,
    on_call: Mutex<Option<Callback>>,
}

impl MockHook {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            on_call: Mutex::new(None),
        }
    }

    // === Response configuration ===

    /// Succeed for `commit` printing `output`
    pub fn succeed_with(&self, commit: &CommitId, output: &str) {
        self.set(commit, Some(HookResult {
            exit_code: 0,
            output: output.to_string(),
        }));
    }

    /// Fail for `commit` with `exit_code` and `output`
    pub fn fail_with(&self, commit: &CommitId, exit_code: i32, output: &str) {
        self.set(commit, Some(HookResult {
            exit_code,
            output: output.to_string(),
        }));
    }

    /// Behave as if the hook could not be started for `commit`
    pub fn unavailable_for(&self, commit: &CommitId) {
        self.set(commit, None);
    }

    /// Run `f` on every invocation, before answering
    pub fn on_call(&self, f: impl Fn(&HookRequest) + Send + Sync + 'static) {
        *self.on_call.lock().unwrap() = Some(Box::new(f));
    }

    fn set(&self, commit: &CommitId, response: Option<HookResult>) {
        self.responses
            .lock()
            .unwrap()
            .insert(commit.clone(), response);
    }

    // === Call verification ===

    /// Every request received, in order
    pub fn get_calls(&self) -> Vec<HookRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Commits pushed, in order
    pub fn pushed(&self) -> Vec<CommitId> {
        self.get_calls().into_iter().map(|r| r.new_rev).collect()
    }

    /// Assert the hook ran for exactly `commits`, in that order
    pub fn assert_pushed(&self, commits: &[CommitId]) {
        let pushed = self.pushed();
        assert_eq!(pushed, commits, "unexpected hook calls: {pushed:?}");
    }

    /// Assert the hook never ran
    pub fn assert_not_called(&self) {
        let calls = self.get_calls();
        assert!(calls.is_empty(), "expected no hook calls, got: {calls:?}");
    }
}

#[async_trait]
impl SyncHook for MockHook {
    async fn invoke(&self, request: &HookRequest) -> Option<HookResult> {
        self.calls.lock().unwrap().push(request.clone());

        if let Some(f) = self.on_call.lock().unwrap().as_ref() {
            f(request);
        }

        self.responses
            .lock()
            .unwrap()
            .get(&request.new_rev)
            .cloned()
            .unwrap_or(Some(HookResult {
                exit_code: 0,
                output: String::new(),
            }))
    }
}

/// Progress event seen by [`RecordingProgress`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Phase(Phase),
    Outcome(CommitId, Outcome),
    HookStarted(CommitId, String),
    HookFinished(CommitId, Option<i32>),
    Message(CommitId, String),
}

/// Progress callback recording every event
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<Event>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Phase(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl SubmitProgress for RecordingProgress {
    async fn on_phase(&self, phase: Phase) {
        self.push(Event::Phase(phase));
    }

    async fn on_outcome(&self, commit: &CommitId, outcome: Outcome) {
        self.push(Event::Outcome(commit.clone(), outcome));
    }

    async fn on_hook_started(&self, commit: &CommitId, ticket: &str) {
        self.push(Event::HookStarted(commit.clone(), ticket.to_string()));
    }

    async fn on_hook_finished(&self, commit: &CommitId, result: Option<&HookResult>) {
        self.push(Event::HookFinished(commit.clone(), result.map(|r| r.exit_code)));
    }

    async fn on_message(&self, commit: &CommitId, message: &str) {
        self.push(Event::Message(commit.clone(), message.to_string()));
    }
}
