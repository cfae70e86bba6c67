//! Scripted test doubles for the assistant seams.
//!
//! Provides a configurable [`MockBackend`] plus recording implementations of
//! [`Sleeper`] and [`NotificationSink`], so conversations can be exercised
//! without a network or real delays.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::Notify;

use crate::backend::{AssistantBackend, AssistantReply, AssistantRequest, BackendFailure};
use crate::notify::{Notice, NotificationSink};
use crate::retry::Sleeper;

/// Predefined outcome for one backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    Reply(String),
    Fail(BackendFailure),
}

impl MockOutcome {
    pub fn reply(content: impl Into<String>) -> Self {
        Self::Reply(content.into())
    }

    pub fn fail(failure: BackendFailure) -> Self {
        Self::Fail(failure)
    }
}

/// Mock assistant backend.
///
/// Captures every request and answers from a script. Once the script runs
/// out the last outcome repeats; an empty script always replies
/// `"mock reply"`.
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Scripted outcomes, consumed in order.
    outcomes: Arc<RwLock<Vec<MockOutcome>>>,
    /// Index of next outcome to return.
    outcome_index: Arc<AtomicUsize>,
    /// Captured requests for verification.
    requests: Arc<RwLock<Vec<AssistantRequest>>>,
    /// When set, each call waits for a release before answering.
    hold: Arc<RwLock<Option<Arc<Notify>>>>,
}

impl MockBackend {
    /// Create a new mock backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an outcome for the next unscripted call.
    pub fn add_outcome(self, outcome: MockOutcome) -> Self {
        self.outcomes.write().push(outcome);
        self
    }

    /// Replace the whole script.
    pub fn with_outcomes(self, outcomes: Vec<MockOutcome>) -> Self {
        *self.outcomes.write() = outcomes;
        self
    }

    /// Make every call wait until [`MockBackend::release`] is called.
    pub fn held(self) -> Self {
        *self.hold.write() = Some(Arc::new(Notify::new()));
        self
    }

    /// Let one held call answer.
    pub fn release(&self) {
        if let Some(notify) = self.hold.read().as_ref() {
            notify.notify_one();
        }
    }

    /// Get all captured requests.
    pub fn requests(&self) -> Vec<AssistantRequest> {
        self.requests.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.requests.read().len()
    }

    fn next_outcome(&self) -> MockOutcome {
        let outcomes = self.outcomes.read();
        let index = self.outcome_index.fetch_add(1, Ordering::SeqCst);
        outcomes
            .get(index)
            .or_else(|| outcomes.last())
            .cloned()
            .unwrap_or_else(|| MockOutcome::reply("mock reply"))
    }
}

#[async_trait]
impl AssistantBackend for MockBackend {
    async fn complete(&self, request: &AssistantRequest) -> Result<AssistantReply, BackendFailure> {
        self.requests.write().push(request.clone());

        let hold = self.hold.read().clone();
        if let Some(notify) = hold {
            notify.notified().await;
        }

        match self.next_outcome() {
            MockOutcome::Reply(content) => Ok(AssistantReply { content }),
            MockOutcome::Fail(failure) => Err(failure),
        }
    }
}

/// Sleeper that records requested delays and returns immediately.
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    delays: Arc<RwLock<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.read().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.write().push(duration);
        tokio::task::yield_now().await;
    }
}

/// Sink that keeps every notice.
#[derive(Clone, Default)]
pub struct RecordingSink {
    notices: Arc<RwLock<Vec<Notice>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.read().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notice: Notice) {
        self.notices.write().push(notice);
    }
}
