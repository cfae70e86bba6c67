//! Chat orchestrator.
//!
//! This module provides the main entry point for chat operations,
//! coordinating the message log, quota gate, project context and the
//! retrying backend invoker behind a small state machine:
//!
//! ```text
//!            submit (gate open)             reply
//!   Idle ─────────────────────────▶ Sending ───────▶ Idle
//!    ▲                                │  │
//!    │   overload exhausted /         │  │ quota exceeded
//!    └── transient / fatal ◀──────────┘  └──────────────▶ LimitReached
//! ```
//!
//! The `Sending` phase is the only mutual exclusion between submissions:
//! a submit while sending is ignored.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::backend::{AssistantBackend, AssistantRequest, HistoryEntry, HttpAssistantBackend};
use crate::config::ChatConfig;
use crate::context::build_context;
use crate::error::{ChatError, ChatResult};
use crate::message_log::MessageLog;
use crate::notify::{Notice, NotificationSink, TracingSink};
use crate::project::ProjectProvider;
use crate::quota::QuotaGate;
use crate::retry::{RetryPolicy, RetryingInvoker, Sleeper};
use crate::types::{ChatPhase, ChatTurn, ChatView};

/// What became of one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input, or a send was already in flight. Nothing changed.
    Ignored,
    /// The session was switched while the request was in flight; the
    /// result was dropped.
    Abandoned,
    /// The daily allowance is gone; input stays disabled.
    LimitReached,
    /// The assistant answered with this turn.
    Replied(ChatTurn),
    /// The send failed; the user may resubmit.
    Failed(ChatError),
}

/// Mutable per-conversation state, only touched under the session lock
struct Session {
    project_id: String,
    generation: u64,
    phase: ChatPhase,
    log: MessageLog,
}

struct Inner {
    invoker: RetryingInvoker,
    projects: Arc<dyn ProjectProvider>,
    gate: QuotaGate,
    sink: Arc<dyn NotificationSink>,
    welcome: bool,
    session: Mutex<Session>,
    views: watch::Sender<ChatView>,
}

/// Drives one project conversation against the assistant backend.
///
/// Cheap to clone; clones drive the same conversation.
#[derive(Clone)]
pub struct ChatOrchestrator {
    inner: Arc<Inner>,
}

/// Builder for [`ChatOrchestrator`]
pub struct ChatOrchestratorBuilder {
    backend: Arc<dyn AssistantBackend>,
    projects: Arc<dyn ProjectProvider>,
    project_id: String,
    gate: QuotaGate,
    sink: Arc<dyn NotificationSink>,
    sleeper: Option<Arc<dyn Sleeper>>,
    policy: RetryPolicy,
    welcome: bool,
}

impl ChatOrchestratorBuilder {
    /// Share a quota gate with other conversations
    pub fn gate(mut self, gate: QuotaGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Seed new conversations with the welcome turn
    pub fn welcome(mut self, welcome: bool) -> Self {
        self.welcome = welcome;
        self
    }

    pub fn build(self) -> ChatOrchestrator {
        let mut invoker = RetryingInvoker::new(self.backend).with_policy(self.policy);
        if let Some(sleeper) = self.sleeper {
            invoker = invoker.with_sleeper(sleeper);
        }

        let session = Session {
            project_id: self.project_id,
            generation: 0,
            phase: initial_phase(&self.gate),
            log: fresh_log(self.welcome),
        };
        let (views, _) = watch::channel(view_of(&session, &self.gate));

        let orchestrator = ChatOrchestrator {
            inner: Arc::new(Inner {
                invoker,
                projects: self.projects,
                gate: self.gate,
                sink: self.sink,
                welcome: self.welcome,
                session: Mutex::new(session),
                views,
            }),
        };
        orchestrator.watch_gate();
        orchestrator
    }
}

impl ChatOrchestrator {
    /// Start building a conversation about `project_id`
    pub fn builder(
        backend: Arc<dyn AssistantBackend>,
        projects: Arc<dyn ProjectProvider>,
        project_id: impl Into<String>,
    ) -> ChatOrchestratorBuilder {
        ChatOrchestratorBuilder {
            backend,
            projects,
            project_id: project_id.into(),
            gate: QuotaGate::new(),
            sink: Arc::new(TracingSink),
            sleeper: None,
            policy: RetryPolicy::default(),
            welcome: false,
        }
    }

    /// Conversation over HTTP using resolved configuration
    pub fn from_config(
        config: &ChatConfig,
        projects: Arc<dyn ProjectProvider>,
        project_id: impl Into<String>,
    ) -> ChatResult<ChatOrchestratorBuilder> {
        let backend = Arc::new(HttpAssistantBackend::from_config(config)?);
        Ok(Self::builder(backend, projects, project_id).welcome(config.welcome))
    }

    /// Current read-only view
    pub fn state(&self) -> ChatView {
        let session = self.inner.session.lock();
        view_of(&session, &self.inner.gate)
    }

    /// Receive a new view after every state change
    pub fn subscribe(&self) -> watch::Receiver<ChatView> {
        self.inner.views.subscribe()
    }

    pub fn phase(&self) -> ChatPhase {
        self.inner.session.lock().phase
    }

    pub fn project_id(&self) -> String {
        self.inner.session.lock().project_id.clone()
    }

    pub fn gate(&self) -> &QuotaGate {
        &self.inner.gate
    }

    /// Fire-and-forget send. Requires a tokio runtime.
    pub fn submit(&self, text: impl Into<String>) -> JoinHandle<SendOutcome> {
        let this = self.clone();
        let text = text.into();
        tokio::spawn(async move { this.send_message(&text).await })
    }

    /// Send a user message and wait for the conversation to settle.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        let input = text.trim();
        if input.is_empty() {
            debug!("Ignoring blank chat input");
            return SendOutcome::Ignored;
        }

        let (generation, project_id, history) = {
            let mut session = self.inner.session.lock();
            match session.phase {
                ChatPhase::Sending => {
                    debug!("Send already in flight, ignoring submit");
                    return SendOutcome::Ignored;
                }
                ChatPhase::LimitReached => return SendOutcome::LimitReached,
                ChatPhase::Idle => {}
            }

            if !self.inner.gate.is_open() {
                info!("Quota gate closed, chat input disabled");
                session.phase = ChatPhase::LimitReached;
                drop(session);
                self.publish();
                self.inner.sink.notify(Notice::from_error(&ChatError::QuotaExceeded));
                return SendOutcome::LimitReached;
            }

            session.phase = ChatPhase::Sending;
            session.log.append(ChatTurn::user(input));

            let history: Vec<HistoryEntry> = session
                .log
                .history_before_last()
                .iter()
                .filter(|t| !t.is_welcome())
                .map(HistoryEntry::from)
                .collect();

            (session.generation, session.project_id.clone(), history)
        };
        self.publish();

        let project = match self.inner.projects.project(&project_id).await {
            Ok(project) => project,
            Err(e) => {
                warn!("Could not load project {}: {}", project_id, e);
                None
            }
        };

        let request = AssistantRequest {
            context: build_context(project.as_ref()),
            history,
            new_message: input.to_string(),
        };

        let result = self.inner.invoker.invoke(&request).await;
        self.settle(generation, result.map(|reply| reply.content))
    }

    /// Discard the conversation and start over for another project.
    ///
    /// A send still in flight is abandoned.
    pub fn switch_project(&self, project_id: impl Into<String>) {
        {
            let mut session = self.inner.session.lock();
            session.generation += 1;
            session.project_id = project_id.into();
            session.phase = initial_phase(&self.inner.gate);
            session.log = fresh_log(self.inner.welcome);
            info!("Chat switched to project {}", session.project_id);
        }
        self.publish();
    }

    // Apply the invoker's result to the session it was started from
    fn settle(&self, generation: u64, result: Result<String, ChatError>) -> SendOutcome {
        if matches!(result, Err(ChatError::QuotaExceeded)) && self.inner.gate.mark_exhausted() {
            info!("Daily chat quota exhausted");
        }

        let (outcome, notice) = {
            let mut session = self.inner.session.lock();
            if session.generation != generation {
                debug!("Dropping result for abandoned session {}", generation);
                (SendOutcome::Abandoned, None)
            } else {
                match result {
                    Ok(content) => {
                        let turn = ChatTurn::assistant(content);
                        session.log.append(turn.clone());
                        session.phase = ChatPhase::Idle;
                        (SendOutcome::Replied(turn), None)
                    }
                    Err(ChatError::QuotaExceeded) => {
                        session.phase = ChatPhase::LimitReached;
                        (
                            SendOutcome::LimitReached,
                            Some(Notice::from_error(&ChatError::QuotaExceeded)),
                        )
                    }
                    Err(e) => {
                        if matches!(e, ChatError::Fatal(_)) {
                            error!("Assistant returned an unusable response: {}", e);
                        } else {
                            warn!("Chat send failed: {}", e);
                        }
                        session.phase = ChatPhase::Idle;
                        let notice = Notice::from_error(&e);
                        (SendOutcome::Failed(e), Some(notice))
                    }
                }
            }
        };

        self.publish();
        if let Some(notice) = notice {
            self.inner.sink.notify(notice);
        }
        outcome
    }

    // Republish once the gate closes, even when another conversation closed it
    fn watch_gate(&self) {
        let mut closed = self.inner.gate.subscribe();
        if *closed.borrow() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("No tokio runtime, quota closures are only visible through state()");
            return;
        };

        let inner = Arc::downgrade(&self.inner);
        runtime.spawn(async move {
            if closed.changed().await.is_err() {
                return;
            }
            if let Some(inner) = inner.upgrade() {
                ChatOrchestrator { inner }.publish();
            }
        });
    }

    fn publish(&self) {
        let view = self.state();
        self.inner.views.send_replace(view);
    }
}

fn initial_phase(gate: &QuotaGate) -> ChatPhase {
    if gate.is_open() {
        ChatPhase::Idle
    } else {
        ChatPhase::LimitReached
    }
}

fn fresh_log(welcome: bool) -> MessageLog {
    if welcome {
        MessageLog::with_welcome()
    } else {
        MessageLog::new()
    }
}

fn view_of(session: &Session, gate: &QuotaGate) -> ChatView {
    ChatView {
        messages: session.log.snapshot(),
        is_sending: session.phase == ChatPhase::Sending,
        limit_reached: session.phase == ChatPhase::LimitReached || !gate.is_open(),
    }
}
