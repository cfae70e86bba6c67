//! End-to-end conversation scenarios against a scripted backend.

use std::sync::Arc;
use std::time::Duration;

use vitrine_chat::{
    mock::{MockBackend, MockOutcome, RecordingSink, RecordingSleeper},
    Author, BackendFailure, ChatError, ChatOrchestrator, ChatPhase, FixedProject, NoticeLevel,
    ProjectRecord, SendOutcome, MAX_RETRIES, RETRY_DELAY_MS,
};

struct Scenario {
    chat: ChatOrchestrator,
    backend: MockBackend,
    sleeper: RecordingSleeper,
    sink: RecordingSink,
}

fn scenario(backend: MockBackend) -> Scenario {
    let sleeper = RecordingSleeper::new();
    let sink = RecordingSink::new();
    let project = ProjectRecord::titled("Atlas")
        .with_description("Offline map tiles for hiking")
        .with_creator("Robin")
        .with_tags(["rust", "maps"]);

    let chat = ChatOrchestrator::builder(
        Arc::new(backend.clone()),
        Arc::new(FixedProject::new(project)),
        "atlas",
    )
    .sleeper(Arc::new(sleeper.clone()))
    .sink(Arc::new(sink.clone()))
    .build();

    Scenario {
        chat,
        backend,
        sleeper,
        sink,
    }
}

/// Empty log, "Hello" answered with "Hi there".
#[tokio::test]
async fn test_simple_exchange() {
    let s = scenario(MockBackend::new().add_outcome(MockOutcome::reply("Hi there")));

    s.chat.send_message("Hello").await;

    let view = s.chat.state();
    let turns: Vec<_> = view
        .messages
        .iter()
        .map(|t| (t.author, t.content.as_str()))
        .collect();
    assert_eq!(
        turns,
        vec![(Author::User, "Hello"), (Author::Assistant, "Hi there")]
    );
    assert_eq!(s.chat.phase(), ChatPhase::Idle);
    assert!(!view.is_sending);
    assert!(!view.limit_reached);

    let request = &s.backend.requests()[0];
    assert!(request.context.contains("Project title: Atlas"));
    assert!(request.context.contains("Tags: rust, maps"));
}

/// Three overloads followed by quota exhaustion.
#[tokio::test]
async fn test_overload_then_quota() {
    let s = scenario(MockBackend::new().with_outcomes(vec![
        MockOutcome::fail(BackendFailure::Overloaded),
        MockOutcome::fail(BackendFailure::Overloaded),
        MockOutcome::fail(BackendFailure::Overloaded),
        MockOutcome::fail(BackendFailure::QuotaExceeded),
    ]));

    let outcome = s.chat.send_message("Q").await;

    assert_eq!(outcome, SendOutcome::LimitReached);
    assert_eq!(s.chat.phase(), ChatPhase::LimitReached);
    assert_eq!(s.backend.call_count(), 4);
    assert_eq!(
        s.sleeper.delays(),
        vec![Duration::from_millis(RETRY_DELAY_MS); 3]
    );

    let view = s.chat.state();
    assert!(view.limit_reached);
    assert_eq!(view.messages.len(), 1);
    assert_eq!(view.messages[0].author, Author::User);
    assert_eq!(view.messages[0].content, "Q");

    let notices = s.sink.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert!(!s.chat.gate().is_open());
}

/// A second submit while the first is in flight is a no-op.
#[tokio::test]
async fn test_submit_while_sending() {
    let s = scenario(
        MockBackend::new()
            .add_outcome(MockOutcome::reply("answer"))
            .held(),
    );

    let first = s.chat.submit("Q");
    while s.backend.call_count() == 0 {
        tokio::task::yield_now().await;
    }

    let before = s.chat.state();
    assert!(before.is_sending);

    assert_eq!(s.chat.send_message("Q").await, SendOutcome::Ignored);
    assert_eq!(s.chat.state(), before);
    assert_eq!(s.backend.call_count(), 1);

    s.backend.release();
    assert!(matches!(first.await.unwrap(), SendOutcome::Replied(_)));

    let view = s.chat.state();
    let users = view
        .messages
        .iter()
        .filter(|t| t.author == Author::User)
        .count();
    assert_eq!(users, 1);
    assert_eq!(view.messages.len(), 2);
}

/// Overload runs of every length up to and past the retry budget.
#[tokio::test]
async fn test_overload_run_lengths() {
    for k in 0..=(MAX_RETRIES + 2) {
        let mut outcomes = vec![MockOutcome::fail(BackendFailure::Overloaded); k as usize];
        outcomes.push(MockOutcome::reply("recovered"));
        let s = scenario(MockBackend::new().with_outcomes(outcomes));

        let outcome = s.chat.send_message("Q").await;
        let messages = s.chat.state().messages;

        if k <= MAX_RETRIES {
            assert!(matches!(outcome, SendOutcome::Replied(_)), "k={}", k);
            assert_eq!(s.backend.call_count(), k as usize + 1);
            assert_eq!(s.sleeper.delays().len(), k as usize);
            assert_eq!(messages.len(), 2);
        } else {
            assert_eq!(
                outcome,
                SendOutcome::Failed(ChatError::RetryExhausted {
                    attempts: MAX_RETRIES + 1
                })
            );
            assert_eq!(s.backend.call_count(), (MAX_RETRIES + 1) as usize);
            assert_eq!(s.sleeper.delays().len(), MAX_RETRIES as usize);
            assert_eq!(messages.len(), 1);
            assert_eq!(s.chat.phase(), ChatPhase::Idle);
        }
    }
}

/// Quota stays exhausted whatever the backend would say later.
#[tokio::test]
async fn test_quota_survives_project_switch() {
    let s = scenario(MockBackend::new().with_outcomes(vec![
        MockOutcome::fail(BackendFailure::QuotaExceeded),
        MockOutcome::reply("would succeed"),
    ]));

    s.chat.send_message("Q").await;
    s.chat.switch_project("beacon");

    assert_eq!(s.chat.phase(), ChatPhase::LimitReached);
    assert_eq!(s.chat.send_message("Q").await, SendOutcome::LimitReached);
    assert_eq!(s.backend.call_count(), 1);
    assert!(!s.chat.gate().is_open());
}

/// History replays every prior turn in order.
#[tokio::test]
async fn test_history_order_across_turns() {
    let s = scenario(MockBackend::new().with_outcomes(vec![
        MockOutcome::reply("a1"),
        MockOutcome::fail(BackendFailure::Network("reset".into())),
        MockOutcome::reply("a3"),
    ]));

    s.chat.send_message("q1").await;
    s.chat.send_message("q2").await;
    s.chat.send_message("q3").await;

    let requests = s.backend.requests();
    assert_eq!(requests.len(), 3);

    let history: Vec<_> = requests[2]
        .history
        .iter()
        .map(|e| e.content.as_str())
        .collect();
    assert_eq!(history, vec!["q1", "a1", "q2"]);

    let contents: Vec<_> = s
        .chat
        .state()
        .messages
        .iter()
        .map(|t| t.content.clone())
        .collect();
    assert_eq!(contents, vec!["q1", "a1", "q2", "q3", "a3"]);
}
