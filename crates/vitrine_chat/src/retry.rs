//! Bounded retry around one assistant call.
//!
//! Only overload failures are retried, with a fixed pause between attempts.
//! Quota exhaustion returns immediately; everything else is surfaced as
//! transient or fatal without a second try.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::backend::{AssistantBackend, AssistantReply, AssistantRequest};
use crate::error::{ChatError, ChatResult};

/// Retries allowed after the first overloaded attempt
pub const MAX_RETRIES: u32 = 3;

/// Pause between overloaded attempts
pub const RETRY_DELAY_MS: u64 = 2000;

/// Suspension point between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Retry budget and delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }
}

/// Per-send retry bookkeeping
#[derive(Debug, Default)]
struct RetryState {
    attempt: u32,
    last_error: Option<ChatError>,
}

/// Invokes the backend, retrying overloads within the policy budget
#[derive(Clone)]
pub struct RetryingInvoker {
    backend: Arc<dyn AssistantBackend>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl RetryingInvoker {
    pub fn new(backend: Arc<dyn AssistantBackend>) -> Self {
        Self {
            backend,
            sleeper: Arc::new(TokioSleeper),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Send one request. The same payload is reused on every attempt.
    pub async fn invoke(&self, request: &AssistantRequest) -> ChatResult<AssistantReply> {
        let mut state = RetryState::default();

        loop {
            debug!(attempt = state.attempt, "Calling assistant backend");

            let failure = match self.backend.complete(request).await {
                Ok(reply) => {
                    if let Some(ref previous) = state.last_error {
                        debug!(attempt = state.attempt, %previous, "Assistant recovered");
                    }
                    return Ok(reply);
                }
                Err(failure) => failure,
            };

            match ChatError::from(failure) {
                ChatError::Overloaded if state.attempt < self.policy.max_retries => {
                    warn!(
                        "Assistant overloaded (attempt {}/{}), retrying in {:?}",
                        state.attempt + 1,
                        self.policy.max_retries + 1,
                        self.policy.delay
                    );
                    state.last_error = Some(ChatError::Overloaded);
                    self.sleeper.sleep(self.policy.delay).await;
                    state.attempt += 1;
                }
                ChatError::Overloaded => {
                    let attempts = state.attempt + 1;
                    warn!("Assistant still overloaded after {} attempts, giving up", attempts);
                    return Err(ChatError::RetryExhausted { attempts });
                }
                other => {
                    debug!(attempt = state.attempt, error = %other, "Assistant call failed without retry");
                    return Err(other);
                }
            }
        }
    }
}
