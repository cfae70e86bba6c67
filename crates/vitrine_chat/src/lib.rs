//! # vitrine_chat - Project Chat Assistant for Vitrine
//!
//! This crate turns user questions about a showcased project into calls
//! against a remote language-model endpoint:
//! - Ordered, append-only conversation log replayed as history
//! - Project context injected into every request
//! - Fixed-delay retry for overloaded backends
//! - Daily quota mirrored client-side once the backend reports it
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │  UI / CLI layer │────▶│ChatOrchestrator │────▶│RetryingInvoker  │
//! └─────────────────┘     └────────┬────────┘     └────────┬────────┘
//!                                  │                       │
//!         ┌────────────────────────┼───────────┐           ▼
//!         ▼                        ▼           ▼   ┌───────────────┐
//! ┌───────────────┐      ┌───────────────┐ ┌─────┐ │AssistantBackend│
//! │  MessageLog   │      │ContextBuilder │ │Quota│ └───────────────┘
//! └───────────────┘      └───────────────┘ └─────┘
//! ```

pub mod types;
pub mod error;
pub mod config;
pub mod context;
pub mod message_log;
pub mod quota;
pub mod notify;
pub mod project;
pub mod backend;
pub mod retry;
pub mod orchestrator;
pub mod mock;

pub use types::*;
pub use error::*;
pub use config::*;
pub use context::*;
pub use message_log::*;
pub use quota::*;
pub use notify::*;
pub use project::*;
pub use backend::*;
pub use retry::*;
pub use orchestrator::*;
