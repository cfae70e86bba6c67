//! Client-side mirror of the backend's daily chat allowance.

use std::sync::Arc;

use tokio::sync::watch;

/// One-way gate that closes once the backend reports the daily quota is gone.
///
/// Clones share the same gate; inject one clone into several orchestrators to
/// share a budget deliberately. Every holder can [`subscribe`](Self::subscribe)
/// to hear about the closure, whoever caused it.
#[derive(Debug, Clone)]
pub struct QuotaGate {
    exhausted: Arc<watch::Sender<bool>>,
}

impl Default for QuotaGate {
    fn default() -> Self {
        let (exhausted, _) = watch::channel(false);
        Self {
            exhausted: Arc::new(exhausted),
        }
    }
}

impl QuotaGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// True until exhaustion has been observed
    pub fn is_open(&self) -> bool {
        !*self.exhausted.borrow()
    }

    /// Close the gate. Returns true only for the call that closed it.
    pub fn mark_exhausted(&self) -> bool {
        self.exhausted.send_if_modified(|exhausted| {
            if *exhausted {
                false
            } else {
                *exhausted = true;
                true
            }
        })
    }

    /// Changes to `true` once the gate closes
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.exhausted.subscribe()
    }
}
