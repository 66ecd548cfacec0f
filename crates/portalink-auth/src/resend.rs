//! Per-email resend throttling.
//!
//! Every code request triggers a live vendor lookup, so an unthrottled
//! resend button is a vendor-API amplification vector. The guard keeps a
//! small TTL map of recent sends; within the cooldown window the flow
//! returns its uniform success message without touching the vendor.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// Tracks the last code-request time per email.
pub struct ResendGuard {
    cooldown: Duration,
    sent: RwLock<HashMap<String, Instant>>,
}

impl ResendGuard {
    /// Creates a guard with the given cooldown window.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            sent: RwLock::new(HashMap::new()),
        }
    }

    /// Whether a vendor lookup is allowed for this email right now.
    ///
    /// Records the attempt when allowed. Keys are lowercased so casing
    /// differences cannot bypass the window.
    pub async fn try_acquire(&self, email: &str) -> bool {
        let key = email.to_lowercase();
        let mut sent = self.sent.write().await;
        if let Some(last) = sent.get(&key)
            && last.elapsed() < self.cooldown
        {
            return false;
        }
        sent.insert(key, Instant::now());
        true
    }

    /// Drop entries older than the cooldown window.
    pub async fn cleanup(&self) {
        let cooldown = self.cooldown;
        let mut sent = self.sent.write().await;
        sent.retain(|_, last| last.elapsed() < cooldown);
    }

    /// Number of emails currently tracked.
    pub async fn len(&self) -> usize {
        self.sent.read().await.len()
    }

    /// Returns `true` if no emails are tracked.
    pub async fn is_empty(&self) -> bool {
        self.sent.read().await.is_empty()
    }
}
