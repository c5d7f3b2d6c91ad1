//! One-shot readiness barrier.
//!
//! The gate starts closed and opens exactly once. Waiters park on a
//! `tokio::sync::watch` channel and are all woken by the single transition.

use tokio::sync::watch;

/// Barrier that worker-dependent operations pass through before running.
#[derive(Debug)]
pub struct ReadinessGate {
    state: watch::Sender<bool>,
}

impl ReadinessGate {
    /// Create a closed gate.
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self { state }
    }

    /// Whether the gate has opened.
    pub fn is_ready(&self) -> bool {
        *self.state.borrow()
    }

    /// Open the gate and wake every waiter.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn open(&self) -> bool {
        let was_ready = self.state.send_replace(true);
        !was_ready
    }

    /// Suspend until the gate is open. Returns immediately once it is.
    pub async fn wait(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_new_gate_is_closed() {
        let gate = ReadinessGate::new();
        assert!(!gate.is_ready());
    }

    #[test]
    fn test_open_transitions_once() {
        let gate = ReadinessGate::new();
        assert!(gate.open());
        assert!(gate.is_ready());
        assert!(!gate.open());
        assert!(gate.is_ready());
    }

    #[tokio::test]
    async fn test_wait_on_open_gate_returns_immediately() {
        let gate = ReadinessGate::new();
        gate.open();
        tokio::time::timeout(Duration::from_millis(100), gate.wait())
            .await
            .expect("wait should not block on an open gate");
    }

    #[tokio::test]
    async fn test_waiters_suspend_until_open() {
        let gate = Arc::new(ReadinessGate::new());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let g = Arc::clone(&gate);
            handles.push(tokio::spawn(async move { g.wait().await }));
        }

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(handles.iter().all(|h| !h.is_finished()));

        assert!(gate.open());
        for h in handles {
            tokio::time::timeout(Duration::from_secs(1), h)
                .await
                .expect("waiter should wake after open")
                .unwrap();
        }
    }
}
