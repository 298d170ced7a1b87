//! Per-conversation mutual exclusion.
//!
//! A conversation must process one query at a time; concurrent queries for
//! different conversations proceed independently. The gate maps a
//! conversation key to an owned async mutex and hands out guards scoped to
//! one call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Clone, Default)]
pub struct ConversationGate {
    slots: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl ConversationGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key` and returns the guard. Dropping
    /// the guard releases the conversation for the next waiter.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self
                .slots
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            // Sweep slots nobody holds or waits on; they are recreated on demand.
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            Arc::clone(slots.entry(key.to_owned()).or_default())
        };
        slot.lock_owned().await
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_key_serializes() {
        let gate = ConversationGate::new();
        let guard = gate.acquire("conv-1").await;

        let blocked =
            tokio::time::timeout(Duration::from_millis(50), gate.acquire("conv-1")).await;
        assert!(blocked.is_err(), "second acquire should block while held");

        drop(guard);
        let unblocked =
            tokio::time::timeout(Duration::from_millis(50), gate.acquire("conv-1")).await;
        assert!(unblocked.is_ok(), "acquire should proceed after release");
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let gate = ConversationGate::new();
        let _guard = gate.acquire("conv-1").await;

        let other = tokio::time::timeout(Duration::from_millis(50), gate.acquire("conv-2")).await;
        assert!(other.is_ok(), "a different conversation must not block");
    }

    #[tokio::test]
    async fn idle_slots_are_swept() {
        let gate = ConversationGate::new();
        drop(gate.acquire("conv-1").await);
        drop(gate.acquire("conv-2").await);

        // The next acquire sweeps the two idle slots before inserting its own.
        let _guard = gate.acquire("conv-3").await;
        assert_eq!(gate.slot_count(), 1);
    }

    #[tokio::test]
    async fn gate_clones_share_state() {
        let gate = ConversationGate::new();
        let clone = gate.clone();
        let _guard = gate.acquire("conv-1").await;

        let blocked =
            tokio::time::timeout(Duration::from_millis(50), clone.acquire("conv-1")).await;
        assert!(blocked.is_err(), "clone must observe the held slot");
    }
}
