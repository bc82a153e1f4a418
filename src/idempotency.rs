//! Client-token → task id map for replay-safe task creation.
//!
//! Process-local: two server processes do not share it.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use uuid::Uuid;

pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Default)]
struct Inner {
    tokens: HashMap<String, Uuid>,
    /// Insertion order for eviction.
    order: VecDeque<String>,
}

pub struct IdempotencyMap {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl Default for IdempotencyMap {
    fn default() -> Self {
        IdempotencyMap::with_capacity(DEFAULT_CAPACITY)
    }
}

impl IdempotencyMap {
    pub fn with_capacity(capacity: usize) -> Self {
        IdempotencyMap {
            inner: Mutex::new(Inner::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn lookup(&self, token: &str) -> Option<Uuid> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.tokens.get(token).copied()
    }

    /// Remember `token` → `task_id`, evicting the oldest token when full.
    pub fn record(&self, token: &str, task_id: Uuid) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.tokens.insert(token.to_string(), task_id).is_some() {
            return;
        }
        inner.order.push_back(token.to_string());
        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.tokens.remove(&oldest);
            }
        }
    }

    /// Drop a token whose task no longer exists.
    pub fn forget(&self, token: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.tokens.remove(token).is_some() {
            inner.order.retain(|t| t != token);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
