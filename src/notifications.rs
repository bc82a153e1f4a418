//! Per-user notification inbox. In memory only; every user starts with a
//! welcome pair on first read.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: u32,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub time: DateTime<Utc>,
}

#[derive(Default)]
pub struct NotificationStore {
    inboxes: Mutex<HashMap<Uuid, Vec<Notification>>>,
}

fn welcome(now: DateTime<Utc>) -> Vec<Notification> {
    vec![
        Notification {
            id: 1,
            title: "Welcome to TaskWise".into(),
            message: "Thanks for joining TaskWise. Get productive!".into(),
            read: false,
            time: now,
        },
        Notification {
            id: 2,
            title: "Sample Task Added".into(),
            message: "We created a sample task to get you started.".into(),
            read: false,
            time: now,
        },
    ]
}

impl NotificationStore {
    pub fn list(&self, user_id: Uuid) -> Vec<Notification> {
        let mut inboxes = self.inboxes.lock().unwrap_or_else(|e| e.into_inner());
        inboxes
            .entry(user_id)
            .or_insert_with(|| welcome(Utc::now()))
            .clone()
    }

    /// Returns false when the user has no notification with that id.
    pub fn mark_read(&self, user_id: Uuid, id: u32) -> bool {
        let mut inboxes = self.inboxes.lock().unwrap_or_else(|e| e.into_inner());
        let inbox = inboxes.entry(user_id).or_insert_with(|| welcome(Utc::now()));
        match inbox.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                true
            }
            None => false,
        }
    }
}
