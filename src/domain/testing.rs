//! Test doubles shared by the domain tests

use crate::domain::models::Gesture;
use crate::domain::ports::ActionSink;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// Sink that records every gesture it receives
pub struct RecordingSink {
    gestures: Mutex<Vec<Gesture>>,
    count: watch::Sender<usize>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            gestures: Mutex::new(Vec::new()),
            count: watch::channel(0).0,
        })
    }

    pub fn gestures(&self) -> Vec<Gesture> {
        self.gestures.lock().unwrap().clone()
    }

    /// Wait until at least `n` gestures were consumed
    pub async fn wait_for(&self, n: usize) {
        let mut rx = self.count.subscribe();
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|count| *count >= n))
            .await
            .expect("timed out waiting for gestures")
            .unwrap();
    }
}

#[async_trait]
impl ActionSink for RecordingSink {
    async fn consume(&self, gesture: Gesture) {
        let len = {
            let mut gestures = self.gestures.lock().unwrap();
            gestures.push(gesture);
            gestures.len()
        };
        self.count.send_replace(len);
    }
}
