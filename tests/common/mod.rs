#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use messenger_webhook::send_message::{DeliveryError, ReplySender};
use messenger_webhook::types::{ReplyPayload, SendAck};
use reqwest::StatusCode;

/// Records every reply; optionally fails sends to the listed recipients.
#[derive(Clone, Default)]
pub struct RecordingSender {
    sent: Arc<Mutex<Vec<ReplyPayload>>>,
    failing: Arc<Vec<String>>,
}

impl RecordingSender {
    pub fn failing_for(recipients: &[&str]) -> Self {
        RecordingSender {
            sent: Arc::default(),
            failing: Arc::new(recipients.iter().map(|r| r.to_string()).collect()),
        }
    }

    pub fn sent(&self) -> Vec<ReplyPayload> {
        self.sent.lock().unwrap().clone()
    }
}

impl ReplySender for RecordingSender {
    async fn send(&self, reply: &ReplyPayload) -> Result<SendAck, DeliveryError> {
        self.sent.lock().unwrap().push(reply.clone());

        if self.failing.contains(&reply.recipient.id) {
            return Err(DeliveryError::Status {
                status: StatusCode::BAD_GATEWAY,
                body: "sink down".into(),
            });
        }

        Ok(SendAck::default())
    }
}

pub fn delivery(events: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "object": "page",
        "entry": [{"id": "PAGE", "time": 1, "messaging": events}]
    })
}
