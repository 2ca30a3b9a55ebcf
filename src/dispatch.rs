use log::{debug, error, info};
use serde_json::Value;
use thiserror::Error;

use crate::replies::ReplyStrategy;
use crate::send_message::ReplySender;
use crate::types::{InboundDelivery, MessagingEvent, PayloadError};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("request body is empty")]
    EmptyBody,
    #[error("request body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("request body is an empty JSON value")]
    NullPayload,
    #[error("malformed delivery: {0}")]
    Malformed(#[from] PayloadError),
}

impl DispatchError {
    /// Bad input from the caller, as opposed to a delivery that parsed but
    /// has the wrong inner structure.
    pub fn is_bad_request(&self) -> bool {
        !matches!(self, DispatchError::Malformed(_))
    }
}

/// Counts for one processed delivery.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub replied: usize,
    pub skipped: usize,
    pub failed_sends: usize,
}

/// Decode a raw webhook body and dispatch it.
pub async fn dispatch_body<S: ReplySender>(
    sender: &S,
    body: &[u8],
) -> Result<DispatchOutcome, DispatchError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(DispatchError::EmptyBody);
    }

    let value: Value = serde_json::from_slice(body)?;
    debug!("Received delivery: {}", value);

    if is_falsy(&value) {
        return Err(DispatchError::NullPayload);
    }

    let delivery = InboundDelivery::from_value(&value)?;
    dispatch(sender, &delivery).await.map_err(DispatchError::from)
}

/// Route each event of the first entry to its reply, strictly in order. A
/// failed send is counted and does not stop the remaining events. The first
/// malformed event stops dispatch; replies to earlier events have been sent.
pub async fn dispatch<S: ReplySender>(
    sender: &S,
    delivery: &InboundDelivery,
) -> Result<DispatchOutcome, PayloadError> {
    let mut outcome = DispatchOutcome::default();

    let Some(entry) = delivery.first_entry() else {
        return Ok(outcome);
    };

    for event in entry.events() {
        let event = event?;
        let Some(strategy) = classify(&event) else {
            debug!("Skipping event: {:?}", event);
            outcome.skipped += 1;
            continue;
        };

        match &strategy {
            ReplyStrategy::Echo { sender_id, text } => {
                info!("Message from user ID: {} with text: {}", sender_id, text)
            }
            ReplyStrategy::StartMenu { sender_id } => {
                info!("Start menu requested by user ID: {}", sender_id)
            }
            ReplyStrategy::Postback { sender_id, payload } => {
                info!("Postback from user ID: {} with payload: {}", sender_id, payload)
            }
        }

        let reply = strategy.into_payload();
        match sender.send(&reply).await {
            Ok(_) => outcome.replied += 1,
            Err(e) => {
                error!("Failed to send reply to {}: {}", reply.recipient.id, e);
                outcome.failed_sends += 1;
            }
        }
    }

    Ok(outcome)
}

/// Pick the reply strategy for an event, or `None` when it gets no reply.
pub fn classify(event: &MessagingEvent) -> Option<ReplyStrategy> {
    match event {
        MessagingEvent::Message {
            sender_id,
            text: Some(text),
        } if !text.is_empty() => Some(ReplyStrategy::for_text(sender_id.clone(), text.clone())),
        MessagingEvent::Postback {
            sender_id,
            payload: Some(payload),
        } if !payload.is_empty() => Some(ReplyStrategy::Postback {
            sender_id: sender_id.clone(),
            payload: payload.clone(),
        }),
        _ => None,
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
