use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Structural failures when a delivery parses as JSON but does not have the
/// `entry[0].messaging[]` shape.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` should be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("`entry` is empty")]
    NoEntries,
    #[error("event #{index} is malformed: {source}")]
    InvalidEvent {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// One webhook POST body. Only the first entry is ever consumed.
#[derive(Debug)]
pub struct InboundDelivery {
    pub entries: Vec<Entry>,
}

/// Events are kept as raw JSON and decoded one at a time, so a malformed
/// event only fails once every event before it has been handled.
#[derive(Debug)]
pub struct Entry {
    raw_events: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagingEvent {
    Message {
        sender_id: String,
        text: Option<String>,
    },
    Postback {
        sender_id: String,
        payload: Option<String>,
    },
    /// Deliveries, reads, reactions and the like.
    Other,
}

#[derive(Debug, Deserialize)]
struct Sender {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostbackBody {
    payload: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMessageEvent {
    sender: Sender,
    message: MessageBody,
}

#[derive(Debug, Deserialize)]
struct RawPostbackEvent {
    sender: Sender,
    postback: PostbackBody,
}

impl InboundDelivery {
    /// Parse the first entry of a delivery. Later entries are not looked at,
    /// so a malformed second entry never fails the delivery.
    pub fn from_value(value: &Value) -> Result<Self, PayloadError> {
        let entries = value
            .get("entry")
            .ok_or(PayloadError::MissingField("entry"))?
            .as_array()
            .ok_or(PayloadError::WrongType {
                field: "entry",
                expected: "an array",
            })?;

        let first = entries.first().ok_or(PayloadError::NoEntries)?;
        let entry = Entry::from_value(first)?;

        Ok(InboundDelivery {
            entries: vec![entry],
        })
    }

    pub fn first_entry(&self) -> Option<&Entry> {
        self.entries.first()
    }
}

impl Entry {
    fn from_value(value: &Value) -> Result<Self, PayloadError> {
        if !value.is_object() {
            return Err(PayloadError::WrongType {
                field: "entry[0]",
                expected: "an object",
            });
        }

        let raw_events = value
            .get("messaging")
            .ok_or(PayloadError::MissingField("entry[0].messaging"))?
            .as_array()
            .ok_or(PayloadError::WrongType {
                field: "entry[0].messaging",
                expected: "an array",
            })?;

        Ok(Entry {
            raw_events: raw_events.clone(),
        })
    }

    /// Decode events in order.
    pub fn events(&self) -> impl Iterator<Item = Result<MessagingEvent, PayloadError>> + '_ {
        self.raw_events
            .iter()
            .enumerate()
            .map(|(index, raw)| MessagingEvent::from_value(index, raw))
    }
}

impl MessagingEvent {
    pub fn from_value(index: usize, value: &Value) -> Result<Self, PayloadError> {
        let Some(object) = value.as_object() else {
            return Ok(MessagingEvent::Other);
        };

        let invalid = |source| PayloadError::InvalidEvent { index, source };

        if object.contains_key("message") {
            let raw: RawMessageEvent = serde_json::from_value(value.clone()).map_err(invalid)?;
            return Ok(MessagingEvent::Message {
                sender_id: raw.sender.id,
                text: raw.message.text,
            });
        }

        if object.contains_key("postback") {
            let raw: RawPostbackEvent = serde_json::from_value(value.clone()).map_err(invalid)?;
            return Ok(MessagingEvent::Postback {
                sender_id: raw.sender.id,
                payload: raw.postback.payload,
            });
        }

        Ok(MessagingEvent::Other)
    }
}

// ===== Outbound =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyPayload {
    pub recipient: Recipient,
    pub message: ReplyMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReplyMessage {
    Text { text: String },
    Attachment { attachment: Attachment },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub payload: TemplatePayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplatePayload {
    pub template_type: &'static str,
    pub elements: Vec<TemplateElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateElement {
    pub title: String,
    pub image_url: String,
    pub subtitle: String,
    pub buttons: Vec<Button>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: String,
    pub payload: String,
}

impl ReplyPayload {
    pub fn text(recipient_id: impl Into<String>, text: impl Into<String>) -> Self {
        ReplyPayload {
            recipient: Recipient {
                id: recipient_id.into(),
            },
            message: ReplyMessage::Text { text: text.into() },
        }
    }

    pub fn generic_template(recipient_id: impl Into<String>, element: TemplateElement) -> Self {
        ReplyPayload {
            recipient: Recipient {
                id: recipient_id.into(),
            },
            message: ReplyMessage::Attachment {
                attachment: Attachment {
                    kind: "template",
                    payload: TemplatePayload {
                        template_type: "generic",
                        elements: vec![element],
                    },
                },
            },
        }
    }

    pub fn text_body(&self) -> Option<&str> {
        match &self.message {
            ReplyMessage::Text { text } => Some(text),
            ReplyMessage::Attachment { .. } => None,
        }
    }
}

/// Acknowledgement returned by the send endpoint. The dispatcher ignores it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendAck {
    pub recipient_id: Option<String>,
    pub message_id: Option<String>,
}

/// Body for `me/messenger_profile` registering the bot's command list.
#[derive(Debug, Serialize)]
pub struct MessengerProfile {
    pub commands: Vec<LocaleCommands>,
}

#[derive(Debug, Serialize)]
pub struct LocaleCommands {
    pub locale: &'static str,
    pub commands: Vec<BotCommand>,
}

#[derive(Debug, Serialize)]
pub struct BotCommand {
    pub name: &'static str,
    pub description: &'static str,
}
