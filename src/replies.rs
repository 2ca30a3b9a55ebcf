use crate::types::{Button, ReplyPayload, TemplateElement};

pub const GET_CHIPS: &str = "GET_CHIPS";
pub const POST_CHIPS: &str = "POST_CHIPS";
pub const CHIPS_BALANCE: &str = "CHIPS_BALANCE";

pub const UNKNOWN_POSTBACK_TEXT: &str = "Unknown postback received.";

const MENU_TITLE: &str = "Привіт! Я демо бот Savvy 😃";
const MENU_IMAGE_URL: &str = "https://savvysolutions.ltd/_next/static/media/logo.0aa3c3fa.svg";
const MENU_SUBTITLE: &str = "Ось наше головне меню:";

/// (payload key, button title, acknowledgement text)
const POSTBACKS: [(&str, &str, &str); 3] = [
    (
        GET_CHIPS,
        "Отримати фішки",
        "Ви натиснули на кнопку 'Отримати фішки'!",
    ),
    (
        POST_CHIPS,
        "Використати фішки",
        "Ви натиснули на кнопку 'Використати фішки'!",
    ),
    (
        CHIPS_BALANCE,
        "Баланс фішок",
        "Ви натиснули на кнопку 'Баланс фішок'!",
    ),
];

/// Which canned reply an event maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyStrategy {
    Echo { sender_id: String, text: String },
    StartMenu { sender_id: String },
    Postback { sender_id: String, payload: String },
}

impl ReplyStrategy {
    /// Text equal to "start" in any casing opens the menu; anything else is echoed.
    pub fn for_text(sender_id: String, text: String) -> Self {
        if text.to_lowercase() == "start" {
            ReplyStrategy::StartMenu { sender_id }
        } else {
            ReplyStrategy::Echo { sender_id, text }
        }
    }

    pub fn into_payload(self) -> ReplyPayload {
        match self {
            ReplyStrategy::Echo { sender_id, text } => ReplyPayload::text(sender_id, text),
            ReplyStrategy::StartMenu { sender_id } => start_menu(sender_id),
            ReplyStrategy::Postback { sender_id, payload } => {
                ReplyPayload::text(sender_id, postback_text(&payload))
            }
        }
    }
}

pub fn start_menu(sender_id: impl Into<String>) -> ReplyPayload {
    let buttons = POSTBACKS
        .iter()
        .map(|(key, title, _)| Button {
            kind: "postback",
            title: (*title).to_string(),
            payload: (*key).to_string(),
        })
        .collect();

    ReplyPayload::generic_template(
        sender_id,
        TemplateElement {
            title: MENU_TITLE.to_string(),
            image_url: MENU_IMAGE_URL.to_string(),
            subtitle: MENU_SUBTITLE.to_string(),
            buttons,
        },
    )
}

/// Exact, case-sensitive lookup with a fixed fallback.
pub fn postback_text(payload: &str) -> &'static str {
    POSTBACKS
        .iter()
        .find(|(key, _, _)| *key == payload)
        .map(|(_, _, text)| *text)
        .unwrap_or(UNKNOWN_POSTBACK_TEXT)
}
