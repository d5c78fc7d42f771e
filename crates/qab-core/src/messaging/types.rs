use crate::{
    content::Content,
    domain::{ChatId, MessageId, UserId},
};

/// Sender of an inbound message.
#[derive(Clone, Debug)]
pub struct Sender {
    pub user_id: UserId,
    pub username: Option<String>,
    pub first_name: String,
}

/// Transport-neutral inbound message.
///
/// Only messages with relayable content are converted; everything else is
/// dropped in the adapter.
#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub sender: Sender,
    pub content: Content,
    /// Id of the message this one replies to (same chat).
    pub reply_to: Option<MessageId>,
}

/// Inline button press.
#[derive(Clone, Debug)]
pub struct CallbackPress {
    pub callback_id: String,
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub data: String,
}

/// Inline keyboard (buttons) attached to a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback_data: callback_data.into(),
        }
    }
}

impl InlineKeyboard {
    pub fn single_row(buttons: Vec<InlineButton>) -> Self {
        Self {
            rows: vec![buttons],
        }
    }
}

/// Custom reply keyboard replacing the user's text keyboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyKeyboard {
    pub buttons: Vec<String>,
    pub resize: bool,
    pub one_time: bool,
}

impl ReplyKeyboard {
    /// One compact button that disappears after use.
    pub fn one_time_button(label: impl Into<String>) -> Self {
        Self {
            buttons: vec![label.into()],
            resize: true,
            one_time: true,
        }
    }
}
