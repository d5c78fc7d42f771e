//! Conversion of teloxide updates into the relay's transport-neutral types.

use teloxide::types::{CallbackQuery, Message};

use qab_core::{
    content::Content,
    domain::{ChatId, MessageId, UserId},
    messaging::types::{CallbackPress, IncomingMessage, Sender},
};

/// Extract relayable content; `None` for kinds the relay does not carry
/// (stickers, locations, service messages, ...).
pub fn extract_content(msg: &Message) -> Option<Content> {
    let caption = msg.caption().map(str::to_string);

    if let Some(text) = msg.text() {
        return Some(Content::Text {
            text: text.to_string(),
        });
    }
    if let Some(photos) = msg.photo() {
        // Telegram orders sizes ascending; the last one is the largest.
        let best = photos.last()?;
        return Some(Content::Photo {
            file_id: best.file.id.clone(),
            caption,
        });
    }
    if let Some(doc) = msg.document() {
        return Some(Content::Document {
            file_id: doc.file.id.clone(),
            caption,
        });
    }
    if let Some(voice) = msg.voice() {
        return Some(Content::Voice {
            file_id: voice.file.id.clone(),
        });
    }
    if let Some(audio) = msg.audio() {
        return Some(Content::Audio {
            file_id: audio.file.id.clone(),
            caption,
        });
    }
    if let Some(video) = msg.video() {
        return Some(Content::Video {
            file_id: video.file.id.clone(),
            caption,
        });
    }
    if let Some(note) = msg.video_note() {
        return Some(Content::VideoNote {
            file_id: note.file.id.clone(),
        });
    }
    None
}

pub fn incoming_message(msg: &Message) -> Option<IncomingMessage> {
    let user = msg.from()?;
    let content = extract_content(msg)?;

    Some(IncomingMessage {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
        sender: Sender {
            user_id: UserId(user.id.0 as i64),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
        },
        content,
        reply_to: msg.reply_to_message().map(|r| MessageId(r.id.0)),
    })
}

/// `None` when the button's message is no longer available.
pub fn callback_press(q: &CallbackQuery) -> Option<CallbackPress> {
    let chat_id = q.message.as_ref().map(|m| m.chat.id)?;
    Some(CallbackPress {
        callback_id: q.id.clone(),
        chat_id: ChatId(chat_id.0),
        user_id: UserId(q.from.id.0 as i64),
        data: q.data.clone().unwrap_or_default(),
    })
}
