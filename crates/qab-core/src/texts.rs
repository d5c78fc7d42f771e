//! User-facing copy and message composition.

use crate::{
    audit::truncate_text,
    content::{Content, ContentKind},
};

pub const WELCOME: &str = "👋 Welcome to HU Bible Study Section Question and Answer Bot!\n\
እንኳን ወደ HU Bible Study Section የጥያቄ እና መልስ bot በደህና መጡ!";

pub const RESTART_BUTTON: &str = "/start";

pub const TOPIC_PROMPT: &str = "ከየት መጠየቅ ይፈልጋሉ?\nChoose an option:";

pub const TOPIC_GALATIANS_LABEL: &str = "ከገላትያ";
pub const TOPIC_ANYWHERE_LABEL: &str = "ከየትኛውም ቦታ ይጠይቁ";

pub const ASK_QUESTION: &str = "ጥያቄዎን ይላኩ...\nSend your Question...";

pub const QUESTION_RECEIPT: &str =
    "✅ ጥያቄዎ ተልኳል።\nYour question has been sent!\nWait for the Answer...";

pub const ANSWER_ACK: &str = "✔ Answer sent to user!";

const ANSWER_LABEL: &str = "💬 Answer";

/// Bot API limits, in characters.
pub const TEXT_LIMIT: usize = 4096;
pub const CAPTION_LIMIT: usize = 1024;

/// Longest body Telegram accepts for a message of this kind.
pub fn body_limit(kind: ContentKind) -> usize {
    match kind {
        ContentKind::Text => TEXT_LIMIT,
        _ => CAPTION_LIMIT,
    }
}

/// `s` unchanged when it fits, otherwise cut to exactly `limit` chars ending in `...`.
pub fn fit_to(s: &str, limit: usize) -> String {
    if s.chars().count() <= limit {
        return s.to_string();
    }
    truncate_text(s, limit.saturating_sub(3))
}

/// `@username` when the sender has one, otherwise their first name.
pub fn display_name(username: Option<&str>, first_name: &str) -> String {
    match username.filter(|u| !u.is_empty()) {
        Some(u) => format!("@{u}"),
        None => first_name.to_string(),
    }
}

/// Text (or caption) of a question forwarded to the admin group.
pub fn admin_message(preview: &str, display_name: &str, summary: &str) -> String {
    format!("{preview}📩 From {display_name}:\n{summary}")
}

/// Text (or caption) of an answer delivered to a user, cut to the kind's limit.
pub fn answer_message(content: &Content) -> String {
    let body = match content {
        Content::Text { text } => format!("{ANSWER_LABEL}:\n{text}"),
        _ => match content.caption() {
            Some(c) => format!("{ANSWER_LABEL}:\n{c}"),
            None => ANSWER_LABEL.to_string(),
        },
    };
    fit_to(&body, body_limit(content.kind()))
}
