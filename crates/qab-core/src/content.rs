use serde::Serialize;

/// Kind tag of a relayed message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Text,
    Photo,
    Document,
    Voice,
    Audio,
    Video,
    VideoNote,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Text => "text",
            ContentKind::Photo => "photo",
            ContentKind::Document => "document",
            ContentKind::Voice => "voice",
            ContentKind::Audio => "audio",
            ContentKind::Video => "video",
            ContentKind::VideoNote => "video_note",
        }
    }

    /// Label shown in place of a missing caption.
    pub fn placeholder(self) -> Option<&'static str> {
        match self {
            ContentKind::Text => None,
            ContentKind::Photo => Some("[Photo]"),
            ContentKind::Document => Some("[Document]"),
            ContentKind::Voice => Some("[Voice message]"),
            ContentKind::Audio => Some("[Audio message]"),
            ContentKind::Video => Some("[Video message]"),
            ContentKind::VideoNote => Some("[Video note]"),
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relayable message content.
///
/// `file_id` is the platform file reference; media is forwarded by reference,
/// never downloaded. Voice messages and video notes carry no caption.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content {
    Text {
        text: String,
    },
    Photo {
        file_id: String,
        caption: Option<String>,
    },
    Document {
        file_id: String,
        caption: Option<String>,
    },
    Voice {
        file_id: String,
    },
    Audio {
        file_id: String,
        caption: Option<String>,
    },
    Video {
        file_id: String,
        caption: Option<String>,
    },
    VideoNote {
        file_id: String,
    },
}

impl Content {
    pub fn kind(&self) -> ContentKind {
        match self {
            Content::Text { .. } => ContentKind::Text,
            Content::Photo { .. } => ContentKind::Photo,
            Content::Document { .. } => ContentKind::Document,
            Content::Voice { .. } => ContentKind::Voice,
            Content::Audio { .. } => ContentKind::Audio,
            Content::Video { .. } => ContentKind::Video,
            Content::VideoNote { .. } => ContentKind::VideoNote,
        }
    }

    pub fn media_ref(&self) -> Option<&str> {
        match self {
            Content::Text { .. } => None,
            Content::Photo { file_id, .. }
            | Content::Document { file_id, .. }
            | Content::Voice { file_id }
            | Content::Audio { file_id, .. }
            | Content::Video { file_id, .. }
            | Content::VideoNote { file_id } => Some(file_id),
        }
    }

    /// Caption attached by the sender, if the kind supports one and it is non-empty.
    pub fn caption(&self) -> Option<&str> {
        let caption = match self {
            Content::Photo { caption, .. }
            | Content::Document { caption, .. }
            | Content::Audio { caption, .. }
            | Content::Video { caption, .. } => caption.as_deref(),
            Content::Text { .. } | Content::Voice { .. } | Content::VideoNote { .. } => None,
        };
        caption.filter(|c| !c.is_empty())
    }

    /// Display summary: the text, the caption, or the kind placeholder.
    pub fn summary(&self) -> String {
        if let Content::Text { text } = self {
            return text.clone();
        }
        match self.caption() {
            Some(c) => c.to_string(),
            None => self.kind().placeholder().unwrap_or_default().to_string(),
        }
    }

    pub fn is_start_command(&self) -> bool {
        let Content::Text { text } = self else {
            return false;
        };
        // Telegram may send `/start@botname payload`.
        let first = text.split_whitespace().next().unwrap_or("");
        first
            .split('@')
            .next()
            .is_some_and(|cmd| cmd.eq_ignore_ascii_case("/start"))
    }
}
