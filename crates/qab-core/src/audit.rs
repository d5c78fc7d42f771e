use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::Serialize;

use crate::{
    content::ContentKind,
    domain::{MessageId, UserId},
    Result,
};

const AUDIT_MAX_TEXT: usize = 500;

/// One line of the relay audit trail.
#[derive(Clone, Debug, Serialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event: &'static str,
    pub user_id: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_type: Option<ContentKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Message id on the admin side (forwarded copy or the admin's reply).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_message_id: Option<i32>,
}

impl AuditEvent {
    /// `<timestamp> <event> user=<id> [name] [kind] [admin_msg]: <content>`
    fn to_plain_line(&self) -> String {
        let mut line = format!("{} {} user={}", self.timestamp, self.event, self.user_id);
        if let Some(name) = &self.display_name {
            line.push_str(&format!(" name={name}"));
        }
        if let Some(kind) = self.message_type {
            line.push_str(&format!(" kind={kind}"));
        }
        if let Some(id) = self.admin_message_id {
            line.push_str(&format!(" admin_msg={id}"));
        }
        if let Some(content) = &self.content {
            // Keep one event per line.
            line.push_str(": ");
            line.push_str(&content.replace('\n', "\\n"));
        }
        line
    }

    pub fn forwarded(
        user_id: UserId,
        display_name: &str,
        kind: ContentKind,
        content: &str,
        admin_message_id: MessageId,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            event: "forwarded",
            user_id: user_id.0,
            display_name: Some(display_name.to_string()),
            message_type: Some(kind),
            content: Some(content.to_string()),
            admin_message_id: Some(admin_message_id.0),
        }
    }

    pub fn answered(
        user_id: UserId,
        kind: ContentKind,
        content: &str,
        admin_message_id: MessageId,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            event: "answered",
            user_id: user_id.0,
            display_name: None,
            message_type: Some(kind),
            content: Some(content.to_string()),
            admin_message_id: Some(admin_message_id.0),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuditLogger {
    path: PathBuf,
    json: bool,
}

impl AuditLogger {
    pub fn new(path: impl Into<PathBuf>, json: bool) -> Self {
        Self {
            path: path.into(),
            json,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event, as a JSON line or a single readable line.
    pub fn write(&self, mut event: AuditEvent) -> Result<()> {
        event.content = event.content.map(|c| truncate_text(&c, AUDIT_MAX_TEXT));

        let line = if self.json {
            serde_json::to_string(&event)?
        } else {
            event.to_plain_line()
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

pub fn truncate_text(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out = s.chars().take(max_len).collect::<String>();
    out.push_str("...");
    out
}
