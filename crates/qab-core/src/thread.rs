use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};

use crate::{
    content::{Content, ContentKind},
    domain::UserId,
    texts::fit_to,
};

/// Lines of the previous question shown to the admin.
pub const PREVIEW_LINES: usize = 2;

const PREVIEW_HEADER: &str = "🕘 Previous Question:\n";

/// Below this many chars per line the preview is dropped rather than shortened.
const MIN_PREVIEW_LINE: usize = 8;

/// Who produced a thread entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Origin {
    Admin,
    /// A user, labelled by display name.
    User(String),
}

impl Origin {
    pub fn label(&self) -> &str {
        match self {
            Origin::Admin => "Admin",
            Origin::User(name) => name,
        }
    }
}

/// One relayed message in a user's conversation history.
#[derive(Clone, Debug)]
pub struct ThreadEntry {
    pub origin: Origin,
    pub kind: ContentKind,
    pub content: String,
    pub media_ref: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl ThreadEntry {
    pub fn new(origin: Origin, content: &Content) -> Self {
        Self {
            origin,
            kind: content.kind(),
            content: content.summary(),
            media_ref: content.media_ref().map(str::to_string),
            recorded_at: Utc::now(),
        }
    }
}

/// Per-user rolling history, capped at `limit` entries per user.
#[derive(Debug)]
pub struct ThreadStore {
    limit: usize,
    threads: HashMap<UserId, VecDeque<ThreadEntry>>,
}

impl ThreadStore {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            threads: HashMap::new(),
        }
    }

    pub fn append(&mut self, user_id: UserId, entry: ThreadEntry) {
        let thread = self.threads.entry(user_id).or_default();
        while thread.len() >= self.limit {
            thread.pop_front();
        }
        thread.push_back(entry);
    }

    pub fn len(&self, user_id: UserId) -> usize {
        self.threads.get(&user_id).map(VecDeque::len).unwrap_or(0)
    }

    pub fn history(&self, user_id: UserId) -> Vec<ThreadEntry> {
        self.threads
            .get(&user_id)
            .map(|t| t.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Most recent entry that did not come from the admin side.
    pub fn last_user_entry(&self, user_id: UserId) -> Option<&ThreadEntry> {
        self.threads
            .get(&user_id)?
            .iter()
            .rev()
            .find(|e| e.origin != Origin::Admin)
    }

    /// Preview block prepended to a forwarded question, or `""` on a user's first question.
    pub fn preview(&self, user_id: UserId) -> String {
        self.preview_within(user_id, usize::MAX)
    }

    /// Like `preview`, but at most `budget` chars: each line is shortened to an
    /// equal share, and the block is left out when the share gets too small.
    pub fn preview_within(&self, user_id: UserId, budget: usize) -> String {
        let Some(prev) = self.last_user_entry(user_id) else {
            return String::new();
        };
        let lines: Vec<&str> = prev.content.lines().take(PREVIEW_LINES).collect();

        let full = render_preview(&lines);
        if full.chars().count() <= budget {
            return full;
        }

        // Header, trailing blank line and the separators between lines.
        let frame = PREVIEW_HEADER.chars().count() + 2 + lines.len().saturating_sub(1);
        let per_line = budget.saturating_sub(frame) / lines.len().max(1);
        if per_line < MIN_PREVIEW_LINE {
            return String::new();
        }
        let shortened: Vec<String> = lines.iter().map(|l| fit_to(l, per_line)).collect();
        render_preview(&shortened)
    }
}

fn render_preview<S: AsRef<str>>(lines: &[S]) -> String {
    let body = lines
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n");
    format!("{PREVIEW_HEADER}{body}\n\n")
}
