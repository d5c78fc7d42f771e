use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{domain::ChatId, errors::Error, Result};

pub const DEFAULT_THREAD_HISTORY_LIMIT: usize = 200;

/// Typed configuration, loaded once at process start.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    pub admin_group_id: ChatId,

    /// Per-user cap on recorded thread entries (oldest evicted first).
    pub thread_history_limit: usize,

    // Audit
    pub audit_log_path: Option<PathBuf>,
    pub audit_log_json: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the process env in `load`).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = lookup("TELEGRAM_BOT_TOKEN")
            .and_then(non_empty)
            .or_else(|| lookup("API_TOKEN").and_then(non_empty))
            .ok_or_else(|| {
                Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
            })?;

        let raw_admin = lookup("ADMIN_GROUP_ID").and_then(non_empty).ok_or_else(|| {
            Error::Config("ADMIN_GROUP_ID environment variable is required".to_string())
        })?;
        let admin_group_id = raw_admin
            .trim()
            .parse::<i64>()
            .map(ChatId)
            .map_err(|_| Error::Config(format!("ADMIN_GROUP_ID is not a number: {raw_admin}")))?;

        let thread_history_limit = lookup("THREAD_HISTORY_LIMIT")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_THREAD_HISTORY_LIMIT)
            .max(1);

        let audit_log_path = lookup("AUDIT_LOG_PATH")
            .and_then(non_empty)
            .map(PathBuf::from);
        let audit_log_json = lookup("AUDIT_LOG_JSON")
            .map(|s| parse_bool(&s))
            .unwrap_or(false);

        Ok(Self {
            telegram_bot_token,
            admin_group_id,
            thread_history_limit,
            audit_log_path,
            audit_log_json,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
