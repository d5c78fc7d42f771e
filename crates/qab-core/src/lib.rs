//! Core domain + routing logic for the question/answer relay bot.
//!
//! This crate is intentionally framework-agnostic. Telegram lives behind the
//! `MessagingPort` trait implemented in the adapter crate.

pub mod audit;
pub mod config;
pub mod content;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod relay;
pub mod texts;
pub mod thread;

pub use errors::{Error, Result};
