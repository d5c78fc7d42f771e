//! Telegram adapter (teloxide).
//!
//! This crate implements the `qab-core` MessagingPort over the Telegram Bot API
//! and feeds inbound updates into the relay.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{
        InlineKeyboardButton, InlineKeyboardMarkup, InputFile, KeyboardButton, KeyboardMarkup,
    },
};

pub mod handlers;
pub mod inbound;
pub mod router;

use qab_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{InlineKeyboard, ReplyKeyboard},
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    fn sent(chat_id: ChatId, msg: Message) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        let msg = self
            .bot
            .send_message(Self::tg_chat(chat_id), text.to_string())
            .await
            .map_err(Self::map_err)?;
        Ok(Self::sent(chat_id, msg))
    }

    async fn send_reply_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: ReplyKeyboard,
    ) -> Result<MessageRef> {
        let row: Vec<KeyboardButton> = keyboard
            .buttons
            .into_iter()
            .map(KeyboardButton::new)
            .collect();
        let markup = KeyboardMarkup::new(vec![row])
            .resize_keyboard(keyboard.resize)
            .one_time_keyboard(keyboard.one_time);

        let msg = self
            .bot
            .send_message(Self::tg_chat(chat_id), text.to_string())
            .reply_markup(markup)
            .await
            .map_err(Self::map_err)?;
        Ok(Self::sent(chat_id, msg))
    }

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
            .rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|b| InlineKeyboardButton::callback(b.label, b.callback_data))
                    .collect()
            })
            .collect();
        let markup = InlineKeyboardMarkup::new(rows);

        let msg = self
            .bot
            .send_message(Self::tg_chat(chat_id), text.to_string())
            .reply_markup(markup)
            .await
            .map_err(Self::map_err)?;
        Ok(Self::sent(chat_id, msg))
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        let mut req = self
            .bot
            .send_photo(Self::tg_chat(chat_id), InputFile::file_id(file_id));
        if let Some(c) = caption {
            req = req.caption(c.to_string());
        }
        let msg = req.await.map_err(Self::map_err)?;
        Ok(Self::sent(chat_id, msg))
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        let mut req = self
            .bot
            .send_document(Self::tg_chat(chat_id), InputFile::file_id(file_id));
        if let Some(c) = caption {
            req = req.caption(c.to_string());
        }
        let msg = req.await.map_err(Self::map_err)?;
        Ok(Self::sent(chat_id, msg))
    }

    async fn send_voice(
        &self,
        chat_id: ChatId,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        let mut req = self
            .bot
            .send_voice(Self::tg_chat(chat_id), InputFile::file_id(file_id));
        if let Some(c) = caption {
            req = req.caption(c.to_string());
        }
        let msg = req.await.map_err(Self::map_err)?;
        Ok(Self::sent(chat_id, msg))
    }

    async fn send_audio(
        &self,
        chat_id: ChatId,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        let mut req = self
            .bot
            .send_audio(Self::tg_chat(chat_id), InputFile::file_id(file_id));
        if let Some(c) = caption {
            req = req.caption(c.to_string());
        }
        let msg = req.await.map_err(Self::map_err)?;
        Ok(Self::sent(chat_id, msg))
    }

    async fn send_video(
        &self,
        chat_id: ChatId,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        let mut req = self
            .bot
            .send_video(Self::tg_chat(chat_id), InputFile::file_id(file_id));
        if let Some(c) = caption {
            req = req.caption(c.to_string());
        }
        let msg = req.await.map_err(Self::map_err)?;
        Ok(Self::sent(chat_id, msg))
    }

    async fn send_video_note(&self, chat_id: ChatId, file_id: &str) -> Result<MessageRef> {
        let msg = self
            .bot
            .send_video_note(Self::tg_chat(chat_id), InputFile::file_id(file_id))
            .await
            .map_err(Self::map_err)?;
        Ok(Self::sent(chat_id, msg))
    }

    async fn answer_callback_query(&self, callback_id: &str) -> Result<()> {
        self.bot
            .answer_callback_query(callback_id.to_string())
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }
}
