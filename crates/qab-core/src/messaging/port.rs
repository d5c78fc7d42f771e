use async_trait::async_trait;

use crate::{
    content::Content,
    domain::{ChatId, MessageRef},
    messaging::types::{InlineKeyboard, ReplyKeyboard},
    Result,
};

/// Outbound messaging port.
///
/// Every send returns the `MessageRef` of the message it produced; an `Err`
/// means nothing was delivered and the caller must not record anything.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;

    async fn send_reply_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: ReplyKeyboard,
    ) -> Result<MessageRef>;

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef>;

    async fn send_photo(
        &self,
        chat_id: ChatId,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<MessageRef>;

    async fn send_document(
        &self,
        chat_id: ChatId,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<MessageRef>;

    async fn send_voice(
        &self,
        chat_id: ChatId,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<MessageRef>;

    async fn send_audio(
        &self,
        chat_id: ChatId,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<MessageRef>;

    async fn send_video(
        &self,
        chat_id: ChatId,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<MessageRef>;

    /// Video notes cannot carry a caption.
    async fn send_video_note(&self, chat_id: ChatId, file_id: &str) -> Result<MessageRef>;

    async fn answer_callback_query(&self, callback_id: &str) -> Result<()>;

    /// Send `content` with the call matching its kind.
    ///
    /// `body` is the message text for `Text` and the caption for media.
    async fn send_content(
        &self,
        chat_id: ChatId,
        content: &Content,
        body: &str,
    ) -> Result<MessageRef> {
        let caption = Some(body);
        match content {
            Content::Text { .. } => self.send_text(chat_id, body).await,
            Content::Photo { file_id, .. } => self.send_photo(chat_id, file_id, caption).await,
            Content::Document { file_id, .. } => {
                self.send_document(chat_id, file_id, caption).await
            }
            Content::Voice { file_id } => self.send_voice(chat_id, file_id, caption).await,
            Content::Audio { file_id, .. } => self.send_audio(chat_id, file_id, caption).await,
            Content::Video { file_id, .. } => self.send_video(chat_id, file_id, caption).await,
            Content::VideoNote { file_id } => self.send_video_note(chat_id, file_id).await,
        }
    }
}
