//! Relay router: forwards user questions to the admin group and routes admin
//! replies back to the user who asked.
//!
//! All state lives in one `RelayState` behind a single async mutex. The lock is
//! held for the whole operation, sends included, so events are applied one at a
//! time and a failed send never leaves half-recorded state behind.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    audit::{AuditEvent, AuditLogger},
    config::Config,
    domain::{ChatId, MessageId, MessageRef, UserId},
    messaging::{
        port::MessagingPort,
        types::{CallbackPress, IncomingMessage, InlineButton, InlineKeyboard, ReplyKeyboard},
    },
    texts,
    thread::{Origin, ThreadEntry, ThreadStore},
    Result,
};

/// Topic offered after `/start`.
///
/// Both topics currently lead to the same prompt; the choice is only logged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topic {
    Galatians,
    Anywhere,
}

impl Topic {
    pub const ALL: [Topic; 2] = [Topic::Galatians, Topic::Anywhere];

    pub fn callback_data(self) -> &'static str {
        match self {
            Topic::Galatians => "btn1",
            Topic::Anywhere => "btn2",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Topic::Galatians => texts::TOPIC_GALATIANS_LABEL,
            Topic::Anywhere => texts::TOPIC_ANYWHERE_LABEL,
        }
    }

    pub fn from_callback_data(data: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.callback_data() == data)
    }

    fn keyboard() -> InlineKeyboard {
        InlineKeyboard::single_row(
            Self::ALL
                .into_iter()
                .map(|t| InlineButton::new(t.label(), t.callback_data()))
                .collect(),
        )
    }
}

/// Why an event produced no routing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Admin group message that is not a reply (or was handed to the user path).
    AdminChatter,
    /// Reply handed to the admin path from some other chat.
    NotAdminChat,
    /// Admin reply to a message the relay never produced.
    UnknownReplyTarget,
}

/// Result of handling one event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelayOutcome {
    Started { welcomed: bool },
    Prompted { topic: Option<Topic> },
    Forwarded { admin_message: MessageRef },
    Answered { user_id: UserId, delivered: MessageRef },
    Ignored(IgnoreReason),
}

#[derive(Debug)]
pub struct RelayState {
    admin_to_user: HashMap<MessageId, UserId>,
    /// Written on both paths but never consulted when routing. Keyed on the
    /// full reference since message ids are only unique within a chat.
    user_to_admin: HashMap<MessageRef, MessageRef>,
    greeted: HashSet<UserId>,
    threads: ThreadStore,
}

impl RelayState {
    pub fn new(history_limit: usize) -> Self {
        Self {
            admin_to_user: HashMap::new(),
            user_to_admin: HashMap::new(),
            greeted: HashSet::new(),
            threads: ThreadStore::new(history_limit),
        }
    }

    /// Bind an admin-side message to a user. Existing bindings are never replaced.
    fn link(&mut self, admin_message: MessageId, user_id: UserId) -> UserId {
        *self.admin_to_user.entry(admin_message).or_insert(user_id)
    }

    fn resolve(&self, admin_message: MessageId) -> Option<UserId> {
        self.admin_to_user.get(&admin_message).copied()
    }
}

pub struct Relay {
    admin_chat: ChatId,
    messenger: Arc<dyn MessagingPort>,
    audit: Option<AuditLogger>,
    state: Mutex<RelayState>,
}

impl Relay {
    pub fn new(admin_chat: ChatId, history_limit: usize, messenger: Arc<dyn MessagingPort>) -> Self {
        Self {
            admin_chat,
            messenger,
            audit: None,
            state: Mutex::new(RelayState::new(history_limit)),
        }
    }

    pub fn from_config(cfg: &Config, messenger: Arc<dyn MessagingPort>) -> Self {
        let relay = Self::new(cfg.admin_group_id, cfg.thread_history_limit, messenger);
        match &cfg.audit_log_path {
            Some(path) => relay.with_audit(AuditLogger::new(path.clone(), cfg.audit_log_json)),
            None => relay,
        }
    }

    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn admin_chat(&self) -> ChatId {
        self.admin_chat
    }

    /// Route an inbound message to the matching operation.
    pub async fn dispatch(&self, msg: &IncomingMessage) -> Result<RelayOutcome> {
        if msg.content.is_start_command() {
            return self.handle_start(msg.sender.user_id, msg.chat_id).await;
        }
        if msg.chat_id != self.admin_chat {
            return self.handle_user_message(msg).await;
        }
        if msg.reply_to.is_some() {
            return self.handle_admin_reply(msg).await;
        }
        Ok(RelayOutcome::Ignored(IgnoreReason::AdminChatter))
    }

    /// Greet first-time users once, then always offer the topic buttons.
    pub async fn handle_start(&self, user_id: UserId, chat_id: ChatId) -> Result<RelayOutcome> {
        let mut state = self.state.lock().await;

        let welcomed = !state.greeted.contains(&user_id);
        if welcomed {
            self.messenger
                .send_reply_keyboard(
                    chat_id,
                    texts::WELCOME,
                    ReplyKeyboard::one_time_button(texts::RESTART_BUTTON),
                )
                .await?;
            state.greeted.insert(user_id);
        }

        self.messenger
            .send_inline_keyboard(chat_id, texts::TOPIC_PROMPT, Topic::keyboard())
            .await?;

        info!(user_id = user_id.0, welcomed, "start handled");
        Ok(RelayOutcome::Started { welcomed })
    }

    pub async fn handle_button_press(&self, press: &CallbackPress) -> Result<RelayOutcome> {
        if let Err(e) = self.messenger.answer_callback_query(&press.callback_id).await {
            warn!(error = %e, "failed to answer callback query");
        }

        let topic = Topic::from_callback_data(&press.data);
        self.messenger
            .send_text(press.chat_id, texts::ASK_QUESTION)
            .await?;

        info!(user_id = press.user_id.0, ?topic, "topic chosen");
        Ok(RelayOutcome::Prompted { topic })
    }

    /// Forward a user's message to the admin group, with a preview of their
    /// previous question.
    pub async fn handle_user_message(&self, msg: &IncomingMessage) -> Result<RelayOutcome> {
        if msg.chat_id == self.admin_chat {
            return Ok(RelayOutcome::Ignored(IgnoreReason::AdminChatter));
        }

        let mut state = self.state.lock().await;

        let user_id = msg.sender.user_id;
        let display_name =
            texts::display_name(msg.sender.username.as_deref(), &msg.sender.first_name);
        let summary = msg.content.summary();

        // The question itself wins; the preview gets whatever room is left.
        let limit = texts::body_limit(msg.content.kind());
        let question = texts::admin_message("", &display_name, &summary);
        let question = texts::fit_to(&question, limit);
        let budget = limit.saturating_sub(question.chars().count());
        let preview = state.threads.preview_within(user_id, budget);
        let body = format!("{preview}{question}");

        let sent = self
            .messenger
            .send_content(self.admin_chat, &msg.content, &body)
            .await?;

        state.threads.append(
            user_id,
            ThreadEntry::new(Origin::User(display_name.clone()), &msg.content),
        );
        state.link(sent.message_id, user_id);
        state.user_to_admin.insert(
            MessageRef {
                chat_id: msg.chat_id,
                message_id: msg.message_id,
            },
            sent,
        );

        info!(
            user_id = user_id.0,
            kind = %msg.content.kind(),
            admin_message_id = sent.message_id.0,
            "question forwarded"
        );
        self.audit(AuditEvent::forwarded(
            user_id,
            &display_name,
            msg.content.kind(),
            &summary,
            sent.message_id,
        ));

        self.messenger
            .send_text(msg.chat_id, texts::QUESTION_RECEIPT)
            .await?;

        Ok(RelayOutcome::Forwarded {
            admin_message: sent,
        })
    }

    /// Deliver an admin's reply to the user behind the replied-to message.
    pub async fn handle_admin_reply(&self, msg: &IncomingMessage) -> Result<RelayOutcome> {
        if msg.chat_id != self.admin_chat {
            return Ok(RelayOutcome::Ignored(IgnoreReason::NotAdminChat));
        }
        let Some(target) = msg.reply_to else {
            return Ok(RelayOutcome::Ignored(IgnoreReason::AdminChatter));
        };

        let mut state = self.state.lock().await;

        let Some(user_id) = state.resolve(target) else {
            debug!(reply_to = target.0, "admin reply to unknown message dropped");
            return Ok(RelayOutcome::Ignored(IgnoreReason::UnknownReplyTarget));
        };

        let body = texts::answer_message(&msg.content);
        let delivered = self
            .messenger
            .send_content(user_id.as_chat(), &msg.content, &body)
            .await?;

        state
            .threads
            .append(user_id, ThreadEntry::new(Origin::Admin, &msg.content));
        state.link(msg.message_id, user_id);
        state.user_to_admin.insert(
            delivered,
            MessageRef {
                chat_id: self.admin_chat,
                message_id: msg.message_id,
            },
        );

        info!(
            user_id = user_id.0,
            kind = %msg.content.kind(),
            admin_message_id = msg.message_id.0,
            "answer delivered"
        );
        self.audit(AuditEvent::answered(
            user_id,
            msg.content.kind(),
            &msg.content.summary(),
            msg.message_id,
        ));

        self.messenger
            .send_text(self.admin_chat, texts::ANSWER_ACK)
            .await?;

        Ok(RelayOutcome::Answered { user_id, delivered })
    }

    pub async fn history(&self, user_id: UserId) -> Vec<ThreadEntry> {
        self.state.lock().await.threads.history(user_id)
    }

    pub async fn user_for_admin_message(&self, admin_message: MessageId) -> Option<UserId> {
        self.state.lock().await.resolve(admin_message)
    }

    pub async fn counterpart_of(&self, message: MessageRef) -> Option<MessageRef> {
        self.state.lock().await.user_to_admin.get(&message).copied()
    }

    pub async fn is_greeted(&self, user_id: UserId) -> bool {
        self.state.lock().await.greeted.contains(&user_id)
    }

    fn audit(&self, event: AuditEvent) {
        let Some(audit) = &self.audit else {
            return;
        };
        if let Err(e) = audit.write(event) {
            warn!(error = %e, path = %audit.path().display(), "audit write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Content;
    use crate::errors::Error;
    use crate::messaging::types::Sender;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    const ADMIN: ChatId = ChatId(-1000);

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Sent {
        chat_id: ChatId,
        call: &'static str,
        body: Option<String>,
        file_id: Option<String>,
    }

    #[derive(Default)]
    struct FakeMessenger {
        next_id: std::sync::Mutex<i32>,
        sent: std::sync::Mutex<Vec<Sent>>,
        callbacks: std::sync::Mutex<Vec<String>>,
        fail: AtomicBool,
    }

    impl FakeMessenger {
        fn record(
            &self,
            chat_id: ChatId,
            call: &'static str,
            body: Option<&str>,
            file_id: Option<&str>,
        ) -> Result<MessageRef> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::External("telegram error: boom".to_string()));
            }
            self.sent.lock().unwrap().push(Sent {
                chat_id,
                call,
                body: body.map(str::to_string),
                file_id: file_id.map(str::to_string),
            });
            let mut guard = self.next_id.lock().unwrap();
            *guard += 1;
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(500 + *guard),
            })
        }

        fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }

        fn sent_to(&self, chat_id: ChatId) -> Vec<Sent> {
            self.sent()
                .into_iter()
                .filter(|s| s.chat_id == chat_id)
                .collect()
        }

        fn fail_sends(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl MessagingPort for FakeMessenger {
        async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
            self.record(chat_id, "text", Some(text), None)
        }

        async fn send_reply_keyboard(
            &self,
            chat_id: ChatId,
            text: &str,
            _keyboard: ReplyKeyboard,
        ) -> Result<MessageRef> {
            self.record(chat_id, "reply_keyboard", Some(text), None)
        }

        async fn send_inline_keyboard(
            &self,
            chat_id: ChatId,
            text: &str,
            keyboard: InlineKeyboard,
        ) -> Result<MessageRef> {
            assert_eq!(keyboard.rows.len(), 1);
            assert_eq!(keyboard.rows[0].len(), 2);
            self.record(chat_id, "inline_keyboard", Some(text), None)
        }

        async fn send_photo(
            &self,
            chat_id: ChatId,
            file_id: &str,
            caption: Option<&str>,
        ) -> Result<MessageRef> {
            self.record(chat_id, "photo", caption, Some(file_id))
        }

        async fn send_document(
            &self,
            chat_id: ChatId,
            file_id: &str,
            caption: Option<&str>,
        ) -> Result<MessageRef> {
            self.record(chat_id, "document", caption, Some(file_id))
        }

        async fn send_voice(
            &self,
            chat_id: ChatId,
            file_id: &str,
            caption: Option<&str>,
        ) -> Result<MessageRef> {
            self.record(chat_id, "voice", caption, Some(file_id))
        }

        async fn send_audio(
            &self,
            chat_id: ChatId,
            file_id: &str,
            caption: Option<&str>,
        ) -> Result<MessageRef> {
            self.record(chat_id, "audio", caption, Some(file_id))
        }

        async fn send_video(
            &self,
            chat_id: ChatId,
            file_id: &str,
            caption: Option<&str>,
        ) -> Result<MessageRef> {
            self.record(chat_id, "video", caption, Some(file_id))
        }

        async fn send_video_note(&self, chat_id: ChatId, file_id: &str) -> Result<MessageRef> {
            self.record(chat_id, "video_note", None, Some(file_id))
        }

        async fn answer_callback_query(&self, callback_id: &str) -> Result<()> {
            self.callbacks.lock().unwrap().push(callback_id.to_string());
            Ok(())
        }
    }

    fn setup() -> (Arc<FakeMessenger>, Relay) {
        let messenger = Arc::new(FakeMessenger::default());
        let relay = Relay::new(ADMIN, 50, messenger.clone());
        (messenger, relay)
    }

    fn user_msg(user: i64, username: Option<&str>, message_id: i32, content: Content) -> IncomingMessage {
        IncomingMessage {
            chat_id: ChatId(user),
            message_id: MessageId(message_id),
            sender: Sender {
                user_id: UserId(user),
                username: username.map(str::to_string),
                first_name: "First".to_string(),
            },
            content,
            reply_to: None,
        }
    }

    fn admin_msg(message_id: i32, reply_to: Option<MessageId>, content: Content) -> IncomingMessage {
        IncomingMessage {
            chat_id: ADMIN,
            message_id: MessageId(message_id),
            sender: Sender {
                user_id: UserId(9),
                username: Some("moderator".to_string()),
                first_name: "Mod".to_string(),
            },
            content,
            reply_to,
        }
    }

    fn text(s: &str) -> Content {
        Content::Text {
            text: s.to_string(),
        }
    }

    fn msg_ref(chat: i64, message_id: i32) -> MessageRef {
        MessageRef {
            chat_id: ChatId(chat),
            message_id: MessageId(message_id),
        }
    }

    fn forwarded_id(outcome: RelayOutcome) -> MessageId {
        match outcome {
            RelayOutcome::Forwarded { admin_message } => admin_message.message_id,
            other => panic!("expected Forwarded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn start_welcomes_only_once_but_always_offers_topics() {
        let (messenger, relay) = setup();
        let user = UserId(42);

        let first = relay.handle_start(user, ChatId(42)).await.unwrap();
        assert_eq!(first, RelayOutcome::Started { welcomed: true });
        let second = relay.handle_start(user, ChatId(42)).await.unwrap();
        assert_eq!(second, RelayOutcome::Started { welcomed: false });

        let calls: Vec<_> = messenger.sent().into_iter().map(|s| s.call).collect();
        assert_eq!(
            calls,
            vec!["reply_keyboard", "inline_keyboard", "inline_keyboard"]
        );
        assert_eq!(
            messenger.sent()[0].body.as_deref(),
            Some(texts::WELCOME)
        );
        assert!(relay.is_greeted(user).await);
    }

    #[tokio::test]
    async fn start_command_is_dispatched_from_any_chat() {
        let (messenger, relay) = setup();
        let outcome = relay
            .dispatch(&user_msg(42, None, 1, text("/start")))
            .await
            .unwrap();
        assert_eq!(outcome, RelayOutcome::Started { welcomed: true });
        assert!(messenger.sent_to(ADMIN).is_empty());
    }

    #[tokio::test]
    async fn failed_welcome_does_not_mark_user_as_greeted() {
        let (messenger, relay) = setup();
        messenger.fail_sends(true);
        assert!(relay.handle_start(UserId(42), ChatId(42)).await.is_err());
        assert!(!relay.is_greeted(UserId(42)).await);
    }

    #[tokio::test]
    async fn both_topic_buttons_prompt_for_a_question() {
        let (messenger, relay) = setup();
        for (id, data) in [("cb1", "btn1"), ("cb2", "btn2")] {
            let outcome = relay
                .handle_button_press(&CallbackPress {
                    callback_id: id.to_string(),
                    chat_id: ChatId(42),
                    user_id: UserId(42),
                    data: data.to_string(),
                })
                .await
                .unwrap();
            assert!(matches!(outcome, RelayOutcome::Prompted { topic: Some(_) }));
        }

        let sent = messenger.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent
            .iter()
            .all(|s| s.body.as_deref() == Some(texts::ASK_QUESTION)));
        assert_eq!(*messenger.callbacks.lock().unwrap(), vec!["cb1", "cb2"]);
        assert_eq!(Topic::from_callback_data("btn3"), None);
    }

    #[tokio::test]
    async fn question_answer_follow_up_scenario() {
        let (messenger, relay) = setup();
        let user = UserId(42);

        // First question: no preview.
        let outcome = relay
            .dispatch(&user_msg(42, Some("A"), 1, text("Hello")))
            .await
            .unwrap();
        let admin_copy = forwarded_id(outcome);
        let to_admin = messenger.sent_to(ADMIN);
        assert_eq!(to_admin.len(), 1);
        assert_eq!(to_admin[0].body.as_deref(), Some("📩 From @A:\nHello"));
        assert_eq!(relay.user_for_admin_message(admin_copy).await, Some(user));
        assert_eq!(
            relay.counterpart_of(msg_ref(42, 1)).await,
            Some(MessageRef {
                chat_id: ADMIN,
                message_id: admin_copy
            })
        );
        assert_eq!(
            messenger.sent_to(ChatId(42)).last().unwrap().body.as_deref(),
            Some(texts::QUESTION_RECEIPT)
        );

        // Admin answers by replying to the forwarded copy.
        let outcome = relay
            .dispatch(&admin_msg(77, Some(admin_copy), text("Hi there")))
            .await
            .unwrap();
        let (user_id, delivered) = match outcome {
            RelayOutcome::Answered { user_id, delivered } => (user_id, delivered),
            other => panic!("expected Answered, got {other:?}"),
        };
        assert_eq!(user_id, user);
        assert_eq!(delivered.chat_id, ChatId(42));
        let to_user = messenger.sent_to(ChatId(42));
        assert_eq!(to_user.last().unwrap().body.as_deref(), Some("💬 Answer:\nHi there"));
        assert_eq!(
            messenger.sent_to(ADMIN).last().unwrap().body.as_deref(),
            Some(texts::ANSWER_ACK)
        );
        assert_eq!(relay.user_for_admin_message(MessageId(77)).await, Some(user));
        assert_eq!(
            relay.counterpart_of(delivered).await,
            Some(MessageRef {
                chat_id: ADMIN,
                message_id: MessageId(77)
            })
        );

        // Follow-up carries a preview of the previous question, not the answer.
        relay
            .dispatch(&user_msg(42, Some("A"), 2, text("Follow up")))
            .await
            .unwrap();
        let to_admin = messenger.sent_to(ADMIN);
        assert_eq!(
            to_admin.last().unwrap().body.as_deref(),
            Some("🕘 Previous Question:\nHello\n\n📩 From @A:\nFollow up")
        );

        let history = relay.history(user).await;
        let origins: Vec<_> = history.iter().map(|e| e.origin.label().to_string()).collect();
        assert_eq!(origins, vec!["@A", "Admin", "@A"]);
    }

    #[tokio::test]
    async fn media_is_forwarded_with_caption_and_file_reference() {
        let (messenger, relay) = setup();
        relay
            .handle_user_message(&user_msg(42, None, 1, text("line 1\nline 2\nline 3")))
            .await
            .unwrap();

        let photo = Content::Photo {
            file_id: "big-photo".to_string(),
            caption: None,
        };
        relay
            .handle_user_message(&user_msg(42, None, 2, photo))
            .await
            .unwrap();

        let last = messenger.sent_to(ADMIN).pop().unwrap();
        assert_eq!(last.call, "photo");
        assert_eq!(last.file_id.as_deref(), Some("big-photo"));
        assert_eq!(
            last.body.as_deref(),
            Some("🕘 Previous Question:\nline 1\nline 2\n\n📩 From First:\n[Photo]")
        );

        let history = relay.history(UserId(42)).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].media_ref.as_deref(), Some("big-photo"));
        assert_eq!(history[1].origin, Origin::User("First".to_string()));
    }

    #[tokio::test]
    async fn long_previous_question_is_shortened_to_fit_the_caption() {
        let (messenger, relay) = setup();
        relay
            .handle_user_message(&user_msg(42, Some("A"), 1, text(&"q".repeat(1500))))
            .await
            .unwrap();

        let photo = Content::Photo {
            file_id: "pic".to_string(),
            caption: None,
        };
        relay
            .handle_user_message(&user_msg(42, Some("A"), 2, photo))
            .await
            .unwrap();
        let caption = messenger.sent_to(ADMIN).pop().unwrap().body.unwrap();
        assert!(caption.chars().count() <= texts::CAPTION_LIMIT);
        assert!(caption.starts_with("🕘 Previous Question:\nqqq"));
        assert!(caption.ends_with("📩 From @A:\n[Photo]"));

        // Previous question is now the photo; a long text follow-up still fits.
        relay
            .handle_user_message(&user_msg(42, Some("A"), 3, text(&"w".repeat(3000))))
            .await
            .unwrap();
        relay
            .handle_user_message(&user_msg(42, Some("A"), 4, text(&"z".repeat(4096))))
            .await
            .unwrap();
        let body = messenger.sent_to(ADMIN).pop().unwrap().body.unwrap();
        assert_eq!(body.chars().count(), texts::TEXT_LIMIT);
        assert!(body.starts_with("📩 From @A:\nzzz"));
        assert_eq!(relay.history(UserId(42)).await.len(), 4);
    }

    #[tokio::test]
    async fn long_admin_caption_is_cut_to_the_caption_limit() {
        let (messenger, relay) = setup();
        let admin_copy = forwarded_id(
            relay
                .handle_user_message(&user_msg(42, None, 1, text("q")))
                .await
                .unwrap(),
        );

        let doc = Content::Document {
            file_id: "notes.pdf".to_string(),
            caption: Some("c".repeat(1024)),
        };
        relay
            .handle_admin_reply(&admin_msg(77, Some(admin_copy), doc))
            .await
            .unwrap();

        let delivered = messenger
            .sent_to(ChatId(42))
            .into_iter()
            .find(|s| s.call == "document")
            .unwrap();
        let caption = delivered.body.unwrap();
        assert_eq!(caption.chars().count(), texts::CAPTION_LIMIT);
        assert!(caption.starts_with("💬 Answer:\nccc"));
    }

    #[tokio::test]
    async fn admin_video_note_reply_is_sent_without_caption() {
        let (messenger, relay) = setup();
        let admin_copy = forwarded_id(
            relay
                .handle_user_message(&user_msg(42, None, 1, text("q")))
                .await
                .unwrap(),
        );

        let note = Content::VideoNote {
            file_id: "circle".to_string(),
        };
        relay
            .handle_admin_reply(&admin_msg(78, Some(admin_copy), note))
            .await
            .unwrap();

        let to_user = messenger.sent_to(ChatId(42));
        let delivered = to_user.iter().find(|s| s.call == "video_note").unwrap();
        assert_eq!(delivered.file_id.as_deref(), Some("circle"));
        assert_eq!(delivered.body, None);

        let history = relay.history(UserId(42)).await;
        assert_eq!(history.last().unwrap().origin, Origin::Admin);
        assert_eq!(history.last().unwrap().content, "[Video note]");
    }

    #[tokio::test]
    async fn admin_reply_to_unknown_message_is_dropped() {
        let (messenger, relay) = setup();
        let outcome = relay
            .dispatch(&admin_msg(77, Some(MessageId(12345)), text("hello?")))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            RelayOutcome::Ignored(IgnoreReason::UnknownReplyTarget)
        );
        assert!(messenger.sent().is_empty());
        assert_eq!(relay.user_for_admin_message(MessageId(77)).await, None);
    }

    #[tokio::test]
    async fn admin_chatter_without_reply_is_ignored() {
        let (messenger, relay) = setup();
        let outcome = relay
            .dispatch(&admin_msg(77, None, text("team note")))
            .await
            .unwrap();
        assert_eq!(outcome, RelayOutcome::Ignored(IgnoreReason::AdminChatter));

        let outcome = relay
            .handle_admin_reply(&user_msg(42, None, 3, text("not admin")))
            .await
            .unwrap();
        assert_eq!(outcome, RelayOutcome::Ignored(IgnoreReason::NotAdminChat));
        assert!(messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn failed_forward_records_nothing_and_sends_no_receipt() {
        let (messenger, relay) = setup();
        messenger.fail_sends(true);

        let err = relay
            .handle_user_message(&user_msg(42, Some("A"), 1, text("Hello")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::External(_)));
        assert!(relay.history(UserId(42)).await.is_empty());
        assert_eq!(relay.counterpart_of(msg_ref(42, 1)).await, None);
        assert!(messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn failed_answer_records_nothing() {
        let (messenger, relay) = setup();
        let admin_copy = forwarded_id(
            relay
                .handle_user_message(&user_msg(42, None, 1, text("q")))
                .await
                .unwrap(),
        );
        let sends_before = messenger.sent().len();

        messenger.fail_sends(true);
        assert!(relay
            .handle_admin_reply(&admin_msg(77, Some(admin_copy), text("a")))
            .await
            .is_err());

        assert_eq!(relay.history(UserId(42)).await.len(), 1);
        assert_eq!(relay.user_for_admin_message(MessageId(77)).await, None);
        assert_eq!(messenger.sent().len(), sends_before);
    }

    #[tokio::test]
    async fn button_press_does_not_wait_for_relay_state() {
        let (messenger, relay) = setup();
        let _held = relay.state.lock().await;

        let outcome = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            relay.handle_button_press(&CallbackPress {
                callback_id: "cb".to_string(),
                chat_id: ChatId(42),
                user_id: UserId(42),
                data: "btn1".to_string(),
            }),
        )
        .await
        .expect("button press blocked on the relay lock")
        .unwrap();

        assert_eq!(
            outcome,
            RelayOutcome::Prompted {
                topic: Some(Topic::Galatians)
            }
        );
        assert_eq!(messenger.sent().len(), 1);
    }

    #[tokio::test]
    async fn counterparts_are_tracked_per_chat() {
        let (_messenger, relay) = setup();
        let first = forwarded_id(
            relay
                .handle_user_message(&user_msg(42, None, 1, text("from 42")))
                .await
                .unwrap(),
        );
        let second = forwarded_id(
            relay
                .handle_user_message(&user_msg(43, None, 1, text("from 43")))
                .await
                .unwrap(),
        );
        assert_ne!(first, second);

        assert_eq!(
            relay.counterpart_of(msg_ref(42, 1)).await.map(|r| r.message_id),
            Some(first)
        );
        assert_eq!(
            relay.counterpart_of(msg_ref(43, 1)).await.map(|r| r.message_id),
            Some(second)
        );
    }

    #[test]
    fn admin_links_are_never_overwritten() {
        let mut state = RelayState::new(10);
        assert_eq!(state.link(MessageId(1), UserId(10)), UserId(10));
        assert_eq!(state.link(MessageId(1), UserId(20)), UserId(10));
        assert_eq!(state.resolve(MessageId(1)), Some(UserId(10)));
    }

    #[tokio::test]
    async fn audit_log_records_forward_and_answer() {
        let path = std::path::PathBuf::from(format!(
            "/tmp/qab-relay-audit-{}.log",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let messenger = Arc::new(FakeMessenger::default());
        let relay = Relay::new(ADMIN, 50, messenger.clone())
            .with_audit(AuditLogger::new(path.clone(), true));

        let admin_copy = forwarded_id(
            relay
                .handle_user_message(&user_msg(42, Some("A"), 1, text("Hello")))
                .await
                .unwrap(),
        );
        relay
            .handle_admin_reply(&admin_msg(77, Some(admin_copy), text("Hi")))
            .await
            .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let events: Vec<serde_json::Value> = written
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["event"], "forwarded");
        assert_eq!(events[0]["user_id"], 42);
        assert_eq!(events[1]["event"], "answered");
        assert_eq!(events[1]["admin_message_id"], 77);

        let _ = std::fs::remove_file(&path);
    }
}
