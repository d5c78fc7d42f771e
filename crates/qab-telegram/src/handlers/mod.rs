//! Telegram update handlers.
//!
//! Each handler converts the teloxide update into the relay's neutral types,
//! hands it to the `Relay`, and logs transport failures instead of returning
//! them, so one failed send never stops the dispatcher.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};
use tracing::{debug, warn};

use qab_core::{messaging::port::MessagingPort, relay::RelayOutcome};

use crate::{inbound, router::AppState};

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(press) = inbound::callback_press(&q) else {
        // Always answer callback query eventually.
        if let Err(e) = state.messenger.answer_callback_query(&q.id).await {
            warn!(error = %e, "failed to answer orphaned callback query");
        }
        return Ok(());
    };

    if let Err(e) = state.relay.handle_button_press(&press).await {
        warn!(error = %e, chat_id = press.chat_id.0, "button press not handled");
    }
    Ok(())
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(incoming) = inbound::incoming_message(&msg) else {
        debug!(chat_id = msg.chat.id.0, "unsupported message ignored");
        return Ok(());
    };

    match state.relay.dispatch(&incoming).await {
        Ok(RelayOutcome::Ignored(reason)) => {
            debug!(?reason, message_id = incoming.message_id.0, "message not routed");
        }
        Ok(_) => {}
        Err(e) => {
            warn!(
                error = %e,
                chat_id = incoming.chat_id.0,
                message_id = incoming.message_id.0,
                "relay aborted"
            );
        }
    }
    Ok(())
}
