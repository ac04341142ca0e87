//! Welcome messages triggered by transport-level join events.
//!
//! Stateless and fire-and-forget: a failed welcome post is logged but never
//! blocks or reverses the membership change that triggered it.

use tracing::{debug, warn};

use crate::{
    domain::{ChatId, GroupRole, UserInfo},
    formatting::{self, escape_html},
};

use super::{report, Context};

pub async fn on_join(ctx: &Context, chat: ChatId, user: &UserInfo) {
    match ctx.groups.role_of(chat) {
        Some(GroupRole::WaitingRoom) => {
            // Alert the admins that someone is waiting.
            let handle = user
                .username
                .as_deref()
                .map(|u| format!("@{}", escape_html(u)))
                .unwrap_or_else(|| "no username".to_string());
            report(
                ctx,
                GroupRole::Admin,
                &format!(
                    "🆕 {} ({handle} id:{})",
                    escape_html(&user.first_name),
                    user.id
                ),
            )
            .await;

            let welcome = formatting::waiting_room_welcome(
                &user.first_name,
                ctx.rules_url.as_deref(),
                ctx.join_url.as_deref(),
            );
            if let Err(e) = ctx
                .port
                .send_message(ctx.groups.chat_id(GroupRole::WaitingRoom), &welcome)
                .await
            {
                warn!("waiting room welcome for {} failed: {e}", user.id);
            }
        }
        Some(role) => debug!(?role, user = %user.id, "join observed"),
        None => debug!(chat = %chat, user = %user.id, "join in unconfigured chat"),
    }
}
