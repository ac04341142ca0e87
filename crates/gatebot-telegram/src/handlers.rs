//! Mapping from raw teloxide updates to the core's inbound event types.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{ChatJoinRequest, ChatMemberKind, ChatMemberUpdated, Message, User},
};
use tracing::warn;

use gatebot_core::{
    domain::{
        ChatId, GroupRole, InboundEvent, InboundMessage, MemberStatus, MessageId, UserId,
        UserInfo, UserRef,
    },
    handlers,
};

use crate::router::AppState;

fn user_info(user: &User) -> UserInfo {
    UserInfo {
        id: UserId(user.id.0 as i64),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
    }
}

pub async fn on_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(from) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let inbound = InboundMessage {
        origin: ChatId(msg.chat.id.0),
        sender: user_info(from),
        text: text.to_string(),
        reply_to: msg.reply_to_message().map(|m| MessageId(m.id.0)),
    };
    handlers::handle_event(&state.ctx, InboundEvent::Message(inbound)).await;
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum JoinVerdict {
    /// Leave the request open for an admin to `/approve`.
    AwaitApproval,
    /// Decline outright, with the reason relayed to the admin group.
    Decline(&'static str),
}

/// Only waiting-room members get to keep a main-group join request open;
/// everything else is turned down so requests never pile up unseen.
fn vet_join_request(is_main_group: bool, waiting_status: MemberStatus) -> JoinVerdict {
    if !is_main_group {
        return JoinVerdict::Decline("requested to join a chat other than the main group");
    }
    match waiting_status {
        MemberStatus::Pending => JoinVerdict::AwaitApproval,
        _ => JoinVerdict::Decline("they are not in the waiting room"),
    }
}

pub async fn on_chat_join_request(
    req: ChatJoinRequest,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let chat = ChatId(req.chat.id.0);
    let user = user_info(&req.from);
    let groups = &state.ctx.groups;
    let admin = groups.chat_id(GroupRole::Admin);

    let handle = user
        .username
        .as_deref()
        .map(|u| format!("@{u}"))
        .unwrap_or_else(|| format!("id:{}", user.id));

    let waiting_status = match state
        .ctx
        .port
        .member_status(groups.chat_id(GroupRole::WaitingRoom), &UserRef::Id(user.id))
        .await
    {
        Ok(status) => status,
        Err(e) => {
            warn!("could not vet join request from {handle}: {e}");
            return Ok(());
        }
    };

    match vet_join_request(groups.role_of(chat) == Some(GroupRole::Main), waiting_status) {
        JoinVerdict::AwaitApproval => {
            let notice = match &user.username {
                Some(name) => format!(
                    "🆕 {handle} requested to join the main group; /approve @{name} to let them in"
                ),
                None => format!("🆕 {handle} requested to join the main group"),
            };
            if let Err(e) = state.ctx.port.send_message(admin, &notice).await {
                warn!("join request notice failed: {e}");
            }
        }
        JoinVerdict::Decline(reason) => {
            if let Err(e) = state.port.decline_join_request(chat, &user).await {
                warn!("could not decline join request from {handle}: {e}");
                return Ok(());
            }
            let notice = format!("⛔ Declined join request from {handle}: {reason}");
            if let Err(e) = state.ctx.port.send_message(admin, &notice).await {
                warn!("join request notice failed: {e}");
            }
        }
    }
    Ok(())
}

fn is_present(kind: &ChatMemberKind) -> bool {
    matches!(
        kind,
        ChatMemberKind::Owner(_)
            | ChatMemberKind::Administrator(_)
            | ChatMemberKind::Member
            | ChatMemberKind::Restricted(_)
    )
}

/// Join/leave detection from the old/new status pair, feeding both the
/// waiting-room roster and the core welcome handlers.
pub async fn on_chat_member(upd: ChatMemberUpdated, state: Arc<AppState>) -> ResponseResult<()> {
    let was = is_present(&upd.old_chat_member.kind);
    let now = is_present(&upd.new_chat_member.kind);
    if was == now {
        return Ok(());
    }

    let chat = ChatId(upd.chat.id.0);
    let user = user_info(&upd.new_chat_member.user);

    if now {
        state.port.note_join(chat, &user).await;
        handlers::handle_event(&state.ctx, InboundEvent::Joined { chat, user }).await;
    } else {
        state.port.note_leave(chat, &user).await;
        handlers::handle_event(&state.ctx, InboundEvent::Left { chat, user }).await;
    }
    Ok(())
}
