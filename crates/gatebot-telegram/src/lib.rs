//! Telegram adapter (teloxide).
//!
//! This crate implements the `gatebot-core` capability port over the Telegram
//! Bot API and maps raw updates into the core's inbound event types.

use std::{collections::HashMap, future::IntoFuture, time::Duration};

use async_trait::async_trait;

use teloxide::{prelude::*, types::ParseMode};
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};

pub mod handlers;
pub mod router;

use gatebot_core::{
    domain::{ChatId, MemberStatus, MessageId, MessageRef, UserInfo, UserRef},
    errors::Error,
    transport::{AddOutcome, ChatPort},
    Result,
};

/// `ChatPort` over a teloxide [`Bot`].
///
/// The onboarding flow expects prospective members to send a join request to
/// the main group (the waiting-room welcome instructs them to), so
/// `add_member` maps onto approving that request. Telegram cannot enumerate
/// group members, so usernames are resolved through a roster fed by the
/// waiting room's join/leave updates — the same workaround every moderation
/// bot ends up with. The roster misses anyone who joined before the bot went
/// live; admins can fall back to re-inviting those by hand.
pub struct TelegramChatPort {
    bot: Bot,
    waiting_room: ChatId,
    call_timeout: Duration,
    roster: Mutex<HashMap<String, u64>>,
}

impl TelegramChatPort {
    pub fn new(bot: Bot, waiting_room: ChatId, call_timeout: Duration) -> Self {
        Self {
            bot,
            waiting_room,
            call_timeout,
            roster: Mutex::new(HashMap::new()),
        }
    }

    /// Record a waiting-room arrival so their username can be resolved later.
    pub async fn note_join(&self, chat: ChatId, user: &UserInfo) {
        if chat != self.waiting_room {
            return;
        }
        if let Some(username) = &user.username {
            self.roster
                .lock()
                .await
                .insert(username.to_lowercase(), user.id.0 as u64);
        }
    }

    pub async fn note_leave(&self, chat: ChatId, user: &UserInfo) {
        if chat != self.waiting_room {
            return;
        }
        if let Some(username) = &user.username {
            self.roster.lock().await.remove(&username.to_lowercase());
        }
    }

    async fn resolve(&self, user: &UserRef) -> Option<teloxide::types::UserId> {
        match user {
            UserRef::Id(id) => Some(teloxide::types::UserId(id.0 as u64)),
            UserRef::Username(name) => self
                .roster
                .lock()
                .await
                .get(name)
                .copied()
                .map(teloxide::types::UserId),
        }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    /// Create a reusable invite link into `chat_id` that raises a join request
    /// instead of admitting directly. The waiting-room welcome hands this out,
    /// so every pending member has an outstanding request for `/approve` to
    /// act on.
    pub async fn create_join_link(&self, chat_id: ChatId) -> Result<String> {
        let link = self
            .with_timeout(|| {
                self.bot
                    .create_chat_invite_link(Self::tg_chat(chat_id))
                    .creates_join_request(true)
            })
            .await?;
        Ok(link.invite_link)
    }

    /// Turn down an open join request; used for requests the bot will never
    /// approve (wrong chat, or a requester who skipped the waiting room).
    pub async fn decline_join_request(&self, chat_id: ChatId, user: &UserInfo) -> Result<()> {
        let user_id = teloxide::types::UserId(user.id.0 as u64);
        self.with_timeout(|| {
            self.bot
                .decline_chat_join_request(Self::tg_chat(chat_id), user_id)
        })
        .await?;
        Ok(())
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::Transport(format!("telegram error: {e}"))
    }

    /// Bound a Telegram call with the configured timeout and honor one
    /// `RetryAfter` before giving up.
    async fn with_timeout<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match timeout(self.call_timeout, op().into_future()).await {
                Err(_) => return Err(Error::TransportTimeout),
                Ok(Ok(v)) => return Ok(v),
                Ok(Err(e)) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

fn is_already_member(e: &Error) -> bool {
    let text = e.to_string().to_lowercase();
    text.contains("already") && text.contains("participant")
}

/// When approving a join request fails, a live membership in the target chat
/// means somebody else's approval won the race (Telegram reports the vanished
/// request as `HIDE_REQUESTER_MISSING`, not as "already a participant").
fn membership_means_already_added(status: MemberStatus) -> bool {
    matches!(
        status,
        MemberStatus::Regular | MemberStatus::Administrator | MemberStatus::Pending
    )
}

#[async_trait]
impl ChatPort for TelegramChatPort {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        let msg = self
            .with_timeout(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), text.to_string())
                    .parse_mode(ParseMode::Html)
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn add_member(&self, chat_id: ChatId, user: &UserRef) -> Result<AddOutcome> {
        let Some(user_id) = self.resolve(user).await else {
            return Err(Error::Transport(format!(
                "{user} has not been seen by the bot and cannot be resolved"
            )));
        };

        match self
            .with_timeout(|| {
                self.bot
                    .approve_chat_join_request(Self::tg_chat(chat_id), user_id)
            })
            .await
        {
            Ok(_) => Ok(AddOutcome::Added),
            Err(e) if is_already_member(&e) => Ok(AddOutcome::AlreadyMember),
            Err(e) => {
                // Racing approvals of the same request: the loser's approve
                // fails because the request is gone. Re-check membership
                // before surfacing the error.
                match self.member_status(chat_id, user).await {
                    Ok(status) if membership_means_already_added(status) => {
                        Ok(AddOutcome::AlreadyMember)
                    }
                    _ => Err(e),
                }
            }
        }
    }

    async fn ban_member(&self, chat_id: ChatId, user: &UserRef) -> Result<()> {
        let Some(user_id) = self.resolve(user).await else {
            return Err(Error::Transport(format!("{user} cannot be resolved")));
        };

        // Telegram kicks a present member on unban; using it instead of a real
        // ban avoids leaving a permanent ban record behind.
        // See: https://core.telegram.org/bots/api#unbanchatmember
        self.with_timeout(|| self.bot.unban_chat_member(Self::tg_chat(chat_id), user_id))
            .await?;
        Ok(())
    }

    async fn member_status(&self, chat_id: ChatId, user: &UserRef) -> Result<MemberStatus> {
        let Some(user_id) = self.resolve(user).await else {
            return Ok(MemberStatus::Absent);
        };

        let member = self
            .with_timeout(|| self.bot.get_chat_member(Self::tg_chat(chat_id), user_id))
            .await?;

        use teloxide::types::ChatMemberKind;
        let status = match member.kind {
            ChatMemberKind::Owner(_) | ChatMemberKind::Administrator(_) => {
                MemberStatus::Administrator
            }
            ChatMemberKind::Member | ChatMemberKind::Restricted(_) => {
                // Ordinary membership of the waiting room means "awaiting
                // approval"; that group exists for nothing else.
                if chat_id == self.waiting_room {
                    MemberStatus::Pending
                } else {
                    MemberStatus::Regular
                }
            }
            ChatMemberKind::Left | ChatMemberKind::Banned(_) => MemberStatus::Absent,
        };
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_link_duplicate_join_is_already_member() {
        let e = Error::Transport(
            "telegram error: Bad Request: USER_ALREADY_PARTICIPANT".to_string(),
        );
        assert!(is_already_member(&e));

        let missing = Error::Transport("telegram error: Bad Request: HIDE_REQUESTER_MISSING".to_string());
        assert!(!is_already_member(&missing));
    }

    #[test]
    fn lost_approval_race_counts_as_already_added() {
        // A failed approve followed by a live membership means another admin's
        // approval landed first; only a confirmed absence keeps the error.
        assert!(membership_means_already_added(MemberStatus::Regular));
        assert!(membership_means_already_added(MemberStatus::Administrator));
        assert!(!membership_means_already_added(MemberStatus::Absent));
    }
}
