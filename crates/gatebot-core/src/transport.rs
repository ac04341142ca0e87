use async_trait::async_trait;

use crate::{
    domain::{ChatId, MemberStatus, MessageRef, UserRef},
    Result,
};

/// Outcome of an `add_member` call.
///
/// "Already a member" is a distinct, non-fatal outcome rather than an error:
/// admin commands arrive at-least-once, and the add operation is the sole
/// serialization point for concurrent approvals of the same user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyMember,
}

/// Capability port for all chat-transport side effects.
///
/// Telegram is the first implementation. Every call must be bounded by a
/// timeout in the adapter; expiry maps to `Error::TransportTimeout` and is
/// handled like any other transport failure.
#[async_trait]
pub trait ChatPort: Send + Sync {
    /// Post a message (HTML parse mode) into a chat.
    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;

    /// Admit a user into a chat.
    async fn add_member(&self, chat_id: ChatId, user: &UserRef) -> Result<AddOutcome>;

    /// Remove a user from a chat.
    async fn ban_member(&self, chat_id: ChatId, user: &UserRef) -> Result<()>;

    /// Live membership status of a user in a chat. Never cached by the core.
    async fn member_status(&self, chat_id: ChatId, user: &UserRef) -> Result<MemberStatus>;
}
