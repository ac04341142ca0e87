//! Recording mocks for the capability port and the event source.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{ChatId, MemberStatus, MessageId, MessageRef, UserRef},
    events::{EventRecord, EventSource},
    transport::{AddOutcome, ChatPort},
    Error, Result,
};

fn user_key(user: &UserRef) -> String {
    user.to_string()
}

/// In-memory `ChatPort` that records every call.
///
/// `add_member` keeps a membership set so that two concurrent approvals of
/// the same user serialize into one `Added` and one `AlreadyMember`, matching
/// the real transport's semantics.
#[derive(Default)]
pub struct MockPort {
    pub sent: Mutex<Vec<(ChatId, String)>>,
    pub added: Mutex<Vec<(ChatId, String)>>,
    pub banned: Mutex<Vec<(ChatId, String)>>,
    pub statuses: Mutex<HashMap<(ChatId, String), MemberStatus>>,
    pub members: Mutex<HashSet<(ChatId, String)>>,
    pub send_failures: Mutex<HashSet<ChatId>>,
    pub fail_adds: Mutex<bool>,
}

impl MockPort {
    pub async fn set_status(&self, chat: ChatId, user: &UserRef, status: MemberStatus) {
        self.statuses
            .lock()
            .await
            .insert((chat, user_key(user)), status);
    }

    pub async fn fail_sends_to(&self, chat: ChatId) {
        self.send_failures.lock().await.insert(chat);
    }

    pub async fn sent_to(&self, chat: ChatId) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(c, _)| *c == chat)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl ChatPort for MockPort {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        if self.send_failures.lock().await.contains(&chat_id) {
            return Err(Error::Transport("simulated send failure".to_string()));
        }
        let mut sent = self.sent.lock().await;
        sent.push((chat_id, text.to_string()));
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(sent.len() as i32),
        })
    }

    async fn add_member(&self, chat_id: ChatId, user: &UserRef) -> Result<AddOutcome> {
        if *self.fail_adds.lock().await {
            return Err(Error::Transport("simulated add failure".to_string()));
        }
        let newly_added = self
            .members
            .lock()
            .await
            .insert((chat_id, user_key(user)));
        self.added.lock().await.push((chat_id, user_key(user)));
        if newly_added {
            Ok(AddOutcome::Added)
        } else {
            Ok(AddOutcome::AlreadyMember)
        }
    }

    async fn ban_member(&self, chat_id: ChatId, user: &UserRef) -> Result<()> {
        self.banned.lock().await.push((chat_id, user_key(user)));
        Ok(())
    }

    async fn member_status(&self, chat_id: ChatId, user: &UserRef) -> Result<MemberStatus> {
        Ok(self
            .statuses
            .lock()
            .await
            .get(&(chat_id, user_key(user)))
            .copied()
            .unwrap_or(MemberStatus::Absent))
    }
}

/// Event source backed by a fixed record list (or a scripted failure).
pub struct StaticEvents {
    pub records: Vec<EventRecord>,
    pub fail: bool,
}

impl StaticEvents {
    pub fn new(records: Vec<EventRecord>) -> Self {
        Self {
            records,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            records: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl EventSource for StaticEvents {
    async fn list_upcoming(&self) -> Result<Vec<EventRecord>> {
        if self.fail {
            return Err(Error::Fetch("simulated feed failure".to_string()));
        }
        Ok(self.records.clone())
    }
}
