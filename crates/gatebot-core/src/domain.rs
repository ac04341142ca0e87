use std::fmt;

/// Chat id (numeric, negative for groups).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// User id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Message id (numeric, scoped to a chat).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a posted message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The three fixed group roles the bot operates over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroupRole {
    Main,
    Admin,
    WaitingRoom,
}

/// Immutable role → chat id binding, built once from configuration.
///
/// The mapping is fixed for the process lifetime; changing a group requires a
/// restart.
#[derive(Clone, Copy, Debug)]
pub struct GroupMap {
    pub main: ChatId,
    pub admin: ChatId,
    pub waiting_room: ChatId,
}

impl GroupMap {
    pub fn chat_id(&self, role: GroupRole) -> ChatId {
        match role {
            GroupRole::Main => self.main,
            GroupRole::Admin => self.admin,
            GroupRole::WaitingRoom => self.waiting_room,
        }
    }

    /// Reverse lookup: which configured group a chat id belongs to, if any.
    pub fn role_of(&self, chat_id: ChatId) -> Option<GroupRole> {
        if chat_id == self.main {
            Some(GroupRole::Main)
        } else if chat_id == self.admin {
            Some(GroupRole::Admin)
        } else if chat_id == self.waiting_room {
            Some(GroupRole::WaitingRoom)
        } else {
            None
        }
    }
}

/// A reference to a user, either by numeric id or by (normalized) username.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum UserRef {
    Id(UserId),
    Username(String),
}

impl UserRef {
    /// Build a username reference: leading `@` stripped, lowercased.
    pub fn username(raw: &str) -> Self {
        UserRef::Username(normalize_username(raw))
    }
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRef::Id(id) => write!(f, "id:{id}"),
            UserRef::Username(name) => write!(f, "@{name}"),
        }
    }
}

pub fn normalize_username(raw: &str) -> String {
    raw.trim().trim_start_matches('@').to_lowercase()
}

/// Membership status of a user in a specific group.
///
/// `Pending` means "present in the waiting room, awaiting approval"; it is
/// only ever reported for waiting-room queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberStatus {
    Regular,
    Administrator,
    Pending,
    Absent,
}

/// The sender (or subject) of an inbound update.
#[derive(Clone, Debug)]
pub struct UserInfo {
    pub id: UserId,
    pub username: Option<String>,
    pub first_name: String,
}

/// One inbound chat message, immutable for the duration of one dispatch.
#[derive(Clone, Debug)]
pub struct InboundMessage {
    pub origin: ChatId,
    pub sender: UserInfo,
    pub text: String,
    pub reply_to: Option<MessageId>,
}

/// Everything the transport layer delivers to the core.
#[derive(Clone, Debug)]
pub enum InboundEvent {
    Message(InboundMessage),
    Joined { chat: ChatId, user: UserInfo },
    Left { chat: ChatId, user: UserInfo },
}
