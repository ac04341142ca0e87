//! Pure classification and routing: origin group + parsed command → handler.
//!
//! No side effects here; the dispatch table decides which handler runs, and
//! anything outside the command grammar or the three configured groups is
//! ignored (logged by the caller, never surfaced to users).

use crate::domain::{normalize_username, GroupMap, GroupRole, InboundMessage, UserInfo};

/// Parsed intent of one inbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Say(String),
    Approve(String),
    MeetDates,
    Unknown,
}

/// Parse a command from raw message text by prefix matching.
///
/// Tolerates the `/cmd@botname` form groups produce. Unrecognized or
/// malformed input yields `Unknown`, never an error.
pub fn parse_command(text: &str) -> Command {
    let trimmed = text.trim_start();
    if !trimmed.starts_with('/') {
        return Command::Unknown;
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let head = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim();

    let cmd = head
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    match cmd.as_str() {
        "say" if !rest.is_empty() => Command::Say(rest.to_string()),
        "approve" => {
            // Exactly one username argument.
            let mut args = rest.split_whitespace();
            match (args.next(), args.next()) {
                (Some(user), None) => {
                    let name = normalize_username(user);
                    if name.is_empty() {
                        Command::Unknown
                    } else {
                        Command::Approve(name)
                    }
                }
                _ => Command::Unknown,
            }
        }
        "meet_dates" => Command::MeetDates,
        _ => Command::Unknown,
    }
}

/// A handler invocation decided by the router.
#[derive(Clone, Debug)]
pub enum Dispatch {
    Say { sender: UserInfo, text: String },
    Approve { sender: UserInfo, username: String },
    MeetDates { origin: GroupRole },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Message from a chat outside the three configured groups.
    UnknownOrigin,
    /// Recognized group, but no (group, command) entry in the dispatch table.
    UnsupportedHere,
}

#[derive(Clone, Debug)]
pub enum RouteOutcome {
    Dispatch(Dispatch),
    Ignore(IgnoreReason),
}

/// The dispatch table: which (group, command) pairs are supported.
///
/// `/say` and `/approve` only act from the admin group; `/meet_dates` also
/// answers in the main group. Everything else is silently ignored.
pub fn route(groups: &GroupMap, msg: &InboundMessage) -> RouteOutcome {
    let Some(role) = groups.role_of(msg.origin) else {
        return RouteOutcome::Ignore(IgnoreReason::UnknownOrigin);
    };

    match (role, parse_command(&msg.text)) {
        (GroupRole::Admin, Command::Say(text)) => RouteOutcome::Dispatch(Dispatch::Say {
            sender: msg.sender.clone(),
            text,
        }),
        (GroupRole::Admin, Command::Approve(username)) => {
            RouteOutcome::Dispatch(Dispatch::Approve {
                sender: msg.sender.clone(),
                username,
            })
        }
        (GroupRole::Admin | GroupRole::Main, Command::MeetDates) => {
            RouteOutcome::Dispatch(Dispatch::MeetDates { origin: role })
        }
        _ => RouteOutcome::Ignore(IgnoreReason::UnsupportedHere),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, UserId};

    fn groups() -> GroupMap {
        GroupMap {
            main: ChatId(-100),
            admin: ChatId(-200),
            waiting_room: ChatId(-300),
        }
    }

    fn msg(origin: i64, text: &str) -> InboundMessage {
        InboundMessage {
            origin: ChatId(origin),
            sender: UserInfo {
                id: UserId(1),
                username: Some("admin1".to_string()),
                first_name: "Admin".to_string(),
            },
            text: text.to_string(),
            reply_to: None,
        }
    }

    #[test]
    fn parses_supported_commands() {
        assert_eq!(
            parse_command("/say Meetup Friday at 7pm"),
            Command::Say("Meetup Friday at 7pm".to_string())
        );
        assert_eq!(
            parse_command("/approve @NewUser"),
            Command::Approve("newuser".to_string())
        );
        assert_eq!(
            parse_command("/approve@gatebot fox"),
            Command::Approve("fox".to_string())
        );
        assert_eq!(parse_command("/meet_dates"), Command::MeetDates);
    }

    #[test]
    fn malformed_input_is_unknown_not_an_error() {
        assert_eq!(parse_command(""), Command::Unknown);
        assert_eq!(parse_command("hello"), Command::Unknown);
        assert_eq!(parse_command("/say"), Command::Unknown);
        assert_eq!(parse_command("/approve"), Command::Unknown);
        assert_eq!(parse_command("/approve @a @b"), Command::Unknown);
        assert_eq!(parse_command("/frobnicate now"), Command::Unknown);
    }

    #[test]
    fn unknown_origin_is_ignored() {
        let out = route(&groups(), &msg(12345, "/say hi"));
        assert!(matches!(
            out,
            RouteOutcome::Ignore(IgnoreReason::UnknownOrigin)
        ));
    }

    #[test]
    fn say_in_main_group_is_not_relayed() {
        let out = route(&groups(), &msg(-100, "/say hi"));
        assert!(matches!(
            out,
            RouteOutcome::Ignore(IgnoreReason::UnsupportedHere)
        ));
    }

    #[test]
    fn admin_group_commands_dispatch() {
        assert!(matches!(
            route(&groups(), &msg(-200, "/say hi")),
            RouteOutcome::Dispatch(Dispatch::Say { .. })
        ));
        assert!(matches!(
            route(&groups(), &msg(-200, "/approve @x")),
            RouteOutcome::Dispatch(Dispatch::Approve { .. })
        ));
        assert!(matches!(
            route(&groups(), &msg(-100, "/meet_dates")),
            RouteOutcome::Dispatch(Dispatch::MeetDates {
                origin: GroupRole::Main
            })
        ));
    }

    #[test]
    fn waiting_room_commands_are_ignored() {
        assert!(matches!(
            route(&groups(), &msg(-300, "/approve @x")),
            RouteOutcome::Ignore(IgnoreReason::UnsupportedHere)
        ));
    }
}
