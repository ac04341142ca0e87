use std::{env, fs, path::Path, time::Duration};

use crate::{
    domain::{ChatId, GroupMap},
    errors::Error,
    Result,
};

/// Typed process-wide configuration, read once at startup.
///
/// The three group ids are fixed for the process lifetime; changing them
/// requires a restart. There is deliberately no runtime mutation path.
#[derive(Clone, Debug)]
pub struct Config {
    pub bot_token: String,
    pub main_group: ChatId,
    pub admin_group: ChatId,
    pub waiting_room_group: ChatId,

    // Calendar feed / announcements
    pub calendar_url: Option<String>,
    pub rules_url: Option<String>,
    pub announce_lead_days: u64,
    pub scheduler_tick: Duration,

    // Timeouts
    pub transport_timeout: Duration,
    pub feed_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let bot_token = env_str("BOT_TOKEN").and_then(non_empty).ok_or_else(|| {
            Error::Config("BOT_TOKEN environment variable is required".to_string())
        })?;

        let main_group = required_chat_id("MAIN_GROUP_ID")?;
        let admin_group = required_chat_id("ADMIN_GROUP_ID")?;
        let waiting_room_group = required_chat_id("WAITING_ROOM_GROUP_ID")?;

        let calendar_url = env_str("CALENDAR_URL").and_then(non_empty);
        let rules_url = env_str("RULES_URL").and_then(non_empty);
        let announce_lead_days = env_u64("ANNOUNCE_LEAD_DAYS").unwrap_or(7);
        let scheduler_tick = Duration::from_secs(env_u64("SCHEDULER_TICK_SECS").unwrap_or(3600));

        let transport_timeout =
            Duration::from_millis(env_u64("TRANSPORT_TIMEOUT_MS").unwrap_or(10_000));
        let feed_timeout = Duration::from_millis(env_u64("FEED_TIMEOUT_MS").unwrap_or(15_000));

        Ok(Self {
            bot_token,
            main_group,
            admin_group,
            waiting_room_group,
            calendar_url,
            rules_url,
            announce_lead_days,
            scheduler_tick,
            transport_timeout,
            feed_timeout,
        })
    }

    pub fn group_map(&self) -> GroupMap {
        GroupMap {
            main: self.main_group,
            admin: self.admin_group,
            waiting_room: self.waiting_room_group,
        }
    }
}

fn required_chat_id(key: &str) -> Result<ChatId> {
    let raw = env_str(key)
        .and_then(non_empty)
        .ok_or_else(|| Error::Config(format!("{key} environment variable is required")))?;
    raw.trim()
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| Error::Config(format!("{key} must be a numeric chat id, got {raw:?}")))
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_id_parsing_accepts_negative_group_ids() {
        env::set_var("TEST_GROUP_A", "-1001234567890");
        assert_eq!(
            required_chat_id("TEST_GROUP_A").unwrap(),
            ChatId(-1001234567890)
        );

        env::set_var("TEST_GROUP_B", "not-a-number");
        assert!(required_chat_id("TEST_GROUP_B").is_err());
    }

    #[test]
    fn missing_required_var_is_a_config_error() {
        env::remove_var("TEST_GROUP_MISSING");
        let err = required_chat_id("TEST_GROUP_MISSING").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
