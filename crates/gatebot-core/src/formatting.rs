//! HTML escaping and user-facing message templates.

use chrono::{DateTime, Datelike, Utc};

use crate::events::EventRecord;

/// Escape HTML special characters for Telegram HTML parse mode.
///
/// Order matters: `&` must be escaped first.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// English ordinal suffix: 1st, 2nd, 3rd, 4th, ... 11th, 12th, 13th.
pub fn ordinal(n: u32) -> String {
    let suffix = if (n / 10) % 10 == 1 {
        "th"
    } else {
        match n % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        }
    };
    format!("{n}{suffix}")
}

/// "March 21st" style date for announcements.
pub fn event_date(start: DateTime<Utc>) -> String {
    format!("{} {}", start.format("%B"), ordinal(start.day()))
}

pub fn announcement(event: &EventRecord) -> String {
    let mut text = format!(
        "📅 <b>{}</b>\n{}",
        escape_html(&event.title),
        event_date(event.start)
    );
    if let Some(location) = &event.location {
        text.push_str(&format!(" — {}", escape_html(location)));
    }
    text
}

pub fn meet_dates_list(events: &[EventRecord]) -> String {
    let mut lines = vec!["⭐ <b><u>Upcoming meet dates</u></b> ⭐".to_string()];
    for event in events {
        lines.push(format!(
            "➡️ {} — {}",
            event_date(event.start),
            escape_html(&event.title)
        ));
    }
    lines.join("\n")
}

pub fn main_welcome(handle: &str) -> String {
    format!("Everyone welcome {} to the chat!", escape_html(handle))
}

pub fn waiting_room_welcome(
    first_name: &str,
    rules_url: Option<&str>,
    join_url: Option<&str>,
) -> String {
    let mut lines = vec![format!(
        "Hi {}! An admin will be with you shortly to get you into the main chat.",
        escape_html(first_name)
    )];
    if let Some(url) = rules_url {
        lines.push(String::new());
        lines.push(format!(
            "In the meantime, please read <a href=\"{url}\">the rules</a> and let us know whether you agree."
        ));
    }
    if let Some(url) = join_url {
        lines.push(String::new());
        lines.push(format!(
            "Once you're done, <a href=\"{url}\">request to join the main group here</a> so an admin can let you in."
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn escapes_ampersand_first() {
        assert_eq!(escape_html("a<b & c>d"), "a&lt;b &amp; c&gt;d");
        assert_eq!(escape_html("&lt;"), "&amp;lt;");
    }

    #[test]
    fn ordinals_handle_the_teens() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(4), "4th");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(12), "12th");
        assert_eq!(ordinal(13), "13th");
        assert_eq!(ordinal(21), "21st");
        assert_eq!(ordinal(111), "111th");
    }

    #[test]
    fn waiting_room_welcome_links_rules_and_join_request() {
        let text = waiting_room_welcome(
            "Fox",
            Some("https://rules.example.org"),
            Some("https://t.me/+abc123"),
        );
        assert!(text.contains("Hi Fox!"));
        assert!(text.contains("https://rules.example.org"));
        assert!(text.contains("https://t.me/+abc123"));
        assert!(text.contains("request to join the main group"));

        let bare = waiting_room_welcome("Fox", None, None);
        assert!(!bare.contains("href"));
    }

    #[test]
    fn main_welcome_escapes_the_handle() {
        let text = main_welcome("@fox<3");
        assert!(text.contains("@fox&lt;3"));
        assert!(text.starts_with("Everyone welcome"));
    }

    #[test]
    fn announcement_includes_title_date_and_location() {
        let event = EventRecord {
            title: "March meet".to_string(),
            start: Utc.with_ymd_and_hms(2026, 3, 21, 19, 0, 0).unwrap(),
            location: Some("The Grain & Hop Store".to_string()),
        };
        let text = announcement(&event);
        assert!(text.contains("March meet"));
        assert!(text.contains("March 21st"));
        assert!(text.contains("Grain &amp; Hop Store"));
    }
}
