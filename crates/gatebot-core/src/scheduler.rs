//! Periodic announcement scheduler.
//!
//! Each event identity key moves through two states: unannounced → announced.
//! The transition fires exactly once, on the first tick that observes the
//! event inside the lead window, and only after the main-group post succeeds.
//! A failed post leaves the key unannounced so the next tick retries — the
//! system's only automatic retry, safe because posting is not destructive.

use std::{collections::HashSet, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    domain::{GroupMap, GroupRole},
    events::EventSource,
    formatting,
    transport::ChatPort,
};

pub struct Announcer {
    groups: GroupMap,
    port: Arc<dyn ChatPort>,
    source: Arc<dyn EventSource>,
    lead: chrono::Duration,
    /// Identity keys already posted, scoped to the process lifetime.
    /// Insert-only, never pruned; resets on restart by design (a restart may
    /// re-announce recently-crossed events, an accepted tradeoff of the
    /// no-persistence principle).
    announced: Mutex<HashSet<String>>,
}

impl Announcer {
    pub fn new(
        groups: GroupMap,
        port: Arc<dyn ChatPort>,
        source: Arc<dyn EventSource>,
        lead_days: u64,
    ) -> Self {
        Self {
            groups,
            port,
            source,
            lead: chrono::Duration::days(lead_days as i64),
            announced: Mutex::new(HashSet::new()),
        }
    }

    /// Timer loop: wakes on a fixed interval and runs one tick. Runs until
    /// the process exits; individual tick failures are logged, never fatal.
    pub async fn run(self: Arc<Self>, tick: Duration) {
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            self.tick_once(Utc::now()).await;
        }
    }

    /// One scheduler tick: fetch the event sequence and announce whatever has
    /// newly crossed the lead window. Fails soft on fetch errors.
    pub async fn tick_once(&self, now: DateTime<Utc>) {
        let records = match self.source.list_upcoming().await {
            Ok(records) => records,
            Err(e) => {
                warn!("skipping announcement tick: {e}");
                return;
            }
        };

        let main = self.groups.chat_id(GroupRole::Main);
        for record in records {
            if record.start < now || record.start - now > self.lead {
                continue;
            }
            let key = record.identity_key();
            if self.announced.lock().await.contains(&key) {
                continue;
            }

            match self
                .port
                .send_message(main, &formatting::announcement(&record))
                .await
            {
                Ok(_) => {
                    info!("announced {:?}", record.title);
                    self.announced.lock().await.insert(key);
                }
                Err(e) => {
                    // Key stays out of the set; the next tick retries.
                    warn!("announcement for {:?} failed: {e}", record.title);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::ChatId,
        events::EventRecord,
        testing::{MockPort, StaticEvents},
    };
    use chrono::TimeZone;

    const MAIN: ChatId = ChatId(-100);

    fn groups() -> GroupMap {
        GroupMap {
            main: MAIN,
            admin: ChatId(-200),
            waiting_room: ChatId(-300),
        }
    }

    fn event(title: &str, start: DateTime<Utc>) -> EventRecord {
        EventRecord {
            title: title.to_string(),
            start,
            location: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn announces_once_no_matter_how_many_ticks_observe_it() {
        let port = Arc::new(MockPort::default());
        let source = Arc::new(StaticEvents::new(vec![event(
            "March meet",
            now() + chrono::Duration::days(3),
        )]));
        let announcer = Announcer::new(groups(), port.clone(), source, 7);

        for _ in 0..5 {
            announcer.tick_once(now()).await;
        }

        assert_eq!(port.sent_to(MAIN).await.len(), 1);
    }

    #[tokio::test]
    async fn events_outside_the_lead_window_wait() {
        let port = Arc::new(MockPort::default());
        let source = Arc::new(StaticEvents::new(vec![
            event("too far", now() + chrono::Duration::days(30)),
            event("already started", now() - chrono::Duration::hours(1)),
            event("due", now() + chrono::Duration::days(2)),
        ]));
        let announcer = Announcer::new(groups(), port.clone(), source, 7);

        announcer.tick_once(now()).await;

        let sent = port.sent_to(MAIN).await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("due"));
    }

    #[tokio::test]
    async fn failed_post_retries_on_the_next_tick() {
        let port = Arc::new(MockPort::default());
        let source = Arc::new(StaticEvents::new(vec![event(
            "March meet",
            now() + chrono::Duration::days(1),
        )]));
        let announcer = Announcer::new(groups(), port.clone(), source, 7);

        port.fail_sends_to(MAIN).await;
        announcer.tick_once(now()).await;
        assert!(port.sent_to(MAIN).await.is_empty());
        assert!(announcer.announced.lock().await.is_empty());

        port.send_failures.lock().await.clear();
        announcer.tick_once(now()).await;
        assert_eq!(port.sent_to(MAIN).await.len(), 1);
        assert_eq!(announcer.announced.lock().await.len(), 1);

        // And the successful announcement is not repeated.
        announcer.tick_once(now()).await;
        assert_eq!(port.sent_to(MAIN).await.len(), 1);
    }

    #[tokio::test]
    async fn fetch_failure_skips_the_tick() {
        let port = Arc::new(MockPort::default());
        let announcer =
            Announcer::new(groups(), port.clone(), Arc::new(StaticEvents::failing()), 7);

        announcer.tick_once(now()).await;
        assert!(port.sent.lock().await.is_empty());
    }
}
