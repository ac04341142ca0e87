use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{info, warn};

use gatebot_core::{
    config::Config,
    domain::GroupRole,
    events::EventSource,
    feed::{IcsEventSource, NoCalendar},
    handlers::Context,
    scheduler::Announcer,
    transport::ChatPort,
};

use crate::handlers;
use crate::TelegramChatPort;

pub struct AppState {
    pub ctx: Arc<Context>,
    pub port: Arc<TelegramChatPort>,
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.bot_token.clone());

    // An unreachable transport at boot is fatal; after this the process only
    // ever fails per-command.
    let me = bot
        .get_me()
        .await
        .map_err(|e| anyhow::anyhow!("telegram unreachable at startup: {e}"))?;
    info!("gatebot started as @{}", me.username());

    let groups = cfg.group_map();
    let port = Arc::new(TelegramChatPort::new(
        bot.clone(),
        groups.waiting_room,
        cfg.transport_timeout,
    ));
    let port_dyn: Arc<dyn ChatPort> = port.clone();

    let source: Arc<dyn EventSource> = match &cfg.calendar_url {
        Some(url) => Arc::new(IcsEventSource::new(url.clone(), cfg.feed_timeout)?),
        None => {
            warn!("CALENDAR_URL not set; meet announcements disabled");
            Arc::new(NoCalendar)
        }
    };

    // The welcome hands this link out so newcomers raise a join request the
    // bot can later approve. Without it approvals fall back to manual invites.
    let join_url = match port.create_join_link(groups.main).await {
        Ok(url) => Some(url),
        Err(e) => {
            warn!("could not create a main-group join link (is the bot an admin there?): {e}");
            None
        }
    };

    let ctx = Arc::new(Context {
        groups,
        port: port_dyn.clone(),
        events: source.clone(),
        rules_url: cfg.rules_url.clone(),
        join_url,
    });

    if cfg.calendar_url.is_some() {
        let announcer = Arc::new(Announcer::new(
            groups,
            port_dyn.clone(),
            source,
            cfg.announce_lead_days,
        ));
        tokio::spawn(announcer.run(cfg.scheduler_tick));
    }

    let admin = groups.chat_id(GroupRole::Admin);
    if let Err(e) = port_dyn.send_message(admin, "🟢 gatebot started").await {
        warn!("startup notice failed: {e}");
    }

    let state = Arc::new(AppState { ctx, port });

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handlers::on_message))
        .branch(Update::filter_chat_member().endpoint(handlers::on_chat_member))
        .branch(Update::filter_chat_join_request().endpoint(handlers::on_chat_join_request));

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build();

    tokio::select! {
        _ = dispatcher.dispatch() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
        }
    }

    if let Err(e) = port_dyn.send_message(admin, "🔴 gatebot stopped").await {
        warn!("shutdown notice failed: {e}");
    }

    Ok(())
}
