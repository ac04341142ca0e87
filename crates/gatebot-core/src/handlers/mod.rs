//! Command and event handlers.
//!
//! Each handler performs its side effects through the `ChatPort` and reports
//! every admin-initiated failure back into the admin group: the bot never
//! fails silently on admin-facing actions, so admins can tell when to step in
//! manually.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    domain::{GroupMap, GroupRole, InboundEvent, MemberStatus, UserInfo, UserRef},
    events::EventSource,
    router::{self, Dispatch, RouteOutcome},
    transport::ChatPort,
    Error, Result,
};

mod approve;
mod meet_dates;
mod say;
mod welcome;

/// Shared handler context, constructed once at startup.
pub struct Context {
    pub groups: GroupMap,
    pub port: Arc<dyn ChatPort>,
    pub events: Arc<dyn EventSource>,
    pub rules_url: Option<String>,
    /// Invite link into the main group that raises a join request instead of
    /// admitting directly; the waiting-room welcome points newcomers at it so
    /// that `/approve` has a request to act on.
    pub join_url: Option<String>,
}

/// Entry point for everything the transport layer delivers.
pub async fn handle_event(ctx: &Context, event: InboundEvent) {
    match event {
        InboundEvent::Message(msg) => match router::route(&ctx.groups, &msg) {
            RouteOutcome::Dispatch(dispatch) => {
                if let Err(e) = run_dispatch(ctx, dispatch).await {
                    warn!("command failed: {e}");
                }
            }
            RouteOutcome::Ignore(reason) => {
                debug!(origin = %msg.origin, ?reason, "ignoring message");
            }
        },
        InboundEvent::Joined { chat, user } => welcome::on_join(ctx, chat, &user).await,
        InboundEvent::Left { chat, user } => {
            debug!(chat = %chat, user = %user.id, "member left");
        }
    }
}

async fn run_dispatch(ctx: &Context, dispatch: Dispatch) -> Result<()> {
    match dispatch {
        Dispatch::Say { sender, text } => say::handle(ctx, &sender, &text).await,
        Dispatch::Approve { sender, username } => approve::handle(ctx, &sender, &username).await,
        Dispatch::MeetDates { origin } => meet_dates::handle(ctx, origin).await,
    }
}

/// Shared authorization check: the sender must be a live administrator of the
/// admin group, queried at invocation time (no cached admin list).
///
/// On refusal, exactly one rejection notice goes to the admin group and the
/// caller gets `Forbidden`.
async fn ensure_admin(ctx: &Context, sender: &UserInfo) -> Result<()> {
    let admin = ctx.groups.chat_id(GroupRole::Admin);
    let status = match ctx
        .port
        .member_status(admin, &UserRef::Id(sender.id))
        .await
    {
        Ok(status) => status,
        Err(e) => {
            report(ctx, GroupRole::Admin, &format!("❌ Could not verify admin status: {e}")).await;
            return Err(e);
        }
    };

    if status != MemberStatus::Administrator {
        report(
            ctx,
            GroupRole::Admin,
            "❌ Only group admins may use this command.",
        )
        .await;
        return Err(Error::Forbidden(format!(
            "user {} is not an administrator",
            sender.id
        )));
    }

    Ok(())
}

/// Best-effort report into a group; a failed report is logged, never fatal.
async fn report(ctx: &Context, role: GroupRole, text: &str) {
    let chat = ctx.groups.chat_id(role);
    if let Err(e) = ctx.port.send_message(chat, text).await {
        warn!(?role, "failed to deliver report: {e}");
    }
}
