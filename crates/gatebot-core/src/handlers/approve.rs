//! `/approve @username`: grant a waiting-room member entry to the main group.

use tracing::{info, warn};

use crate::{
    domain::{GroupRole, MemberStatus, UserInfo, UserRef},
    formatting::{escape_html, main_welcome},
    transport::AddOutcome,
    Error, Result,
};

use super::{ensure_admin, report, Context};

/// Approval flow, in order: resolve the pending member, add them to the main
/// group, welcome them there, clear them out of the waiting room.
///
/// The add operation is the sole serialization point for concurrent approvals
/// of the same username: "already a member" is a non-fatal idempotent outcome
/// (acknowledged, no duplicate welcome), since admin commands arrive
/// at-least-once.
pub async fn handle(ctx: &Context, sender: &UserInfo, username: &str) -> Result<()> {
    ensure_admin(ctx, sender).await?;

    let user = UserRef::username(username);
    let waiting_room = ctx.groups.chat_id(GroupRole::WaitingRoom);
    let main = ctx.groups.chat_id(GroupRole::Main);
    let safe_name = escape_html(username);

    match ctx.port.member_status(waiting_room, &user).await {
        Ok(MemberStatus::Pending) => {}
        Ok(_) => {
            report(
                ctx,
                GroupRole::Admin,
                &format!("❌ No pending member @{safe_name} in the waiting room."),
            )
            .await;
            return Err(Error::UserNotFound(format!("@{username}")));
        }
        Err(e) => {
            report(
                ctx,
                GroupRole::Admin,
                &format!("❌ Could not check the waiting room for @{safe_name}: {e}"),
            )
            .await;
            return Err(e);
        }
    }

    match ctx.port.add_member(main, &user).await {
        Ok(AddOutcome::Added) => {
            // Membership is the authoritative side effect; the welcome and the
            // waiting-room cleanup below are best-effort decoration.
            let welcome = main_welcome(&format!("@{username}"));
            if let Err(e) = ctx.port.send_message(main, &welcome).await {
                warn!("welcome message for @{username} failed: {e}");
            }
            if let Err(e) = ctx.port.ban_member(waiting_room, &user).await {
                warn!("could not clear @{username} out of the waiting room: {e}");
            }
            report(
                ctx,
                GroupRole::Admin,
                &format!("✅ @{safe_name} has been added to the main group."),
            )
            .await;
            Ok(())
        }
        Ok(AddOutcome::AlreadyMember) => {
            info!("@{username} is already a member; treating approve as done");
            report(
                ctx,
                GroupRole::Admin,
                &format!("✅ @{safe_name} is already a member of the main group."),
            )
            .await;
            Ok(())
        }
        Err(e) => {
            report(
                ctx,
                GroupRole::Admin,
                &format!("❌ Could not add @{safe_name}: {e}"),
            )
            .await;
            Err(Error::AddFailed(format!("@{username}: {e}")))
        }
    }
}
