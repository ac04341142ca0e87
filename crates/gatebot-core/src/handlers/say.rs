//! `/say`: relay an admin-authored announcement into the main group.

use crate::{
    domain::{GroupRole, UserInfo},
    formatting::escape_html,
    Error, Result,
};

use super::{ensure_admin, report, Context};

/// Relay `text` verbatim into the main group.
///
/// Not idempotent by design: re-sending the command posts a duplicate, the
/// same as a human pressing send twice.
pub async fn handle(ctx: &Context, sender: &UserInfo, text: &str) -> Result<()> {
    ensure_admin(ctx, sender).await?;

    let main = ctx.groups.chat_id(GroupRole::Main);
    let posted = match ctx.port.send_message(main, &escape_html(text)).await {
        Ok(posted) => posted,
        Err(e) => {
            report(ctx, GroupRole::Admin, &format!("❌ Could not relay message: {e}")).await;
            return Err(Error::Transport(format!("relay to main failed: {e}")));
        }
    };

    report(
        ctx,
        GroupRole::Admin,
        &format!("✅ Sent! id: {}", posted.message_id.0),
    )
    .await;
    Ok(())
}
