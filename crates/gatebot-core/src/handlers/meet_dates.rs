//! `/meet_dates`: list upcoming meet dates in the asking group.

use crate::{domain::GroupRole, formatting, Result};

use super::{report, Context};

pub async fn handle(ctx: &Context, origin: GroupRole) -> Result<()> {
    let events = match ctx.events.list_upcoming().await {
        Ok(events) => events,
        Err(e) => {
            report(ctx, origin, &format!("❌ Could not fetch meet dates: {e}")).await;
            return Err(e);
        }
    };

    let text = if events.is_empty() {
        "No upcoming meets scheduled.".to_string()
    } else {
        formatting::meet_dates_list(&events)
    };
    report(ctx, origin, &text).await;
    Ok(())
}
