use std::sync::Arc;

use gatebot_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), gatebot_core::Error> {
    gatebot_core::logging::init("gatebot")?;

    let cfg = Arc::new(Config::load()?);

    gatebot_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| gatebot_core::Error::Transport(format!("bot failed: {e}")))?;

    Ok(())
}
