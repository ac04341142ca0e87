/// Core error type.
///
/// Adapter crates map their specific errors into this type so the bot core can
/// handle failures consistently: admin-facing failures are reported back into
/// the admin group, everything else is logged. No per-command failure is ever
/// fatal to the process; only `Config` errors at startup terminate the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("no pending member matching {0}")]
    UserNotFound(String),

    #[error("could not add member: {0}")]
    AddFailed(String),

    #[error("transport call timed out")]
    TransportTimeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("calendar feed error: {0}")]
    Fetch(String),
}

pub type Result<T> = std::result::Result<T, Error>;
