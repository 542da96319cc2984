use thiserror::Error;

/// Failures that stop the bot. Anything that only concerns a single
/// interaction is reported to the user instead, see `commands::todo::TodoError`.
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Serenity(#[from] serenity::Error),

    #[error("cannot create '{name}' command: {source}")]
    Register {
        name: &'static str,
        source: serenity::Error,
    },

    #[error("shutdown task failed: {0}")]
    Shutdown(#[from] tokio::task::JoinError),

    #[error("cannot delete '{name}' command: {source}")]
    Deregister {
        name: String,
        source: serenity::Error,
    },
}
