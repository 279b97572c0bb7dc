#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The accepted-application query failed, so no list could be built.
    #[error("cannot load conversations: {0:#}")]
    CannotLoadConversations(anyhow::Error),

    #[error("message is empty")]
    EmptyMessage,

    #[error("invalid input: {0}")]
    Invalid(&'static str),

    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("conflict: {0}")]
    Conflict(&'static str),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
