use thiserror::Error;

/// Failures of the persistence collaborator behind [`crate::PlayerDirectory`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed store data: {0}")]
    Json(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by the command layer.
///
/// User mistakes (bad usage, missing permission, unknown player) are answered
/// with a reply to the sender and never show up here.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("empty command line")]
    EmptyCommandLine,

    #[error("command already registered: {0}")]
    AlreadyRegistered(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("invalid ip address: {0}")]
    InvalidIp(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
