use std::path::PathBuf;

use thiserror::Error;

use crate::cache::ResourceKey;

/// Errors surfaced by engine operations.
///
/// Precondition failures (sound not loaded, loop not playing, unknown event)
/// are also logged before being returned, so callers that ignore the result
/// still get a console diagnostic.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("sound `{0}` has not been loaded")]
    SoundNotLoaded(ResourceKey),

    #[error("sound `{0}` is not an actively playing loop")]
    LoopNotPlaying(ResourceKey),

    #[error("no loaded bank defines event `{0}`")]
    EventNotFound(ResourceKey),

    #[error("event `{0}` has not been created")]
    EventNotCreated(ResourceKey),

    #[error("event `{event}` has no parameter `{parameter}`")]
    UnknownParameter {
        event: ResourceKey,
        parameter: String,
    },

    #[error("failed to read bank `{path}`")]
    BankRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bank `{path}` is malformed")]
    BankParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A middleware call failed.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type Result<T, E = AudioError> = std::result::Result<T, E>;
