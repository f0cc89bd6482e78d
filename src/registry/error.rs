use crate::keyspec::ParseError;
use crate::platform::PlatformError;

/// Hotkey registry error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("'{0}' is already in the hotkey table")]
    DuplicateSpec(String),
    #[error("id {0} is already in the hotkey table")]
    DuplicateId(i16),
    #[error("'{0}' is not in the hotkey table")]
    NotFound(String),
    #[error("hotkeys are already started, stop them first")]
    AlreadyRunning,
    #[error("hotkeys are not started, start them first")]
    NotRunning,
    #[error("{specs} specs given with {ids} ids")]
    LengthMismatch { specs: usize, ids: usize },
    #[error("spec list with explicit ids cannot contain duplicate specs")]
    DuplicateSpecsInInput,
    #[error("cannot parse '{spec}': {source}")]
    ParseFailure {
        spec: String,
        #[source]
        source: ParseError,
    },
    /// The register primitive refused the claim (`source: None`) or failed.
    #[error("platform did not register hotkey id {id}")]
    OsRegistrationFailure {
        id: i16,
        #[source]
        source: Option<PlatformError>,
    },
    #[error("id {0} is outside 1..=32767")]
    InvalidId(i16),
    #[error("no hotkey ids left above the current maximum")]
    IdSpaceExhausted,
    #[error("hotkey registry has been disposed")]
    Disposed,
    #[error(transparent)]
    Platform(#[from] PlatformError),
}
