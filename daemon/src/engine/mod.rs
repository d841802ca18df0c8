pub mod scripted;

pub use scripted::{EngineCall, ScriptedEngine};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("network error during recognition")]
    Network,

    #[error("microphone access blocked")]
    PermissionBlocked,

    #[error("microphone access denied")]
    PermissionDenied,

    #[error("recognition already started")]
    AlreadyStarted,

    #[error("recognition engine error: {0}")]
    Other(String),
}

impl EngineError {
    /// Errors after which restarting the engine cannot succeed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::PermissionBlocked | EngineError::PermissionDenied
        )
    }
}

/// How the engine should capture, derived from the session's start options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureSettings {
    pub continuous: bool,
    pub interim_results: bool,
}

/// Events a recognition engine delivers, in the order it emits them.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Start,
    End,
    Error(EngineError),
    Result {
        hypotheses: Vec<String>,
        is_final: bool,
    },
    SoundStart,
    SoundEnd,
}

/// The speech-to-text engine a session drives. Calls return immediately;
/// the engine reports back later through `EngineEvent`s.
pub trait RecognitionEngine {
    fn start(&mut self, settings: CaptureSettings) -> Result<(), EngineError>;
    fn stop(&mut self);
    fn abort(&mut self);
}
