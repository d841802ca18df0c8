use std::collections::VecDeque;
use tracing::debug;

use super::{CaptureSettings, EngineError, EngineEvent, RecognitionEngine};

/// A command the session sent to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCall {
    Start(CaptureSettings),
    Stop,
    Abort,
}

/// In-process engine driven by text instead of audio.
///
/// Events are queued rather than delivered on the spot, the way a real
/// engine reports asynchronously: whoever owns the session drains
/// `next_event` and hands each event to `Session::handle_event`.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    running: bool,
    settings: CaptureSettings,
    pending: VecDeque<EngineEvent>,
    calls: Vec<EngineCall>,
    start_failure: Option<EngineError>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    pub fn next_event(&mut self) -> Option<EngineEvent> {
        self.pending.pop_front()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Make the next `start` call fail with `error`.
    pub fn fail_next_start(&mut self, error: EngineError) {
        self.start_failure = Some(error);
    }

    /// Deliver a final result. Returns false when the engine is not capturing.
    pub fn say(&mut self, hypotheses: &[&str]) -> bool {
        self.emit_result(hypotheses.iter().map(|h| h.to_string()).collect(), true)
    }

    pub fn emit_result(&mut self, hypotheses: Vec<String>, is_final: bool) -> bool {
        if !self.running {
            debug!("Engine not capturing, dropping {:?}", hypotheses);
            return false;
        }

        self.pending.push_back(EngineEvent::SoundStart);
        self.pending.push_back(EngineEvent::Result {
            hypotheses,
            is_final,
        });
        self.pending.push_back(EngineEvent::SoundEnd);

        // A single-shot engine stops after its first final result.
        if is_final && !self.settings.continuous {
            self.finish();
        }
        true
    }

    /// Report an error. Permission errors also end the capture.
    pub fn fail(&mut self, error: EngineError) {
        let fatal = error.is_fatal();
        self.pending.push_back(EngineEvent::Error(error));
        if fatal {
            self.finish();
        }
    }

    fn finish(&mut self) {
        if self.running {
            self.running = false;
            self.pending.push_back(EngineEvent::End);
        }
    }
}

impl RecognitionEngine for ScriptedEngine {
    fn start(&mut self, settings: CaptureSettings) -> Result<(), EngineError> {
        self.calls.push(EngineCall::Start(settings));
        if let Some(error) = self.start_failure.take() {
            return Err(error);
        }
        if self.running {
            return Err(EngineError::AlreadyStarted);
        }
        self.running = true;
        self.settings = settings;
        self.pending.push_back(EngineEvent::Start);
        Ok(())
    }

    fn stop(&mut self) {
        self.calls.push(EngineCall::Stop);
        self.finish();
    }

    fn abort(&mut self) {
        self.calls.push(EngineCall::Abort);
        self.finish();
    }
}
