use std::fmt;
use tracing::{debug, error, info, warn};

use crate::callbacks::{CallbackId, CallbackRegistry, Event, EventKind};
use crate::engine::{CaptureSettings, EngineError, EngineEvent, RecognitionEngine, ScriptedEngine};
use crate::hotword::HotwordConfig;
use crate::processor::{MatchOutcome, ResultProcessor};
use crate::registry::{CommandBinding, MatcherRegistry, RegisterError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Listening,
    Paused,
    Aborting,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "Idle"),
            Phase::Listening => write!(f, "Listening"),
            Phase::Paused => write!(f, "Paused"),
            Phase::Aborting => write!(f, "Aborting"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOptions {
    pub auto_restart: bool,
    pub continuous: bool,
    /// Match non-final results too.
    pub interim_results: bool,
    /// Ask the engine to stop while paused instead of ignoring its results.
    pub pause_stops_engine: bool,
    /// Start in the paused phase.
    pub paused: bool,
    /// Replaces the current hotword when set.
    pub hotword: Option<HotwordConfig>,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            auto_restart: true,
            continuous: false,
            interim_results: false,
            pause_stops_engine: false,
            paused: false,
            hotword: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub phase: Phase,
    pub auto_restart: bool,
    pub continuous: bool,
    pub interim_results: bool,
    pub pause_stops_engine: bool,
}

impl SessionState {
    fn new() -> Self {
        let defaults = StartOptions::default();
        Self {
            phase: Phase::Idle,
            auto_restart: defaults.auto_restart,
            continuous: defaults.continuous,
            interim_results: defaults.interim_results,
            pause_stops_engine: defaults.pause_stops_engine,
        }
    }

    pub fn listening(&self) -> bool {
        self.phase == Phase::Listening
    }

    pub fn paused(&self) -> bool {
        self.phase == Phase::Paused
    }

    fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings {
            continuous: self.continuous,
            interim_results: self.interim_results,
        }
    }
}

/// What the session believes the engine is doing.
#[derive(Debug, Default, Clone, Copy)]
struct EngineTrack {
    active: bool,
    /// Stop or abort was requested and the engine has not ended yet.
    stopping: bool,
    /// Capture was requested while the engine was still stopping.
    restart_pending: bool,
}

/// One recognition session bound to one engine.
///
/// Caller intent (`pause`, `abort`) is recorded synchronously and is what
/// every later engine event is checked against. An engine `End` that shows
/// up after the caller paused or aborted never brings listening back.
///
/// - Idle -> Listening (start)
/// - Listening <-> Paused (pause / resume)
/// - any -> Aborting (abort) -> Idle (engine end)
/// - Listening -> Listening (engine end with auto-restart)
/// - Listening -> Idle (engine end without auto-restart)
pub struct Session<E> {
    engine: E,
    state: SessionState,
    track: EngineTrack,
    registry: MatcherRegistry,
    hotword: HotwordConfig,
    callbacks: CallbackRegistry,
}

impl<E: RecognitionEngine> Session<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            state: SessionState::new(),
            track: EngineTrack::default(),
            registry: MatcherRegistry::new(),
            hotword: HotwordConfig::Disabled,
            callbacks: CallbackRegistry::new(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn is_listening(&self) -> bool {
        self.state.listening()
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused()
    }

    pub fn hotword(&self) -> &HotwordConfig {
        &self.hotword
    }

    pub fn commands(&self) -> Vec<String> {
        self.registry.templates()
    }

    pub fn add_commands<I>(&mut self, bindings: I) -> Result<(), RegisterError>
    where
        I: IntoIterator<Item = CommandBinding>,
    {
        self.registry.add(bindings)
    }

    pub fn remove_commands(&mut self, templates: Option<&[&str]>) {
        self.registry.remove(templates);
    }

    /// Applies from the next result on.
    pub fn set_hotword(&mut self, hotword: impl Into<HotwordConfig>) {
        let hotword = hotword.into();
        if hotword.words().iter().any(|w| w.split_whitespace().count() != 1) {
            warn!(
                "Hotword {:?} is not a single word and will never match",
                hotword
            );
        }
        info!("Hotword set to {:?}", hotword);
        self.hotword = hotword;
    }

    pub fn add_callback<F>(&mut self, kind: EventKind, callback: F) -> CallbackId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.callbacks.add(kind, callback)
    }

    pub fn remove_callback(&mut self, kind: Option<EventKind>, id: Option<CallbackId>) {
        self.callbacks.remove(kind, id);
    }

    pub fn start(&mut self, options: StartOptions) {
        self.state.auto_restart = options.auto_restart;
        self.state.continuous = options.continuous;
        self.state.interim_results = options.interim_results;
        self.state.pause_stops_engine = options.pause_stops_engine;
        if let Some(hotword) = options.hotword {
            self.set_hotword(hotword);
        }

        if options.paused {
            self.transition(Phase::Paused);
            if self.state.pause_stops_engine {
                self.stop_engine();
                return;
            }
        } else {
            self.transition(Phase::Listening);
        }

        if !self.ensure_capturing() {
            self.transition(Phase::Idle);
        }
    }

    pub fn pause(&mut self) {
        if self.state.phase != Phase::Listening {
            debug!("pause ignored in {}", self.state.phase);
            return;
        }
        self.transition(Phase::Paused);

        if self.state.pause_stops_engine {
            self.stop_engine();
        }
    }

    pub fn resume(&mut self) {
        if self.state.phase != Phase::Paused {
            debug!("resume ignored in {}", self.state.phase);
            return;
        }
        self.transition(Phase::Listening);
        if !self.ensure_capturing() {
            self.transition(Phase::Idle);
        }
    }

    pub fn abort(&mut self) {
        match self.state.phase {
            Phase::Idle | Phase::Aborting => {
                debug!("abort ignored in {}", self.state.phase);
                return;
            }
            Phase::Listening | Phase::Paused => {}
        }

        self.track.restart_pending = false;
        if !self.track.active {
            self.transition(Phase::Idle);
            return;
        }

        self.transition(Phase::Aborting);
        if !self.track.stopping {
            self.track.stopping = true;
            self.engine.abort();
        }
    }

    /// Run hypotheses through the matcher as if the engine had produced
    /// them. Nothing happens unless the session is listening.
    pub fn trigger(&mut self, hypotheses: &[String]) -> Option<MatchOutcome> {
        if !self.is_listening() {
            warn!("Cannot trigger commands while {}", self.state.phase);
            return None;
        }
        Some(self.process(hypotheses, true))
    }

    /// Feed one engine event through the state machine. Returns the outcome
    /// when the event was a result that reached the matcher.
    pub fn handle_event(&mut self, event: EngineEvent) -> Option<MatchOutcome> {
        match event {
            EngineEvent::Start => {
                self.track.active = true;
                self.callbacks.emit(&Event::Start);
            }
            EngineEvent::SoundStart => self.callbacks.emit(&Event::SoundStart),
            EngineEvent::SoundEnd => self.callbacks.emit(&Event::SoundEnd),
            EngineEvent::Error(e) => self.on_error(e),
            EngineEvent::End => self.on_end(),
            EngineEvent::Result {
                hypotheses,
                is_final,
            } => {
                if self.state.phase != Phase::Listening {
                    debug!("Discarding result while {}: {:?}", self.state.phase, hypotheses);
                    return None;
                }
                if !is_final && !self.state.interim_results {
                    debug!("Ignoring interim result {:?}", hypotheses);
                    return None;
                }
                return Some(self.process(&hypotheses, is_final));
            }
        }
        None
    }

    fn process(&self, hypotheses: &[String], is_final: bool) -> MatchOutcome {
        let processor =
            ResultProcessor::new(self.registry.snapshot(), self.hotword.clone(), &self.callbacks);
        processor.process(hypotheses, is_final)
    }

    fn on_error(&mut self, error: EngineError) {
        error!("Recognition error: {}", error);
        if error.is_fatal() && self.state.auto_restart {
            warn!("Disabling auto-restart after '{}'", error);
            self.state.auto_restart = false;
        }
        self.callbacks.emit(&Event::Error(error));
    }

    fn on_end(&mut self) {
        self.track.active = false;
        self.track.stopping = false;
        let restart_pending = std::mem::take(&mut self.track.restart_pending);

        self.callbacks.emit(&Event::End);

        match self.state.phase {
            Phase::Listening if restart_pending || self.state.auto_restart => {
                info!("Recognition ended, restarting");
                if !self.start_engine() {
                    self.transition(Phase::Idle);
                }
            }
            Phase::Listening | Phase::Aborting => self.transition(Phase::Idle),
            Phase::Paused => debug!("Recognition ended while paused, staying paused"),
            Phase::Idle => {}
        }
    }

    fn ensure_capturing(&mut self) -> bool {
        if self.track.stopping {
            self.track.restart_pending = true;
            return true;
        }
        if self.track.active {
            return true;
        }
        self.start_engine()
    }

    fn stop_engine(&mut self) {
        self.track.restart_pending = false;
        if self.track.active && !self.track.stopping {
            self.track.stopping = true;
            self.engine.stop();
        }
    }

    fn start_engine(&mut self) -> bool {
        match self.engine.start(self.state.capture_settings()) {
            Ok(()) => {
                self.track.active = true;
                true
            }
            Err(EngineError::AlreadyStarted) => {
                debug!("Engine already capturing");
                self.track.active = true;
                true
            }
            Err(e) => {
                error!("Failed to start recognition: {}", e);
                self.callbacks.emit(&Event::Error(e));
                false
            }
        }
    }

    fn transition(&mut self, target: Phase) {
        if self.state.phase != target {
            info!("Session: {} -> {}", self.state.phase, target);
            self.state.phase = target;
        }
    }
}

impl Session<ScriptedEngine> {
    /// Deliver every event the engine has queued, including the ones that
    /// handling them causes. Returns the outcome of each matched or
    /// unmatched result.
    pub fn pump(&mut self) -> Vec<MatchOutcome> {
        let mut outcomes = Vec::new();
        while let Some(event) = self.engine.next_event() {
            if let Some(outcome) = self.handle_event(event) {
                outcomes.push(outcome);
            }
        }
        outcomes
    }
}
