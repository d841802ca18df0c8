pub mod callbacks;
pub mod config;
pub mod engine;
pub mod grammar;
pub mod hotword;
pub mod processor;
pub mod registry;
pub mod server;
pub mod session;
pub mod state;

pub use callbacks::{CallbackId, CallbackRegistry, Event, EventKind};
pub use config::{load_config, Config};
pub use engine::{CaptureSettings, EngineError, EngineEvent, RecognitionEngine, ScriptedEngine};
pub use grammar::{compile, Arg, CompileError, CompiledMatcher, Template};
pub use hotword::HotwordConfig;
pub use processor::{MatchOutcome, MatchReport, ResultProcessor};
pub use registry::{CommandBinding, MatcherRegistry, RegisterError};
pub use session::{Phase, Session, SessionState, StartOptions};
pub use state::{DaemonState, Heard};
