use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Stop,
    Pause,
    Resume,
    Toggle,
    Status,
    /// An empty list switches the hotword off.
    SetHotword(Vec<String>),
    /// Hand ranked hypotheses to the daemon's engine as if they were heard.
    Say {
        hypotheses: Vec<String>,
        is_final: bool,
    },
    AddCommand {
        template: String,
        pattern: bool,
    },
    /// `None` removes every command.
    RemoveCommands(Option<Vec<String>>),
    ListCommands,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Response {
    Ok,
    Error(String),
    Status(StatusInfo),
    Matched(MatchInfo),
    NoMatch(Vec<String>),
    /// The utterance never reached the matcher (not listening, or paused).
    Discarded,
    Commands(Vec<String>),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StatusInfo {
    pub is_running: bool,
    pub is_listening: bool,
    pub is_paused: bool,
    pub hotword: Vec<String>,
    pub commands: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MatchInfo {
    pub hypothesis: String,
    pub template: String,
    pub args: Vec<String>,
}

#[derive(Error, Debug)]
pub enum IpcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Connection refused: is vocmdd running?")]
    ConnectionRefused,

    #[error("Connection timeout")]
    Timeout,
}
