pub mod ipc;

pub use ipc::{Command, IpcError, MatchInfo, Response, StatusInfo};
