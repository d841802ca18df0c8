use shared::ipc::{Command, MatchInfo, Response};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::CommandConfig;
use crate::state::{DaemonState, Heard};

pub struct DaemonServer {
    socket_path: PathBuf,
    read_buffer_bytes: usize,
    state: Arc<Mutex<DaemonState>>,
}

impl DaemonServer {
    pub fn new(socket_path: PathBuf, state: Arc<Mutex<DaemonState>>) -> Self {
        Self {
            socket_path,
            read_buffer_bytes: 8192,
            state,
        }
    }

    pub fn with_read_buffer(mut self, bytes: usize) -> Self {
        self.read_buffer_bytes = bytes.max(64);
        self
    }

    pub fn socket_path(&self) -> &PathBuf {
        &self.socket_path
    }

    pub fn bind(&self) -> anyhow::Result<UnixListener> {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        info!("Starting socket server at {}", self.socket_path.display());
        let listener = UnixListener::bind(&self.socket_path)?;
        debug!("Listener bound successfully");
        Ok(listener)
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let listener = self.bind()?;
        self.serve(listener).await
    }

    pub async fn serve(&self, listener: UnixListener) -> anyhow::Result<()> {
        loop {
            debug!("Waiting for connection...");
            let state = Arc::clone(&self.state);
            let buffer_bytes = self.read_buffer_bytes;
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("Connection accepted");
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_connection(state, stream, buffer_bytes).await
                        {
                            error!("Error handling connection: {}", e);
                        } else {
                            debug!("Connection handled successfully");
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }

    async fn handle_connection(
        state: Arc<Mutex<DaemonState>>,
        mut stream: UnixStream,
        buffer_bytes: usize,
    ) -> anyhow::Result<()> {
        let Some(parsed) = read_command(&mut stream, buffer_bytes).await? else {
            return Ok(());
        };

        let response = match parsed {
            Ok(command) => {
                info!("Received command: {:?}", command);
                let mut state = state.lock().await;
                dispatch(&mut state, command)
            }
            Err(e) => {
                warn!("Malformed command: {}", e);
                Response::Error(format!("malformed command: {}", e))
            }
        };

        let response_json = serde_json::to_vec(&response)?;
        stream.write_all(&response_json).await?;

        info!("Sent response: {:?}", response);

        Ok(())
    }
}

/// Read until the bytes form a complete command, the peer closes, or
/// `limit` bytes have arrived. `None` when the peer sent nothing.
async fn read_command(
    stream: &mut UnixStream,
    limit: usize,
) -> anyhow::Result<Option<Result<Command, serde_json::Error>>> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            if buffer.is_empty() {
                return Ok(None);
            }
            return Ok(Some(serde_json::from_slice(&buffer)));
        }
        buffer.extend_from_slice(&chunk[..n]);

        match serde_json::from_slice::<Command>(&buffer) {
            Err(e) if e.is_eof() && buffer.len() < limit => {
                debug!("Partial command, {} bytes so far", buffer.len());
            }
            result => return Ok(Some(result)),
        }
    }
}

/// Apply one command to the daemon state and build the reply.
pub fn dispatch(state: &mut DaemonState, command: Command) -> Response {
    match command {
        Command::Start => {
            state.start();
            Response::Ok
        }
        Command::Stop => {
            state.stop();
            Response::Ok
        }
        Command::Pause => {
            state.pause();
            Response::Ok
        }
        Command::Resume => {
            state.resume();
            Response::Ok
        }
        Command::Toggle => {
            state.toggle();
            Response::Ok
        }
        Command::Status => Response::Status(state.get_status()),
        Command::SetHotword(words) => {
            state.set_hotword(words);
            Response::Ok
        }
        Command::Say {
            hypotheses,
            is_final,
        } => match state.say(hypotheses, is_final) {
            Heard::Matched(report) => Response::Matched(MatchInfo::from(report)),
            Heard::NoMatch(hypotheses) => Response::NoMatch(hypotheses),
            Heard::Discarded => Response::Discarded,
        },
        Command::AddCommand { template, pattern } => {
            match state.add_command(&CommandConfig { template, pattern }) {
                Ok(()) => Response::Ok,
                Err(e) => Response::Error(e.to_string()),
            }
        }
        Command::RemoveCommands(templates) => {
            state.remove_commands(templates);
            Response::Ok
        }
        Command::ListCommands => Response::Commands(state.commands()),
    }
}

impl Drop for DaemonServer {
    fn drop(&mut self) {
        if self.socket_path.exists() {
            let _ = std::fs::remove_file(&self.socket_path);
        }
    }
}
