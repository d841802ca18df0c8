use shared::ipc::{Command, IpcError, Response};
use std::path::PathBuf;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::{timeout, Duration};
use tracing::warn;

/// Timeout for socket operations (5 seconds)
const SOCKET_TIMEOUT: Duration = Duration::from_secs(5);

/// Uses XDG runtime directory if available, falls back to /tmp/vocmdd.sock
fn get_socket_path() -> PathBuf {
    dirs::runtime_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("vocmdd.sock")
}

pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    pub fn new() -> Self {
        Self {
            socket_path: get_socket_path(),
        }
    }

    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self { socket_path }
    }

    pub async fn send_command(&self, cmd: Command) -> Result<Response, IpcError> {
        let mut stream = match timeout(SOCKET_TIMEOUT, UnixStream::connect(&self.socket_path)).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e))
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::ConnectionRefused
                ) =>
            {
                return Err(IpcError::ConnectionRefused);
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                warn!(
                    "Connection timeout: failed to connect to daemon at {} within {:?}",
                    self.socket_path.display(),
                    SOCKET_TIMEOUT
                );
                return Err(IpcError::Timeout);
            }
        };

        let command_json = serde_json::to_vec(&cmd)?;

        if timeout(SOCKET_TIMEOUT, stream.write_all(&command_json))
            .await
            .is_err()
        {
            warn!(
                "Write timeout: failed to send command to daemon within {:?}",
                SOCKET_TIMEOUT
            );
            return Err(IpcError::Timeout);
        }

        // The daemon closes the connection after its single reply.
        let mut buffer = Vec::new();
        match timeout(SOCKET_TIMEOUT, stream.read_to_end(&mut buffer)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                warn!(
                    "Read timeout: failed to receive response from daemon within {:?}",
                    SOCKET_TIMEOUT
                );
                return Err(IpcError::Timeout);
            }
        }

        let response: Response = serde_json::from_slice(&buffer)?;

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{MatchInfo, StatusInfo};
    use std::path::Path;
    use tokio::net::UnixListener;

    /// Serve exactly one request on `socket`, answering with `reply`.
    fn serve_once<F>(socket: &Path, reply: F)
    where
        F: FnOnce(Command) -> Response + Send + 'static,
    {
        let listener = UnixListener::bind(socket).unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();

            let mut buffer = vec![0u8; 1024];
            let n = stream.read(&mut buffer).await.unwrap();
            buffer.truncate(n);

            let command: Command = serde_json::from_slice(&buffer).unwrap();
            let response_json = serde_json::to_vec(&reply(command)).unwrap();
            stream.write_all(&response_json).await.unwrap();
        });
    }

    #[tokio::test]
    async fn test_daemon_client_new() {
        let client = DaemonClient::new();
        match dirs::runtime_dir() {
            Some(dir) => assert_eq!(client.socket_path, dir.join("vocmdd.sock")),
            None => assert_eq!(client.socket_path, PathBuf::from("/tmp/vocmdd.sock")),
        }
    }

    #[tokio::test]
    async fn test_send_command_socket_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let client = DaemonClient::with_socket_path(dir.path().join("missing.sock"));
        let result = client.send_command(Command::Start).await;
        assert!(matches!(result, Err(IpcError::ConnectionRefused)));
    }

    #[tokio::test]
    async fn test_send_command_with_mock_server() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("vocmdd.sock");
        serve_once(&socket, |command| match command {
            Command::Start => Response::Ok,
            _ => Response::Error("unknown".to_string()),
        });

        let client = DaemonClient::with_socket_path(socket);
        let response = tokio_test::assert_ok!(client.send_command(Command::Start).await);
        assert_eq!(response, Response::Ok);
    }

    #[tokio::test]
    async fn test_send_command_status() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("vocmdd.sock");
        serve_once(&socket, |command| {
            assert!(matches!(command, Command::Status));
            Response::Status(StatusInfo {
                is_running: true,
                is_listening: false,
                is_paused: false,
                hotword: vec!["Jimmy".to_string()],
                commands: 3,
            })
        });

        let client = DaemonClient::with_socket_path(socket);
        match client.send_command(Command::Status).await {
            Ok(Response::Status(info)) => {
                assert!(info.is_running);
                assert!(!info.is_listening);
                assert_eq!(info.hotword, vec!["Jimmy"]);
                assert_eq!(info.commands, 3);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_say_gets_match() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("vocmdd.sock");
        serve_once(&socket, |command| match command {
            Command::Say { hypotheses, .. } => Response::Matched(MatchInfo {
                hypothesis: hypotheses[0].clone(),
                template: "open :app".to_string(),
                args: vec!["mail".to_string()],
            }),
            _ => Response::Error("unexpected".to_string()),
        });

        let client = DaemonClient::with_socket_path(socket);
        let result = client
            .send_command(Command::Say {
                hypotheses: vec!["open mail".to_string()],
                is_final: true,
            })
            .await;
        match result {
            Ok(Response::Matched(info)) => assert_eq!(info.args, vec!["mail"]),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_command_error_response() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("vocmdd.sock");
        serve_once(&socket, |_| Response::Error("test error".to_string()));

        let client = DaemonClient::with_socket_path(socket);
        let result = client.send_command(Command::Start).await;
        assert!(matches!(result, Ok(Response::Error(_))));
    }

    #[tokio::test]
    async fn test_send_command_timeout_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("vocmdd.sock");

        let listener = UnixListener::bind(&socket).unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();

            let mut buffer = vec![0u8; 1024];
            let _n = stream.read(&mut buffer).await.unwrap();

            // Longer than SOCKET_TIMEOUT, no reply.
            tokio::time::sleep(tokio::time::Duration::from_secs(6)).await;
        });

        let client = DaemonClient::with_socket_path(socket);
        let result = client.send_command(Command::Start).await;
        assert!(matches!(result, Err(IpcError::Timeout)));
    }
}
