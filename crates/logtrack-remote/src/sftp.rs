//! SFTP over SSH with password authentication.

use std::fs::File;
use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use ssh2::{ErrorCode, Session, Sftp};
use tracing::{debug, info, warn};

use logtrack_core::config::Credentials;
use logtrack_core::error::{SessionError, TransferError};
use logtrack_core::fetch::{RemoteConnector, RemoteSession};

/// libssh2 `LIBSSH2_ERROR_TIMEOUT`.
const SESSION_TIMEOUT: i32 = -9;
/// SFTP status `SSH_FX_NO_SUCH_FILE`.
const SFTP_NO_SUCH_FILE: i32 = 2;

#[derive(Debug, Clone)]
pub struct SftpConnector {
    credentials: Credentials,
    port: u16,
    timeout: Duration,
}

impl SftpConnector {
    pub fn new(credentials: Credentials, port: u16, timeout: Duration) -> Self {
        Self {
            credentials,
            port,
            timeout,
        }
    }

    fn host(&self) -> String {
        self.credentials.hostname.clone()
    }

    fn connect_error(&self, source: io::Error) -> SessionError {
        if matches!(
            source.kind(),
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
        ) {
            SessionError::Timeout {
                host: self.host(),
                port: self.port,
                seconds: self.timeout.as_secs(),
            }
        } else {
            SessionError::Connect {
                host: self.host(),
                port: self.port,
                source,
            }
        }
    }

    /// Maps a libssh2 failure during handshake or subsystem start-up.
    fn session_error(&self, err: ssh2::Error) -> SessionError {
        match err.code() {
            ErrorCode::Session(SESSION_TIMEOUT) => SessionError::Timeout {
                host: self.host(),
                port: self.port,
                seconds: self.timeout.as_secs(),
            },
            _ => SessionError::Protocol {
                host: self.host(),
                message: err.to_string(),
            },
        }
    }

    fn open_tcp(&self) -> Result<TcpStream, SessionError> {
        let addrs = (self.credentials.hostname.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| self.connect_error(e))?;

        let mut last_err = None;
        for addr in addrs {
            debug!("Trying {}", addr);
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => return Ok(stream),
                Err(err) => last_err = Some(err),
            }
        }
        let source = last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, "host resolved to no addresses")
        });
        Err(self.connect_error(source))
    }
}

impl RemoteConnector for SftpConnector {
    type Session = SftpSession;

    fn describe(&self) -> String {
        format!(
            "{}:{} as user '{}'",
            self.credentials.hostname, self.port, self.credentials.username
        )
    }

    fn connect(&self) -> Result<SftpSession, SessionError> {
        let tcp = self.open_tcp()?;

        let mut session = Session::new().map_err(|e| self.session_error(e))?;
        let timeout_ms = u32::try_from(self.timeout.as_millis()).unwrap_or(u32::MAX);
        session.set_timeout(timeout_ms);
        session.set_tcp_stream(tcp);
        session.handshake().map_err(|e| self.session_error(e))?;
        info!("SSH handshake with {} completed", self.host());

        let auth_failed = || SessionError::Authentication {
            host: self.host(),
            user: self.credentials.username.clone(),
        };
        session
            .userauth_password(&self.credentials.username, &self.credentials.password)
            .map_err(|err| match err.code() {
                ErrorCode::Session(SESSION_TIMEOUT) => self.session_error(err),
                _ => auth_failed(),
            })?;
        if !session.authenticated() {
            return Err(auth_failed());
        }

        let sftp = session.sftp().map_err(|e| self.session_error(e))?;
        info!("SFTP session opened");
        Ok(SftpSession {
            sftp: Some(sftp),
            session,
        })
    }
}

/// Open SFTP channel. Dropping it closes the channel, then the SSH session.
pub struct SftpSession {
    sftp: Option<Sftp>,
    session: Session,
}

fn transfer_error(path: &str, err: ssh2::Error) -> TransferError {
    match err.code() {
        ErrorCode::SFTP(SFTP_NO_SUCH_FILE) => TransferError::NotFound {
            path: path.to_string(),
        },
        _ => TransferError::Other {
            path: path.to_string(),
            message: err.to_string(),
        },
    }
}

impl SftpSession {
    fn sftp(&self, path: &str) -> Result<&Sftp, TransferError> {
        self.sftp.as_ref().ok_or_else(|| TransferError::Other {
            path: path.to_string(),
            message: "SFTP channel already closed".to_string(),
        })
    }
}

impl RemoteSession for SftpSession {
    fn list_dir(&mut self, remote_dir: &str) -> Result<Vec<String>, TransferError> {
        let entries = self
            .sftp(remote_dir)?
            .readdir(Path::new(remote_dir))
            .map_err(|e| transfer_error(remote_dir, e))?;
        Ok(entries
            .into_iter()
            .filter_map(|(path, _)| {
                path.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .filter(|name| name != "." && name != "..")
            .collect())
    }

    fn download(&mut self, remote_file: &str, local_path: &Path) -> Result<u64, TransferError> {
        let mut remote = self
            .sftp(remote_file)?
            .open(Path::new(remote_file))
            .map_err(|e| transfer_error(remote_file, e))?;
        let mut local = File::create(local_path).map_err(|source| TransferError::Io {
            path: local_path.display().to_string(),
            source,
        })?;
        io::copy(&mut remote, &mut local).map_err(|source| TransferError::Io {
            path: remote_file.to_string(),
            source,
        })
    }
}

impl Drop for SftpSession {
    fn drop(&mut self) {
        drop(self.sftp.take());
        if let Err(err) = self.session.disconnect(None, "log download finished", None) {
            warn!("Failed to close SSH session cleanly: {}", err);
        } else {
            info!("SSH session closed");
        }
    }
}
