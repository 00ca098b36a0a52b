//! Remote session backends for the log fetcher.

mod local;
mod sftp;

pub use local::{LocalMirror, LocalMirrorSession};
pub use sftp::{SftpConnector, SftpSession};
