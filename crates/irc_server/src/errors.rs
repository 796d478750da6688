use thiserror::Error;

/// Errors that can happen while bringing the server up. Always fatal: logged to stderr,
/// process exits non-zero.
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// A transport-level failure on a specific session. Always results in that session being
/// disconnected; never fatal to the server.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),

    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),

    #[error("peer closed the connection")]
    Closed,

    #[error("idle timeout exceeded")]
    Idle,

    #[error("read buffer exceeded {0} bytes")]
    BufferOverflow(usize),

    #[error("line exceeded {0} bytes")]
    LineTooLong(usize),
}
