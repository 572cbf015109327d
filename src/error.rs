//! Error types for the cache server
//!
//! Provides unified error handling for the protocol layer using thiserror.
//! Cache misses, CAS conflicts and capacity pressure are outcomes, not errors;
//! only malformed input and transport failures end up here.

use std::time::Duration;

use thiserror::Error;

// == Protocol Error Enum ==
/// Errors raised while reading commands from or writing replies to a client.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The command name is not recognized (`ERROR`)
    #[error("unknown command")]
    UnknownCommand,

    /// The command line or data block is malformed (`CLIENT_ERROR`)
    #[error("client error: {0}")]
    Client(String),

    /// The request was well-formed but cannot be served (`SERVER_ERROR`)
    #[error("server error: {0}")]
    Server(String),

    /// No complete command arrived within the idle timeout
    #[error("connection idle for more than {0:?}")]
    IdleTimeout(Duration),

    /// Transport failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// The protocol line reported to the client, if any.
    pub fn reply_line(&self) -> Option<String> {
        match self {
            ProtocolError::UnknownCommand => Some("ERROR".to_string()),
            ProtocolError::Client(msg) => Some(format!("CLIENT_ERROR {}", msg)),
            ProtocolError::Server(msg) => Some(format!("SERVER_ERROR {}", msg)),
            ProtocolError::IdleTimeout(_) | ProtocolError::Io(_) => None,
        }
    }

    /// Whether the connection must be closed after reporting this error.
    ///
    /// An unknown command consumes exactly one line, so framing is intact.
    /// Every other error may leave a partial data block in the stream.
    pub fn closes_connection(&self) -> bool {
        !matches!(self, ProtocolError::UnknownCommand)
    }
}

// == Result Type Alias ==
/// Convenience Result type for the protocol layer.
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_lines() {
        assert_eq!(ProtocolError::UnknownCommand.reply_line().unwrap(), "ERROR");
        assert_eq!(
            ProtocolError::Client("bad data chunk".into()).reply_line().unwrap(),
            "CLIENT_ERROR bad data chunk"
        );
        assert_eq!(
            ProtocolError::Server("object too large for cache".into())
                .reply_line()
                .unwrap(),
            "SERVER_ERROR object too large for cache"
        );
        assert!(ProtocolError::IdleTimeout(Duration::from_secs(1))
            .reply_line()
            .is_none());
    }

    #[test]
    fn test_only_unknown_command_keeps_connection() {
        assert!(!ProtocolError::UnknownCommand.closes_connection());
        assert!(ProtocolError::Client("x".into()).closes_connection());
        assert!(ProtocolError::Server("x".into()).closes_connection());
    }
}
