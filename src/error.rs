use thiserror::Error;
use tokio::time::error::Elapsed;

/// Possible errors for the package.
#[derive(Error, Debug)]
pub enum RconError {
    /// Returned if the buffer cannot even hold the 12 byte header.
    #[error("packet too short: got {0} bytes, need at least 12")]
    PacketTooShort(usize),
    /// Returned if the declared size cannot describe a frame (anything below
    /// id + type + two terminators).
    #[error("packet header malformed (declared size {0})")]
    InvalidPacketSize(i32),
    /// The body is too long for the 32 bit size field.
    #[error("packet body too large: {0} bytes")]
    PacketTooLarge(usize),
    /// Returned if the body is mangled in some way.
    #[error("packet body malformed (not valid utf-8)")]
    MalformedPacketBody(#[from] std::str::Utf8Error),
    /// Port 0 was given.
    #[error("invalid port, expected 1-65535")]
    InvalidPort,
    /// Returned if the host is down, refuses the connection or is behind a
    /// firewall.
    #[error("cannot connect to host")]
    Connection(#[source] std::io::Error),
    /// There was a problem writing to an established stream.
    #[error("cannot send message to host")]
    Send(#[source] std::io::Error),
    /// There was a problem reading from an established stream.
    #[error("cannot receive response from host")]
    Receive(#[source] std::io::Error),
    /// The server closed the stream while we were waiting for a response.
    #[error("connection closed by host")]
    ConnectionClosed,
    /// Returned if you can't remember the password.
    #[error("bad password")]
    AuthenticationError,
    /// The server kept answering with empty acknowledgements.
    #[error("server is not responding properly")]
    ServerUnresponsive,
    /// The operation needs an open connection.
    #[error("not connected")]
    NotConnected,
    /// Commands can only be sent after a successful `authenticate()`.
    #[error("not authenticated")]
    NotAuthenticated,
    /// `authenticate()` was called on a session that is already logged in.
    #[error("already authenticated")]
    AlreadyAuthenticated,
    /// Returned if the server did not respond in time.
    #[error("timeout")]
    Timeout(#[from] Elapsed),
}

impl RconError {
    /// True for errors caused by a frame we could not make sense of.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            RconError::PacketTooShort(_)
                | RconError::InvalidPacketSize(_)
                | RconError::MalformedPacketBody(_)
        )
    }

    /// True for errors after which the session should be thrown away.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RconError::Timeout(_)
                | RconError::Connection(_)
                | RconError::Send(_)
                | RconError::Receive(_)
                | RconError::ConnectionClosed
        ) || self.is_protocol_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_errors_are_grouped() {
        assert!(RconError::PacketTooShort(3).is_protocol_error());
        assert!(RconError::InvalidPacketSize(-4).is_protocol_error());
        assert!(!RconError::AuthenticationError.is_protocol_error());
        assert!(!RconError::ServerUnresponsive.is_protocol_error());
    }

    #[test]
    fn usage_errors_are_not_fatal() {
        assert!(!RconError::NotAuthenticated.is_fatal());
        assert!(!RconError::AuthenticationError.is_fatal());
        assert!(RconError::ConnectionClosed.is_fatal());
        assert!(RconError::PacketTooShort(0).is_fatal());
    }

    #[test]
    fn messages() {
        assert_eq!(
            RconError::PacketTooShort(5).to_string(),
            "packet too short: got 5 bytes, need at least 12"
        );
        assert_eq!(RconError::AuthenticationError.to_string(), "bad password");
    }
}
