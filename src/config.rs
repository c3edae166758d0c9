use std::fmt;
use std::time::Duration;

/// How long we wait for a connection or for a single response.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where to connect and how to log in.
#[derive(Clone)]
pub struct Config {
    host: String,
    port: u16,
    password: String,
    timeout: Duration,
}

impl Config {
    pub fn new(host: impl Into<String>, port: u16, password: impl Into<String>) -> Self {
        Config {
            host: host.into(),
            port,
            password: password.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides both the connect timeout and the per-read timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        self.host.as_ref()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn password(&self) -> &str {
        self.password.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// the password goes over the wire in plain text already, keep it out of logs at least
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}
