use crate::{
    config::Config,
    error::RconError,
    packet::{Packet, PacketType, AUTH_FAILED_ID},
};
use log::{debug, info, trace, warn};
use tokio::{io::AsyncWriteExt, net::TcpStream, time::timeout};

/// Every receive reads at most this much, one read is expected to hold one frame.
pub const READ_BUFFER_SIZE: usize = 4096;

/// Number of empty type 2 packets in a row after which we give up on a command.
pub const MAX_EMPTY_RESPONSES: u32 = 3;

/// Simple asynchronous rcon client. Call `open()` to establish a connection
/// and authenticate in one go, or `connect()` followed by `authenticate()`.
/// The connection is released by `close()`, or when the client is dropped.
///
/// Only one command is in flight at a time; all operations take `&mut self`.
///
/// ## Example
/// ```no_run
/// use srcon::{client::Client, config::Config};
/// use std::error::Error;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn Error>> {
///     let config = Config::new("127.0.0.1", 27015, "12345");
///     let mut client = Client::open(config).await?;
///     let response = client.command("players").await?;
///
///     println!("{}", response.body());
///     client.close().await;
///     Ok(())
/// }
/// ```
pub struct Client {
    config: Config,
    stream: Option<TcpStream>,
    authenticated: bool,
}

/// Result of a single command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    id: i32,
    body: String,
    retries: u32,
}

impl Response {
    pub fn body(&self) -> &str {
        self.body.as_ref()
    }

    /// Request id echoed by the server.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// How many empty acknowledgements were skipped before the real answer.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn into_body(self) -> String {
        self.body
    }
}

impl Client {
    /// Connects and authenticates. If authentication fails the connection is
    /// closed before the error is returned.
    pub async fn open(config: Config) -> Result<Self, RconError> {
        let mut client = Self::connect(config).await?;

        if let Err(e) = client.authenticate().await {
            client.close().await;
            return Err(e);
        }

        Ok(client)
    }

    /// Opens the tcp stream without logging in.
    pub async fn connect(config: Config) -> Result<Self, RconError> {
        if config.port() == 0 {
            return Err(RconError::InvalidPort);
        }

        let stream = timeout(
            config.timeout(),
            TcpStream::connect((config.host(), config.port())),
        )
        .await?
        .map_err(RconError::Connection)?;

        info!("connected to {}", config.address());

        Ok(Client {
            config,
            stream: Some(stream),
            authenticated: false,
        })
    }

    /// Shuts the stream down. Calling this more than once is fine.
    pub async fn close(&mut self) {
        self.authenticated = false;

        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!("shutdown of {} failed: {}", self.config.address(), e);
            }
            info!("connection to {} closed", self.config.address());
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sends the password and waits for the verdict. The server signals a
    /// wrong password by answering with request id -1.
    pub async fn authenticate(&mut self) -> Result<(), RconError> {
        if !self.is_connected() {
            return Err(RconError::NotConnected);
        }
        if self.authenticated {
            return Err(RconError::AlreadyAuthenticated);
        }

        let result = self.exchange_auth().await;
        self.teardown_if_fatal(result).await
    }

    /// Run a rcon command and wait for its output.
    pub async fn command(&mut self, command: &str) -> Result<Response, RconError> {
        if !self.authenticated {
            return Err(RconError::NotAuthenticated);
        }

        let result = self.exchange_command(command).await;
        self.teardown_if_fatal(result).await
    }

    /// Closes the session when the stream is left in an unknown state, a late
    /// reply would otherwise be read as the answer to the next command.
    async fn teardown_if_fatal<T>(
        &mut self,
        result: Result<T, RconError>,
    ) -> Result<T, RconError> {
        if let Err(ref e) = result {
            if e.is_fatal() {
                warn!("closing connection to {}: {}", self.config.address(), e);
                self.close().await;
            }
        }
        result
    }

    async fn exchange_auth(&mut self) -> Result<(), RconError> {
        let auth_packet = Packet::new(PacketType::Auth, self.config.password());
        trace!("sending auth packet to server");
        self.write_packet(&auth_packet).await?;

        let response = self.read_packet().await?;
        if response.id() == AUTH_FAILED_ID {
            warn!("authentication with {} failed", self.config.address());
            return Err(RconError::AuthenticationError);
        }

        self.authenticated = true;
        info!("authorization was successful");
        Ok(())
    }

    async fn exchange_command(&mut self, command: &str) -> Result<Response, RconError> {
        let command_packet = Packet::new(PacketType::ExecCommand, command);
        trace!("sending command packet {} to server", command_packet.id());
        self.write_packet(&command_packet).await?;

        let mut response = self.read_packet().await?;

        // some servers send an empty SERVERDATA_RESPONSE (type 2) before, or
        // instead of, the actual type 0 output
        let mut retries = 0;
        while response.is_empty_ack() {
            retries += 1;
            if retries >= MAX_EMPTY_RESPONSES {
                warn!("giving up after {} empty responses", retries);
                return Err(RconError::ServerUnresponsive);
            }
            warn!(
                "received empty response (type 2), retrying ({}/{})",
                retries, MAX_EMPTY_RESPONSES
            );
            response = self.read_packet().await?;
        }

        if response.id() != command_packet.id() {
            trace!(
                "response id {} does not match request id {}",
                response.id(),
                command_packet.id()
            );
        }

        info!("server response: {}", response.body());

        Ok(Response {
            id: response.id(),
            body: response.body().to_owned(),
            retries,
        })
    }

    async fn write_packet(&mut self, packet: &Packet) -> Result<(), RconError> {
        let stream = self.stream.as_mut().ok_or(RconError::NotConnected)?;

        stream
            .write_all(&packet.pack()?)
            .await
            .map_err(RconError::Send)
    }

    async fn read_packet(&mut self) -> Result<Packet, RconError> {
        let wait = self.config.timeout();
        let stream = self.stream.as_ref().ok_or(RconError::NotConnected)?;
        let mut buf = [0u8; READ_BUFFER_SIZE];

        let read = timeout(wait, Self::read_from_stream(stream, &mut buf)).await??;
        if read == 0 {
            return Err(RconError::ConnectionClosed);
        }

        let packet = Packet::unpack(&buf[..read])?;
        trace!(
            "receive packet id {} type {} ({} bytes)",
            packet.id(),
            packet.packet_type(),
            read
        );
        Ok(packet)
    }

    async fn read_from_stream(stream: &TcpStream, buf: &mut [u8]) -> Result<usize, RconError> {
        loop {
            stream.readable().await.map_err(RconError::Receive)?;
            match stream.try_read(buf) {
                Ok(read) => return Ok(read),
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
                Err(e) => return Err(RconError::Receive(e)),
            }
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        // dropping the stream closes the socket
        if self.stream.take().is_some() {
            info!("connection to {} closed", self.config.address());
        }
    }
}
