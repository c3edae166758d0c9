//! Scripted in-process rcon server for driving the client in tests.
#![allow(dead_code)]

use std::{net::SocketAddr, time::Duration};

use srcon::{
    packet::{Packet, AUTH_FAILED_ID},
    Config,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    task::JoinHandle,
    time::sleep,
};

pub const PASSWORD: &str = "12345";

/// What the server does with a single incoming packet.
#[derive(Clone, Debug)]
pub enum Reply {
    /// Accept the password, echoing the request id.
    AuthOk,
    /// Reject the password with the -1 sentinel.
    AuthRejected,
    /// Send these (type, body) packets, each in its own write.
    Packets(Vec<(i32, &'static str)>),
    /// Answer with a single type 0 packet, but only after a pause.
    Delayed(Duration, &'static str),
    /// Read the packet and never answer.
    Silence,
}

/// What the server saw during the connection.
#[derive(Debug, Default)]
pub struct Transcript {
    pub received: Vec<Packet>,
    /// Whether the client closed its side after the script ran out.
    pub closed_by_client: bool,
}

pub struct Server {
    addr: SocketAddr,
    handle: JoinHandle<Transcript>,
}

impl Server {
    /// Accepts exactly one connection and answers each incoming packet with
    /// the next reply in `script`.
    pub async fn start(script: Vec<Reply>) -> Server {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            Server::process(stream, script).await
        });

        Server { addr, handle }
    }

    pub fn config(&self) -> Config {
        Config::new(self.addr.ip().to_string(), self.addr.port(), PASSWORD)
    }

    pub fn config_with_password(&self, password: &str) -> Config {
        Config::new(self.addr.ip().to_string(), self.addr.port(), password)
    }

    /// Waits for the connection to end and returns what happened on it.
    pub async fn finish(self) -> Transcript {
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not see the connection end")
            .unwrap()
    }

    async fn process(mut stream: TcpStream, script: Vec<Reply>) -> Transcript {
        let mut transcript = Transcript::default();
        let mut buf = [0u8; 4096];

        for reply in script {
            let read = match stream.read(&mut buf).await {
                Ok(0) | Err(_) => {
                    transcript.closed_by_client = true;
                    return transcript;
                }
                Ok(read) => read,
            };
            let request = Packet::unpack(&buf[..read]).unwrap();
            let id = request.id();
            transcript.received.push(request);

            match reply {
                Reply::AuthOk => send(&mut stream, &Packet::with_id(id, 2, "")).await,
                Reply::AuthRejected => {
                    send(&mut stream, &Packet::with_id(AUTH_FAILED_ID, 2, "")).await
                }
                Reply::Packets(packets) => {
                    for (packet_type, body) in packets {
                        send(&mut stream, &Packet::with_id(id, packet_type, body)).await;
                        // keep frames in separate reads on the client side
                        sleep(Duration::from_millis(100)).await;
                    }
                }
                Reply::Delayed(pause, body) => {
                    sleep(pause).await;
                    send(&mut stream, &Packet::with_id(id, 0, body)).await;
                }
                Reply::Silence => {}
            }
        }

        // hold the connection until the client lets go of it
        loop {
            match stream.read(&mut buf).await {
                Ok(0) | Err(_) => {
                    transcript.closed_by_client = true;
                    return transcript;
                }
                Ok(_) => continue,
            }
        }
    }
}

// the client may already be gone when a late packet goes out
async fn send(stream: &mut TcpStream, packet: &Packet) {
    let _ = stream.write_all(&packet.pack().unwrap()).await;
    let _ = stream.flush().await;
}

/// An address nothing listens on.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}
