use rand::Rng;

use crate::error::RconError;

/// Packet roles as numbered on the wire. `AuthResponse` and `ExecCommand`
/// share the value 2, so decoded packets keep the raw code around instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    // SERVERDATA_AUTH
    Auth,
    // SERVERDATA_AUTH_RESPONSE
    AuthResponse,
    // SERVERDATA_EXECCOMMAND
    ExecCommand,
    // SERVERDATA_RESPONSE_VALUE
    ResponseValue,
}

impl PacketType {
    pub fn code(&self) -> i32 {
        match self {
            PacketType::Auth => 3,
            PacketType::AuthResponse => 2,
            PacketType::ExecCommand => 2,
            PacketType::ResponseValue => 0,
        }
    }
}

/// Request id the server uses to tell us the password was wrong.
pub const AUTH_FAILED_ID: i32 = -1;

/// Size of the `size`, `id` and `type` fields together.
pub const HEADER_SIZE: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    id: i32,
    packet_type: i32,
    body: String,
}

impl Packet {
    pub const BASE_PACKAGE_SIZE: i32 = 10;

    /// Creates an outgoing packet with a fresh random id in `[1, i32::MAX)`.
    pub fn new(packet_type: PacketType, body: &str) -> Self {
        let id = rand::thread_rng().gen_range(1..i32::MAX);
        Self::with_id(id, packet_type.code(), body)
    }

    pub fn with_id(id: i32, packet_type: i32, body: &str) -> Self {
        Packet {
            id,
            packet_type,
            body: body.to_owned(),
        }
    }

    /// Parses the first frame in `incoming`. Anything after the declared
    /// frame length is ignored.
    pub fn unpack(incoming: &[u8]) -> Result<Self, RconError> {
        if incoming.len() < HEADER_SIZE {
            return Err(RconError::PacketTooShort(incoming.len()));
        }

        let size = read_i32(&incoming[0..4]);
        let id = read_i32(&incoming[4..8]);
        let packet_type = read_i32(&incoming[8..12]);

        if size < Self::BASE_PACKAGE_SIZE {
            return Err(RconError::InvalidPacketSize(size));
        }

        // a frame bigger than what we read gets truncated to what we have
        let end = (size as usize + 4).min(incoming.len());
        let body = std::str::from_utf8(&incoming[HEADER_SIZE..end])?
            .trim_end_matches(|c: char| c == '\0' || c.is_whitespace());

        Ok(Packet::with_id(id, packet_type, body))
    }

    // Since the only one of these values that can change in length is the body,
    // an easy way to calculate the size of a packet is to find the byte-length
    // of the packet body, then add 10 to it.
    /// Saturates at `i32::MAX` for bodies that cannot be framed, `pack()`
    /// refuses those.
    pub fn size(&self) -> i32 {
        frame_size(self.body.len()).unwrap_or(i32::MAX)
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn packet_type(&self) -> i32 {
        self.packet_type
    }

    pub fn is(&self, packet_type: PacketType) -> bool {
        self.packet_type == packet_type.code()
    }

    pub fn body(&self) -> &str {
        self.body.as_ref()
    }

    /// The spurious acknowledgement some servers send ahead of a real
    /// command response.
    pub fn is_empty_ack(&self) -> bool {
        self.is(PacketType::ExecCommand) && self.body.is_empty()
    }

    pub fn pack(&self) -> Result<Vec<u8>, RconError> {
        let size =
            frame_size(self.body.len()).ok_or(RconError::PacketTooLarge(self.body.len()))?;

        // Size, ID, Type, Body, Terminator
        let mut payload = Vec::<u8>::new();
        payload.extend_from_slice(&size.to_le_bytes());
        payload.extend_from_slice(&self.id().to_le_bytes());
        payload.extend_from_slice(&self.packet_type().to_le_bytes());
        payload.extend_from_slice(self.body().as_bytes());
        // null terminate the body, then null terminate the entire package
        payload.extend_from_slice(&[0u8, 0u8]);
        Ok(payload)
    }
}

/// Value of the size field for a body of `body_len` bytes, if it fits.
fn frame_size(body_len: usize) -> Option<i32> {
    i32::try_from(body_len)
        .ok()?
        .checked_add(Packet::BASE_PACKAGE_SIZE)
}

fn read_i32(bytes: &[u8]) -> i32 {
    let mut field = [0u8; 4];
    field.copy_from_slice(bytes);
    i32::from_le_bytes(field)
}
