//! Server state records and their SQP wire form.

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Live state of the game server as seen by discovery queries.
///
/// The surrounding service keeps one of these current (player joins and
/// leaves, map rotation) and the responder snapshots it once per answered
/// query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    pub current_players: i32,
    pub max_players: i32,
    pub server_name: String,
    pub game_type: String,
    pub map_name: String,
    pub port: u16,
}

/// The SQP v1 server info chunk.
///
/// Wire form, in order: current players (u16), max players (u16), server
/// name, game type, build id and map name (each a single length byte
/// followed by that many UTF-8 bytes), then the game port (u16). All
/// integers big-endian.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub current_players: u16,
    pub max_players: u16,
    pub server_name: String,
    pub game_type: String,
    pub build_id: String,
    pub map_name: String,
    pub port: u16,
}

// Player counts, four string length prefixes and the port.
const FIXED_FIELDS_LEN: u32 = 10;

impl ServerInfo {
    /// Builds the wire record from a live state snapshot.
    ///
    /// Player counts are clamped into u16 range rather than wrapped. The
    /// build id is not part of the snapshot and stays empty.
    pub fn from_state(state: &QueryState) -> Self {
        Self {
            current_players: clamp_players(state.current_players),
            max_players: clamp_players(state.max_players),
            server_name: state.server_name.clone(),
            game_type: state.game_type.clone(),
            build_id: String::new(),
            map_name: state.map_name.clone(),
            port: state.port,
        }
    }

    /// Number of bytes the record occupies on the wire, computable before
    /// serialization. Fails if a string field cannot fit its length byte.
    pub fn size(&self) -> Result<u32, QueryError> {
        let mut total = FIXED_FIELDS_LEN;
        for (value, oversized) in self.strings() {
            if value.len() > usize::from(u8::MAX) {
                return Err(QueryError::EncodingFailure(oversized));
            }
            total += value.len() as u32;
        }
        Ok(total)
    }

    /// Serializes the record field by field.
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<(), QueryError> {
        dst.put_u16(self.current_players);
        dst.put_u16(self.max_players);
        for (value, oversized) in self.strings() {
            put_string(dst, value, oversized)?;
        }
        dst.put_u16(self.port);
        Ok(())
    }

    /// Deserializes a record, failing on truncated input. Non-UTF-8 string
    /// bytes are replaced rather than rejected.
    pub fn decode(src: &mut impl Buf) -> Result<Self, QueryError> {
        if src.remaining() < 4 {
            return Err(QueryError::MalformedPacket);
        }
        let current_players = src.get_u16();
        let max_players = src.get_u16();
        let server_name = get_string(src)?;
        let game_type = get_string(src)?;
        let build_id = get_string(src)?;
        let map_name = get_string(src)?;
        if src.remaining() < 2 {
            return Err(QueryError::MalformedPacket);
        }
        let port = src.get_u16();

        Ok(Self {
            current_players,
            max_players,
            server_name,
            game_type,
            build_id,
            map_name,
            port,
        })
    }

    fn strings(&self) -> [(&str, &'static str); 4] {
        [
            (&self.server_name, "server name longer than 255 bytes"),
            (&self.game_type, "game type longer than 255 bytes"),
            (&self.build_id, "build id longer than 255 bytes"),
            (&self.map_name, "map name longer than 255 bytes"),
        ]
    }
}

fn clamp_players(count: i32) -> u16 {
    count.clamp(0, i32::from(u16::MAX)) as u16
}

fn put_string(dst: &mut impl BufMut, value: &str, oversized: &'static str) -> Result<(), QueryError> {
    let bytes = value.as_bytes();
    let len = u8::try_from(bytes.len()).map_err(|_| QueryError::EncodingFailure(oversized))?;
    dst.put_u8(len);
    dst.put_slice(bytes);
    Ok(())
}

fn get_string(src: &mut impl Buf) -> Result<String, QueryError> {
    if !src.has_remaining() {
        return Err(QueryError::MalformedPacket);
    }
    let len = usize::from(src.get_u8());
    if src.remaining() < len {
        return Err(QueryError::MalformedPacket);
    }
    let mut bytes = vec![0u8; len];
    src.copy_to_slice(&mut bytes);
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
