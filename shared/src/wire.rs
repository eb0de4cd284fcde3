//! Byte-exact encoding of SQP packets.
//!
//! The layout is a fixed table of (offset, size) protocol constants rather
//! than a general-purpose parser. Every multi-byte integer is big-endian,
//! on the way in and on the way out.

use bytes::{Buf, BufMut};

use crate::error::QueryError;
use crate::server_info::ServerInfo;
use crate::{CHALLENGE_HEADER, QUERY_HEADER};

/// Byte offset of the challenge field in query requests and both responses.
pub const CHALLENGE_OFFSET: usize = 1;
/// Byte offset of the protocol version field.
pub const VERSION_OFFSET: usize = 5;
/// Byte offset of the requested-chunks bitmask in a query request.
pub const CHUNKS_OFFSET: usize = 7;
/// Byte offset of the payload length field in a query response.
pub const PAYLOAD_LEN_OFFSET: usize = 9;
/// Byte offset of the server info length field in a query response.
pub const SERVER_INFO_LEN_OFFSET: usize = 11;
/// Encoded length of a challenge response: header plus token.
pub const CHALLENGE_RESPONSE_LEN: usize = 5;
/// Fixed part of a query response, up to the start of the server info block.
pub const QUERY_RESPONSE_PREFIX_LEN: usize = 15;
/// Size of the server info length field, which counts toward the payload length.
pub const SERVER_INFO_LEN_FIELD: u32 = 4;

/// Reads the big-endian challenge value of a query request.
///
/// Callers must have checked the buffer against
/// [`MIN_QUERY_LEN`](crate::MIN_QUERY_LEN) first.
pub fn read_challenge(buf: &[u8]) -> u32 {
    (&buf[CHALLENGE_OFFSET..]).get_u32()
}

/// Reads the big-endian protocol version of a query request.
///
/// Same length precondition as [`read_challenge`].
pub fn read_version(buf: &[u8]) -> u16 {
    (&buf[VERSION_OFFSET..]).get_u16()
}

/// Reads the requested-chunks bitmask of a query request.
///
/// Same length precondition as [`read_challenge`].
pub fn read_requested_chunks(buf: &[u8]) -> u8 {
    buf[CHUNKS_OFFSET]
}

/// Reply to a challenge request: a zero header byte followed by the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeResponse {
    pub challenge: u32,
}

impl ChallengeResponse {
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u8(CHALLENGE_HEADER);
        dst.put_u32(self.challenge);
    }
}

/// Reply to a query request.
///
/// Responses never span multiple datagrams, so both packet counters stay at
/// zero. The server info block is present only when the client requested it;
/// otherwise the payload and server info lengths are written as zero and
/// nothing follows them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResponse {
    pub challenge: u32,
    pub version: u16,
    pub current_packet: u8,
    pub last_packet: u8,
    pub server_info: Option<ServerInfo>,
}

impl QueryResponse {
    /// Serializes the response field by field in declaration order.
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<(), QueryError> {
        let (payload_len, server_info_len) = match &self.server_info {
            Some(info) => {
                let info_len = info.size()?;
                let payload = u16::try_from(info_len + SERVER_INFO_LEN_FIELD)
                    .map_err(|_| QueryError::EncodingFailure("payload exceeds u16 range"))?;
                (payload, info_len)
            }
            None => (0, 0),
        };

        dst.put_u8(QUERY_HEADER);
        dst.put_u32(self.challenge);
        dst.put_u16(self.version);
        dst.put_u8(self.current_packet);
        dst.put_u8(self.last_packet);
        dst.put_u16(payload_len);
        dst.put_u32(server_info_len);
        if let Some(info) = &self.server_info {
            info.encode(dst)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server_info::QueryState;
    use crate::SUPPORTED_VERSION;
    use bytes::BytesMut;

    #[test]
    fn test_challenge_response_layout() {
        let mut buf = BytesMut::new();
        ChallengeResponse {
            challenge: 0xDEAD_BEEF,
        }
        .encode(&mut buf);

        assert_eq!(&buf[..], &[0x00, 0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(buf.len(), CHALLENGE_RESPONSE_LEN);
    }

    #[test]
    fn test_query_response_layout_without_server_info() {
        let mut buf = BytesMut::new();
        QueryResponse {
            challenge: 0x0102_0304,
            version: SUPPORTED_VERSION,
            current_packet: 0,
            last_packet: 0,
            server_info: None,
        }
        .encode(&mut buf)
        .unwrap();

        #[rustfmt::skip]
        assert_eq!(
            &buf[..],
            &[
                0x01,                   // header
                0x01, 0x02, 0x03, 0x04, // challenge
                0x00, 0x01,             // version
                0x00,                   // current packet number
                0x00,                   // last packet number
                0x00, 0x00,             // payload length
                0x00, 0x00, 0x00, 0x00, // server info length
            ]
        );
    }

    #[test]
    fn test_query_response_layout_with_server_info() {
        let info = ServerInfo::from_state(&QueryState {
            current_players: 3,
            max_players: 12,
            server_name: "sq".to_string(),
            game_type: "dm".to_string(),
            map_name: "m1".to_string(),
            port: 4000,
        });
        let info_len = info.size().unwrap();

        let mut buf = BytesMut::new();
        QueryResponse {
            challenge: 0xCAFE_F00D,
            version: SUPPORTED_VERSION,
            current_packet: 0,
            last_packet: 0,
            server_info: Some(info.clone()),
        }
        .encode(&mut buf)
        .unwrap();

        assert_eq!(buf.len(), QUERY_RESPONSE_PREFIX_LEN + info_len as usize);
        assert_eq!(buf[0], QUERY_HEADER);
        assert_eq!(read_challenge(&buf), 0xCAFE_F00D);
        assert_eq!(read_version(&buf), SUPPORTED_VERSION);

        let payload_len = u16::from_be_bytes([buf[PAYLOAD_LEN_OFFSET], buf[PAYLOAD_LEN_OFFSET + 1]]);
        assert_eq!(u32::from(payload_len), info_len + SERVER_INFO_LEN_FIELD);

        let encoded_info_len = u32::from_be_bytes([
            buf[SERVER_INFO_LEN_OFFSET],
            buf[SERVER_INFO_LEN_OFFSET + 1],
            buf[SERVER_INFO_LEN_OFFSET + 2],
            buf[SERVER_INFO_LEN_OFFSET + 3],
        ]);
        assert_eq!(encoded_info_len, info_len);

        let mut tail = &buf[QUERY_RESPONSE_PREFIX_LEN..];
        assert_eq!(ServerInfo::decode(&mut tail).unwrap(), info);
    }

    #[test]
    fn test_query_response_oversized_field_is_an_error() {
        let mut info = ServerInfo::default();
        info.map_name = "x".repeat(300);

        let mut buf = BytesMut::new();
        let err = QueryResponse {
            challenge: 1,
            version: SUPPORTED_VERSION,
            current_packet: 0,
            last_packet: 0,
            server_info: Some(info),
        }
        .encode(&mut buf)
        .unwrap_err();

        assert!(matches!(err, QueryError::EncodingFailure(_)));
    }

    #[test]
    fn test_request_field_readers() {
        // header, challenge, version, chunk bitmask
        let buf = [0x01, 0xAA, 0xBB, 0xCC, 0xDD, 0x00, 0x01, 0x03];
        assert_eq!(read_challenge(&buf), 0xAABB_CCDD);
        assert_eq!(read_version(&buf), 1);
        assert_eq!(read_requested_chunks(&buf), 0x03);
    }
}
