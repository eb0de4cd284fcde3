//! SQP query client: the challenge/query handshake over UDP.

use bytes::{Buf, BufMut, BytesMut};
use log::debug;
use shared::wire::{
    self, CHALLENGE_RESPONSE_LEN, PAYLOAD_LEN_OFFSET, QUERY_RESPONSE_PREFIX_LEN,
    SERVER_INFO_LEN_FIELD,
};
use shared::{
    ServerInfo, CHALLENGE_HEADER, CHALLENGE_PREFIX_LEN, CHUNK_SERVER_INFO, MIN_QUERY_LEN,
    QUERY_HEADER, SUPPORTED_VERSION,
};
use std::time::Duration;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time::timeout;

/// Errors a query attempt can produce.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Nothing arrived within the receive timeout. Servers answer invalid
    /// packets with silence, so this is also what a rejected query looks
    /// like from the outside.
    #[error("timed out waiting for server")]
    Timeout,

    /// The reply arrived but did not look like the expected packet.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(&'static str),

    /// The reply had the right shape but its payload would not decode.
    #[error("malformed response: {0}")]
    Decode(#[from] shared::QueryError),
}

/// Decoded outcome of one query handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub challenge: u32,
    pub version: u16,
    pub payload_length: u16,
    pub server_info: Option<ServerInfo>,
}

/// SQP query client bound to one server address.
pub struct Client {
    socket: UdpSocket,
    recv_timeout: Duration,
}

impl Client {
    /// Binds an ephemeral local socket and connects it to the server.
    pub async fn connect(server: &str, recv_timeout: Duration) -> Result<Self, ClientError> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(server).await?;

        Ok(Self {
            socket,
            recv_timeout,
        })
    }

    /// Runs the full challenge/query handshake once.
    pub async fn query(&self, want_server_info: bool) -> Result<QueryResult, ClientError> {
        let challenge = self.request_challenge().await?;
        debug!("Server issued challenge {:#010x}", challenge);

        let request = build_query_request(challenge, want_server_info);
        self.socket.send(&request).await?;

        let mut buf = [0u8; 2048];
        let len = self.recv(&mut buf).await?;
        decode_query_response(&buf[..len], challenge)
    }

    async fn request_challenge(&self) -> Result<u32, ClientError> {
        self.socket.send(&[0u8; CHALLENGE_PREFIX_LEN]).await?;

        let mut buf = [0u8; 64];
        let len = self.recv(&mut buf).await?;
        if len < CHALLENGE_RESPONSE_LEN {
            return Err(ClientError::UnexpectedResponse(
                "challenge response too short",
            ));
        }
        if buf[0] != CHALLENGE_HEADER {
            return Err(ClientError::UnexpectedResponse(
                "bad challenge response header",
            ));
        }

        Ok(wire::read_challenge(&buf[..len]))
    }

    async fn recv(&self, buf: &mut [u8]) -> Result<usize, ClientError> {
        match timeout(self.recv_timeout, self.socket.recv(buf)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ClientError::Timeout),
        }
    }
}

/// Builds the 8-byte query request echoing `challenge`.
pub fn build_query_request(challenge: u32, want_server_info: bool) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(MIN_QUERY_LEN);
    buf.put_u8(QUERY_HEADER);
    buf.put_u32(challenge);
    buf.put_u16(SUPPORTED_VERSION);
    buf.put_u8(if want_server_info { CHUNK_SERVER_INFO } else { 0 });
    buf.to_vec()
}

/// Validates a query response against the expected challenge and decodes it.
pub fn decode_query_response(
    buf: &[u8],
    expected_challenge: u32,
) -> Result<QueryResult, ClientError> {
    if buf.len() < QUERY_RESPONSE_PREFIX_LEN {
        return Err(ClientError::UnexpectedResponse("query response too short"));
    }
    if buf[0] != QUERY_HEADER {
        return Err(ClientError::UnexpectedResponse(
            "bad query response header",
        ));
    }
    let challenge = wire::read_challenge(buf);
    if challenge != expected_challenge {
        return Err(ClientError::UnexpectedResponse("challenge not echoed"));
    }
    let version = wire::read_version(buf);
    if version != SUPPORTED_VERSION {
        return Err(ClientError::UnexpectedResponse("unsupported version"));
    }

    let mut tail = &buf[PAYLOAD_LEN_OFFSET..];
    let payload_length = tail.get_u16();
    let server_info_length = tail.get_u32();

    let server_info = if payload_length == 0 && server_info_length == 0 {
        None
    } else {
        if u32::from(payload_length) != server_info_length + SERVER_INFO_LEN_FIELD {
            return Err(ClientError::UnexpectedResponse(
                "inconsistent payload length",
            ));
        }
        if tail.remaining() < server_info_length as usize {
            return Err(ClientError::UnexpectedResponse("truncated server info"));
        }
        Some(ServerInfo::decode(&mut tail)?)
    };

    Ok(QueryResult {
        challenge,
        version,
        payload_length,
        server_info,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{QueryResponse, QueryState};

    fn encoded_response(challenge: u32, info: Option<ServerInfo>) -> Vec<u8> {
        let mut buf = BytesMut::new();
        QueryResponse {
            challenge,
            version: SUPPORTED_VERSION,
            current_packet: 0,
            last_packet: 0,
            server_info: info,
        }
        .encode(&mut buf)
        .unwrap();
        buf.to_vec()
    }

    fn test_info() -> ServerInfo {
        ServerInfo::from_state(&QueryState {
            current_players: 2,
            max_players: 8,
            server_name: "client test".to_string(),
            game_type: "race".to_string(),
            map_name: "oval".to_string(),
            port: 31000,
        })
    }

    #[test]
    fn test_query_request_layout() {
        let request = build_query_request(0x1122_3344, true);
        assert_eq!(
            request,
            vec![0x01, 0x11, 0x22, 0x33, 0x44, 0x00, 0x01, 0x01]
        );

        let without_info = build_query_request(0x1122_3344, false);
        assert_eq!(without_info[7], 0x00);
        assert_eq!(without_info.len(), MIN_QUERY_LEN);
    }

    #[test]
    fn test_decode_response_without_server_info() {
        let result = decode_query_response(&encoded_response(42, None), 42).unwrap();

        assert_eq!(result.challenge, 42);
        assert_eq!(result.version, SUPPORTED_VERSION);
        assert_eq!(result.payload_length, 0);
        assert_eq!(result.server_info, None);
    }

    #[test]
    fn test_decode_response_with_server_info() {
        let info = test_info();
        let info_len = info.size().unwrap();
        let result =
            decode_query_response(&encoded_response(7, Some(info.clone())), 7).unwrap();

        assert_eq!(u32::from(result.payload_length), info_len + 4);
        assert_eq!(result.server_info, Some(info));
    }

    #[test]
    fn test_decode_rejects_wrong_challenge() {
        let err = decode_query_response(&encoded_response(7, None), 8).unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedResponse(_)));
    }

    #[test]
    fn test_decode_rejects_wrong_header() {
        let mut reply = encoded_response(7, None);
        reply[0] = 0x02;
        assert!(decode_query_response(&reply, 7).is_err());
    }

    #[test]
    fn test_decode_rejects_short_reply() {
        let reply = encoded_response(7, None);
        assert!(decode_query_response(&reply[..QUERY_RESPONSE_PREFIX_LEN - 1], 7).is_err());
    }

    #[test]
    fn test_decode_rejects_truncated_server_info() {
        let reply = encoded_response(7, Some(test_info()));
        let cut = reply.len() - 3;
        assert!(decode_query_response(&reply[..cut], 7).is_err());
    }

    #[test]
    fn test_decode_rejects_inconsistent_lengths() {
        let mut reply = encoded_response(7, Some(test_info()));
        // Corrupt the payload length field
        reply[PAYLOAD_LEN_OFFSET] = 0xFF;
        reply[PAYLOAD_LEN_OFFSET + 1] = 0xFF;
        assert!(matches!(
            decode_query_response(&reply, 7),
            Err(ClientError::UnexpectedResponse("inconsistent payload length"))
        ));
    }
}
