//! Shared SQP protocol definitions used by both the server and the client.
//!
//! SQP is a two-step challenge/response discovery protocol: a client first
//! sends a challenge request and receives a random token, then sends a query
//! request echoing that token and receives the server state it asked for.
//! This crate holds everything both sides must agree on: packet
//! classification, the byte-exact wire layout, the server info record and
//! the protocol error taxonomy. It performs no I/O.

pub mod error;
pub mod server_info;
pub mod wire;

pub use error::QueryError;
pub use server_info::{QueryState, ServerInfo};
pub use wire::{ChallengeResponse, QueryResponse};

/// Header byte of a challenge response.
pub const CHALLENGE_HEADER: u8 = 0;
/// Header byte of query requests and query responses.
pub const QUERY_HEADER: u8 = 1;
/// A challenge request is this many leading zero bytes.
pub const CHALLENGE_PREFIX_LEN: usize = 5;
/// The only SQP version this implementation speaks.
pub const SUPPORTED_VERSION: u16 = 1;
/// Smallest well-formed query request: header, challenge, version, chunk bitmask.
pub const MIN_QUERY_LEN: usize = 8;
/// Bit in the requested-chunks bitmask selecting the server info block.
pub const CHUNK_SERVER_INFO: u8 = 0x1;

/// Returns true if the buffer is a challenge request packet.
///
/// Buffers shorter than the zero prefix never match.
pub fn is_challenge_request(buf: &[u8]) -> bool {
    buf.len() >= CHALLENGE_PREFIX_LEN && buf[..CHALLENGE_PREFIX_LEN].iter().all(|&b| b == 0)
}

/// Returns true if the buffer is a query request packet.
pub fn is_query_request(buf: &[u8]) -> bool {
    buf.first() == Some(&QUERY_HEADER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_request_detection() {
        assert!(is_challenge_request(&[0, 0, 0, 0, 0]));
        // Trailing bytes do not matter, only the prefix is inspected
        assert!(is_challenge_request(&[0, 0, 0, 0, 0, 9, 9, 9]));
        assert!(!is_challenge_request(&[1, 0, 0, 0, 0]));
        assert!(!is_challenge_request(&[0, 0, 0, 0, 1]));
    }

    #[test]
    fn test_challenge_request_short_buffers() {
        assert!(!is_challenge_request(&[]));
        assert!(!is_challenge_request(&[0]));
        assert!(!is_challenge_request(&[0, 0, 0, 0]));
    }

    #[test]
    fn test_query_request_detection() {
        assert!(is_query_request(&[1]));
        assert!(is_query_request(&[1, 0xAA, 0xBB, 0xCC, 0xDD, 0, 1, 1]));
        assert!(!is_query_request(&[0, 1, 1, 1]));
        assert!(!is_query_request(&[2]));
        assert!(!is_query_request(&[]));
    }

    #[test]
    fn test_classification_is_disjoint() {
        // A packet can never satisfy both predicates
        let challenge = [0u8; 8];
        let query = [1u8, 0, 0, 0, 0, 0, 1, 1];
        assert!(is_challenge_request(&challenge) && !is_query_request(&challenge));
        assert!(is_query_request(&query) && !is_challenge_request(&query));
    }
}
