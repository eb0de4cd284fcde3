//! Classification and answering of incoming SQP datagrams.

use bytes::BytesMut;
use log::debug;
use shared::wire::{
    self, ChallengeResponse, QueryResponse, CHALLENGE_RESPONSE_LEN, QUERY_RESPONSE_PREFIX_LEN,
};
use shared::{
    is_challenge_request, is_query_request, QueryError, ServerInfo, CHUNK_SERVER_INFO,
    MIN_QUERY_LEN, SUPPORTED_VERSION,
};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::challenge::ChallengeStore;
use crate::state::SharedQueryState;

/// Answers SQP datagrams.
///
/// Every call classifies the packet, validates it against the token issued
/// to the sender and, when everything checks out, returns the reply bytes.
/// On `Err` the transport must not send anything back: invalid, spoofed or
/// mismatched traffic gets silence, never an acknowledgement. Apart from the
/// challenge map there is no per-client state, so the responder can be
/// driven concurrently from any number of workers.
pub struct QueryResponder {
    challenges: ChallengeStore,
    state: Arc<SharedQueryState>,
}

impl QueryResponder {
    pub fn new(state: Arc<SharedQueryState>) -> Self {
        Self {
            challenges: ChallengeStore::new(),
            state,
        }
    }

    /// Handles one datagram from `client` and returns the bytes to send back.
    pub fn respond(&self, client: SocketAddr, buf: &[u8]) -> Result<Vec<u8>, QueryError> {
        if is_challenge_request(buf) {
            return self.handle_challenge(client);
        }
        if is_query_request(buf) {
            return self.handle_query(client, buf);
        }
        Err(QueryError::UnsupportedQuery)
    }

    fn handle_challenge(&self, client: SocketAddr) -> Result<Vec<u8>, QueryError> {
        let challenge = self.challenges.issue(client);
        debug!("Issued challenge {:#010x} to {}", challenge, client);

        let mut buf = BytesMut::with_capacity(CHALLENGE_RESPONSE_LEN);
        ChallengeResponse { challenge }.encode(&mut buf);
        Ok(buf.to_vec())
    }

    fn handle_query(&self, client: SocketAddr, buf: &[u8]) -> Result<Vec<u8>, QueryError> {
        // A query burns the stored token whether or not it validates
        let expected = self
            .challenges
            .consume(&client)
            .ok_or(QueryError::NoChallenge)?;

        if buf.len() < MIN_QUERY_LEN {
            return Err(QueryError::MalformedPacket);
        }
        if wire::read_challenge(buf) != expected {
            return Err(QueryError::ChallengeMismatch);
        }
        let version = wire::read_version(buf);
        if version != SUPPORTED_VERSION {
            return Err(QueryError::UnsupportedVersion(version));
        }

        let wants_server_info = wire::read_requested_chunks(buf) & CHUNK_SERVER_INFO != 0;
        let server_info = wants_server_info.then(|| ServerInfo::from_state(&self.state.snapshot()));

        let mut out = BytesMut::with_capacity(QUERY_RESPONSE_PREFIX_LEN);
        QueryResponse {
            challenge: expected,
            version: SUPPORTED_VERSION,
            current_packet: 0,
            last_packet: 0,
            server_info,
        }
        .encode(&mut out)?;

        Ok(out.to_vec())
    }
}
