//! # SQP Query Client Library
//!
//! Discovery-side counterpart of the SQP server: performs the two-packet
//! challenge/query handshake against a game server's query port and decodes
//! the advertised server state.
//!
//! Rejected or spoof-suspect queries are answered with silence by SQP
//! servers, so from this side every protocol violation surfaces as a
//! receive timeout rather than an error reply.

pub mod network;

pub use network::{Client, ClientError, QueryResult};
