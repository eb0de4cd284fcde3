//! # SQP Query Server Library
//!
//! Server-side implementation of the SQP discovery protocol: issuing
//! anti-spoofing challenge tokens, validating query packets against them and
//! serializing responses that advertise the current server state.
//!
//! ## Handshake
//!
//! Discovery clients go through a two-packet exchange:
//!
//! 1. The client sends a challenge request (five zero bytes) and receives a
//!    random 32-bit token bound to its source address.
//! 2. The client sends a query request echoing the token. The server
//!    consumes the token (single use), validates the echoed value and the
//!    protocol version, and replies with the requested data chunks.
//!
//! The token exchange forces a client to prove it can receive traffic at its
//! claimed source address before the server spends bytes on a real answer,
//! which keeps the responder from amplifying spoofed traffic.
//!
//! ## Silence on rejection
//!
//! Invalid packets never get a reply of any kind: unknown shapes, queries
//! without an outstanding challenge, short packets, token mismatches and
//! unsupported versions are all dropped without acknowledgement. Answering
//! any of them would let an attacker probe for valid tokens or bounce
//! traffic at forged addresses.
//!
//! ## Module Organization
//!
//! - [`challenge`]: sharded per-address store of one-time tokens.
//! - [`responder`]: packet classification, validation and reply building.
//!   Pure computation plus one shared-map access; safe to call from any
//!   number of concurrent workers.
//! - [`state`]: lock-free snapshot cell the game loop publishes the current
//!   [`shared::QueryState`] into.
//! - [`network`]: tokio UDP transport running the worker loops. Only this
//!   layer touches sockets, and it sends bytes exclusively for accepted
//!   packets.

pub mod challenge;
pub mod network;
pub mod responder;
pub mod state;
