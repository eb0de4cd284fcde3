//! Protocol error taxonomy.

use thiserror::Error;

/// Errors produced while classifying, validating or answering an SQP packet.
///
/// Every variant suppresses the reply: the transport layer must not send any
/// bytes back when `respond` fails, so that spoofed or malformed traffic is
/// never acknowledged and cannot be used to probe for valid tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The packet matched neither the challenge nor the query shape.
    #[error("unsupported query")]
    UnsupportedQuery,

    /// A query arrived from an address with no outstanding challenge.
    #[error("no challenge")]
    NoChallenge,

    /// The packet is too short to contain the required fields.
    #[error("packet not long enough")]
    MalformedPacket,

    /// The echoed challenge does not match the token issued to this address.
    #[error("challenge mismatch")]
    ChallengeMismatch,

    /// The client speaks an SQP version other than 1.
    #[error("unsupported sqp version: {0}")]
    UnsupportedVersion(u16),

    /// A response record could not be serialized. Indicates a defect or an
    /// oversized server state, never client input.
    #[error("encoding failure: {0}")]
    EncodingFailure(&'static str),
}
