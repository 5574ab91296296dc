//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when decoding a verified frame into a response.
///
/// Checksum failures never reach this type: the frame assembler drops them
/// before a frame exists to decode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload is too short to hold the fixed header region.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// Packet region ended before a schema field was satisfied.
    #[error("truncated {packet} response: field '{field}' needs {needed} bytes, {available} available")]
    TruncatedFrame {
        /// Packet name from the schema.
        packet: String,
        /// Field that could not be filled.
        field: String,
        /// Bytes the field required.
        needed: usize,
        /// Bytes the packet region still held.
        available: usize,
    },

    /// Packet-type code has no schema in the registry.
    #[error("unrecognized response code: 0x{id:02X}")]
    UnrecognizedResponse {
        /// The unknown packet-type code.
        id: u8,
    },

    /// Packet-type code is one the host sends, not one a device reports.
    /// Usually means the transport is echoing host traffic back.
    #[error("received outgoing command code 0x{id:02X}; transport may be echoing host traffic")]
    UnexpectedCommandEcho {
        /// The echoed command code.
        id: u8,
    },

    /// Packet region held bytes past the last schema field and the schema
    /// rejects them.
    #[error("{packet} response carries {count} bytes past the last schema field")]
    UnexpectedTrailingBytes {
        /// Packet name from the schema.
        packet: String,
        /// How many bytes were left over.
        count: usize,
    },
}

/// Errors raised while building packet schemas or a registry of them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A remainder field swallows the rest of the packet region, so nothing
    /// may follow it.
    #[error("schema {packet}: remainder field '{field}' must be last")]
    RemainderNotLast {
        /// Packet name being defined.
        packet: String,
        /// The offending remainder field.
        field: String,
    },

    /// Two schemas claimed the same packet-type code.
    #[error("schema {packet}: packet code 0x{id:02X} is already registered")]
    DuplicateId {
        /// Packet name being registered.
        packet: String,
        /// The contested packet-type code.
        id: u8,
    },
}
