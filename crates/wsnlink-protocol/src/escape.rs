//! Byte escaping for the serial link.
//!
//! When escaping is switched on, reserved bytes inside a frame body travel as
//! a two-byte pair: the escape marker followed by the byte XORed with 0x20.
//! The start marker itself always goes out bare, which is what makes it safe
//! to hunt for in a noisy stream.
//!
//! The deployed sensor firmware runs with escaping switched off and relies on
//! the length byte and checksum instead, so the trigger set is configuration
//! rather than a constant. An empty set disables the transform entirely.

use serde::{Deserialize, Serialize};

use crate::constants::{ESCAPE_MARKER, ESCAPE_XOR, FRAME_START, XOFF, XON};

/// Which bytes are escaped on the wire.
///
/// When the trigger set is non-empty it must contain the marker itself,
/// otherwise a data byte equal to the marker corrupts the stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscapeConfig {
    /// Byte that introduces an escape pair.
    pub marker: u8,
    /// Bytes that must not appear bare inside a frame body. Empty switches
    /// escaping off.
    pub triggers: Vec<u8>,
}

impl Default for EscapeConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

impl EscapeConfig {
    /// Escaping switched off: every byte passes through untouched.
    pub fn disabled() -> Self {
        EscapeConfig {
            marker: ESCAPE_MARKER,
            triggers: Vec::new(),
        }
    }

    /// The classic API-mode set: start marker, escape marker, XON, XOFF.
    pub fn standard() -> Self {
        EscapeConfig {
            marker: ESCAPE_MARKER,
            triggers: vec![FRAME_START, ESCAPE_MARKER, XON, XOFF],
        }
    }

    /// Whether any escaping happens at all.
    pub fn is_enabled(&self) -> bool {
        !self.triggers.is_empty()
    }

    fn is_trigger(&self, byte: u8) -> bool {
        self.triggers.contains(&byte)
    }
}

/// Escape a payload for transmission.
///
/// Every trigger byte becomes `[marker, byte ^ 0x20]`; everything else passes
/// through. With escaping disabled this is a plain copy.
pub fn escape(payload: &[u8], config: &EscapeConfig) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len());
    for &byte in payload {
        if config.is_trigger(byte) {
            out.push(config.marker);
            out.push(byte ^ ESCAPE_XOR);
        } else {
            out.push(byte);
        }
    }
    out
}

/// Incremental unescaper for the receive path.
///
/// Feed raw wire bytes one at a time; logical bytes come out. A marker byte
/// emits nothing and flags the byte after it for the XOR. The flag is the
/// only state, so an unescaper can sit inside a frame assembler and be reset
/// whenever a frame is finalized or discarded.
#[derive(Debug, Clone)]
pub struct Unescaper {
    config: EscapeConfig,
    pending: bool,
}

impl Unescaper {
    /// Create an unescaper for the given configuration.
    pub fn new(config: EscapeConfig) -> Self {
        Unescaper {
            config,
            pending: false,
        }
    }

    /// Feed one raw wire byte. Returns the logical byte it completes, if any.
    pub fn feed(&mut self, raw: u8) -> Option<u8> {
        if !self.config.is_enabled() {
            return Some(raw);
        }
        if self.pending {
            self.pending = false;
            return Some(raw ^ ESCAPE_XOR);
        }
        if raw == self.config.marker {
            self.pending = true;
            return None;
        }
        Some(raw)
    }

    /// Drop any half-consumed escape pair.
    pub fn reset(&mut self) {
        self.pending = false;
    }
}
