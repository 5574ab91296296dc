//! Schema-driven response decoding.
//!
//! A verified frame plus the packet registry yields a [`DecodedResponse`]:
//! the header meta-fields every packet shares, then the schema's named
//! fields in wire order. All field values are cheap slices of the frame's
//! own buffer.

use bytes::Bytes;

use crate::commands::COMMAND_IDS;
use crate::constants::ADDRESS_LEN;
use crate::error::DecodeError;
use crate::frame::{Frame, FrameLayout};
use crate::schema::{FieldLength, SchemaRegistry, TrailingBytes};
use crate::types::{hex_encode, ExtendedAddress};

/// A decoded device response: header meta plus named fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedResponse {
    /// Packet-type code from the wire.
    pub packet_id: u8,
    /// Packet name from the schema.
    pub packet_name: String,
    /// Reporting device's extended address.
    pub address: ExtendedAddress,
    /// Transaction id from the header.
    pub transaction_id: u8,
    /// Control byte from the header.
    pub control: u8,
    fields: Vec<(String, Bytes)>,
    /// Packet-region bytes past the last schema field. Empty unless the
    /// schema tolerates trailing bytes.
    pub trailing: Bytes,
}

impl DecodedResponse {
    /// Look up a field value by name.
    pub fn field(&self, name: &str) -> Option<&[u8]> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_ref())
    }

    /// Fields in wire order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }

    /// Number of decoded fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// Turns verified frames into named-field responses.
///
/// The registry and layout are fixed at construction; swapping packet
/// descriptions under a live decode is not supported.
#[derive(Debug, Clone)]
pub struct ResponseDecoder {
    registry: SchemaRegistry,
    layout: FrameLayout,
}

impl ResponseDecoder {
    /// Create a decoder over the given packet registry and frame layout.
    pub fn new(registry: SchemaRegistry, layout: FrameLayout) -> Self {
        ResponseDecoder { registry, layout }
    }

    /// The packet registry this decoder consults.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// The frame layout this decoder assumes.
    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    /// Decode one verified frame.
    pub fn decode(&self, frame: &Frame) -> Result<DecodedResponse, DecodeError> {
        let payload = &frame.payload;
        let packet_offset = self.layout.packet_offset();
        if payload.len() <= packet_offset {
            return Err(DecodeError::FrameTooShort {
                expected: packet_offset + 1,
                actual: payload.len(),
            });
        }

        let packet_id = payload[packet_offset];
        let Some(schema) = self.registry.get(packet_id) else {
            if COMMAND_IDS.contains(&packet_id) {
                return Err(DecodeError::UnexpectedCommandEcho { id: packet_id });
            }
            return Err(DecodeError::UnrecognizedResponse { id: packet_id });
        };

        let address_offset = self.layout.address_offset();
        let mut address = [0u8; ADDRESS_LEN];
        address.copy_from_slice(&payload[address_offset..address_offset + ADDRESS_LEN]);

        // Walk the schema over the bytes after the packet-type code.
        let end = payload.len();
        let mut cursor = packet_offset + 1;
        let mut fields = Vec::with_capacity(schema.fields().len());
        for spec in schema.fields() {
            let value = match spec.length {
                FieldLength::Fixed(len) => {
                    if end - cursor < len {
                        return Err(DecodeError::TruncatedFrame {
                            packet: schema.name().to_string(),
                            field: spec.name.clone(),
                            needed: len,
                            available: end - cursor,
                        });
                    }
                    let value = payload.slice(cursor..cursor + len);
                    cursor += len;
                    value
                }
                FieldLength::NullTerminated => {
                    let Some(rel) = payload[cursor..end].iter().position(|&b| b == 0) else {
                        return Err(DecodeError::TruncatedFrame {
                            packet: schema.name().to_string(),
                            field: spec.name.clone(),
                            needed: end - cursor + 1,
                            available: end - cursor,
                        });
                    };
                    let value = payload.slice(cursor..cursor + rel);
                    // Terminator consumed, excluded from the value.
                    cursor += rel + 1;
                    value
                }
                FieldLength::Remainder => {
                    let value = payload.slice(cursor..end);
                    cursor = end;
                    value
                }
            };
            fields.push((spec.name.clone(), value));
        }

        // Anything left is trailing; the schema says how sternly to treat it.
        let trailing = payload.slice(cursor..end);
        if !trailing.is_empty() {
            match schema.trailing() {
                TrailingBytes::Warn => {
                    log::warn!(
                        "{} response carries {} bytes past the last schema field: {}",
                        schema.name(),
                        trailing.len(),
                        hex_encode(&trailing)
                    );
                }
                TrailingBytes::Ignore => {}
                TrailingBytes::Reject => {
                    return Err(DecodeError::UnexpectedTrailingBytes {
                        packet: schema.name().to_string(),
                        count: trailing.len(),
                    });
                }
            }
        }

        Ok(DecodedResponse {
            packet_id,
            packet_name: schema.name().to_string(),
            address: ExtendedAddress::new(address),
            transaction_id: payload[self.layout.transaction_id_offset()],
            control: payload[self.layout.control_offset()],
            fields,
            trailing,
        })
    }
}
