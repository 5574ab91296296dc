//! Packet descriptions.
//!
//! Every packet type a device can report is described by an ordered list of
//! named fields; the decoder walks that description over the packet region
//! of a verified frame. Descriptions are plain data with serde derives, so a
//! registry can also live in a config file next to the firmware build it
//! matches.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::SchemaError;

/// How many packet-region bytes a field consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldLength {
    /// Exactly this many bytes.
    Fixed(usize),
    /// Bytes up to the first zero byte. The zero is consumed but not part of
    /// the value.
    NullTerminated,
    /// Whatever the packet region still holds, possibly nothing. Only valid
    /// as the last field.
    Remainder,
}

/// One named field of a packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name as the firmware documentation spells it.
    pub name: String,
    /// How many bytes the field consumes.
    pub length: FieldLength,
}

impl FieldSpec {
    /// A field of exactly `len` bytes.
    pub fn fixed(name: &str, len: usize) -> Self {
        FieldSpec {
            name: name.to_string(),
            length: FieldLength::Fixed(len),
        }
    }

    /// A field running up to the first zero byte.
    pub fn null_terminated(name: &str) -> Self {
        FieldSpec {
            name: name.to_string(),
            length: FieldLength::NullTerminated,
        }
    }

    /// A field taking everything left in the packet region.
    pub fn remainder(name: &str) -> Self {
        FieldSpec {
            name: name.to_string(),
            length: FieldLength::Remainder,
        }
    }
}

/// What to do with packet-region bytes left over after the last field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrailingBytes {
    /// Accept the response, keep the extra bytes on it, log a warning.
    #[default]
    Warn,
    /// Accept silently. For packet types that legitimately pad their region.
    Ignore,
    /// Fail the decode.
    Reject,
}

/// Description of one packet type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketSchema {
    id: u8,
    name: String,
    #[serde(default)]
    trailing: TrailingBytes,
    fields: Vec<FieldSpec>,
}

impl PacketSchema {
    /// Build a schema with the default trailing-bytes policy.
    pub fn new(id: u8, name: &str, fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        Self::with_trailing(id, name, TrailingBytes::Warn, fields)
    }

    /// Build a schema with an explicit trailing-bytes policy.
    pub fn with_trailing(
        id: u8,
        name: &str,
        trailing: TrailingBytes,
        fields: Vec<FieldSpec>,
    ) -> Result<Self, SchemaError> {
        // A remainder swallows the rest of the region, so nothing may follow.
        for (i, field) in fields.iter().enumerate() {
            if field.length == FieldLength::Remainder && i + 1 != fields.len() {
                return Err(SchemaError::RemainderNotLast {
                    packet: name.to_string(),
                    field: field.name.clone(),
                });
            }
        }
        Ok(PacketSchema {
            id,
            name: name.to_string(),
            trailing,
            fields,
        })
    }

    /// Packet-type code this schema describes.
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Packet name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Policy for bytes past the last field.
    pub fn trailing(&self) -> TrailingBytes {
        self.trailing
    }

    /// Fields in wire order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }
}

/// Immutable packet-code → schema table.
///
/// Built up front and handed to the decoder at construction; there is no way
/// to swap descriptions under a live decode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaRegistry {
    schemas: HashMap<u8, PacketSchema>,
}

impl SchemaRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        SchemaRegistry {
            schemas: HashMap::new(),
        }
    }

    /// Build a registry from a list of schemas.
    pub fn from_schemas(
        schemas: impl IntoIterator<Item = PacketSchema>,
    ) -> Result<Self, SchemaError> {
        let mut registry = SchemaRegistry::new();
        for schema in schemas {
            registry.register(schema)?;
        }
        Ok(registry)
    }

    /// Add a schema. Refuses a second schema for the same packet code.
    pub fn register(&mut self, schema: PacketSchema) -> Result<(), SchemaError> {
        if self.schemas.contains_key(&schema.id) {
            return Err(SchemaError::DuplicateId {
                packet: schema.name,
                id: schema.id,
            });
        }
        self.schemas.insert(schema.id, schema);
        Ok(())
    }

    /// Look up the schema for a packet-type code.
    pub fn get(&self, id: u8) -> Option<&PacketSchema> {
        self.schemas.get(&id)
    }

    /// Number of registered packet types.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the registry holds no schemas at all.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// The packet table of the deployed sensor firmware.
///
/// Field names and widths follow the firmware documentation. DBG_INFO pads
/// its region with context bytes that are not part of the documented layout,
/// so it alone ignores trailing bytes.
pub fn standard_registry() -> SchemaRegistry {
    let schemas = [
        PacketSchema::new(
            PKT_STATUS,
            "STATUS",
            vec![
                FieldSpec::fixed("Reboot_Reason", 1),
                FieldSpec::fixed("Serial", 12),
            ],
        ),
        PacketSchema::new(
            PKT_SDP,
            "SDP",
            vec![
                FieldSpec::fixed("SDP_version", 1),
                FieldSpec::fixed("Port1", 1),
                FieldSpec::fixed("Port2", 1),
                FieldSpec::fixed("Port3", 1),
                FieldSpec::fixed("rssi", 1),
                FieldSpec::fixed("int_temp", 2),
                FieldSpec::fixed("int_humid", 2),
                FieldSpec::fixed("battery", 2),
                FieldSpec::fixed("Port1_Reading", 2),
                FieldSpec::fixed("Port2_Reading", 2),
                FieldSpec::fixed("Port3_Reading", 2),
                FieldSpec::fixed("deviceType", 1),
                FieldSpec::fixed("Channel_ID", 1),
                FieldSpec::fixed("HW_version", 2),
                FieldSpec::fixed("FW_version", 3),
                FieldSpec::fixed("Mfg_date", 8),
                FieldSpec::fixed("Serial", 12),
                FieldSpec::fixed("SKU", 8),
                FieldSpec::fixed("UTC_Time", 4),
                FieldSpec::fixed("downLoadedVersion", 4),
                FieldSpec::fixed("tranID", 1),
                FieldSpec::fixed("flags", 1),
            ],
        ),
        PacketSchema::new(
            PKT_NDP,
            "NDP",
            vec![
                FieldSpec::fixed("ieee_address", 8),
                FieldSpec::fixed("sA", 2),
                FieldSpec::fixed("parent_ieee_address", 8),
                FieldSpec::fixed("parent_sA", 2),
                FieldSpec::fixed("rxLQI", 1),
                FieldSpec::fixed("deviceUpTime", 4),
                FieldSpec::fixed("txCounter", 1),
                FieldSpec::fixed("workingMemory", 2),
                FieldSpec::fixed("packetLoss", 2),
                FieldSpec::fixed("txFailure", 2),
                FieldSpec::fixed("bl_version", 4),
                FieldSpec::fixed("hopCount", 1),
                FieldSpec::fixed("neighbors", 35),
            ],
        ),
        PacketSchema::new(PKT_SJOIN_REQ, "SJOIN_REQ", vec![FieldSpec::fixed("XAddr", 8)]),
        PacketSchema::new(
            PKT_QUERY_NEXT_PACKAGE_REQ,
            "Query_Next_Package_REQ",
            vec![
                FieldSpec::fixed("CONTROL", 1),
                FieldSpec::fixed("MANID", 2),
                FieldSpec::fixed("PKGTYPE", 2),
                FieldSpec::fixed("FILEVER", 4),
            ],
        ),
        PacketSchema::new(
            PKT_PACKAGE_BLOCK_REQ,
            "Package_Block_REQ",
            vec![
                FieldSpec::fixed("CONTROL", 1),
                FieldSpec::fixed("MANID", 2),
                FieldSpec::fixed("PKGTYPE", 2),
                FieldSpec::fixed("FILEVER", 4),
                FieldSpec::fixed("OFFSET", 4),
                FieldSpec::fixed("MAX_BLOCK_SIZE", 1),
            ],
        ),
        PacketSchema::new(
            PKT_PACKAGE_END_REQ,
            "Package_End_REQ",
            vec![
                FieldSpec::fixed("CONTROL", 1),
                FieldSpec::fixed("MANID", 2),
                FieldSpec::fixed("PKGTYPE", 2),
                FieldSpec::fixed("FILEVER", 4),
            ],
        ),
        PacketSchema::new(PKT_TIME_REQ, "TIME_REQ", vec![FieldSpec::fixed("CMD", 0)]),
        PacketSchema::new(
            PKT_PANID,
            "PANID",
            vec![
                FieldSpec::fixed("Rotary_Switch", 1),
                FieldSpec::fixed("PANID", 2),
                FieldSpec::fixed("Security_key", 16),
            ],
        ),
        PacketSchema::new(
            PKT_REMOTE_CMD,
            "REMOTE_CMD",
            vec![FieldSpec::fixed("LENGTH", 1), FieldSpec::fixed("CMD", 60)],
        ),
        PacketSchema::new(
            PKT_ACK,
            "ACK",
            vec![FieldSpec::fixed("TRANSID", 1), FieldSpec::fixed("RESULT", 1)],
        ),
        PacketSchema::with_trailing(
            PKT_DBG_INFO,
            "DBG_INFO",
            TrailingBytes::Ignore,
            vec![FieldSpec::fixed("ERROR_CODE", 8)],
        ),
        PacketSchema::new(
            PKT_DBG_INFO_2,
            "DBG_INFO_2",
            vec![FieldSpec::fixed("ERROR_MSG", 26)],
        ),
    ];

    let mut registry = SchemaRegistry::new();
    for schema in schemas {
        let schema = schema.expect("builtin packet table is valid");
        registry
            .register(schema)
            .expect("builtin packet table is valid");
    }
    registry
}
