//! Commands the host sends back to devices.
//!
//! Devices drive every exchange: they ask for the time, for join approval,
//! or for pieces of an update package, and the host answers with one of
//! these. Multi-byte fields travel big-endian.

use crate::constants::*;
use crate::escape::EscapeConfig;
use crate::frame::{encode_frame, FrameLayout};
use crate::types::ExtendedAddress;

/// Every packet-type code the host may emit. The receive path uses this set
/// to tell a command echo from an unknown response.
pub const COMMAND_IDS: &[u8] = &[
    CMD_TIME_SYNC,
    CMD_JOIN_APPROVAL,
    CMD_PACKAGE_INFO,
    CMD_PACKAGE_BLOCK,
    CMD_PACKAGE_END,
];

/// Commands that can be sent to a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Answer a TIME_REQ with the current UTC time.
    TimeSync {
        /// Seconds since the Unix epoch.
        utc_time: u32,
    },

    /// Approve a pending secure join request.
    JoinApproval {
        /// Extended address the device presented in its SJOIN_REQ.
        address: ExtendedAddress,
    },

    /// Describe the package available for download.
    PackageInfo {
        /// Control bits echoed from the request.
        control: u8,
        /// Manufacturer id of the package.
        manufacturer_id: u16,
        /// Package type code.
        package_type: u16,
        /// File version of the offered package.
        file_version: u32,
        /// Total package size in bytes.
        total_size: u32,
    },

    /// One block of the package image.
    PackageBlock {
        /// Control bits echoed from the request.
        control: u8,
        /// Manufacturer id of the package.
        manufacturer_id: u16,
        /// Package type code.
        package_type: u16,
        /// File version of the package being served.
        file_version: u32,
        /// Byte offset of this block within the image.
        offset: u32,
        /// Block payload.
        data: Vec<u8>,
    },

    /// Confirm the end of a package transfer.
    PackageEnd {
        /// Control bits echoed from the request.
        control: u8,
        /// Manufacturer id of the package.
        manufacturer_id: u16,
        /// Package type code.
        package_type: u16,
        /// File version the device just finished downloading.
        file_version: u32,
    },
}

impl Command {
    /// Get the command code for this command.
    pub fn code(&self) -> u8 {
        match self {
            Command::TimeSync { .. } => CMD_TIME_SYNC,
            Command::JoinApproval { .. } => CMD_JOIN_APPROVAL,
            Command::PackageInfo { .. } => CMD_PACKAGE_INFO,
            Command::PackageBlock { .. } => CMD_PACKAGE_BLOCK,
            Command::PackageEnd { .. } => CMD_PACKAGE_END,
        }
    }

    /// Encode the packet region: the command code followed by its fields.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(32);

        match self {
            Command::TimeSync { utc_time } => {
                buf.push(CMD_TIME_SYNC);
                buf.extend_from_slice(&utc_time.to_be_bytes());
            }

            Command::JoinApproval { address } => {
                buf.push(CMD_JOIN_APPROVAL);
                buf.extend_from_slice(address.as_bytes());
            }

            Command::PackageInfo {
                control,
                manufacturer_id,
                package_type,
                file_version,
                total_size,
            } => {
                buf.push(CMD_PACKAGE_INFO);
                buf.push(*control);
                buf.extend_from_slice(&manufacturer_id.to_be_bytes());
                buf.extend_from_slice(&package_type.to_be_bytes());
                buf.extend_from_slice(&file_version.to_be_bytes());
                buf.extend_from_slice(&total_size.to_be_bytes());
            }

            Command::PackageBlock {
                control,
                manufacturer_id,
                package_type,
                file_version,
                offset,
                data,
            } => {
                buf.push(CMD_PACKAGE_BLOCK);
                buf.push(*control);
                buf.extend_from_slice(&manufacturer_id.to_be_bytes());
                buf.extend_from_slice(&package_type.to_be_bytes());
                buf.extend_from_slice(&file_version.to_be_bytes());
                buf.extend_from_slice(&offset.to_be_bytes());
                buf.push(data.len() as u8);
                buf.extend_from_slice(data);
            }

            Command::PackageEnd {
                control,
                manufacturer_id,
                package_type,
                file_version,
            } => {
                buf.push(CMD_PACKAGE_END);
                buf.push(*control);
                buf.extend_from_slice(&manufacturer_id.to_be_bytes());
                buf.extend_from_slice(&package_type.to_be_bytes());
                buf.extend_from_slice(&file_version.to_be_bytes());
            }
        }

        buf
    }

    /// Build the complete wire frame carrying this command.
    pub fn to_frame(
        &self,
        layout: &FrameLayout,
        escape: &EscapeConfig,
        address: &ExtendedAddress,
        transaction_id: u8,
        control: u8,
    ) -> Vec<u8> {
        encode_frame(layout, escape, address, transaction_id, control, &self.encode())
    }
}
