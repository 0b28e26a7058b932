//! Firmware File System (FFS) File Attribute Definitions
//!
//! Based on the values defined in the UEFI Platform Initialization (PI) Specification V1.8A Section 3.2.3.1
//! EFI_FFS_FILE_HEADER.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!

/// Raw FFS attribute constant definitions
pub mod raw {
    /// Large file attribute; the file uses `EFI_FFS_FILE_HEADER2`.
    pub const LARGE_FILE: u8 = 0x01;
    /// File must be at a fixed address
    pub const FIXED: u8 = 0x04;
    /// Data alignment mask
    pub const DATA_ALIGNMENT: u8 = 0x38;
    /// File checksum attribute. When clear, `integrity_check_file` holds [`FIXED_FILE_CHECKSUM`].
    pub const CHECKSUM: u8 = 0x40;
}

/// Value stored in `integrity_check_file` when the [`raw::CHECKSUM`] attribute is clear.
pub const FIXED_FILE_CHECKSUM: u8 = 0xAA;
