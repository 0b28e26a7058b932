//! Firmware File System (FFS) File Definitions
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

use r_efi::efi;

use crate::{
    depex::Phase,
    fw_fs::ffs::{attributes, section::strip_prefix_ignore_case},
};

/// Largest file size that fits in the 24-bit size field of [`Header`].
pub const MAX_STANDARD_FILE_SIZE: usize = 0xFF_FFFF;

/// Raw FFS file constant definitions
pub mod raw {
    /// File State Bits
    pub mod state {
        /// File header is under construction
        pub const HEADER_CONSTRUCTION: u8 = 0x01;
        /// File header is valid
        pub const HEADER_VALID: u8 = 0x02;
        /// File data is valid
        pub const DATA_VALID: u8 = 0x04;
    }

    /// File Type Definitions
    pub mod r#type {
        /// Raw data file
        pub const RAW: u8 = 0x01;
        /// Freeform file
        pub const FREEFORM: u8 = 0x02;
        /// Security (SEC) core file
        pub const SECURITY_CORE: u8 = 0x03;
        /// PEI core file
        pub const PEI_CORE: u8 = 0x04;
        /// DXE core file
        pub const DXE_CORE: u8 = 0x05;
        /// Pre-EFI module (PEIM) file
        pub const PEIM: u8 = 0x06;
        /// Driver Execution Environment (DXE) driver file
        pub const DRIVER: u8 = 0x07;
        /// Combined PEIM and driver file
        pub const COMBINED_PEIM_DRIVER: u8 = 0x08;
        /// Application file
        pub const APPLICATION: u8 = 0x09;
        /// Management Mode (MM) file
        pub const MM: u8 = 0x0A;
        /// Firmware volume image file
        pub const FIRMWARE_VOLUME_IMAGE: u8 = 0x0B;
        /// Combined MM and DXE file
        pub const COMBINED_MM_DXE: u8 = 0x0C;
        /// MM core file
        pub const MM_CORE: u8 = 0x0D;
        /// MM standalone module file
        pub const MM_STANDALONE: u8 = 0x0E;
        /// MM standalone core file
        pub const MM_CORE_STANDALONE: u8 = 0x0F;
    }
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// Firmware file type enumeration
pub enum Type {
    /// Raw file type
    Raw = raw::r#type::RAW,
    /// Free form file
    FreeForm = raw::r#type::FREEFORM,
    /// Security core file
    SecurityCore = raw::r#type::SECURITY_CORE,
    /// PEI core file
    PeiCore = raw::r#type::PEI_CORE,
    /// DXE core file
    DxeCore = raw::r#type::DXE_CORE,
    /// PEI module file
    Peim = raw::r#type::PEIM,
    /// Driver file
    Driver = raw::r#type::DRIVER,
    /// Combined PEIM driver file
    CombinedPeimDriver = raw::r#type::COMBINED_PEIM_DRIVER,
    /// Application file
    Application = raw::r#type::APPLICATION,
    /// Traditional Management Mode (MM) file
    Mm = raw::r#type::MM,
    /// Firmware volume image file
    FirmwareVolumeImage = raw::r#type::FIRMWARE_VOLUME_IMAGE,
    /// Combined MM/DXE file
    CombinedMmDxe = raw::r#type::COMBINED_MM_DXE,
    /// Traditional Management Mode (MM) core file
    MmCore = raw::r#type::MM_CORE,
    /// Standalone MM driver file
    MmStandalone = raw::r#type::MM_STANDALONE,
    /// Standalone MM Core file
    MmCoreStandalone = raw::r#type::MM_CORE_STANDALONE,
}

/// Static per-file-type defaults.
#[derive(Debug, Clone, Copy)]
pub struct FileTypeInfo {
    /// Canonical name.
    pub name: &'static str,
    /// File type.
    pub file_type: Type,
    /// Attributes a generated file of this type starts with.
    pub default_attributes: u8,
    /// Execution phase that evaluates the dependency expression of this file type, if any.
    pub depex_phase: Option<Phase>,
}

const fn info(name: &'static str, file_type: Type, depex_phase: Option<Phase>) -> FileTypeInfo {
    FileTypeInfo { name, file_type, default_attributes: attributes::raw::CHECKSUM, depex_phase }
}

static FILE_TYPES: &[FileTypeInfo] = &[
    info("RAW", Type::Raw, None),
    info("FREEFORM", Type::FreeForm, None),
    info("SECURITY_CORE", Type::SecurityCore, None),
    info("PEI_CORE", Type::PeiCore, Some(Phase::Pei)),
    info("DXE_CORE", Type::DxeCore, Some(Phase::Dxe)),
    info("PEIM", Type::Peim, Some(Phase::Pei)),
    info("DRIVER", Type::Driver, Some(Phase::Dxe)),
    info("COMBINED_PEIM_DRIVER", Type::CombinedPeimDriver, Some(Phase::Pei)),
    info("APPLICATION", Type::Application, Some(Phase::Dxe)),
    info("SMM", Type::Mm, Some(Phase::Mm)),
    info("FIRMWARE_VOLUME_IMAGE", Type::FirmwareVolumeImage, None),
    info("COMBINED_SMM_DXE", Type::CombinedMmDxe, Some(Phase::Dxe)),
    info("SMM_CORE", Type::MmCore, Some(Phase::Mm)),
    info("SMM_STANDALONE", Type::MmStandalone, Some(Phase::Mm)),
    info("SMM_CORE_STANDALONE", Type::MmCoreStandalone, Some(Phase::Mm)),
];

static FILE_TYPE_ALIASES: &[(&str, Type)] = &[
    ("MM", Type::Mm),
    ("COMBINED_MM_DXE", Type::CombinedMmDxe),
    ("MM_CORE", Type::MmCore),
    ("MM_STANDALONE", Type::MmStandalone),
    ("MM_CORE_STANDALONE", Type::MmCoreStandalone),
];

impl Type {
    /// Look up a file type by name.
    ///
    /// Matching is case-insensitive and the EDK II `EFI_FV_FILETYPE_` prefix is optional. Both the
    /// `SMM_*` and `MM_*` spellings are accepted for management mode file types.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        let name = strip_prefix_ignore_case(name, "EFI_FV_FILETYPE_").unwrap_or(name);
        FILE_TYPES
            .iter()
            .map(|info| (info.name, info.file_type))
            .chain(FILE_TYPE_ALIASES.iter().copied())
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, ty)| ty)
    }

    /// Static defaults for this file type.
    pub fn info(self) -> &'static FileTypeInfo {
        // every variant has a table entry; the fallback keeps this total.
        FILE_TYPES.iter().find(|info| info.file_type == self).unwrap_or(&FILE_TYPES[1])
    }

    /// Canonical name of the file type.
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Raw file type value as stored in the file header.
    pub fn raw(self) -> u8 {
        self as u8
    }

    /// Execution phase that evaluates dependency expressions for this file type.
    pub fn depex_phase(self) -> Option<Phase> {
        self.info().depex_phase
    }
}

// EFI_FFS_FILE_HEADER
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Firmware file header structure per PI Specification
pub struct Header {
    /// Unique file GUID identifier
    pub name: efi::Guid,
    /// Header checksum value
    pub integrity_check_header: u8,
    /// File checksum value
    pub integrity_check_file: u8,
    /// Type of file (see file type constants)
    pub file_type: u8,
    /// File attributes
    pub attributes: u8,
    /// 24-bit file size in bytes
    pub size: [u8; 3],
    /// File state (see state constants)
    pub state: u8,
}

impl Header {
    /// Serialized size of the header.
    pub const SIZE: usize = 24;

    /// Serialize the header in PI byte order.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..16].copy_from_slice(self.name.as_bytes());
        bytes[16] = self.integrity_check_header;
        bytes[17] = self.integrity_check_file;
        bytes[18] = self.file_type;
        bytes[19] = self.attributes;
        bytes[20..23].copy_from_slice(&self.size);
        bytes[23] = self.state;
        bytes
    }
}

// EFI_FFS_FILE_HEADER2
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Extended firmware file header structure (version 2) for files larger than 16MB
pub struct Header2 {
    /// Standard file header
    pub header: Header,
    /// Extended 64-bit file size for large files
    pub extended_size: u64,
}

impl Header2 {
    /// Serialized size of the header.
    pub const SIZE: usize = 32;

    /// Serialize the header in PI byte order.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..Header::SIZE].copy_from_slice(&self.header.to_bytes());
        bytes[Header::SIZE..].copy_from_slice(&self.extended_size.to_le_bytes());
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_names_resolve() {
        assert_eq!(Type::from_name("DRIVER"), Some(Type::Driver));
        assert_eq!(Type::from_name("EFI_FV_FILETYPE_DRIVER"), Some(Type::Driver));
        assert_eq!(Type::from_name("smm"), Some(Type::Mm));
        assert_eq!(Type::from_name("MM"), Some(Type::Mm));
        assert_eq!(Type::from_name("smm_core"), Some(Type::MmCore));
        assert_eq!(Type::from_name("PEIM"), Some(Type::Peim));
        assert_eq!(Type::from_name("DRIVERS"), None);
    }

    #[test]
    fn test_every_file_type_have_a_table_entry() {
        for info in FILE_TYPES {
            assert_eq!(info.file_type.info().name, info.name);
            assert_eq!(Type::from_name(info.name), Some(info.file_type));
        }
        assert_eq!(Type::Driver.raw(), 0x07);
        assert_eq!(Type::Mm.raw(), 0x0A);
        assert_eq!(Type::MmCore.raw(), 0x0D);
    }

    #[test]
    fn test_file_types_map_to_depex_phases() {
        assert_eq!(Type::Driver.depex_phase(), Some(Phase::Dxe));
        assert_eq!(Type::DxeCore.depex_phase(), Some(Phase::Dxe));
        assert_eq!(Type::Mm.depex_phase(), Some(Phase::Mm));
        assert_eq!(Type::MmStandalone.depex_phase(), Some(Phase::Mm));
        assert_eq!(Type::Peim.depex_phase(), Some(Phase::Pei));
        assert_eq!(Type::FreeForm.depex_phase(), None);
        assert_eq!(Type::Raw.depex_phase(), None);
    }

    #[test]
    fn test_header_serialize_in_field_order() {
        let header = Header {
            name: efi::Guid::from_bytes(&[0xAB; 16]),
            integrity_check_header: 1,
            integrity_check_file: 2,
            file_type: 3,
            attributes: 4,
            size: [5, 6, 7],
            state: 8,
        };
        let bytes = Header2 { header, extended_size: 0x0102_0304_0506_0708 }.to_bytes();
        assert_eq!(&bytes[0..16], &[0xAB; 16]);
        assert_eq!(&bytes[16..24], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&bytes[24..], &[0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
    }
}
