//! Firmware File System (FFS) Section Definition
//!
//! Based on the values defined in the UEFI Platform Initialization (PI) Specification V1.8A Section 3.2.4
//! Firmware File Section.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!

/// Type alias for section type identifiers
pub type EfiSectionType = u8;

/// Size of `EFI_COMMON_SECTION_HEADER`.
pub const COMMON_HEADER_SIZE: usize = 4;
/// Size of `EFI_COMMON_SECTION_HEADER2`.
pub const EXTENDED_HEADER_SIZE: usize = 8;
/// Largest total section size that can be stored in the 24-bit size field. `0xFFFFFF` itself is the
/// sentinel that announces an extended header.
pub const MAX_STANDARD_SECTION_SIZE: usize = 0xFF_FFFE;
/// Value of the 24-bit size field when the extended size field is in use.
pub const EXTENDED_SIZE_SENTINEL: [u8; 3] = [0xff; 3];

/// Firmware File System Leaf Section Types
/// Note: Typically called `EFI_SECTION_*` in EDK II code.
pub mod raw_type {
    /// Encapsulated section type constants
    pub mod encapsulated {
        /// Compression encapsulated section
        pub const COMPRESSION: u8 = 0x01;
        /// GUID-defined encapsulated section
        pub const GUID_DEFINED: u8 = 0x02;
        /// Disposable encapsulated section
        pub const DISPOSABLE: u8 = 0x03;
    }
    /// PE32 executable section
    pub const PE32: u8 = 0x10;
    /// Position-independent code section
    pub const PIC: u8 = 0x11;
    /// Terse executable section
    pub const TE: u8 = 0x12;
    /// DXE dependency expression section
    pub const DXE_DEPEX: u8 = 0x13;
    /// Version information section
    pub const VERSION: u8 = 0x14;
    /// User interface string section
    pub const USER_INTERFACE: u8 = 0x15;
    /// Compatibility16 section
    pub const COMPATIBILITY16: u8 = 0x16;
    /// Firmware volume image section
    pub const FIRMWARE_VOLUME_IMAGE: u8 = 0x17;
    /// Freeform GUID subtype section
    pub const FREEFORM_SUBTYPE_GUID: u8 = 0x18;
    /// Raw data section
    pub const RAW: u8 = 0x19;
    /// PEI dependency expression section
    pub const PEI_DEPEX: u8 = 0x1B;
    /// MM dependency expression section
    pub const MM_DEPEX: u8 = 0x1C;
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// Section type enumeration for firmware file sections
pub enum Type {
    /// Compression section
    Compression = raw_type::encapsulated::COMPRESSION,
    /// GUID-defined section
    GuidDefined = raw_type::encapsulated::GUID_DEFINED,
    /// Disposable section
    Disposable = raw_type::encapsulated::DISPOSABLE,
    /// PE32 executable
    Pe32 = raw_type::PE32,
    /// Position-independent code
    Pic = raw_type::PIC,
    /// Terse executable
    Te = raw_type::TE,
    /// DXE dependency expression
    DxeDepex = raw_type::DXE_DEPEX,
    /// Version information
    Version = raw_type::VERSION,
    /// User interface string
    UserInterface = raw_type::USER_INTERFACE,
    /// Compatibility16 binary
    Compatibility16 = raw_type::COMPATIBILITY16,
    /// Firmware volume image
    FirmwareVolumeImage = raw_type::FIRMWARE_VOLUME_IMAGE,
    /// Freeform GUID subtype
    FreeformSubtypeGuid = raw_type::FREEFORM_SUBTYPE_GUID,
    /// Raw data
    Raw = raw_type::RAW,
    /// PEI dependency expression
    PeiDepex = raw_type::PEI_DEPEX,
    /// MM dependency expression
    MmDepex = raw_type::MM_DEPEX,
}

/// Name table for section types, in the spelling used by build descriptions.
///
/// The first entry for each type is its canonical name.
static SECTION_TYPE_NAMES: &[(&str, Type)] = &[
    ("COMPRESSION", Type::Compression),
    ("GUID_DEFINED", Type::GuidDefined),
    ("DISPOSABLE", Type::Disposable),
    ("PE32", Type::Pe32),
    ("PIC", Type::Pic),
    ("TE", Type::Te),
    ("DXE_DEPEX", Type::DxeDepex),
    ("VERSION", Type::Version),
    ("USER_INTERFACE", Type::UserInterface),
    ("UI", Type::UserInterface),
    ("COMPATIBILITY16", Type::Compatibility16),
    ("FIRMWARE_VOLUME_IMAGE", Type::FirmwareVolumeImage),
    ("FREEFORM_SUBTYPE_GUID", Type::FreeformSubtypeGuid),
    ("RAW", Type::Raw),
    ("PEI_DEPEX", Type::PeiDepex),
    ("MM_DEPEX", Type::MmDepex),
    ("SMM_DEPEX", Type::MmDepex),
];

impl Type {
    /// Look up a section type by name.
    ///
    /// Matching is case-insensitive and the EDK II `EFI_SECTION_` prefix is optional, so `pe32`,
    /// `PE32` and `EFI_SECTION_PE32` all resolve to [`Type::Pe32`].
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        let name = strip_prefix_ignore_case(name, "EFI_SECTION_").unwrap_or(name);
        SECTION_TYPE_NAMES.iter().find(|(candidate, _)| candidate.eq_ignore_ascii_case(name)).map(|(_, ty)| *ty)
    }

    /// Canonical name of the section type.
    pub fn name(self) -> &'static str {
        SECTION_TYPE_NAMES.iter().find(|(_, ty)| *ty == self).map(|(name, _)| *name).unwrap_or("UNKNOWN")
    }

    /// Raw section type value as stored in the common section header.
    pub fn raw(self) -> EfiSectionType {
        self as u8
    }

    /// Whether the section type is one of the three dependency expression types.
    pub fn is_depex(self) -> bool {
        matches!(self, Type::DxeDepex | Type::PeiDepex | Type::MmDepex)
    }
}

impl TryFrom<u8> for Type {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        SECTION_TYPE_NAMES.iter().find(|(_, ty)| ty.raw() == value).map(|(_, ty)| *ty).ok_or(value)
    }
}

pub(crate) fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    if value.len() >= prefix.len() && value.is_char_boundary(prefix.len()) {
        let (head, tail) = value.split_at(prefix.len());
        if head.eq_ignore_ascii_case(prefix) {
            return Some(tail);
        }
    }
    None
}

/// Section header structures and definitions
pub mod header {
    use r_efi::efi;

    /// EFI_GUID_DEFINED_SECTION per PI spec 1.8A 3.2.5.7
    #[repr(C)]
    #[derive(Debug, Clone, Copy)]
    /// GUID-defined section header
    pub struct GuidDefined {
        /// GUID identifying the section format
        pub section_definition_guid: efi::Guid,
        /// Offset to section data from start of the section (including the common header)
        pub data_offset: u16,
        /// Section attributes
        pub attributes: u16,
        // Guid-specific header fields.
    }

    impl GuidDefined {
        /// Serialized size of the fixed part of the header.
        pub const SIZE: usize = 20;

        /// Serialize the fixed part of the header in little-endian order.
        pub fn to_bytes(&self) -> [u8; Self::SIZE] {
            let mut bytes = [0u8; Self::SIZE];
            bytes[0..16].copy_from_slice(self.section_definition_guid.as_bytes());
            bytes[16..18].copy_from_slice(&self.data_offset.to_le_bytes());
            bytes[18..20].copy_from_slice(&self.attributes.to_le_bytes());
            bytes
        }
    }

    /// GUID-defined section attribute bits.
    pub mod guid_defined_attributes {
        /// The section content must be processed (for example decompressed) before use.
        pub const PROCESSING_REQUIRED: u16 = 0x01;
        /// The authentication status of the section content is valid.
        pub const AUTH_STATUS_VALID: u16 = 0x02;
    }

    /// EFI_VERSION_SECTION per PI spec 1.8A 3.2.5.15
    #[repr(C)]
    #[derive(Debug, Clone, Copy)]
    /// Version section header
    pub struct Version {
        /// Build number
        pub build_number: u16,
    }

    impl Version {
        /// Serialized size in bytes.
        pub const SIZE: usize = 2;

        /// Serialize to the on-disk little-endian layout.
        pub fn to_bytes(&self) -> [u8; Self::SIZE] {
            self.build_number.to_le_bytes()
        }
    }

    /// EFI_FREEFORM_SUBTYPE_GUID_SECTION per PI spec 1.8A 3.2.5.6
    #[repr(C)]
    #[derive(Debug, Clone, Copy)]
    /// Freeform GUID subtype section header
    pub struct FreeformSubtypeGuid {
        /// Subtype GUID identifier
        pub sub_type_guid: efi::Guid,
    }
}
