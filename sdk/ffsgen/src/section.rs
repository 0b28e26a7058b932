//! Section encoding for UEFI Firmware File System (FFS) sections.
//!
//! This module turns one payload into one fully formed section record: the common section header
//! (standard or extended), any type-specific header fields, and the payload. It also provides the
//! payload encoders for the textual metadata sections (VERSION and USER_INTERFACE) and the helper
//! that lays sections out back to back with the alignment the PI specification requires.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use alloc::{string::ToString, vec::Vec};
use core::{fmt, iter};
use ffsgen_pi::fw_fs::ffs::section::{
    self, COMMON_HEADER_SIZE, EXTENDED_HEADER_SIZE, EXTENDED_SIZE_SENTINEL, MAX_STANDARD_SECTION_SIZE, header,
};
use r_efi::efi;

use crate::FfsGenError;

/// Sections start at 4-byte aligned offsets relative to the start of the section stream.
pub const SECTION_ALIGNMENT: usize = 4;

/// A fully encoded section: header followed by content.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedSection {
    section_type: section::Type,
    header_size: usize,
    bytes: Vec<u8>,
}

impl fmt::Debug for EncodedSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedSection")
            .field("section_type", &self.section_type)
            .field("header_size", &self.header_size)
            .field("bytes ({:#x} bytes)", &self.bytes.len())
            .finish()
    }
}

impl EncodedSection {
    /// The section type.
    pub fn section_type(&self) -> section::Type {
        self.section_type
    }

    /// Size of the common header (4 or 8 bytes).
    pub fn header_size(&self) -> usize {
        self.header_size
    }

    /// Whether the extended (`EFI_COMMON_SECTION_HEADER2`) form is used.
    pub fn is_extended(&self) -> bool {
        self.header_size == EXTENDED_HEADER_SIZE
    }

    /// Total serialized size of the section.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// The serialized section.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Everything after the common header, including type-specific header fields.
    pub fn body(&self) -> &[u8] {
        &self.bytes[self.header_size..]
    }

    /// Consume the section and return its serialized bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Size of the common header needed for a section whose header-independent body is `body_len` bytes.
fn common_header_size(body_len: usize) -> Result<usize, FfsGenError> {
    let standard_size = body_len.checked_add(COMMON_HEADER_SIZE).ok_or(FfsGenError::SectionTooLarge(body_len))?;
    if standard_size <= MAX_STANDARD_SECTION_SIZE { Ok(COMMON_HEADER_SIZE) } else { Ok(EXTENDED_HEADER_SIZE) }
}

/// Build a section from its type, type-specific header bytes, and content.
fn encode_parts(
    section_type: section::Type,
    type_header: &[u8],
    content: &[u8],
) -> Result<EncodedSection, FfsGenError> {
    let body_len = type_header.len() + content.len();
    let header_size = common_header_size(body_len)?;
    let section_size = header_size + body_len;

    let mut bytes = Vec::with_capacity(section_size);
    if header_size == COMMON_HEADER_SIZE {
        bytes.extend_from_slice(&(section_size as u32).to_le_bytes()[0..3]);
        bytes.push(section_type.raw());
    } else {
        let extended_size = u32::try_from(section_size).map_err(|_| FfsGenError::SectionTooLarge(section_size))?;
        bytes.extend_from_slice(&EXTENDED_SIZE_SENTINEL);
        bytes.push(section_type.raw());
        bytes.extend_from_slice(&extended_size.to_le_bytes());
    }
    bytes.extend_from_slice(type_header);
    bytes.extend_from_slice(content);

    log::trace!(
        "encoded {} section: {:#x} bytes{}",
        section_type.name(),
        section_size,
        if header_size == EXTENDED_HEADER_SIZE { " (extended header)" } else { "" }
    );

    Ok(EncodedSection { section_type, header_size, bytes })
}

/// Wrap `payload` as a section of `section_type`.
///
/// The payload is placed verbatim after the common header. The extended header form is chosen when
/// the total size does not fit the 24-bit size field.
///
/// ## Examples
///
/// ```rust
/// use ffsgen::section;
/// use ffsgen_pi::fw_fs::ffs::section::Type;
///
/// let raw = section::encode(Type::Raw, b"hello").unwrap();
/// assert_eq!(raw.as_bytes(), &[0x09, 0x00, 0x00, 0x19, b'h', b'e', b'l', b'l', b'o']);
/// ```
pub fn encode(section_type: section::Type, payload: &[u8]) -> Result<EncodedSection, FfsGenError> {
    encode_parts(section_type, &[], payload)
}

/// Wrap `payload` as a section identified by its raw type value.
///
/// Returns [`FfsGenError::UnknownSectionType`] if `raw_type` is not a known section type.
pub fn encode_raw(raw_type: u8, payload: &[u8]) -> Result<EncodedSection, FfsGenError> {
    let section_type = section::Type::try_from(raw_type)
        .map_err(|raw| FfsGenError::UnknownSectionType(alloc::format!("{raw:#04x}")))?;
    encode(section_type, payload)
}

/// Resolve a section type name, as accepted by [`section::Type::from_name`].
pub fn section_type_from_name(name: &str) -> Result<section::Type, FfsGenError> {
    section::Type::from_name(name).ok_or_else(|| FfsGenError::UnknownSectionType(name.to_string()))
}

/// Encode `text` as a null-terminated UTF-16LE string.
pub fn ucs2_payload(text: &str) -> Vec<u8> {
    text.encode_utf16().chain(iter::once(0)).flat_map(u16::to_le_bytes).collect()
}

/// Payload of a VERSION section: the 16-bit build number followed by the null-terminated UTF-16LE
/// version string.
pub fn version_payload(build_number: u16, text: &str) -> Vec<u8> {
    let mut payload = header::Version { build_number }.to_bytes().to_vec();
    payload.extend(ucs2_payload(text));
    payload
}

/// Build a USER_INTERFACE section holding `text`.
pub fn encode_user_interface(text: &str) -> Result<EncodedSection, FfsGenError> {
    encode(section::Type::UserInterface, &ucs2_payload(text))
}

/// Build a VERSION section holding `build_number` and `text`.
pub fn encode_version(build_number: u16, text: &str) -> Result<EncodedSection, FfsGenError> {
    encode(section::Type::Version, &version_payload(build_number, text))
}

/// Build a FREEFORM_SUBTYPE_GUID section.
pub fn encode_freeform_subtype_guid(sub_type_guid: &efi::Guid, content: &[u8]) -> Result<EncodedSection, FfsGenError> {
    let freeform = header::FreeformSubtypeGuid { sub_type_guid: *sub_type_guid };
    encode_parts(section::Type::FreeformSubtypeGuid, freeform.sub_type_guid.as_bytes(), content)
}

/// Build a GUID_DEFINED section.
///
/// `guid_specific_data` is placed directly after the fixed GUID-defined header and before the
/// content; the header's data offset is computed from the actual common header width.
pub fn encode_guid_defined(
    section_definition_guid: &efi::Guid,
    attributes: u16,
    guid_specific_data: &[u8],
    content: &[u8],
) -> Result<EncodedSection, FfsGenError> {
    let type_header_len = header::GuidDefined::SIZE + guid_specific_data.len();
    let header_size = common_header_size(type_header_len + content.len())?;
    let data_offset = header_size + type_header_len;

    let guid_defined = header::GuidDefined {
        section_definition_guid: *section_definition_guid,
        data_offset: u16::try_from(data_offset).map_err(|_| FfsGenError::DataOffsetOverflow(data_offset))?,
        attributes,
    };

    let mut type_header = guid_defined.to_bytes().to_vec();
    type_header.extend_from_slice(guid_specific_data);
    encode_parts(section::Type::GuidDefined, &type_header, content)
}

/// Lay out `sections` back to back as they appear in a file or encapsulation section.
///
/// Every section after the first starts on a [`SECTION_ALIGNMENT`] boundary; the gap is filled with
/// zero bytes. No padding follows the last section.
pub fn concatenate(sections: &[EncodedSection]) -> Vec<u8> {
    let mut content = Vec::with_capacity(sections.iter().map(|s| s.size() + SECTION_ALIGNMENT).sum());
    let mut section_iter = sections.iter().peekable();
    while let Some(section) = section_iter.next() {
        content.extend_from_slice(section.as_bytes());
        if section_iter.peek().is_some() && content.len() % SECTION_ALIGNMENT != 0 {
            // Per PI 1.8A volume 3 section 2.2.4, pad byte is always zero.
            let pad_length = SECTION_ALIGNMENT - (content.len() % SECTION_ALIGNMENT);
            content.extend(iter::repeat_n(0u8, pad_length));
        }
    }
    content
}
