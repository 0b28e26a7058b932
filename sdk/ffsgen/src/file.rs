//! Firmware file assembly.
//!
//! Assembles the outer `EFI_FFS_FILE_HEADER` (or `EFI_FFS_FILE_HEADER2` for files over 16 MiB) in
//! front of a file's section set, filling in the size, checksum, and state fields.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use alloc::{string::ToString, vec::Vec};
use core::fmt;
use ffsgen_pi::{
    fw_fs::ffs::{
        attributes::{self, FIXED_FILE_CHECKSUM},
        file::{self, Header, Header2, MAX_STANDARD_FILE_SIZE},
    },
    guid::GuidDisplay,
};
use r_efi::efi;

use crate::{FfsGenError, compress::SectionSet, guid};

/// Resolve a file type name, as accepted by [`file::Type::from_name`].
pub fn file_type_from_name(name: &str) -> Result<file::Type, FfsGenError> {
    file::Type::from_name(name).ok_or_else(|| FfsGenError::UnknownFileType(name.to_string()))
}

fn checksum(bytes: &[u8]) -> u8 {
    0u8.wrapping_sub(bytes.iter().fold(0u8, |sum, value| sum.wrapping_add(*value)))
}

/// A firmware file ready to be serialized.
#[derive(Clone)]
pub struct FirmwareFile {
    name: efi::Guid,
    file_type: file::Type,
    attributes: u8,
    erase_polarity: bool,
    sections: SectionSet,
}

impl fmt::Debug for FirmwareFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirmwareFile")
            .field("name", &GuidDisplay(&self.name))
            .field("file_type", &self.file_type)
            .field("attributes", &format_args!("{:#04x}", self.attributes))
            .field("erase_polarity", &self.erase_polarity)
            .field("sections", &self.sections.sections().len())
            .finish()
    }
}

impl FirmwareFile {
    /// Create a file of `file_type` named `name` holding `sections`.
    ///
    /// Attributes start from the file type's defaults and erase polarity is 1.
    pub fn new(name: efi::Guid, file_type: file::Type, sections: SectionSet) -> Self {
        Self { name, file_type, attributes: file_type.info().default_attributes, erase_polarity: true, sections }
    }

    /// Enable or disable the data checksum attribute.
    ///
    /// When disabled, the file checksum field holds [`FIXED_FILE_CHECKSUM`].
    pub fn with_data_checksum(mut self, checksum: bool) -> Self {
        if checksum {
            self.attributes |= attributes::raw::CHECKSUM;
        } else {
            self.attributes &= !attributes::raw::CHECKSUM;
        }
        self
    }

    /// Set the erase polarity to encode in the header state bits.
    ///
    /// `true` => erase=1 (bits inverted), `false` => erase=0.
    pub fn with_erase_polarity(mut self, erase_polarity: bool) -> Self {
        self.erase_polarity = erase_polarity;
        self
    }

    /// The file name GUID.
    pub fn name(&self) -> efi::Guid {
        self.name
    }

    /// The file type.
    pub fn file_type(&self) -> file::Type {
        self.file_type
    }

    /// The file attributes, excluding LARGE_FILE which is decided at serialization.
    pub fn attributes(&self) -> u8 {
        self.attributes
    }

    /// The file's sections.
    pub fn sections(&self) -> &SectionSet {
        &self.sections
    }

    /// Returns `true` if the file has the data checksum attribute set.
    pub fn is_data_checksum(&self) -> bool {
        self.attributes & attributes::raw::CHECKSUM != 0
    }

    /// Serialize the file: header followed by the aligned section stream.
    pub fn serialize(&self) -> Result<Vec<u8>, FfsGenError> {
        if self.sections.is_empty() {
            return Err(FfsGenError::MissingInput);
        }
        let content = self.sections.to_bytes();

        let mut bytes = if content.len() > MAX_STANDARD_FILE_SIZE - Header::SIZE {
            self.serialize_header2(&content)?.to_vec()
        } else {
            self.serialize_header(&content).to_vec()
        };

        log::debug!(
            "assembled {} file {}: {:#x} bytes ({:#x} bytes of sections)",
            self.file_type.name(),
            GuidDisplay(&self.name),
            bytes.len() + content.len(),
            content.len()
        );

        bytes.extend(content);
        Ok(bytes)
    }

    fn data_checksum(&self, content: &[u8]) -> u8 {
        if self.is_data_checksum() { checksum(content) } else { FIXED_FILE_CHECKSUM }
    }

    fn state(&self) -> u8 {
        let state =
            file::raw::state::HEADER_CONSTRUCTION | file::raw::state::HEADER_VALID | file::raw::state::DATA_VALID;
        if self.erase_polarity { !state } else { state }
    }

    // Header checksum is computed with integrity_check_header, integrity_check_file and state zeroed.
    fn serialize_header(&self, content: &[u8]) -> [u8; Header::SIZE] {
        let mut file_header = Header {
            name: self.name,
            integrity_check_header: 0,
            integrity_check_file: 0,
            file_type: self.file_type.raw(),
            attributes: self.attributes & !attributes::raw::LARGE_FILE,
            size: [0u8; 3],
            state: 0,
        };
        let size = Header::SIZE + content.len();
        file_header.size.copy_from_slice(&size.to_le_bytes()[0..3]);

        file_header.integrity_check_header = checksum(&file_header.to_bytes());
        file_header.integrity_check_file = self.data_checksum(content);
        file_header.state = self.state();
        file_header.to_bytes()
    }

    fn serialize_header2(&self, content: &[u8]) -> Result<[u8; Header2::SIZE], FfsGenError> {
        let size = Header2::SIZE + content.len();
        let mut file_header = Header2 {
            header: Header {
                name: self.name,
                integrity_check_header: 0,
                integrity_check_file: 0,
                file_type: self.file_type.raw(),
                attributes: self.attributes | attributes::raw::LARGE_FILE,
                size: [0u8; 3],
                state: 0,
            },
            extended_size: u64::try_from(size).map_err(|_| FfsGenError::SectionTooLarge(size))?,
        };

        file_header.header.integrity_check_header = checksum(&file_header.to_bytes());
        file_header.header.integrity_check_file = self.data_checksum(content);
        file_header.header.state = self.state();
        Ok(file_header.to_bytes())
    }
}

/// Assemble a complete firmware file from a raw 16-byte identifier, a file type, and sections.
pub fn assemble(identifier: &[u8], file_type: file::Type, sections: SectionSet) -> Result<Vec<u8>, FfsGenError> {
    FirmwareFile::new(guid::from_raw(identifier)?, file_type, sections).serialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::{self, EncodedSection};
    use ffsgen_pi::fw_fs::ffs::section::Type as SectionType;

    const NAME: [u8; 16] =
        [0x11, 0x11, 0x11, 0x11, 0x22, 0x22, 0x33, 0x33, 0x44, 0x44, 0x55, 0x55, 0x55, 0x55, 0x55, 0x55];

    fn byte_sum(bytes: &[u8]) -> u8 {
        bytes.iter().fold(0u8, |sum, value| sum.wrapping_add(*value))
    }

    /// Header bytes with the file checksum and state cleared, as covered by the header checksum.
    fn checksummed_header(header: &[u8]) -> Vec<u8> {
        let mut header = header.to_vec();
        header[17] = 0;
        header[23] = 0;
        header
    }

    fn pe32_ui_sections() -> Vec<EncodedSection> {
        vec![
            section::encode(SectionType::Pe32, &[0x4D, 0x5A, 0x90, 0x00]).unwrap(),
            section::encode_user_interface("MyDriver").unwrap(),
        ]
    }

    #[test]
    fn test_driver_file_have_correct_size_and_checksums() {
        let sections = pe32_ui_sections();
        let bytes = assemble(&NAME, file::Type::Driver, SectionSet::Plain(sections.clone())).unwrap();

        // 24 byte header, 8 byte PE32 section, 22 byte UI section.
        assert_eq!(sections[0].size(), 8);
        assert_eq!(sections[1].size(), 22);
        assert_eq!(bytes.len(), 24 + 8 + 22);

        assert_eq!(&bytes[0..16], &NAME);
        assert_eq!(bytes[18], file::raw::r#type::DRIVER);
        assert_eq!(bytes[19], attributes::raw::CHECKSUM);
        assert_eq!(&bytes[20..23], &[54, 0, 0]);
        assert_eq!(bytes[23], 0xF8);

        assert_eq!(byte_sum(&checksummed_header(&bytes[0..24])), 0);
        assert_eq!(byte_sum(&bytes[24..]).wrapping_add(bytes[17]), 0);
        assert_eq!(&bytes[24..32], sections[0].as_bytes());
        assert_eq!(&bytes[32..], sections[1].as_bytes());
    }

    #[test]
    fn test_fixed_checksum_store_sentinel() {
        let file = FirmwareFile::new(
            efi::Guid::from_bytes(&NAME),
            file::Type::FreeForm,
            SectionSet::Plain(pe32_ui_sections()),
        )
        .with_data_checksum(false);
        assert!(!file.is_data_checksum());

        let bytes = file.serialize().unwrap();
        assert_eq!(bytes[17], 0xAA);
        assert_eq!(bytes[19], 0);
        assert_eq!(byte_sum(&checksummed_header(&bytes[0..24])), 0);
    }

    #[test]
    fn test_erase_polarity_zero_store_plain_state() {
        let bytes = FirmwareFile::new(
            efi::Guid::from_bytes(&NAME),
            file::Type::Driver,
            SectionSet::Plain(pe32_ui_sections()),
        )
        .with_erase_polarity(false)
        .serialize()
        .unwrap();
        assert_eq!(bytes[23], 0x07);
    }

    #[test]
    fn test_sections_are_aligned_within_the_file() {
        let sections = vec![
            section::encode(SectionType::Raw, b"a").unwrap(),
            section::encode(SectionType::Raw, b"b").unwrap(),
        ];
        let bytes = assemble(&NAME, file::Type::Raw, SectionSet::Plain(sections)).unwrap();
        assert_eq!(bytes.len(), 24 + 8 + 5);
        assert_eq!(&bytes[29..32], &[0, 0, 0]);
        assert_eq!(bytes[32..].len(), 5);
    }

    #[test]
    fn test_large_file_use_header2() {
        let payload = vec![0x5Au8; MAX_STANDARD_FILE_SIZE];
        let sections = vec![section::encode(SectionType::Raw, &payload).unwrap()];
        let content_len = sections[0].size();
        let bytes = assemble(&NAME, file::Type::FreeForm, SectionSet::Plain(sections)).unwrap();

        assert_eq!(bytes.len(), Header2::SIZE + content_len);
        assert_eq!(&bytes[20..23], &[0, 0, 0]);
        assert_eq!(bytes[19] & attributes::raw::LARGE_FILE, attributes::raw::LARGE_FILE);
        assert_eq!(u64::from_le_bytes(bytes[24..32].try_into().unwrap()), bytes.len() as u64);
        assert_eq!(byte_sum(&checksummed_header(&bytes[0..32])), 0);
        assert_eq!(byte_sum(&bytes[32..]).wrapping_add(bytes[17]), 0);
    }

    #[test]
    fn test_largest_standard_file_use_header() {
        // Section of 0xFFFFFF - 24 bytes fills the 24-bit size field exactly.
        let payload = vec![0u8; MAX_STANDARD_FILE_SIZE - Header::SIZE - 4];
        let sections = vec![section::encode(SectionType::Raw, &payload).unwrap()];
        let bytes = assemble(&NAME, file::Type::FreeForm, SectionSet::Plain(sections)).unwrap();
        assert_eq!(bytes.len(), MAX_STANDARD_FILE_SIZE);
        assert_eq!(&bytes[20..23], &[0xFF, 0xFF, 0xFF]);
        assert_eq!(bytes[19] & attributes::raw::LARGE_FILE, 0);
    }

    #[test]
    fn test_identifiers_must_be_sixteen_bytes() {
        assert_eq!(
            assemble(&NAME[..15], file::Type::Driver, SectionSet::Plain(pe32_ui_sections())),
            Err(FfsGenError::InvalidIdentifierLength(15))
        );
    }

    #[test]
    fn test_empty_files_are_rejected() {
        assert_eq!(assemble(&NAME, file::Type::Driver, SectionSet::Plain(vec![])), Err(FfsGenError::MissingInput));
    }

    #[test]
    fn test_file_type_names_resolve() {
        assert_eq!(file_type_from_name("efi_fv_filetype_driver"), Ok(file::Type::Driver));
        assert_eq!(file_type_from_name("BOGUS"), Err(FfsGenError::UnknownFileType("BOGUS".into())));
    }
}
