//! Compression of a file's section set into one GUID-defined section.
//!
//! When compression is requested, every section of the file is serialized back to back (with the
//! usual section alignment), compressed by a [`SectionCompressor`], and replaced by a single
//! GUID_DEFINED section. The section definition GUID names the algorithm, the PROCESSING_REQUIRED
//! attribute is set, and a fixed sub-header precedes the compressed bytes:
//!
//! | offset (from data start - 8) | size | field                          |
//! |------------------------------|------|--------------------------------|
//! | 0                            | 4    | algorithm tag (u32 LE)         |
//! | 4                            | 4    | uncompressed length (u32 LE)   |
//!
//! The sub-header is carried as the GUID-specific data of the GUID-defined header, so the header's
//! data offset points at the first compressed byte.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
#[cfg(any(test, feature = "mockall"))]
use mockall::automock;

use alloc::{string::ToString, vec::Vec};
use core::slice;
use ffsgen_pi::fw_fs::ffs::{guid, section::header::guid_defined_attributes};
use r_efi::efi;

use crate::{
    FfsGenError,
    section::{self, EncodedSection},
};

/// Size of the compression sub-header that precedes the compressed bytes.
pub const SUB_HEADER_SIZE: usize = 8;

/// A compression scheme that can wrap a section set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionAlgorithm {
    /// Name used on the command line and in messages.
    pub name: &'static str,
    /// Algorithm tag stored in the sub-header.
    pub tag: u32,
    /// Section definition GUID of the wrapping GUID-defined section.
    pub section_guid: efi::Guid,
}

/// LZMA compression.
pub const LZMA: CompressionAlgorithm = CompressionAlgorithm { name: "LZMA", tag: 1, section_guid: guid::LZMA_SECTION };

static ALGORITHMS: &[CompressionAlgorithm] = &[LZMA];

impl CompressionAlgorithm {
    /// Look up an algorithm by name (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self, FfsGenError> {
        ALGORITHMS
            .iter()
            .find(|algorithm| algorithm.name.eq_ignore_ascii_case(name.trim()))
            .copied()
            .ok_or_else(|| FfsGenError::UnsupportedCompression(name.to_string()))
    }

    /// Look up an algorithm by its sub-header tag.
    pub fn from_tag(tag: u32) -> Option<Self> {
        ALGORITHMS.iter().find(|algorithm| algorithm.tag == tag).copied()
    }
}

/// Compresses the serialized section stream of a file.
///
/// An implementation should return:
/// - `Ok(Vec<u8>)` with the complete compressed representation of `data`.
/// - `Err(FfsGenError::UnsupportedCompression)` if it does not implement `algorithm`.
/// - `Err(FfsGenError::CompressionFailed)` for any other failure.
///
/// Compression is all-or-nothing: callers never fall back to uncompressed output.
#[cfg_attr(any(test, feature = "mockall"), automock)]
pub trait SectionCompressor {
    /// Compress `data` with `algorithm`.
    fn compress(&self, algorithm: CompressionAlgorithm, data: &[u8]) -> Result<Vec<u8>, FfsGenError>;
}

/// The ordered sections of a file, either as encoded or collapsed into one compressed wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionSet {
    /// The original sections, in file order.
    Plain(Vec<EncodedSection>),
    /// A single GUID-defined section that holds the compressed original sections.
    Compressed {
        /// The wrapper section.
        wrapper: EncodedSection,
        /// Algorithm used.
        algorithm: CompressionAlgorithm,
        /// Length of the serialized original sections.
        uncompressed_length: u32,
    },
}

impl SectionSet {
    /// The sections that make up the file body.
    pub fn sections(&self) -> &[EncodedSection] {
        match self {
            SectionSet::Plain(sections) => sections,
            SectionSet::Compressed { wrapper, .. } => slice::from_ref(wrapper),
        }
    }

    /// Whether the set holds no sections.
    pub fn is_empty(&self) -> bool {
        self.sections().is_empty()
    }

    /// Serialized file body.
    pub fn to_bytes(&self) -> Vec<u8> {
        section::concatenate(self.sections())
    }

    /// Collapse a plain set into its compressed form.
    ///
    /// A set that is already compressed is returned unchanged.
    pub fn compress(
        self,
        algorithm: CompressionAlgorithm,
        compressor: &dyn SectionCompressor,
    ) -> Result<SectionSet, FfsGenError> {
        match self {
            SectionSet::Plain(sections) => {
                let inner = section::concatenate(&sections);
                let uncompressed_length =
                    u32::try_from(inner.len()).map_err(|_| FfsGenError::SectionTooLarge(inner.len()))?;
                let wrapper = wrap_bytes(&inner, algorithm, compressor)?;
                Ok(SectionSet::Compressed { wrapper, algorithm, uncompressed_length })
            }
            compressed @ SectionSet::Compressed { .. } => Ok(compressed),
        }
    }
}

/// Replace `sections` by one compressed GUID-defined section.
pub fn wrap(
    sections: &[EncodedSection],
    algorithm: CompressionAlgorithm,
    compressor: &dyn SectionCompressor,
) -> Result<EncodedSection, FfsGenError> {
    if sections.is_empty() {
        return Err(FfsGenError::MissingInput);
    }
    wrap_bytes(&section::concatenate(sections), algorithm, compressor)
}

fn wrap_bytes(
    inner: &[u8],
    algorithm: CompressionAlgorithm,
    compressor: &dyn SectionCompressor,
) -> Result<EncodedSection, FfsGenError> {
    let uncompressed_length = u32::try_from(inner.len()).map_err(|_| FfsGenError::SectionTooLarge(inner.len()))?;
    let compressed = compressor.compress(algorithm, inner)?;

    log::debug!(
        "{} compressed {:#x} bytes of sections to {:#x} bytes",
        algorithm.name,
        inner.len(),
        compressed.len()
    );

    let mut sub_header = [0u8; SUB_HEADER_SIZE];
    sub_header[0..4].copy_from_slice(&algorithm.tag.to_le_bytes());
    sub_header[4..8].copy_from_slice(&uncompressed_length.to_le_bytes());

    section::encode_guid_defined(
        &algorithm.section_guid,
        guid_defined_attributes::PROCESSING_REQUIRED,
        &sub_header,
        &compressed,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffsgen_pi::fw_fs::ffs::section::Type;
    use mockall::predicate::{always, eq};

    /// Test codec that "compresses" by reversing the input.
    struct Reverse;

    impl SectionCompressor for Reverse {
        fn compress(&self, algorithm: CompressionAlgorithm, data: &[u8]) -> Result<Vec<u8>, FfsGenError> {
            assert_eq!(algorithm, LZMA);
            Ok(data.iter().rev().copied().collect())
        }
    }

    fn sample_sections() -> Vec<EncodedSection> {
        vec![
            section::encode(Type::Pe32, &[0x4D, 0x5A, 0x90, 0x00, 0x03, 0x00, 0x00, 0x00]).unwrap(),
            section::encode_user_interface("Sample").unwrap(),
        ]
    }

    /// Pull the sub-header and payload back out of a wrapper section.
    fn unwrap_section(wrapper: &EncodedSection) -> (efi::Guid, u16, u32, u32, Vec<u8>) {
        let bytes = wrapper.as_bytes();
        let body = wrapper.body();
        let guid = efi::Guid::from_bytes(body[0..16].try_into().unwrap());
        let data_offset = u16::from_le_bytes([body[16], body[17]]) as usize;
        let attributes = u16::from_le_bytes([body[18], body[19]]);
        let tag = u32::from_le_bytes(body[20..24].try_into().unwrap());
        let length = u32::from_le_bytes(body[24..28].try_into().unwrap());
        (guid, attributes, tag, length, bytes[data_offset..].to_vec())
    }

    #[test]
    fn test_algorithms_resolve_by_name_and_tag() {
        assert_eq!(CompressionAlgorithm::from_name("lzma"), Ok(LZMA));
        assert_eq!(CompressionAlgorithm::from_tag(1), Some(LZMA));
        assert_eq!(CompressionAlgorithm::from_tag(99), None);
        assert_eq!(CompressionAlgorithm::from_name("zip"), Err(FfsGenError::UnsupportedCompression("zip".into())));
    }

    #[test]
    fn test_wrap_produce_one_guid_defined_section() {
        let sections = sample_sections();
        let wrapper = wrap(&sections, LZMA, &Reverse).unwrap();
        assert_eq!(wrapper.section_type(), Type::GuidDefined);

        let (guid, attributes, tag, length, payload) = unwrap_section(&wrapper);
        assert_eq!(guid, guid::LZMA_SECTION);
        assert_eq!(attributes, guid_defined_attributes::PROCESSING_REQUIRED);
        assert_eq!(tag, LZMA.tag);

        let original = section::concatenate(&sections);
        assert_eq!(length as usize, original.len());
        let restored: Vec<u8> = payload.iter().rev().copied().collect();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_compress_transition_plain_to_compressed() {
        let sections = sample_sections();
        let plain = SectionSet::Plain(sections.clone());
        assert_eq!(plain.sections().len(), 2);

        let compressed = plain.compress(LZMA, &Reverse).unwrap();
        assert_eq!(compressed.sections().len(), 1);
        match &compressed {
            SectionSet::Compressed { algorithm, uncompressed_length, wrapper } => {
                assert_eq!(*algorithm, LZMA);
                assert_eq!(*uncompressed_length as usize, section::concatenate(&sections).len());
                assert_eq!(compressed.to_bytes(), wrapper.as_bytes());
            }
            SectionSet::Plain(_) => panic!("expected compressed set"),
        }

        let again = compressed.clone().compress(LZMA, &Reverse).unwrap();
        assert_eq!(again, compressed);
    }

    #[test]
    fn test_codec_failure_abort() {
        let mut compressor = MockSectionCompressor::new();
        compressor
            .expect_compress()
            .with(eq(LZMA), always())
            .times(1)
            .returning(|_, _| Err(FfsGenError::CompressionFailed { algorithm: "LZMA", reason: "no codec".into() }));

        let result = SectionSet::Plain(sample_sections()).compress(LZMA, &compressor);
        assert_eq!(result, Err(FfsGenError::CompressionFailed { algorithm: "LZMA", reason: "no codec".into() }));
    }

    #[test]
    fn test_codec_receive_the_concatenated_sections() {
        let sections = sample_sections();
        let expected = section::concatenate(&sections);
        let mut compressor = MockSectionCompressor::new();
        compressor.expect_compress().withf(move |_, data| data == expected.as_slice()).returning(|_, _| Ok(vec![1, 2]));

        let wrapper = wrap(&sections, LZMA, &compressor).unwrap();
        assert_eq!(unwrap_section(&wrapper).4, vec![1, 2]);
    }

    #[test]
    fn test_wrap_rejects_empty_input() {
        assert_eq!(wrap(&[], LZMA, &Reverse), Err(FfsGenError::MissingInput));
    }
}
