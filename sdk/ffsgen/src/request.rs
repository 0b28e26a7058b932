//! File generation requests.
//!
//! A [`FileRequest`] collects everything needed to produce one firmware file: the ordered input
//! items, optional metadata (display name, version), an optional dependency expression, the file
//! identifier inputs, and the compression choice. [`FileRequest::build`] runs the pipeline:
//!
//! 1. each input item is encoded as one section, in order;
//! 2. a USER_INTERFACE section is appended for the display name, then a VERSION section for the
//!    version string;
//! 3. the dependency expression section is appended;
//! 4. if compression is requested, all sections collapse into one GUID-defined section;
//! 5. the file identifier is resolved and the file header is assembled.
//!
//! ## Examples
//!
//! ```rust
//! use ffsgen::{
//!     FfsGenError,
//!     compress::{CompressionAlgorithm, SectionCompressor},
//!     request::{FileRequest, InputItem},
//! };
//! use ffsgen_pi::fw_fs::ffs::section::Type;
//!
//! struct NoCompression;
//! impl SectionCompressor for NoCompression {
//!     fn compress(&self, algorithm: CompressionAlgorithm, _data: &[u8]) -> Result<Vec<u8>, FfsGenError> {
//!         Err(FfsGenError::UnsupportedCompression(algorithm.name.into()))
//!     }
//! }
//!
//! let file = FileRequest::new()
//!     .with_item(InputItem::new("driver.efi", vec![0x4D, 0x5A]).with_section_type(Type::Pe32))
//!     .with_file_type("DRIVER")
//!     .with_guid("11111111-2222-3333-4444-555555555555")
//!     .build(&NoCompression)
//!     .unwrap();
//! assert_eq!(file.len(), 24 + 6);
//! ```
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use alloc::{
    string::{String, ToString},
    vec::Vec,
};
use core::str;
use ffsgen_pi::fw_fs::ffs::{file, section::Type as SectionType};
use r_efi::efi;

use crate::{
    FfsGenError,
    compress::{CompressionAlgorithm, SectionCompressor, SectionSet},
    depex::{self, DependencyExpression},
    file::{FirmwareFile, file_type_from_name},
    guid,
    section::{self, EncodedSection},
};

/// Input name suffixes recognized by auto-detection, most specific first.
static SUFFIXES: &[(&str, SectionType, Option<file::Type>)] = &[
    (".dxe.depex", SectionType::DxeDepex, Some(file::Type::Driver)),
    (".dxe.dpx", SectionType::DxeDepex, Some(file::Type::Driver)),
    (".smm.depex", SectionType::MmDepex, Some(file::Type::Mm)),
    (".mm.depex", SectionType::MmDepex, Some(file::Type::Mm)),
    (".smm.dpx", SectionType::MmDepex, Some(file::Type::Mm)),
    (".pei.depex", SectionType::PeiDepex, Some(file::Type::Peim)),
    (".pei.dpx", SectionType::PeiDepex, Some(file::Type::Peim)),
    (".efi", SectionType::Pe32, None),
    (".pe32", SectionType::Pe32, None),
    (".dll", SectionType::Pe32, None),
    (".te", SectionType::Te, None),
    (".raw", SectionType::Raw, None),
    (".bin", SectionType::Raw, None),
    (".ver", SectionType::Version, None),
    (".version", SectionType::Version, None),
    (".ui", SectionType::UserInterface, None),
    (".guid", SectionType::FreeformSubtypeGuid, None),
    (".freeform", SectionType::FreeformSubtypeGuid, None),
];

fn ends_with_ignore_case(name: &str, suffix: &str) -> bool {
    name.len() >= suffix.len() && name.as_bytes()[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix.as_bytes())
}

/// Detect the section type of an input from its name.
///
/// Returns the section type and, for dependency expression inputs, the file type implied by the
/// expression's phase.
pub fn detect(name: &str) -> Result<(SectionType, Option<file::Type>), FfsGenError> {
    SUFFIXES
        .iter()
        .find(|(suffix, _, _)| ends_with_ignore_case(name, suffix))
        .map(|(_, section_type, file_type)| (*section_type, *file_type))
        .ok_or_else(|| FfsGenError::UnknownInputSuffix(name.to_string()))
}

/// One payload to place in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputItem {
    name: String,
    section_type: Option<SectionType>,
    data: Vec<u8>,
}

impl InputItem {
    /// Create an item named `name` (typically its source path) holding `data`.
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self { name: name.into(), section_type: None, data }
    }

    /// Set the section type explicitly.
    pub fn with_section_type(mut self, section_type: SectionType) -> Self {
        self.section_type = Some(section_type);
        self
    }

    /// The item name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The explicit section type, if any.
    pub fn section_type(&self) -> Option<SectionType> {
        self.section_type
    }

    /// The payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn text(&self) -> Result<&str, FfsGenError> {
        str::from_utf8(&self.data)
            .map(str::trim_end)
            .map_err(|_| FfsGenError::InvalidPayload { item: self.name.clone(), reason: "text is not valid UTF-8" })
    }

    fn encode(&self, section_type: SectionType, build_number: u16) -> Result<EncodedSection, FfsGenError> {
        match section_type {
            SectionType::UserInterface => section::encode_user_interface(self.text()?),
            SectionType::Version => section::encode_version(build_number, self.text()?),
            SectionType::FreeformSubtypeGuid => {
                if self.data.len() < 16 {
                    return Err(FfsGenError::InvalidPayload {
                        item: self.name.clone(),
                        reason: "payload is shorter than the 16-byte sub-type GUID",
                    });
                }
                let (sub_type, content) = self.data.split_at(16);
                section::encode_freeform_subtype_guid(&guid::from_raw(sub_type)?, content)
            }
            _ => section::encode(section_type, &self.data),
        }
    }
}

/// Source of the generated dependency expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepexSource {
    /// Operand strings, all of which must be satisfied.
    Operands(Vec<String>),
    /// The "always satisfied" expression.
    AlwaysTrue,
}

/// A request to generate one firmware file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRequest {
    items: Vec<InputItem>,
    name: Option<String>,
    file_type: Option<String>,
    version: Option<String>,
    build_number: u16,
    guid: Option<String>,
    default_guid: Option<String>,
    depex: Option<DepexSource>,
    compression: Option<String>,
    auto_detect: bool,
    fixed_checksum: bool,
}

impl FileRequest {
    /// Create an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an input item.
    pub fn with_item(mut self, item: InputItem) -> Self {
        self.items.push(item);
        self
    }

    /// Append several input items.
    pub fn with_items(mut self, items: impl IntoIterator<Item = InputItem>) -> Self {
        self.items.extend(items);
        self
    }

    /// Set the display name, emitted as a USER_INTERFACE section and used to derive the file GUID.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the file type by name.
    pub fn with_file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = Some(file_type.into());
        self
    }

    /// Set the version string, emitted as a VERSION section.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the build number stored in VERSION sections.
    pub fn with_build_number(mut self, build_number: u16) -> Self {
        self.build_number = build_number;
        self
    }

    /// Set the explicit file GUID.
    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = Some(guid.into());
        self
    }

    /// Set the GUID used when neither an explicit GUID nor a display name is given.
    pub fn with_default_guid(mut self, guid: impl Into<String>) -> Self {
        self.default_guid = Some(guid.into());
        self
    }

    /// Set the dependency expression.
    pub fn with_depex(mut self, depex: DepexSource) -> Self {
        self.depex = Some(depex);
        self
    }

    /// Set the dependency expression from operand text separated by whitespace and/or commas.
    ///
    /// A sole `TRUE` operand selects the "always satisfied" expression.
    pub fn with_depex_text(self, text: &str) -> Self {
        let operands = depex::split_operands(text).map(String::from).collect();
        self.with_depex(DepexSource::Operands(operands))
    }

    /// Request compression of the section set with the named algorithm.
    pub fn with_compression(mut self, algorithm: impl Into<String>) -> Self {
        self.compression = Some(algorithm.into());
        self
    }

    /// Detect the section type of untyped items from their names.
    pub fn with_auto_detect(mut self, auto_detect: bool) -> Self {
        self.auto_detect = auto_detect;
        self
    }

    /// Store the fixed file checksum instead of computing one.
    pub fn with_fixed_checksum(mut self, fixed_checksum: bool) -> Self {
        self.fixed_checksum = fixed_checksum;
        self
    }

    /// The input items.
    pub fn items(&self) -> &[InputItem] {
        &self.items
    }

    /// Resolve each item's section type, and the file type auto-detection implies, if any.
    fn item_types(&self) -> Result<(Vec<SectionType>, Option<file::Type>), FfsGenError> {
        let mut detected_file_type = None;
        let mut section_types = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let section_type = match (item.section_type, self.auto_detect) {
                (Some(section_type), _) => section_type,
                (None, true) => {
                    let (section_type, file_type) = detect(&item.name)?;
                    log::debug!("detected {} section for input '{}'", section_type.name(), item.name);
                    detected_file_type = detected_file_type.or(file_type);
                    section_type
                }
                (None, false) => return Err(FfsGenError::MissingSectionType(item.name.clone())),
            };
            section_types.push(section_type);
        }
        Ok((section_types, detected_file_type))
    }

    fn resolve_file_type(&self, detected: Option<file::Type>) -> Result<file::Type, FfsGenError> {
        match (&self.file_type, detected) {
            (Some(name), _) => file_type_from_name(name),
            (None, Some(file_type)) => {
                log::debug!("file type {} implied by dependency expression input", file_type.name());
                Ok(file_type)
            }
            (None, None) => Ok(file::Type::FreeForm),
        }
    }

    fn resolve_identifier(&self) -> Result<efi::Guid, FfsGenError> {
        match guid::resolve(self.guid.as_deref(), self.name.as_deref()) {
            Err(FfsGenError::MissingIdentifier) => match &self.default_guid {
                Some(text) => {
                    log::warn!("no file GUID or name given, using default GUID {text}");
                    guid::parse(text)
                }
                None => Err(FfsGenError::MissingIdentifier),
            },
            result => result,
        }
    }

    /// Encode every section of the file, before compression.
    pub fn sections(&self) -> Result<Vec<EncodedSection>, FfsGenError> {
        if self.items.is_empty() {
            return Err(FfsGenError::MissingInput);
        }
        let (section_types, detected_file_type) = self.item_types()?;
        let file_type = self.resolve_file_type(detected_file_type)?;
        self.encode_sections(&section_types, file_type)
    }

    fn encode_sections(
        &self,
        section_types: &[SectionType],
        file_type: file::Type,
    ) -> Result<Vec<EncodedSection>, FfsGenError> {
        let mut sections = Vec::with_capacity(self.items.len() + 3);
        for (item, section_type) in self.items.iter().zip(section_types.iter().copied()) {
            if section_type.is_depex() && !depex::matches_phase(section_type, file_type) {
                log::warn!("input '{}' is a {} section in a {} file", item.name, section_type.name(), file_type.name());
            }
            sections.push(item.encode(section_type, self.build_number)?);
        }

        if let Some(name) = &self.name {
            sections.push(section::encode_user_interface(name)?);
        }
        if let Some(version) = &self.version {
            sections.push(section::encode_version(self.build_number, version)?);
        }
        match &self.depex {
            Some(DepexSource::Operands(operands)) => sections.push(depex::encode(file_type, operands, false)?),
            Some(DepexSource::AlwaysTrue) => sections.push(DependencyExpression::AlwaysTrue.encode(file_type)?),
            None => (),
        }
        Ok(sections)
    }

    /// Build the firmware file.
    ///
    /// `compressor` is only invoked when compression is requested. Nothing is produced unless every
    /// step succeeds.
    pub fn build(&self, compressor: &dyn SectionCompressor) -> Result<Vec<u8>, FfsGenError> {
        if self.items.is_empty() {
            return Err(FfsGenError::MissingInput);
        }
        let algorithm = self.compression.as_deref().map(CompressionAlgorithm::from_name).transpose()?;
        let (section_types, detected_file_type) = self.item_types()?;
        let file_type = self.resolve_file_type(detected_file_type)?;
        let name = self.resolve_identifier()?;

        let mut section_set = SectionSet::Plain(self.encode_sections(&section_types, file_type)?);
        if let Some(algorithm) = algorithm {
            section_set = section_set.compress(algorithm, compressor)?;
        }

        FirmwareFile::new(name, file_type, section_set).with_data_checksum(!self.fixed_checksum).serialize()
    }
}
