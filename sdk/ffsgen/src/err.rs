//! Error types for the FFS generation crate.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use alloc::string::String;
use core::fmt;
use ffsgen_pi::GuidParseError;

/// Broad classification of a [`FfsGenError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown or unsupported type names, missing inputs, and other request mistakes.
    Configuration,
    /// Malformed identifier text or dependency expression operands.
    Parse,
    /// The compression codec failed or is unavailable.
    Codec,
    /// A value violated a hard format limit.
    Precondition,
}

/// Error definitions for FFS generation.
///
/// Every variant carries enough context (offending name, tag, or text) to diagnose the failure
/// from the message alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FfsGenError {
    /// The section type name or raw value is not known.
    UnknownSectionType(String),
    /// The file type name is not known.
    UnknownFileType(String),
    /// A dependency expression was requested for a file type that no dispatcher evaluates.
    NoDepexPhase(&'static str),
    /// The request contains no input items.
    MissingInput,
    /// An input item has no section type and auto-detection is disabled.
    MissingSectionType(String),
    /// No explicit identifier, display name, or default identifier was supplied.
    MissingIdentifier,
    /// The payload of an input item cannot be encoded as the requested section type.
    InvalidPayload {
        /// Name of the input item.
        item: String,
        /// Why the payload was rejected.
        reason: &'static str,
    },
    /// The requested compression algorithm is not supported by the codec.
    UnsupportedCompression(String),
    /// The identifier text is not a canonical GUID.
    InvalidGuid {
        /// The text that failed to parse.
        text: String,
        /// Parse failure detail.
        source: GuidParseError,
    },
    /// A dependency expression has no operands and is not the "always true" form.
    EmptyDependencyExpression,
    /// The codec failed to compress the section data.
    CompressionFailed {
        /// Algorithm name.
        algorithm: &'static str,
        /// Codec-provided reason.
        reason: String,
    },
    /// A raw identifier is not exactly 16 bytes.
    InvalidIdentifierLength(usize),
    /// Auto-detection could not map the input name to a section type.
    UnknownInputSuffix(String),
    /// The section size does not fit the extended 32-bit size field.
    SectionTooLarge(usize),
    /// The GUID-defined section header does not fit the 16-bit data offset field.
    DataOffsetOverflow(usize),
}

impl FfsGenError {
    /// Classification of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FfsGenError::UnknownSectionType(_)
            | FfsGenError::UnknownFileType(_)
            | FfsGenError::NoDepexPhase(_)
            | FfsGenError::MissingInput
            | FfsGenError::MissingSectionType(_)
            | FfsGenError::MissingIdentifier
            | FfsGenError::InvalidPayload { .. }
            | FfsGenError::UnsupportedCompression(_) => ErrorKind::Configuration,
            FfsGenError::InvalidGuid { .. } | FfsGenError::EmptyDependencyExpression => ErrorKind::Parse,
            FfsGenError::CompressionFailed { .. } => ErrorKind::Codec,
            FfsGenError::InvalidIdentifierLength(_)
            | FfsGenError::UnknownInputSuffix(_)
            | FfsGenError::SectionTooLarge(_)
            | FfsGenError::DataOffsetOverflow(_) => ErrorKind::Precondition,
        }
    }
}

impl fmt::Display for FfsGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FfsGenError::UnknownSectionType(name) => write!(f, "unknown section type '{name}'"),
            FfsGenError::UnknownFileType(name) => write!(f, "unknown file type '{name}'"),
            FfsGenError::NoDepexPhase(file_type) => {
                write!(f, "file type {file_type} does not support a dependency expression")
            }
            FfsGenError::MissingInput => write!(f, "no input sections were provided"),
            FfsGenError::MissingSectionType(item) => {
                write!(f, "no section type given for input '{item}' and auto-detection is disabled")
            }
            FfsGenError::MissingIdentifier => {
                write!(f, "no file GUID, display name, or default GUID was provided")
            }
            FfsGenError::InvalidPayload { item, reason } => write!(f, "invalid payload for input '{item}': {reason}"),
            FfsGenError::UnsupportedCompression(name) => write!(f, "unsupported compression algorithm '{name}'"),
            FfsGenError::InvalidGuid { text, source } => write!(f, "invalid GUID '{text}': {source}"),
            FfsGenError::EmptyDependencyExpression => write!(f, "dependency expression has no operands"),
            FfsGenError::CompressionFailed { algorithm, reason } => {
                write!(f, "{algorithm} compression failed: {reason}")
            }
            FfsGenError::InvalidIdentifierLength(len) => {
                write!(f, "file identifier must be 16 bytes, got {len}")
            }
            FfsGenError::UnknownInputSuffix(name) => {
                write!(f, "cannot detect the section type of input '{name}' from its name")
            }
            FfsGenError::SectionTooLarge(size) => write!(f, "section of {size:#x} bytes exceeds the maximum size"),
            FfsGenError::DataOffsetOverflow(offset) => {
                write!(f, "GUID-defined section data offset {offset:#x} does not fit in 16 bits")
            }
        }
    }
}

impl core::error::Error for FfsGenError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            FfsGenError::InvalidGuid { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_errors_are_classified() {
        assert_eq!(FfsGenError::UnknownFileType("X".into()).kind(), ErrorKind::Configuration);
        assert_eq!(FfsGenError::MissingInput.kind(), ErrorKind::Configuration);
        assert_eq!(FfsGenError::EmptyDependencyExpression.kind(), ErrorKind::Parse);
        assert_eq!(
            FfsGenError::CompressionFailed { algorithm: "LZMA", reason: "boom".into() }.kind(),
            ErrorKind::Codec
        );
        assert_eq!(FfsGenError::InvalidIdentifierLength(15).kind(), ErrorKind::Precondition);
        assert_eq!(FfsGenError::UnknownInputSuffix("a.txt".into()).kind(), ErrorKind::Precondition);
    }

    #[test]
    fn test_messages_name_the_offending_input() {
        let err = FfsGenError::InvalidGuid {
            text: "1234".into(),
            source: GuidParseError::InvalidLength { expected: 36, actual: 4 },
        };
        assert_eq!(err.to_string(), "invalid GUID '1234': expected 36 characters, found 4");
        assert!(core::error::Error::source(&err).is_some());
        assert_eq!(FfsGenError::UnknownSectionType("PE33".into()).to_string(), "unknown section type 'PE33'");
        assert!(FfsGenError::UnknownInputSuffix("blob.txt".into()).to_string().contains("blob.txt"));
    }
}
