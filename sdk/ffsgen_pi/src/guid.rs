//! Canonical GUID text handling.
//!
//! GUIDs are written as `XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX` and stored in the UEFI `EFI_GUID`
//! binary layout: the first three fields little-endian, the remaining eight bytes in text order.
//!
//! ```rust
//! use ffsgen_pi::guid::{guid_from_str, GuidDisplay};
//!
//! let guid = guid_from_str("EE4E5898-3914-4259-9D6E-DC7BD79403CF")?;
//! assert_eq!(guid.as_bytes()[0..4], [0x98, 0x58, 0x4E, 0xEE]);
//! assert_eq!(GuidDisplay(&guid).to_string(), "EE4E5898-3914-4259-9D6E-DC7BD79403CF");
//! # Ok::<(), ffsgen_pi::guid::GuidParseError>(())
//! ```
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use core::fmt;
use r_efi::efi;
use uuid::Uuid;

/// Number of characters in the canonical text form.
const CANONICAL_LENGTH: usize = 36;

/// Character indices (zero based) of the dashes in the canonical text form.
const DASH_POSITIONS: [usize; 4] = [8, 13, 18, 23];

/// Error type for GUID text parsing.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum GuidParseError {
    /// The text is not exactly 36 characters long.
    InvalidLength {
        /// Expected number of characters
        expected: usize,
        /// Actual number of characters found
        actual: usize,
    },
    /// A character that should be a hex digit is not one.
    InvalidHexCharacter {
        /// Position (one based) of the invalid character
        position: usize,
        /// The invalid character that was found
        character: char,
    },
    /// A dash is missing or appears outside of the 8-4-4-4-12 grouping.
    MisplacedSeparator {
        /// Position (one based) of the offending character
        position: usize,
        /// The character that was found
        character: char,
    },
}

impl fmt::Display for GuidParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuidParseError::InvalidLength { expected, actual } => {
                write!(f, "expected {expected} characters, found {actual}")
            }
            GuidParseError::InvalidHexCharacter { position, character } => {
                write!(f, "invalid hex character '{character}' at position {position}")
            }
            GuidParseError::MisplacedSeparator { position, character } => {
                write!(f, "expected '-' at position {position}, found '{character}'")
            }
        }
    }
}

impl core::error::Error for GuidParseError {}

/// Parse a GUID in canonical 8-4-4-4-12 form into its `EFI_GUID` binary layout.
///
/// Hex digits may be either case. Surrounding whitespace, braces, and dash-less forms are rejected.
pub fn guid_from_str(text: &str) -> Result<efi::Guid, GuidParseError> {
    let actual = text.chars().count();
    if actual != CANONICAL_LENGTH {
        return Err(GuidParseError::InvalidLength { expected: CANONICAL_LENGTH, actual });
    }

    let mut digits = [0u8; 32];
    let mut digit_count = 0;
    for (index, character) in text.chars().enumerate() {
        let position = index + 1;
        if DASH_POSITIONS.contains(&index) {
            if character != '-' {
                return Err(GuidParseError::MisplacedSeparator { position, character });
            }
            continue;
        }
        match character.to_digit(16) {
            Some(value) => {
                digits[digit_count] = value as u8;
                digit_count += 1;
            }
            None if character == '-' => return Err(GuidParseError::MisplacedSeparator { position, character }),
            None => return Err(GuidParseError::InvalidHexCharacter { position, character }),
        }
    }

    let time_low = parse_hex(&digits[0..8]) as u32;
    let time_mid = parse_hex(&digits[8..12]) as u16;
    let time_hi_and_version = parse_hex(&digits[12..16]) as u16;
    let clk_seq_hi_res = parse_hex(&digits[16..18]) as u8;
    let clk_seq_low = parse_hex(&digits[18..20]) as u8;
    let mut node = [0u8; 6];
    for (index, byte) in node.iter_mut().enumerate() {
        *byte = parse_hex(&digits[20 + index * 2..22 + index * 2]) as u8;
    }

    Ok(efi::Guid::from_fields(time_low, time_mid, time_hi_and_version, clk_seq_hi_res, clk_seq_low, &node))
}

fn parse_hex(digits: &[u8]) -> u32 {
    digits.iter().fold(0u32, |value, digit| (value << 4) | *digit as u32)
}

/// Formats an `efi::Guid` in uppercase canonical text form.
pub struct GuidDisplay<'a>(pub &'a efi::Guid);

impl fmt::Display for GuidDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", Uuid::from_bytes_le(*self.0.as_bytes()).hyphenated())
    }
}

impl fmt::Debug for GuidDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
