//! File name GUID resolution.
//!
//! A generated file is named either by an explicit GUID string or by a GUID derived from its display
//! name. The derived GUID is the first 16 bytes of the SHA-256 digest of the name encoded the same
//! way a VERSION section encodes text with build number zero: one zero code unit, the UTF-16LE code
//! units of the name, and a terminating zero code unit. The derivation is deterministic but not meant
//! to be secret or collision resistant against an adversary.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use alloc::string::ToString;
use ffsgen_pi::guid::{GuidDisplay, guid_from_str};
use r_efi::efi;
use sha2::{Digest, Sha256};

use crate::{FfsGenError, section::version_payload};

/// Parse a canonical GUID string, wrapping failures with the offending text.
pub fn parse(text: &str) -> Result<efi::Guid, FfsGenError> {
    guid_from_str(text).map_err(|source| FfsGenError::InvalidGuid { text: text.to_string(), source })
}

/// Derive a file name GUID from a display name.
pub fn derive_from_name(name: &str) -> efi::Guid {
    let digest = Sha256::digest(version_payload(0, name));
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    efi::Guid::from_bytes(&bytes)
}

/// Resolve the file name GUID.
///
/// An explicit GUID string takes precedence and must be in canonical form. Otherwise the GUID is
/// derived from `display_name`. When neither is present the caller is expected to supply its own
/// default; this function reports [`FfsGenError::MissingIdentifier`].
pub fn resolve(explicit: Option<&str>, display_name: Option<&str>) -> Result<efi::Guid, FfsGenError> {
    match (explicit, display_name) {
        (Some(text), _) => {
            let guid = parse(text)?;
            log::debug!("using explicit file GUID {}", GuidDisplay(&guid));
            Ok(guid)
        }
        (None, Some(name)) => {
            let guid = derive_from_name(name);
            log::debug!("derived file GUID {} from name '{}'", GuidDisplay(&guid), name);
            Ok(guid)
        }
        (None, None) => Err(FfsGenError::MissingIdentifier),
    }
}

/// Convert a raw identifier into a GUID, enforcing the 16-byte length.
pub fn from_raw(identifier: &[u8]) -> Result<efi::Guid, FfsGenError> {
    let bytes: &[u8; 16] =
        identifier.try_into().map_err(|_| FfsGenError::InvalidIdentifierLength(identifier.len()))?;
    Ok(efi::Guid::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffsgen_pi::GuidParseError;

    #[test]
    fn test_explicit_guid_take_precedence() {
        let guid = resolve(Some("11111111-2222-3333-4444-555555555555"), Some("MyDriver")).unwrap();
        assert_eq!(
            guid.as_bytes(),
            &[0x11, 0x11, 0x11, 0x11, 0x22, 0x22, 0x33, 0x33, 0x44, 0x44, 0x55, 0x55, 0x55, 0x55, 0x55, 0x55]
        );
    }

    #[test]
    fn test_name_derive_guid_when_no_explicit_guid() {
        assert_eq!(resolve(None, Some("MyDriver")).unwrap(), derive_from_name("MyDriver"));
    }

    #[test]
    fn test_derivation_is_deterministic_and_distinct() {
        assert_eq!(derive_from_name("MyDriver"), derive_from_name("MyDriver"));
        assert_ne!(derive_from_name("MyDriver"), derive_from_name("MyDriver2"));
        assert_ne!(derive_from_name("MyDriver"), derive_from_name("mydriver"));
        assert_ne!(derive_from_name(""), derive_from_name(" "));
    }

    #[test]
    fn test_derivation_digest_the_version_encoding_of_the_name() {
        let digest = Sha256::digest([0x00, 0x00, b'A', 0x00, 0x00, 0x00]);
        assert_eq!(derive_from_name("A").as_bytes(), &digest[..16]);
    }

    #[test]
    fn test_missing_inputs_are_reported() {
        assert_eq!(resolve(None, None), Err(FfsGenError::MissingIdentifier));
    }

    #[test]
    fn test_malformed_explicit_guid_is_a_parse_error() {
        let err = resolve(Some("11111111-2222-3333-4444-55555555555"), Some("MyDriver")).unwrap_err();
        assert_eq!(
            err,
            FfsGenError::InvalidGuid {
                text: "11111111-2222-3333-4444-55555555555".into(),
                source: GuidParseError::InvalidLength { expected: 36, actual: 35 },
            }
        );
        assert_eq!(err.kind(), crate::ErrorKind::Parse);
    }

    #[test]
    fn test_raw_identifiers_must_be_sixteen_bytes() {
        assert_eq!(from_raw(&[1u8; 16]).unwrap().as_bytes(), &[1u8; 16]);
        assert_eq!(from_raw(&[1u8; 15]), Err(FfsGenError::InvalidIdentifierLength(15)));
        assert_eq!(from_raw(&[1u8; 17]), Err(FfsGenError::InvalidIdentifierLength(17)));
    }
}
