//! Well-known GUIDs for GUID-defined sections.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use r_efi::efi;

/// Section definition GUID for LZMA compressed GUID-defined sections.
///
/// EE4E5898-3914-4259-9D6E-DC7BD79403CF
pub const LZMA_SECTION: efi::Guid =
    efi::Guid::from_fields(0xEE4E5898, 0x3914, 0x4259, 0x9D, 0x6E, &[0xDC, 0x7B, 0xD7, 0x94, 0x03, 0xCF]);
