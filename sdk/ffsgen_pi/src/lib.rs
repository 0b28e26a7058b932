//! Platform Initialization (PI) definitions for Firmware File System generation.
//!
//! This crate carries the raw values from the UEFI Platform Initialization Specification V1.8A that
//! are needed to produce Firmware File System (FFS) files: file and section types, file attributes,
//! GUID-defined section attributes, dependency expression opcodes, and the canonical GUID text codec.
//!
//! Everything in this crate is read-only data or pure functions over it.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
#![cfg_attr(not(test), no_std)]

pub mod depex;
pub mod fw_fs;
pub mod guid;

pub use guid::{GuidParseError, guid_from_str};
