//! Firmware File System (FFS) file generation.
//!
//! This crate builds a single FFS file, as defined by the UEFI Platform Initialization
//! Specification, from a set of payloads:
//!
//! - [`section`] encodes one payload as one section record and lays sections out with the required
//!   alignment.
//! - [`guid`] resolves the file name GUID, either from canonical text or derived from a display name.
//! - [`depex`] compiles a dependency expression into the phase-specific DEPEX section.
//! - [`compress`] collapses a section set into one compressed GUID-defined section through a
//!   [`compress::SectionCompressor`].
//! - [`file`] assembles the file header with its size, checksums and state.
//! - [`request`] ties these together for one generation request.
//!
//! The crate performs no I/O and carries no compression codec; see the `ffsgen_compressors` crate
//! for codec implementations.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
#![cfg_attr(all(not(test), not(feature = "mockall")), no_std)]

extern crate alloc;

pub mod compress;
pub mod depex;
pub mod err;
pub mod file;
pub mod guid;
pub mod request;
pub mod section;

pub use err::{ErrorKind, FfsGenError};
