//! Firmware File System (FFS) file and section definitions.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
pub mod attributes;
pub mod file;
pub mod guid;
pub mod section;
