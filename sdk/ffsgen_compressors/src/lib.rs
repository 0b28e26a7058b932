//! # Section Compressor Implementations
//!
//! This crate provides implementations of the `ffsgen::compress::SectionCompressor` trait.
//!
//! ## Features
//!
//! Each feature corresponds to one codec, so only the codecs a tool needs are compiled.
//! - `lzma`: Enables the `LzmaCompressor` implementation, producing the LZMA stream stored in
//!   GUID-defined LZMA sections.
//!
//! `CompositeCompressor` is always available and dispatches to every enabled codec.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
#[cfg(feature = "lzma")]
mod lzma;
#[cfg(feature = "lzma")]
pub use lzma::LzmaCompressor;

mod composite;
pub use composite::CompositeCompressor;
