//! Module for LZMA compression.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use std::io::Cursor;

use ffsgen::{
    FfsGenError,
    compress::{self, CompressionAlgorithm, SectionCompressor},
};

/// Produces the LZMA stream for GUID-defined LZMA sections.
///
/// The unpacked size is written to the LZMA header so decompressors can pre-allocate.
#[derive(Default, Clone, Copy)]
pub struct LzmaCompressor;

impl SectionCompressor for LzmaCompressor {
    fn compress(&self, algorithm: CompressionAlgorithm, data: &[u8]) -> Result<Vec<u8>, FfsGenError> {
        if algorithm != compress::LZMA {
            return Err(FfsGenError::UnsupportedCompression(algorithm.name.to_string()));
        }

        let mut compressed = Vec::new();
        let options = lzma_rs::compress::Options {
            unpacked_size: lzma_rs::compress::UnpackedSize::WriteToHeader(Some(data.len() as u64)),
        };
        lzma_rs::lzma_compress_with_options(&mut Cursor::new(data), &mut compressed, &options).map_err(|err| {
            FfsGenError::CompressionFailed { algorithm: algorithm.name, reason: err.to_string() }
        })?;

        log::trace!("lzma: {:#x} bytes in, {:#x} bytes out", data.len(), compressed.len());
        Ok(compressed)
    }
}
