//! Module for a composite of all enabled compressors.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use ffsgen::{
    FfsGenError,
    compress::{CompressionAlgorithm, SectionCompressor},
};

#[cfg(feature = "lzma")]
use crate::LzmaCompressor;

/// Provides a composite section compressor that combines all compressors based on enabled feature flags.
#[derive(Default, Clone, Copy)]
pub struct CompositeCompressor {
    #[cfg(feature = "lzma")]
    lzma: LzmaCompressor,
}

impl SectionCompressor for CompositeCompressor {
    fn compress(&self, algorithm: CompressionAlgorithm, _data: &[u8]) -> Result<Vec<u8>, FfsGenError> {
        #[cfg(feature = "lzma")]
        {
            match self.lzma.compress(algorithm, _data) {
                Err(FfsGenError::UnsupportedCompression(_)) => (),
                Err(err) => return Err(err),
                Ok(buffer) => return Ok(buffer),
            }
        }

        Err(FfsGenError::UnsupportedCompression(algorithm.name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffsgen::compress::LZMA;
    use ffsgen_pi::fw_fs::ffs::guid;

    #[test]
    #[cfg(feature = "lzma")]
    fn test_lzma_dispatch_to_the_lzma_compressor() {
        let data = b"composite compressor test data".repeat(8);
        assert_eq!(CompositeCompressor::default().compress(LZMA, &data), LzmaCompressor.compress(LZMA, &data));
    }

    #[test]
    fn test_unknown_algorithms_are_unsupported() {
        let other = CompressionAlgorithm { name: "OTHER", tag: 42, section_guid: guid::LZMA_SECTION };
        assert_eq!(
            CompositeCompressor::default().compress(other, b"data"),
            Err(FfsGenError::UnsupportedCompression("OTHER".into()))
        );
    }
}
