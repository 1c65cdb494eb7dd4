// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Contains codec interface and supported codec implementations.
//!
//! See [`Compression`] enum for all available compression algorithms.

use std::io::{Read, Write, copy};

use crate::basic::Compression;
use crate::errors::{ParquetError, Result};

/// Parquet compression codec interface.
pub trait Codec: Send {
    /// Compresses data stored in slice `input_buf` and appends the compressed result
    /// to `output_buf`.
    ///
    /// Note that you'll need to call `clear()` before reusing the same `output_buf`
    /// across different `compress` calls.
    fn compress(&mut self, input_buf: &[u8], output_buf: &mut Vec<u8>) -> Result<()>;

    /// Decompresses data stored in slice `input_buf` and appends output to
    /// `output_buf`, returning the number of bytes appended.
    fn decompress(&mut self, input_buf: &[u8], output_buf: &mut Vec<u8>) -> Result<usize>;
}

/// Given the compression type `codec`, returns a codec used to compress and
/// decompress bytes for the compression type.
///
/// This returns `None` if the codec type is `UNCOMPRESSED`.
pub fn create_codec(codec: Compression) -> Result<Option<Box<dyn Codec>>> {
    match codec {
        Compression::UNCOMPRESSED => Ok(None),
        Compression::SNAPPY => Ok(Some(Box::new(SnappyCodec::new()))),
        Compression::GZIP => Ok(Some(Box::new(GZipCodec::new()))),
        Compression::ZSTD => Ok(Some(Box::new(ZstdCodec::new()))),
        codec => Err(nyi_err!("The codec type {} is not supported yet", codec)),
    }
}

/// Codec for Snappy compression format.
pub struct SnappyCodec {
    decoder: snap::raw::Decoder,
    encoder: snap::raw::Encoder,
}

impl SnappyCodec {
    /// Creates new Snappy compression codec.
    fn new() -> Self {
        Self {
            decoder: snap::raw::Decoder::new(),
            encoder: snap::raw::Encoder::new(),
        }
    }
}

impl Codec for SnappyCodec {
    fn decompress(&mut self, input_buf: &[u8], output_buf: &mut Vec<u8>) -> Result<usize> {
        let len = snap::raw::decompress_len(input_buf)?;
        let offset = output_buf.len();
        output_buf.resize(offset + len, 0);
        self.decoder
            .decompress(input_buf, &mut output_buf[offset..])
            .map_err(|e| e.into())
    }

    fn compress(&mut self, input_buf: &[u8], output_buf: &mut Vec<u8>) -> Result<()> {
        let output_buf_len = output_buf.len();
        let required_len = snap::raw::max_compress_len(input_buf.len());
        output_buf.resize(output_buf_len + required_len, 0);
        let n = self
            .encoder
            .compress(input_buf, &mut output_buf[output_buf_len..])?;
        output_buf.truncate(output_buf_len + n);
        Ok(())
    }
}

/// Codec for GZIP compression algorithm.
pub struct GZipCodec {}

impl GZipCodec {
    /// Creates new GZIP compression codec.
    fn new() -> Self {
        Self {}
    }
}

impl Codec for GZipCodec {
    fn decompress(&mut self, input_buf: &[u8], output_buf: &mut Vec<u8>) -> Result<usize> {
        let mut decoder = flate2::read::GzDecoder::new(input_buf);
        decoder.read_to_end(output_buf).map_err(|e| e.into())
    }

    fn compress(&mut self, input_buf: &[u8], output_buf: &mut Vec<u8>) -> Result<()> {
        let mut encoder = flate2::write::GzEncoder::new(output_buf, flate2::Compression::default());
        encoder.write_all(input_buf)?;
        encoder.try_finish().map_err(|e| e.into())
    }
}

/// Codec for Zstandard compression algorithm.
pub struct ZstdCodec {}

impl ZstdCodec {
    /// Creates new Zstandard compression codec.
    fn new() -> Self {
        Self {}
    }
}

/// Compression level used by the Zstandard codec.
const ZSTD_COMPRESSION_LEVEL: i32 = 1;

impl Codec for ZstdCodec {
    fn decompress(&mut self, input_buf: &[u8], output_buf: &mut Vec<u8>) -> Result<usize> {
        let mut decoder = zstd::Decoder::new(input_buf)?;
        match copy(&mut decoder, output_buf) {
            Ok(n) => Ok(n as usize),
            Err(e) => Err(e.into()),
        }
    }

    fn compress(&mut self, input_buf: &[u8], output_buf: &mut Vec<u8>) -> Result<()> {
        let mut encoder = zstd::Encoder::new(output_buf, ZSTD_COMPRESSION_LEVEL)?;
        encoder.write_all(input_buf)?;
        match encoder.finish() {
            Ok(_) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn test_roundtrip(c: Compression, data: &[u8]) {
        let mut c1 = create_codec(c).unwrap().unwrap();
        let mut c2 = create_codec(c).unwrap().unwrap();

        // compress with c1
        let mut compressed = Vec::new();
        let mut decompressed = Vec::new();
        c1.compress(data, &mut compressed).unwrap();

        // decompress with c2
        let decompressed_size = c2.decompress(&compressed, &mut decompressed).unwrap();
        assert_eq!(data.len(), decompressed_size);
        assert_eq!(data, decompressed.as_slice());

        compressed.clear();

        // compress with c2
        c2.compress(data, &mut compressed).unwrap();

        // decompress with c1
        decompressed.clear();
        let decompressed_size = c1.decompress(&compressed, &mut decompressed).unwrap();
        assert_eq!(data.len(), decompressed_size);
        assert_eq!(data, decompressed.as_slice());
    }

    fn test_codec(c: Compression) {
        let sizes = vec![100, 10000, 100000];
        let mut rng = StdRng::seed_from_u64(31);
        for size in sizes {
            // compressible data with repeats
            let data: Vec<u8> = (0..size).map(|_| rng.gen_range(0..16)).collect();
            test_roundtrip(c, &data);
        }
    }

    #[test]
    fn test_codec_snappy() {
        test_codec(Compression::SNAPPY);
    }

    #[test]
    fn test_codec_gzip() {
        test_codec(Compression::GZIP);
    }

    #[test]
    fn test_codec_zstd() {
        test_codec(Compression::ZSTD);
    }

    #[test]
    fn test_codec_uncompressed_is_none() {
        assert!(create_codec(Compression::UNCOMPRESSED).unwrap().is_none());
    }

    #[test]
    fn test_codec_unsupported() {
        assert!(create_codec(Compression::LZO).is_err());
    }
}
