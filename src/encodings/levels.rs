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

use bytes::Bytes;

use super::rle::{RleDecoder, RleEncoder};

use crate::basic::Encoding;
use crate::errors::{ParquetError, Result};
use crate::util::bit_util::{BitReader, BitWriter, ceil, num_required_bits};

/// Computes max buffer size for level encoder/decoder based on encoding, max
/// repetition/definition level and number of total buffered values (includes null
/// values).
///
/// For the RLE encoding the bound includes one extra minimum-sized run, to leave room
/// for the run the writer may still be accumulating when it checks for fullness.
#[inline]
pub fn max_buffer_size(encoding: Encoding, max_level: i16, num_buffered_values: usize) -> usize {
    let bit_width = num_required_bits(max_level as u64);
    match encoding {
        Encoding::RLE => {
            RleEncoder::max_buffer_size(bit_width, num_buffered_values)
                + RleEncoder::min_buffer_size(bit_width)
        }
        #[allow(deprecated)]
        Encoding::BIT_PACKED => ceil(num_buffered_values * bit_width as usize, 8),
        _ => panic!("Unsupported encoding type {encoding}"),
    }
}

/// Encoder for definition/repetition levels.
///
/// Only supports RLE and BIT_PACKED encodings. For the data page v1 layout the RLE
/// variant prefixes its output with the encoded byte length as a 4-byte little-endian
/// integer.
pub enum LevelEncoder {
    Rle(RleEncoder),
    BitPacked(u8, BitWriter),
}

impl LevelEncoder {
    /// Creates new level encoder based on encoding, max level and the expected number
    /// of buffered values.
    ///
    /// Used to encode levels for data page v1.
    ///
    /// Panics, if encoding is not supported.
    pub fn v1(encoding: Encoding, max_level: i16, num_buffered_values: usize) -> Self {
        let capacity_bytes = max_buffer_size(encoding, max_level, num_buffered_values);
        let mut buffer = Vec::with_capacity(capacity_bytes);
        let bit_width = num_required_bits(max_level as u64);
        match encoding {
            Encoding::RLE => {
                // Reserve space for length header
                buffer.extend_from_slice(&[0; 4]);
                LevelEncoder::Rle(RleEncoder::new_from_buf(bit_width, buffer))
            }
            #[allow(deprecated)]
            Encoding::BIT_PACKED => {
                LevelEncoder::BitPacked(bit_width, BitWriter::new_from_buf(buffer))
            }
            _ => panic!("Unsupported encoding type {encoding}"),
        }
    }

    /// Put/encode levels vector into this level encoder.
    /// Returns number of encoded values that are less than or equal to length of the
    /// input buffer.
    #[inline]
    pub fn put(&mut self, buffer: &[i16]) -> usize {
        let mut num_encoded = 0;
        match *self {
            LevelEncoder::Rle(ref mut encoder) => {
                for value in buffer {
                    encoder.put(*value as u64);
                    num_encoded += 1;
                }
                encoder.flush();
            }
            LevelEncoder::BitPacked(bit_width, ref mut encoder) => {
                for value in buffer {
                    encoder.put_value(*value as u64, bit_width as usize);
                    num_encoded += 1;
                }
            }
        }
        num_encoded
    }

    /// Finalizes level encoder, flush all intermediate buffers and return resulting
    /// encoded buffer. Returned buffer is already truncated to encoded bytes only.
    #[inline]
    pub fn consume(self) -> Vec<u8> {
        match self {
            LevelEncoder::Rle(encoder) => {
                let mut encoded_data = encoder.consume();
                // Account for the buffer offset
                let encoded_len = encoded_data.len() - std::mem::size_of::<i32>();
                let len_bytes = (encoded_len as i32).to_le_bytes();
                encoded_data[0..len_bytes.len()].copy_from_slice(&len_bytes);
                encoded_data
            }
            LevelEncoder::BitPacked(_, encoder) => encoder.consume(),
        }
    }
}

/// Decoder for definition/repetition levels.
///
/// The RLE variant expects the 4-byte little-endian length prefix written by
/// [`LevelEncoder::consume`] for data page v1.
pub enum LevelDecoder {
    Rle(Option<usize>, RleDecoder),
    BitPacked(Option<usize>, u8, BitReader),
}

impl LevelDecoder {
    /// Creates new level decoder based on encoding and max definition/repetition
    /// level.
    ///
    /// Panics if encoding is not supported.
    pub fn v1(encoding: Encoding, max_level: i16) -> Self {
        let bit_width = num_required_bits(max_level as u64);
        match encoding {
            Encoding::RLE => LevelDecoder::Rle(None, RleDecoder::new(bit_width)),
            #[allow(deprecated)]
            Encoding::BIT_PACKED => {
                LevelDecoder::BitPacked(None, bit_width, BitReader::new(Bytes::new()))
            }
            _ => panic!("Unsupported encoding type {encoding}"),
        }
    }

    /// Sets data for this level decoder, and returns total number of bytes consumed,
    /// including the length prefix in the RLE case.
    ///
    /// `num_buffered_values` represents the total number of values in the page.
    pub fn set_data(&mut self, num_buffered_values: usize, data: Bytes) -> Result<usize> {
        match *self {
            LevelDecoder::Rle(ref mut num_values, ref mut decoder) => {
                let data_size = data
                    .get(0..4)
                    .map(|b| i32::from_le_bytes(b.try_into().unwrap()))
                    .ok_or_else(|| eof_err!("Not enough bytes to read levels length"))?;
                if data_size < 0 || data.len() < 4 + data_size as usize {
                    return Err(eof_err!("Levels length {} exceeds page size", data_size));
                }
                *num_values = Some(num_buffered_values);
                decoder.set_data(data.slice(4..4 + data_size as usize));
                Ok(4 + data_size as usize)
            }
            LevelDecoder::BitPacked(ref mut num_values, bit_width, ref mut reader) => {
                *num_values = Some(num_buffered_values);
                let num_bytes = ceil(num_buffered_values * bit_width as usize, 8);
                if data.len() < num_bytes {
                    return Err(eof_err!("Not enough bytes to read levels"));
                }
                *reader = BitReader::new(data.slice(0..num_bytes));
                Ok(num_bytes)
            }
        }
    }

    /// Decodes up to `buffer.len()` levels, returning the number decoded.
    pub fn get(&mut self, buffer: &mut [i16]) -> Result<usize> {
        match *self {
            LevelDecoder::Rle(ref mut num_values, ref mut decoder) => {
                let remaining = num_values
                    .ok_or_else(|| general_err!("set_data was not called"))?
                    .min(buffer.len());
                let mut values_read = 0;
                while values_read < remaining {
                    match decoder.get()? {
                        Some(value) => {
                            buffer[values_read] = value as i16;
                            values_read += 1;
                        }
                        None => break,
                    }
                }
                *num_values = num_values.map(|v| v - values_read);
                Ok(values_read)
            }
            LevelDecoder::BitPacked(ref mut num_values, bit_width, ref mut reader) => {
                let remaining = num_values
                    .ok_or_else(|| general_err!("set_data was not called"))?
                    .min(buffer.len());
                let mut values_read = 0;
                while values_read < remaining {
                    match reader.get_value(bit_width as usize) {
                        Some(value) => {
                            buffer[values_read] = value as i16;
                            values_read += 1;
                        }
                        None => break,
                    }
                }
                *num_values = num_values.map(|v| v - values_read);
                Ok(values_read)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(encoding: Encoding, max_level: i16, levels: &[i16]) {
        let mut encoder = LevelEncoder::v1(encoding, max_level, levels.len());
        assert_eq!(encoder.put(levels), levels.len());
        let encoded = encoder.consume();
        assert!(encoded.len() <= max_buffer_size(encoding, max_level, levels.len()) + 4);

        let mut decoder = LevelDecoder::v1(encoding, max_level);
        let consumed = decoder.set_data(levels.len(), encoded.clone().into()).unwrap();
        assert_eq!(consumed, encoded.len());

        let mut decoded = vec![0i16; levels.len()];
        assert_eq!(decoder.get(&mut decoded).unwrap(), levels.len());
        assert_eq!(&decoded, levels);
    }

    #[test]
    fn test_rle_levels_roundtrip() {
        roundtrip(Encoding::RLE, 1, &[0, 1, 1, 0, 1, 1, 1, 1, 1, 0]);
        roundtrip(Encoding::RLE, 1, &[1; 1000]);
        roundtrip(Encoding::RLE, 3, &(0..512).map(|i| (i % 4) as i16).collect::<Vec<_>>());
    }

    #[test]
    fn test_rle_levels_length_prefix() {
        let mut encoder = LevelEncoder::v1(Encoding::RLE, 1, 5);
        encoder.put(&[1, 0, 1, 1, 0]);
        let encoded = encoder.consume();
        let prefix = i32::from_le_bytes(encoded[0..4].try_into().unwrap());
        assert_eq!(prefix as usize, encoded.len() - 4);
    }

    #[test]
    #[allow(deprecated)]
    fn test_bit_packed_levels_roundtrip() {
        roundtrip(Encoding::BIT_PACKED, 1, &[0, 1, 1, 0, 1]);
        roundtrip(Encoding::BIT_PACKED, 7, &(0..100).map(|i| (i % 8) as i16).collect::<Vec<_>>());
    }

    #[test]
    #[should_panic(expected = "Unsupported encoding type")]
    fn test_unsupported_level_encoding() {
        LevelEncoder::v1(Encoding::PLAIN, 1, 10);
    }

    #[test]
    fn test_decoder_without_set_data() {
        let mut decoder = LevelDecoder::v1(Encoding::RLE, 1);
        let mut buffer = vec![0i16; 4];
        assert!(decoder.get(&mut buffer).is_err());
    }
}
