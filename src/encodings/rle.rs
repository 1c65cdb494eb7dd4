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

//! RLE/Bit-Packing hybrid encoding for values that fit in a fixed bit width.
//!
//! The grammar for this encoding looks like the following (copied verbatim from the
//! format specification):
//!
//! ```text
//! rle-bit-packed-hybrid: <length> <encoded-data>
//! length := length of the <encoded-data> in bytes stored as 4 bytes little endian
//! encoded-data := <run>*
//! run := <bit-packed-run> | <rle-run>
//! bit-packed-run := <bit-packed-header> <bit-packed-values>
//! bit-packed-header := varint-encode(<bit-pack-count> << 1 | 1)
//! // we always bit-pack a multiple of 8 values at a time, so we only store the
//! // number of values / 8
//! bit-pack-count := (number of values in this run) / 8
//! bit-packed-values := bit packed values
//! rle-run := <rle-header> <repeated-value>
//! rle-header := varint-encode((number of times repeated) << 1)
//! repeated-value := value that is repeated, using a fixed-width of
//! round-up-to-next-byte(bit-width)
//! ```
//!
//! The `<length>` prefix is not part of this module; callers that need it (the level
//! encoder for data page v1) write it themselves.

use bytes::Bytes;

use crate::errors::{ParquetError, Result};
use crate::util::bit_util::{BitReader, BitWriter, MAX_VLQ_BYTE_LEN, ceil};

/// Maximum number of values that a single bit-packed run header can describe.
const MAX_GROUPS_PER_BIT_PACKED_RUN: usize = (1 << 6) - 1;

/// RLE/bit-packed hybrid encoder.
///
/// The encoder buffers eight values at a time. When a value repeats at least eight
/// times it switches to an RLE run, otherwise groups of eight values are appended to
/// the current bit-packed run whose header byte is patched once the run ends.
pub struct RleEncoder {
    /// Number of bits needed to encode the value. Must be in the range of [0, 64].
    bit_width: u8,

    /// Underlying writer which holds the already encoded runs.
    bit_writer: BitWriter,

    /// Buffered values for the run in progress.
    buffered_values: [u64; 8],

    /// Number of values buffered, in the range [0, 8].
    num_buffered_values: usize,

    /// The last value seen.
    current_value: u64,

    /// Number of times `current_value` has repeated and has not yet been written.
    repeat_count: usize,

    /// Number of groups of 8 written to the bit-packed run in progress.
    bit_packed_group_count: usize,

    /// Offset of the reserved header byte of the bit-packed run in progress.
    bit_packed_header_pos: Option<usize>,
}

impl RleEncoder {
    /// Creates an encoder for values of `bit_width` bits.
    pub fn new(bit_width: u8) -> Self {
        Self::new_from_buf(bit_width, Vec::new())
    }

    /// Create a RLE encoder for values of `bit_width` bits, appending to `buffer`.
    pub fn new_from_buf(bit_width: u8, buffer: Vec<u8>) -> Self {
        Self {
            bit_width,
            bit_writer: BitWriter::new_from_buf(buffer),
            buffered_values: [0; 8],
            num_buffered_values: 0,
            current_value: 0,
            repeat_count: 0,
            bit_packed_group_count: 0,
            bit_packed_header_pos: None,
        }
    }

    /// Returns the minimum buffer size needed to encode a single run with
    /// `bit_width` bits.
    pub fn min_buffer_size(bit_width: u8) -> usize {
        // 1 indicator byte and one group of 8 bit-packed values
        let max_bit_packed_run_size = 1 + ceil(8 * bit_width as usize, 8);
        // max length varint and a single byte-padded value
        let max_rle_run_size = MAX_VLQ_BYTE_LEN + ceil(bit_width as usize, 8);
        max_bit_packed_run_size.max(max_rle_run_size)
    }

    /// Returns the maximum buffer size to encode `num_values` values with
    /// `bit_width` bits.
    pub fn max_buffer_size(bit_width: u8, num_values: usize) -> usize {
        // The largest encoding is with the shortest possible runs of 8
        let num_runs = ceil(num_values, 8);
        let bit_packed_max_size = num_runs + num_runs * bit_width as usize;

        // The largest encoding as RLE runs
        let min_rle_run_size = 1 + ceil(bit_width as usize, 8);
        let rle_max_size = num_runs * min_rle_run_size;

        bit_packed_max_size.max(rle_max_size)
    }

    /// Encodes `value`, which must be representable with `bit_width` bits.
    #[inline]
    pub fn put(&mut self, value: u64) {
        if self.repeat_count > 0 && value == self.current_value {
            self.repeat_count += 1;
            if self.repeat_count >= 8 {
                // This is an RLE run; wait for a different value before writing it out.
                return;
            }
        } else {
            if self.repeat_count >= 8 {
                self.flush_rle_run();
            }
            self.repeat_count = 1;
            self.current_value = value;
        }

        self.buffered_values[self.num_buffered_values] = value;
        self.num_buffered_values += 1;
        if self.num_buffered_values == 8 {
            self.write_or_append_bit_packed_run();
        }
    }

    /// Flushes any run in progress. The encoder can continue to accept values.
    pub fn flush(&mut self) {
        if self.repeat_count >= 8 {
            self.flush_rle_run();
        } else if self.num_buffered_values > 0 {
            // Pad the partial group with zeros; the reader relies on the value count to
            // ignore them.
            for i in self.num_buffered_values..8 {
                self.buffered_values[i] = 0;
            }
            self.num_buffered_values = 8;
            self.write_or_append_bit_packed_run();
            self.end_bit_packed_run();
        } else {
            self.end_bit_packed_run();
        }
        self.repeat_count = 0;
        self.num_buffered_values = 0;
    }

    /// Flushes any run in progress and returns the encoded bytes.
    pub fn consume(mut self) -> Vec<u8> {
        self.flush();
        self.bit_writer.consume()
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.bit_writer.bytes_written()
    }

    /// Returns true if no bytes have been written yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn flush_rle_run(&mut self) {
        debug_assert!(self.repeat_count >= 8);
        self.end_bit_packed_run();
        self.bit_writer.put_vlq_int((self.repeat_count as u64) << 1);
        self.bit_writer
            .put_aligned(self.current_value, ceil(self.bit_width as usize, 8));
        self.repeat_count = 0;
        self.num_buffered_values = 0;
    }

    fn write_or_append_bit_packed_run(&mut self) {
        debug_assert_eq!(self.num_buffered_values, 8);
        if self.bit_packed_group_count >= MAX_GROUPS_PER_BIT_PACKED_RUN {
            // The run header is a single byte holding up to 6 bits of group count.
            self.end_bit_packed_run();
        }
        if self.bit_packed_header_pos.is_none() {
            self.bit_packed_header_pos = Some(self.bit_writer.skip(1));
        }
        for value in self.buffered_values {
            self.bit_writer.put_value(value, self.bit_width as usize);
        }
        // a group is 8 * bit_width bits, so this flushes whole bytes only
        self.bit_writer.flush();
        self.bit_packed_group_count += 1;
        self.num_buffered_values = 0;
        self.repeat_count = 0;
    }

    fn end_bit_packed_run(&mut self) {
        if let Some(header_pos) = self.bit_packed_header_pos.take() {
            let header = ((self.bit_packed_group_count as u8) << 1) | 1;
            self.bit_writer.put_aligned_offset(header, header_pos);
            self.bit_packed_group_count = 0;
        }
    }
}

/// RLE/bit-packed hybrid decoder.
pub struct RleDecoder {
    /// Number of bits used to encode the value. Must be in the range [0, 64].
    bit_width: u8,

    /// Bit reader loaded with input buffer.
    bit_reader: Option<BitReader>,

    /// The remaining number of values in RLE for this run.
    rle_left: u32,

    /// The remaining number of values in bit-packed for this run.
    bit_packed_left: u32,

    /// The current value for the case of RLE mode.
    current_value: Option<u64>,
}

impl RleDecoder {
    /// Creates a decoder for values of `bit_width` bits.
    pub fn new(bit_width: u8) -> Self {
        Self {
            bit_width,
            bit_reader: None,
            rle_left: 0,
            bit_packed_left: 0,
            current_value: None,
        }
    }

    /// Sets the data to decode.
    pub fn set_data(&mut self, data: Bytes) {
        self.bit_reader = Some(BitReader::new(data));
        self.rle_left = 0;
        self.bit_packed_left = 0;
        self.current_value = None;
    }

    /// Decodes the next value, or returns `None` if the input is exhausted.
    pub fn get(&mut self) -> Result<Option<u64>> {
        if self.rle_left == 0 && self.bit_packed_left == 0 && !self.reload() {
            return Ok(None);
        }

        let value = if self.rle_left > 0 {
            let value = self
                .current_value
                .ok_or_else(|| general_err!("RLE decoder is not initialized"))?;
            self.rle_left -= 1;
            value
        } else {
            let reader = self
                .bit_reader
                .as_mut()
                .ok_or_else(|| general_err!("RLE decoder is not initialized"))?;
            let value = reader
                .get_value(self.bit_width as usize)
                .ok_or_else(|| eof_err!("Not enough data to decode bit-packed run"))?;
            self.bit_packed_left -= 1;
            value
        };

        Ok(Some(value))
    }

    /// Decodes up to `buffer.len()` values, returning how many were decoded.
    pub fn get_batch(&mut self, buffer: &mut [u64]) -> Result<usize> {
        let mut values_read = 0;
        while values_read < buffer.len() {
            match self.get()? {
                Some(value) => {
                    buffer[values_read] = value;
                    values_read += 1;
                }
                None => break,
            }
        }
        Ok(values_read)
    }

    fn reload(&mut self) -> bool {
        let reader = match self.bit_reader.as_mut() {
            Some(reader) => reader,
            None => return false,
        };
        match reader.get_vlq_int() {
            Some(indicator_value) => {
                if indicator_value & 1 == 1 {
                    self.bit_packed_left = ((indicator_value >> 1) * 8) as u32;
                } else {
                    self.rle_left = (indicator_value >> 1) as u32;
                    let value_width = ceil(self.bit_width as usize, 8);
                    self.current_value = reader.get_aligned(value_width);
                    if self.current_value.is_none() {
                        // truncated RLE run
                        self.rle_left = 0;
                        return false;
                    }
                }
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn roundtrip(bit_width: u8, values: &[u64]) {
        let mut encoder = RleEncoder::new(bit_width);
        for v in values {
            encoder.put(*v);
        }
        let buf = encoder.consume();
        assert!(buf.len() <= RleEncoder::max_buffer_size(bit_width, values.len()) + 16);

        let mut decoder = RleDecoder::new(bit_width);
        decoder.set_data(buf.into());
        let mut decoded = vec![0u64; values.len()];
        let n = decoder.get_batch(&mut decoded).unwrap();
        assert_eq!(n, values.len());
        assert_eq!(&decoded, values);
    }

    #[test]
    fn test_rle_all_repeats() {
        roundtrip(3, &[4u64; 100]);
    }

    #[test]
    fn test_rle_no_repeats() {
        let values: Vec<u64> = (0..100).map(|i| i % 8).collect();
        roundtrip(3, &values);
    }

    #[test]
    fn test_rle_mixed_runs() {
        let mut values = vec![1u64; 20];
        values.extend((0..17).map(|i| i % 4));
        values.extend(vec![3u64; 9]);
        values.push(0);
        roundtrip(2, &values);
    }

    #[test]
    fn test_rle_single_value() {
        roundtrip(1, &[1]);
        roundtrip(1, &[0]);
    }

    #[test]
    fn test_rle_long_bit_packed_run() {
        // enough groups to force multiple bit-packed run headers
        let values: Vec<u64> = (0..8 * 200).map(|i| (i % 2) as u64).collect();
        roundtrip(1, &values);
    }

    #[test]
    fn test_rle_random() {
        let mut rng = StdRng::seed_from_u64(42);
        for bit_width in [1u8, 2, 5, 10] {
            let max = (1u64 << bit_width) - 1;
            let values: Vec<u64> = (0..1000)
                .map(|_| {
                    if rng.gen_bool(0.5) {
                        max
                    } else {
                        rng.gen_range(0..=max)
                    }
                })
                .collect();
            roundtrip(bit_width, &values);
        }
    }

    #[test]
    fn test_rle_decoder_known_bytes() {
        // RLE run: header 100 << 1, value 2 on one byte
        let data = vec![200u8, 1, 2];
        let mut decoder = RleDecoder::new(3);
        decoder.set_data(data.into());
        let mut buffer = vec![0u64; 100];
        assert_eq!(decoder.get_batch(&mut buffer).unwrap(), 100);
        assert!(buffer.iter().all(|v| *v == 2));
    }
}
