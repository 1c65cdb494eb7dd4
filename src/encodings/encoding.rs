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

//! Value encoders for the encodings the writer emits: PLAIN for data and
//! dictionary pages, RLE_DICTIONARY for dictionary-encoded data pages.

use std::hash::Hash;
use std::marker::PhantomData;

use bytes::Bytes;

use hashbrown::HashMap;
use hashbrown::hash_map::RawEntryMut;

use crate::basic::{Encoding, Type};
use crate::data_type::private::ParquetValueType;
use crate::data_type::{AsBytes, DataType};
use crate::encodings::rle::RleEncoder;
use crate::errors::{ParquetError, Result};
use crate::schema::types::ColumnDescPtr;
use crate::util::bit_util::{BitWriter, num_required_bits};

// ----------------------------------------------------------------------
// Encoders

/// An value encoder for a data type whose output is a single byte buffer.
pub trait Encoder<T: DataType>: Send {
    /// Encodes data from `values`.
    fn put(&mut self, values: &[T::T]) -> Result<()>;

    /// Returns the encoding type of this encoder.
    fn encoding(&self) -> Encoding;

    /// Returns an estimate of the encoded data, in bytes.
    /// Method call must be O(1).
    fn estimated_data_encoded_size(&self) -> usize;

    /// Flushes the underlying byte buffer that's being processed by this encoder, and
    /// return the immutable copy of it. This will also reset the internal state.
    fn flush_buffer(&mut self) -> Result<Bytes>;
}

/// Gets encoder for the particular data type `T` and `encoding`.
///
/// Dictionary encoding is not supported through this function; the writer constructs
/// [`DictEncoder`] directly, because dictionary encoding carries per-chunk state.
pub fn get_encoder<T: DataType>(encoding: Encoding) -> Result<Box<dyn Encoder<T>>> {
    let encoder: Box<dyn Encoder<T>> = match encoding {
        Encoding::PLAIN => Box::new(PlainEncoder::new()),
        Encoding::PLAIN_DICTIONARY | Encoding::RLE_DICTIONARY => {
            return Err(general_err!("Cannot initialize this encoding through this function"));
        }
        e => return Err(nyi_err!("Encoding {} is not supported", e)),
    };
    Ok(encoder)
}

/// PLAIN encoding.
///
/// - BOOLEAN - 1 bit per value, LSB first.
/// - INT32 - 4 bytes per value, little-endian.
/// - INT64 - 8 bytes per value, little-endian.
/// - FLOAT - 4 bytes per value, IEEE little-endian.
/// - DOUBLE - 8 bytes per value, IEEE little-endian.
/// - BYTE_ARRAY - 4 byte length stored as little endian, followed by bytes.
/// - FIXED_LEN_BYTE_ARRAY - just the bytes are stored.
pub struct PlainEncoder<T: DataType> {
    buffer: Vec<u8>,
    bit_writer: BitWriter,
    _phantom: PhantomData<T>,
}

impl<T: DataType> Default for PlainEncoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DataType> PlainEncoder<T> {
    /// Creates new PLAIN encoder.
    pub fn new() -> Self {
        Self {
            buffer: vec![],
            bit_writer: BitWriter::new(),
            _phantom: PhantomData,
        }
    }
}

impl<T: DataType> Encoder<T> for PlainEncoder<T> {
    fn put(&mut self, values: &[T::T]) -> Result<()> {
        T::T::encode(values, &mut self.buffer, &mut self.bit_writer)
    }

    fn encoding(&self) -> Encoding {
        Encoding::PLAIN
    }

    fn estimated_data_encoded_size(&self) -> usize {
        self.buffer.len() + self.bit_writer.bytes_written()
    }

    fn flush_buffer(&mut self) -> Result<Bytes> {
        let packed = std::mem::take(&mut self.bit_writer).consume();
        self.buffer.extend_from_slice(&packed);
        Ok(std::mem::take(&mut self.buffer).into())
    }
}

// ----------------------------------------------------------------------
// Dictionary encoding

/// Dictionary encoder.
///
/// The dictionary encoding builds a dictionary of values encountered in a given
/// column. The dictionary page is written first, before the data pages of the column
/// chunk.
///
/// Dictionary page format: the entries in the dictionary - in dictionary order -
/// using the plain encoding.
///
/// Data page format: the bit width used to encode the entry ids stored as 1 byte
/// (max bit width = 32), followed by the values encoded using RLE/Bit packed
/// described above (with the given bit width).
pub struct DictEncoder<T: DataType> {
    /// Hasher state for looking values up by their byte representation.
    state: ahash::RandomState,

    /// Lookup from a value to its dictionary index. Only the index is stored; the
    /// raw-entry API resolves hash collisions against `uniques`, so values are kept
    /// once.
    dedup: HashMap<u64, (), ()>,

    /// The dictionary entries, in the order they were first encountered.
    uniques: Vec<T::T>,

    /// Byte size the entries will occupy in the PLAIN encoded dictionary page,
    /// compared against the dictionary page size limit by the writer.
    dict_page_size: usize,

    /// Value width for FIXED_LEN_BYTE_ARRAY columns.
    type_length: usize,

    /// The buffered indices of the data page in progress.
    indices: Vec<u64>,
}

impl<T: DataType> DictEncoder<T> {
    /// Creates new dictionary encoder.
    pub fn new(desc: ColumnDescPtr) -> Self {
        Self {
            state: Default::default(),
            dedup: HashMap::with_hasher(()),
            uniques: vec![],
            dict_page_size: 0,
            type_length: desc.type_length().max(0) as usize,
            indices: vec![],
        }
    }

    /// Returns true if dictionary entries are sorted, false otherwise.
    pub fn is_sorted(&self) -> bool {
        // Sorting is not supported currently.
        false
    }

    /// Returns number of unique values (keys) in the dictionary.
    pub fn num_entries(&self) -> usize {
        self.uniques.len()
    }

    /// Returns size of unique values (keys) in the dictionary, in bytes.
    pub fn dict_encoded_size(&self) -> usize {
        self.dict_page_size
    }

    /// Writes out the dictionary values with PLAIN encoding in a byte buffer, and
    /// returns the result.
    pub fn write_dict(&self) -> Result<Bytes> {
        let mut plain_encoder = PlainEncoder::<T>::new();
        plain_encoder.put(&self.uniques)?;
        plain_encoder.flush_buffer()
    }

    /// Writes out the dictionary indices with RLE encoding in a byte buffer, and
    /// returns the result.
    pub fn write_indices(&mut self) -> Result<Bytes> {
        let buffer_len = self.estimated_data_encoded_size();
        let mut buffer = Vec::with_capacity(buffer_len);
        // Write bit width in the first byte
        buffer.push(self.bit_width());

        let mut encoder = RleEncoder::new_from_buf(self.bit_width(), buffer);
        for index in &self.indices {
            encoder.put(*index)
        }
        self.indices.clear();
        Ok(encoder.consume().into())
    }

    fn put_one(&mut self, value: &T::T) {
        let hash = hash_value(&self.state, value);

        let state = &self.state;
        let uniques = &mut self.uniques;
        let dict_page_size = &mut self.dict_page_size;
        let type_length = self.type_length;

        let entry = self
            .dedup
            .raw_entry_mut()
            .from_hash(hash, |index| value == &uniques[*index as usize]);

        let index = match entry {
            RawEntryMut::Occupied(entry) => *entry.into_key(),
            RawEntryMut::Vacant(entry) => {
                let (base_size, num_elements) = value.dict_encoding_size();
                *dict_page_size += match T::get_physical_type() {
                    Type::BYTE_ARRAY => base_size + num_elements,
                    Type::FIXED_LEN_BYTE_ARRAY => type_length,
                    _ => base_size,
                };

                let index = uniques.len() as u64;
                uniques.push(value.clone());
                *entry
                    .insert_with_hasher(hash, index, (), |index| {
                        hash_value(state, &uniques[*index as usize])
                    })
                    .0
            }
        };
        self.indices.push(index);
    }

    #[inline]
    fn bit_width(&self) -> u8 {
        num_required_bits(self.num_entries().saturating_sub(1) as u64)
    }
}

fn hash_value<T: AsBytes + ?Sized>(state: &ahash::RandomState, value: &T) -> u64 {
    use std::hash::{BuildHasher, Hasher};
    let mut hasher = state.build_hasher();
    value.as_bytes().hash(&mut hasher);
    hasher.finish()
}

impl<T: DataType> Encoder<T> for DictEncoder<T> {
    fn put(&mut self, values: &[T::T]) -> Result<()> {
        self.indices.reserve(values.len());
        for i in values {
            self.put_one(i)
        }
        Ok(())
    }

    fn encoding(&self) -> Encoding {
        Encoding::RLE_DICTIONARY
    }

    fn estimated_data_encoded_size(&self) -> usize {
        let bit_width = self.bit_width();
        1 + RleEncoder::max_buffer_size(bit_width, self.indices.len())
    }

    fn flush_buffer(&mut self) -> Result<Bytes> {
        self.write_indices()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::Repetition;
    use crate::data_type::{ByteArray, ByteArrayType, Int32Type};
    use crate::schema::types::{ColumnDescriptor, ColumnPath, Type as SchemaType};
    use std::sync::Arc;

    fn test_column_desc(physical_type: Type) -> ColumnDescPtr {
        let ty = SchemaType::primitive_type_builder("col", physical_type)
            .with_repetition(Repetition::REQUIRED)
            .build()
            .unwrap();
        Arc::new(ColumnDescriptor::new(
            Arc::new(ty),
            0,
            0,
            ColumnPath::from("col"),
        ))
    }

    #[test]
    fn test_plain_encoder_int32() {
        let mut encoder = PlainEncoder::<Int32Type>::new();
        encoder.put(&[1, 2, 3]).unwrap();
        assert_eq!(encoder.estimated_data_encoded_size(), 12);
        let buf = encoder.flush_buffer().unwrap();
        assert_eq!(buf.as_ref(), &[1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0]);
        // encoder is reset after flush
        assert_eq!(encoder.estimated_data_encoded_size(), 0);
    }

    #[test]
    fn test_plain_encoder_byte_array() {
        let mut encoder = PlainEncoder::<ByteArrayType>::new();
        encoder.put(&[ByteArray::from("ab")]).unwrap();
        let buf = encoder.flush_buffer().unwrap();
        assert_eq!(buf.as_ref(), &[2, 0, 0, 0, b'a', b'b']);
    }

    #[test]
    fn test_dict_encoder_dedup() {
        let desc = test_column_desc(Type::INT32);
        let mut encoder = DictEncoder::<Int32Type>::new(desc);
        encoder.put(&[10, 20, 10, 10, 30]).unwrap();
        assert_eq!(encoder.num_entries(), 3);
        assert_eq!(encoder.dict_encoded_size(), 12);

        let dict = encoder.write_dict().unwrap();
        assert_eq!(dict.as_ref(), &[10, 0, 0, 0, 20, 0, 0, 0, 30, 0, 0, 0]);
    }

    #[test]
    fn test_dict_encoder_indices_bit_width_prefix() {
        let desc = test_column_desc(Type::INT32);
        let mut encoder = DictEncoder::<Int32Type>::new(desc);
        encoder.put(&[1, 2, 3, 4, 5]).unwrap();
        let indices = encoder.write_indices().unwrap();
        // 5 entries need 3 bits per index
        assert_eq!(indices[0], 3);
    }

    #[test]
    fn test_get_encoder_rejects_dictionary() {
        let res = get_encoder::<Int32Type>(Encoding::RLE_DICTIONARY);
        assert!(res.is_err());
    }
}
