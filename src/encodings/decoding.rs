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

//! Value decoders for the encodings the reader understands: PLAIN and
//! RLE_DICTIONARY.

use bytes::Bytes;

use crate::basic::Encoding;
use crate::data_type::private::ParquetValueType;
use crate::data_type::{DataType, PlainDecoderDetails};
use crate::encodings::rle::RleDecoder;
use crate::errors::{ParquetError, Result};
use crate::schema::types::ColumnDescPtr;

// ----------------------------------------------------------------------
// Decoders

/// A value decoder for a data type.
pub trait Decoder<T: DataType>: Send {
    /// Sets the data to decode to be `data`, which should contain `num_values` of
    /// values to decode.
    fn set_data(&mut self, data: Bytes, num_values: usize) -> Result<()>;

    /// Consumes values from this decoder and write the results to `buffer`. This will
    /// try to fill up `buffer`.
    ///
    /// Returns the actual number of values decoded, which should be equal to
    /// `buffer.len()` unless the remaining number of values is less than
    /// `buffer.len()`.
    fn get(&mut self, buffer: &mut [T::T]) -> Result<usize>;

    /// Returns the number of values left in this decoder stream.
    fn values_left(&self) -> usize;

    /// Returns the encoding for this decoder.
    fn encoding(&self) -> Encoding;
}

/// Gets a decoder for the column descriptor `descr` and encoding type `encoding`.
///
/// Dictionary encoding is not supported through this function; the page machinery
/// constructs [`DictDecoder`] directly because it carries the per-chunk dictionary.
pub fn get_decoder<T: DataType>(
    descr: ColumnDescPtr,
    encoding: Encoding,
) -> Result<Box<dyn Decoder<T>>> {
    let decoder: Box<dyn Decoder<T>> = match encoding {
        Encoding::PLAIN => Box::new(PlainDecoder::new(descr.type_length())),
        Encoding::PLAIN_DICTIONARY | Encoding::RLE_DICTIONARY => {
            return Err(general_err!("Cannot initialize this encoding through this function"));
        }
        e => return Err(nyi_err!("Encoding {} is not supported", e)),
    };
    Ok(decoder)
}

/// PLAIN decoding, the counterpart of [`PlainEncoder`].
///
/// [`PlainEncoder`]: crate::encodings::encoding::PlainEncoder
pub struct PlainDecoder<T: DataType> {
    inner: PlainDecoderDetails,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: DataType> PlainDecoder<T> {
    /// Creates new PLAIN decoder. `type_length` is only used when decoding
    /// FIXED_LEN_BYTE_ARRAY values.
    pub fn new(type_length: i32) -> Self {
        PlainDecoder {
            inner: PlainDecoderDetails {
                type_length,
                num_values: 0,
                start: 0,
                data: None,
                bit_reader: None,
            },
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T: DataType> Decoder<T> for PlainDecoder<T> {
    #[inline]
    fn set_data(&mut self, data: Bytes, num_values: usize) -> Result<()> {
        T::T::set_data(&mut self.inner, data, num_values);
        Ok(())
    }

    #[inline]
    fn values_left(&self) -> usize {
        self.inner.num_values
    }

    #[inline]
    fn encoding(&self) -> Encoding {
        Encoding::PLAIN
    }

    #[inline]
    fn get(&mut self, buffer: &mut [T::T]) -> Result<usize> {
        T::T::decode(buffer, &mut self.inner)
    }
}

/// Dictionary decoder.
///
/// The dictionary is read from the dictionary page with [`Self::set_dict`]; data pages
/// then carry the bit width in the first byte followed by RLE encoded indices.
pub struct DictDecoder<T: DataType> {
    /// The dictionary, materialized from the dictionary page.
    dictionary: Vec<T::T>,

    /// Whether `set_dict` has been called.
    has_dictionary: bool,

    /// The decoder for the value indices.
    rle_decoder: Option<RleDecoder>,

    /// Number of values left in the data stream.
    num_values: usize,
}

impl<T: DataType> Default for DictDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DataType> DictDecoder<T> {
    /// Creates new dictionary decoder.
    pub fn new() -> Self {
        Self {
            dictionary: vec![],
            has_dictionary: false,
            rle_decoder: None,
            num_values: 0,
        }
    }

    /// Decodes and sets values for dictionary using `decoder` decoder.
    pub fn set_dict(&mut self, mut decoder: Box<dyn Decoder<T>>) -> Result<()> {
        let num_values = decoder.values_left();
        self.dictionary.resize(num_values, T::T::default());
        let decoded = decoder.get(&mut self.dictionary)?;
        if decoded != num_values {
            return Err(general_err!(
                "Expected {} values in the dictionary, got {}",
                num_values,
                decoded
            ));
        }
        self.has_dictionary = true;
        Ok(())
    }
}

impl<T: DataType> Decoder<T> for DictDecoder<T> {
    fn set_data(&mut self, data: Bytes, num_values: usize) -> Result<()> {
        // First byte in `data` is bit width
        let bit_width = *data
            .first()
            .ok_or_else(|| eof_err!("Not enough bytes to decode bit width"))?;
        let mut rle_decoder = RleDecoder::new(bit_width);
        rle_decoder.set_data(data.slice(1..));
        self.num_values = num_values;
        self.rle_decoder = Some(rle_decoder);
        Ok(())
    }

    fn get(&mut self, buffer: &mut [T::T]) -> Result<usize> {
        if !self.has_dictionary {
            return Err(general_err!("Dictionary was not set"));
        }
        let rle = self
            .rle_decoder
            .as_mut()
            .ok_or_else(|| general_err!("RLE decoder is not initialized"))?;

        let num_values = buffer.len().min(self.num_values);
        for item in buffer.iter_mut().take(num_values) {
            let index = rle
                .get()?
                .ok_or_else(|| eof_err!("Not enough dictionary indices to decode"))?
                as usize;
            let value = self
                .dictionary
                .get(index)
                .ok_or_else(|| general_err!("Index {} out of dictionary bounds", index))?;
            *item = value.clone();
        }
        self.num_values -= num_values;
        Ok(num_values)
    }

    fn values_left(&self) -> usize {
        self.num_values
    }

    fn encoding(&self) -> Encoding {
        Encoding::RLE_DICTIONARY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::{Repetition, Type};
    use crate::data_type::{ByteArray, ByteArrayType, Int32Type};
    use crate::encodings::encoding::{DictEncoder, Encoder, PlainEncoder};
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
    fn test_plain_roundtrip_int32() {
        let values = vec![1i32, -5, 42, i32::MIN, i32::MAX];
        let mut encoder = PlainEncoder::<Int32Type>::new();
        encoder.put(&values).unwrap();
        let data = encoder.flush_buffer().unwrap();

        let mut decoder = PlainDecoder::<Int32Type>::new(0);
        decoder.set_data(data, values.len()).unwrap();
        let mut decoded = vec![0i32; values.len()];
        assert_eq!(decoder.get(&mut decoded).unwrap(), values.len());
        assert_eq!(decoded, values);
        assert_eq!(decoder.values_left(), 0);
    }

    #[test]
    fn test_plain_roundtrip_byte_array() {
        let values = vec![
            ByteArray::from("hello"),
            ByteArray::from(""),
            ByteArray::from("parquet"),
        ];
        let mut encoder = PlainEncoder::<ByteArrayType>::new();
        encoder.put(&values).unwrap();
        let data = encoder.flush_buffer().unwrap();

        let mut decoder = PlainDecoder::<ByteArrayType>::new(0);
        decoder.set_data(data, values.len()).unwrap();
        let mut decoded = vec![ByteArray::new(); values.len()];
        assert_eq!(decoder.get(&mut decoded).unwrap(), values.len());
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_dict_roundtrip() {
        let values = vec![3i32, 1, 3, 3, 2, 1];
        let desc = test_column_desc(Type::INT32);
        let mut encoder = DictEncoder::<Int32Type>::new(desc);
        encoder.put(&values).unwrap();
        let dict_page = encoder.write_dict().unwrap();
        let num_entries = encoder.num_entries();
        let indices = encoder.write_indices().unwrap();

        let mut dict_page_decoder = PlainDecoder::<Int32Type>::new(0);
        dict_page_decoder.set_data(dict_page, num_entries).unwrap();

        let mut decoder = DictDecoder::<Int32Type>::new();
        decoder.set_dict(Box::new(dict_page_decoder)).unwrap();
        decoder.set_data(indices, values.len()).unwrap();

        let mut decoded = vec![0i32; values.len()];
        assert_eq!(decoder.get(&mut decoded).unwrap(), values.len());
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_dict_decoder_without_dict() {
        let mut decoder = DictDecoder::<Int32Type>::new();
        decoder.set_data(vec![1u8, 0].into(), 1).unwrap();
        let mut buffer = vec![0i32; 1];
        assert!(decoder.get(&mut buffer).is_err());
    }
}
