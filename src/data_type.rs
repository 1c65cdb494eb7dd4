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

//! Data types that connect the Parquet physical types with their Rust-native
//! representation.

use std::cmp::Ordering;
use std::fmt;
use std::io::Write;

use bytes::Bytes;

use crate::basic::Type;
use crate::column::writer::{ColumnWriter, ColumnWriterImpl};
use crate::errors::{ParquetError, Result};
use crate::file::statistics::{Statistics, ValueStatistics};
use crate::util::bit_util::{BitReader, BitWriter};

/// Rust representation for the deprecated INT96 physical type. Value is backed by an
/// array of 3 little-endian `u32`s; the first two hold the nanoseconds within the day,
/// the third the Julian day.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Int96 {
    value: [u32; 3],
}

impl Int96 {
    /// Creates new INT96 type struct with no data set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns underlying data as slice of [`u32`].
    pub fn data(&self) -> &[u32] {
        &self.value
    }

    /// Sets data for this INT96 type.
    pub fn set_data(&mut self, elem0: u32, elem1: u32, elem2: u32) {
        self.value = [elem0, elem1, elem2];
    }

    /// Reads an INT96 value from 12 little-endian bytes.
    pub fn try_from_le_slice(b: &[u8]) -> Result<Self> {
        if b.len() != 12 {
            return Err(general_err!("Int96 requires 12 bytes, got {}", b.len()));
        }
        let mut i = Int96::new();
        i.set_data(
            u32::from_le_bytes(b[0..4].try_into().unwrap()),
            u32::from_le_bytes(b[4..8].try_into().unwrap()),
            u32::from_le_bytes(b[8..12].try_into().unwrap()),
        );
        Ok(i)
    }
}

impl PartialOrd for Int96 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        // most significant word last
        let lhs = (self.value[2], self.value[1], self.value[0]);
        let rhs = (other.value[2], other.value[1], other.value[0]);
        lhs.partial_cmp(&rhs)
    }
}

impl fmt::Display for Int96 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.data())
    }
}

/// Rust representation for BYTE_ARRAY and FIXED_LEN_BYTE_ARRAY. Value is backed by a
/// byte buffer.
#[derive(Clone, Default)]
pub struct ByteArray {
    data: Option<Bytes>,
}

impl ByteArray {
    /// Creates new byte array with no data set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets length of the underlying byte buffer.
    pub fn len(&self) -> usize {
        assert!(self.data.is_some());
        self.data.as_ref().unwrap().len()
    }

    /// Checks if the underlying buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns slice of data.
    pub fn data(&self) -> &[u8] {
        self.data
            .as_ref()
            .expect("set_data should have been called")
            .as_ref()
    }

    /// Set data from another byte buffer.
    pub fn set_data(&mut self, data: Bytes) {
        self.data = Some(data);
    }
}

impl From<Vec<u8>> for ByteArray {
    fn from(buf: Vec<u8>) -> ByteArray {
        Self {
            data: Some(buf.into()),
        }
    }
}

impl From<&str> for ByteArray {
    fn from(s: &str) -> ByteArray {
        let mut v = Vec::new();
        v.extend_from_slice(s.as_bytes());
        Self {
            data: Some(v.into()),
        }
    }
}

impl From<&[u8]> for ByteArray {
    fn from(b: &[u8]) -> ByteArray {
        Self {
            data: Some(Bytes::copy_from_slice(b)),
        }
    }
}

impl From<Bytes> for ByteArray {
    fn from(value: Bytes) -> Self {
        Self { data: Some(value) }
    }
}

impl PartialEq for ByteArray {
    fn eq(&self, other: &ByteArray) -> bool {
        match (&self.data, &other.data) {
            (Some(d1), Some(d2)) => d1.as_ref() == d2.as_ref(),
            (None, None) => true,
            _ => false,
        }
    }
}

impl PartialOrd for ByteArray {
    fn partial_cmp(&self, other: &ByteArray) -> Option<Ordering> {
        // unsigned, byte-wise comparison
        match (&self.data, &other.data) {
            (Some(d1), Some(d2)) => d1.as_ref().partial_cmp(d2.as_ref()),
            (None, None) => Some(Ordering::Equal),
            (None, Some(_)) => Some(Ordering::Less),
            (Some(_), None) => Some(Ordering::Greater),
        }
    }
}

impl fmt::Debug for ByteArray {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.data.as_ref().map(|b| b.as_ref()))
    }
}

impl fmt::Display for ByteArray {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match std::str::from_utf8(self.data()) {
            Ok(s) => write!(f, "{s:?}"),
            Err(_) => write!(f, "{:?}", self.data()),
        }
    }
}

/// Wrapper type for a fixed-length byte array.
///
/// This is mostly the same as [`ByteArray`], but has a different sort order and a
/// length fixed by the column descriptor rather than the value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FixedLenByteArray(ByteArray);

impl FixedLenByteArray {
    /// Returns the inner [`ByteArray`].
    pub fn into_inner(self) -> ByteArray {
        self.0
    }
}

impl std::ops::Deref for FixedLenByteArray {
    type Target = ByteArray;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for FixedLenByteArray {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl PartialOrd for FixedLenByteArray {
    fn partial_cmp(&self, other: &FixedLenByteArray) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl From<ByteArray> for FixedLenByteArray {
    fn from(other: ByteArray) -> Self {
        Self(other)
    }
}

impl From<FixedLenByteArray> for ByteArray {
    fn from(other: FixedLenByteArray) -> Self {
        other.0
    }
}

impl From<Vec<u8>> for FixedLenByteArray {
    fn from(buf: Vec<u8>) -> FixedLenByteArray {
        FixedLenByteArray(ByteArray::from(buf))
    }
}

impl fmt::Display for FixedLenByteArray {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ----------------------------------------------------------------------
// AsBytes converters for the write path

/// Converts an instance of a data type to a slice of bytes as `u8`.
pub trait AsBytes {
    /// Returns a slice of bytes for this data type.
    fn as_bytes(&self) -> &[u8];
}

macro_rules! gen_as_bytes {
    ($source_ty:ident) => {
        impl AsBytes for $source_ty {
            #[allow(clippy::size_of_in_element_count)]
            fn as_bytes(&self) -> &[u8] {
                // SAFETY: macro is only used with primitive types with no padding
                unsafe {
                    std::slice::from_raw_parts(
                        self as *const $source_ty as *const u8,
                        std::mem::size_of::<$source_ty>(),
                    )
                }
            }
        }
    };
}

gen_as_bytes!(i8);
gen_as_bytes!(i16);
gen_as_bytes!(i32);
gen_as_bytes!(i64);
gen_as_bytes!(u8);
gen_as_bytes!(u16);
gen_as_bytes!(u32);
gen_as_bytes!(u64);
gen_as_bytes!(f32);
gen_as_bytes!(f64);

impl AsBytes for bool {
    fn as_bytes(&self) -> &[u8] {
        // SAFETY: a bool is guaranteed to be a single 0x00/0x01 byte
        unsafe { std::slice::from_raw_parts(self as *const bool as *const u8, 1) }
    }
}

impl AsBytes for Int96 {
    fn as_bytes(&self) -> &[u8] {
        // SAFETY: [u32; 3] has no padding and a fixed 12 byte layout
        unsafe { std::slice::from_raw_parts(self.value.as_ptr() as *const u8, 12) }
    }
}

impl AsBytes for ByteArray {
    fn as_bytes(&self) -> &[u8] {
        self.data()
    }
}

impl AsBytes for FixedLenByteArray {
    fn as_bytes(&self) -> &[u8] {
        self.data()
    }
}

impl AsBytes for Vec<u8> {
    fn as_bytes(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsBytes for [u8] {
    fn as_bytes(&self) -> &[u8] {
        self
    }
}

impl AsBytes for str {
    fn as_bytes(&self) -> &[u8] {
        self.as_ref()
    }
}

// ----------------------------------------------------------------------
// PLAIN codec plumbing shared by the value encoders and decoders

/// State carried by the PLAIN decoder between calls, shared by all physical types.
pub struct PlainDecoderDetails {
    /// The remaining number of values in the byte array.
    pub(crate) num_values: usize,

    /// The current starting index in the byte array. Not used when `data` is a bit
    /// reader.
    pub(crate) start: usize,

    /// The length for the type being decoded. Only used for FIXED_LEN_BYTE_ARRAY.
    pub(crate) type_length: i32,

    /// The byte array to decode from. Not set if `data` is a bit reader.
    pub(crate) data: Option<Bytes>,

    /// Read `data` bit by bit. Only set if the type is boolean.
    pub(crate) bit_reader: Option<BitReader>,
}

pub mod private {
    use super::*;
    use crate::file::statistics::{Statistics, ValueStatistics};

    /// A value type as stored in a leaf column, able to encode and decode itself with
    /// the PLAIN encoding.
    ///
    /// This trait is sealed: the set of physical types is fixed by the format, and
    /// external implementations are not supported.
    pub trait ParquetValueType:
        PartialEq + PartialOrd + std::fmt::Debug + std::fmt::Display + Default + Clone + AsBytes + Send
    {
        const PHYSICAL_TYPE: Type;

        /// Wraps typed statistics for this value type into the [`Statistics`] enum.
        fn make_statistics(stats: ValueStatistics<Self>) -> Statistics
        where
            Self: Sized;

        /// Encode the values using the PLAIN encoding, writing either to `writer` or,
        /// for packed booleans, to `bit_writer`.
        fn encode<W: Write>(values: &[Self], writer: &mut W, bit_writer: &mut BitWriter)
            -> Result<()>;

        /// Establishes the data source for subsequent calls to [`Self::decode`].
        fn set_data(decoder: &mut PlainDecoderDetails, data: Bytes, num_values: usize);

        /// Decode up to `buffer.len()` values into `buffer`, returning the number of
        /// values decoded.
        fn decode(buffer: &mut [Self], decoder: &mut PlainDecoderDetails) -> Result<usize>;

        /// Returns the (base size, number of variable-length elements) this value
        /// contributes to a dictionary page.
        fn dict_encoding_size(&self) -> (usize, usize) {
            (std::mem::size_of::<Self>(), 1)
        }

        /// Return the value as an unsigned integer, used for statistics comparisons of
        /// columns with an unsigned converted type.
        fn as_u64(&self) -> Result<u64> {
            Err(general_err!("Type cannot be converted to u64"))
        }
    }
}

use private::ParquetValueType;

macro_rules! impl_parquet_numeric {
    ($ty:ident, $physical_ty:expr, $byte_len:literal, $stat:ident $(, $as_u64:expr)?) => {
        impl ParquetValueType for $ty {
            const PHYSICAL_TYPE: Type = $physical_ty;

            fn make_statistics(stats: ValueStatistics<Self>) -> Statistics {
                Statistics::$stat(stats)
            }

            fn encode<W: Write>(
                values: &[Self],
                writer: &mut W,
                _: &mut BitWriter,
            ) -> Result<()> {
                for value in values {
                    writer.write_all(value.as_bytes())?;
                }
                Ok(())
            }

            fn set_data(decoder: &mut PlainDecoderDetails, data: Bytes, num_values: usize) {
                decoder.data = Some(data);
                decoder.start = 0;
                decoder.num_values = num_values;
            }

            fn decode(buffer: &mut [Self], decoder: &mut PlainDecoderDetails) -> Result<usize> {
                let data = decoder
                    .data
                    .as_ref()
                    .expect("set_data should have been called");
                let num_values = buffer.len().min(decoder.num_values);
                let bytes_to_decode = $byte_len * num_values;
                if decoder.start + bytes_to_decode > data.len() {
                    return Err(eof_err!("Not enough bytes to decode"));
                }
                for (i, item) in buffer.iter_mut().enumerate().take(num_values) {
                    let offset = decoder.start + i * $byte_len;
                    *item = <$ty>::from_le_bytes(
                        data[offset..offset + $byte_len].try_into().unwrap(),
                    );
                }
                decoder.start += bytes_to_decode;
                decoder.num_values -= num_values;
                Ok(num_values)
            }

            $(
                fn as_u64(&self) -> Result<u64> {
                    let widen: fn(&$ty) -> u64 = $as_u64;
                    Ok(widen(self))
                }
            )?
        }
    };
}

impl_parquet_numeric!(i32, Type::INT32, 4, Int32, |v| *v as u64);
impl_parquet_numeric!(i64, Type::INT64, 8, Int64, |v| *v as u64);
impl_parquet_numeric!(f32, Type::FLOAT, 4, Float);
impl_parquet_numeric!(f64, Type::DOUBLE, 8, Double);

impl private::ParquetValueType for bool {
    const PHYSICAL_TYPE: Type = Type::BOOLEAN;

    fn make_statistics(stats: ValueStatistics<Self>) -> Statistics {
        Statistics::Boolean(stats)
    }

    fn encode<W: Write>(values: &[Self], _: &mut W, bit_writer: &mut BitWriter) -> Result<()> {
        for value in values {
            bit_writer.put_value(*value as u64, 1);
        }
        Ok(())
    }

    fn set_data(decoder: &mut PlainDecoderDetails, data: Bytes, num_values: usize) {
        decoder.bit_reader = Some(BitReader::new(data));
        decoder.num_values = num_values;
    }

    fn decode(buffer: &mut [Self], decoder: &mut PlainDecoderDetails) -> Result<usize> {
        let bit_reader = decoder
            .bit_reader
            .as_mut()
            .expect("set_data should have been called");
        let num_values = buffer.len().min(decoder.num_values);
        for item in buffer.iter_mut().take(num_values) {
            *item = bit_reader
                .get_value(1)
                .ok_or_else(|| eof_err!("Not enough bytes to decode"))?
                != 0;
        }
        decoder.num_values -= num_values;
        Ok(num_values)
    }

    fn as_u64(&self) -> Result<u64> {
        Ok(*self as u64)
    }
}

impl private::ParquetValueType for Int96 {
    const PHYSICAL_TYPE: Type = Type::INT96;

    fn make_statistics(stats: ValueStatistics<Self>) -> Statistics {
        Statistics::Int96(stats)
    }

    fn encode<W: Write>(values: &[Self], writer: &mut W, _: &mut BitWriter) -> Result<()> {
        for value in values {
            writer.write_all(value.as_bytes())?;
        }
        Ok(())
    }

    fn set_data(decoder: &mut PlainDecoderDetails, data: Bytes, num_values: usize) {
        decoder.data = Some(data);
        decoder.start = 0;
        decoder.num_values = num_values;
    }

    fn decode(buffer: &mut [Self], decoder: &mut PlainDecoderDetails) -> Result<usize> {
        let data = decoder
            .data
            .as_ref()
            .expect("set_data should have been called");
        let num_values = buffer.len().min(decoder.num_values);
        let bytes_to_decode = 12 * num_values;
        if decoder.start + bytes_to_decode > data.len() {
            return Err(eof_err!("Not enough bytes to decode"));
        }
        for (i, item) in buffer.iter_mut().enumerate().take(num_values) {
            let offset = decoder.start + i * 12;
            *item = Int96::try_from_le_slice(&data[offset..offset + 12])?;
        }
        decoder.start += bytes_to_decode;
        decoder.num_values -= num_values;
        Ok(num_values)
    }

    fn dict_encoding_size(&self) -> (usize, usize) {
        (12, 1)
    }
}

impl private::ParquetValueType for ByteArray {
    const PHYSICAL_TYPE: Type = Type::BYTE_ARRAY;

    fn make_statistics(stats: ValueStatistics<Self>) -> Statistics {
        Statistics::ByteArray(stats)
    }

    fn encode<W: Write>(values: &[Self], writer: &mut W, _: &mut BitWriter) -> Result<()> {
        for value in values {
            let len: u32 = value.len().try_into().unwrap();
            writer.write_all(&len.to_le_bytes())?;
            writer.write_all(value.data())?;
        }
        Ok(())
    }

    fn set_data(decoder: &mut PlainDecoderDetails, data: Bytes, num_values: usize) {
        decoder.data = Some(data);
        decoder.start = 0;
        decoder.num_values = num_values;
    }

    fn decode(buffer: &mut [Self], decoder: &mut PlainDecoderDetails) -> Result<usize> {
        let data = decoder
            .data
            .as_ref()
            .expect("set_data should have been called");
        let num_values = buffer.len().min(decoder.num_values);
        for item in buffer.iter_mut().take(num_values) {
            let len_bytes: [u8; 4] = data
                .get(decoder.start..decoder.start + 4)
                .ok_or_else(|| eof_err!("Not enough bytes to decode"))?
                .try_into()
                .unwrap();
            let len = u32::from_le_bytes(len_bytes) as usize;
            decoder.start += 4;

            if data.len() < decoder.start + len {
                return Err(eof_err!("Not enough bytes to decode"));
            }

            item.set_data(data.slice(decoder.start..decoder.start + len));
            decoder.start += len;
        }
        decoder.num_values -= num_values;
        Ok(num_values)
    }

    fn dict_encoding_size(&self) -> (usize, usize) {
        (std::mem::size_of::<u32>(), self.len())
    }
}

impl private::ParquetValueType for FixedLenByteArray {
    const PHYSICAL_TYPE: Type = Type::FIXED_LEN_BYTE_ARRAY;

    fn make_statistics(stats: ValueStatistics<Self>) -> Statistics {
        Statistics::FixedLenByteArray(stats)
    }

    fn encode<W: Write>(values: &[Self], writer: &mut W, _: &mut BitWriter) -> Result<()> {
        for value in values {
            writer.write_all(value.data())?;
        }
        Ok(())
    }

    fn set_data(decoder: &mut PlainDecoderDetails, data: Bytes, num_values: usize) {
        decoder.data = Some(data);
        decoder.start = 0;
        decoder.num_values = num_values;
    }

    fn decode(buffer: &mut [Self], decoder: &mut PlainDecoderDetails) -> Result<usize> {
        assert!(decoder.type_length > 0);

        let data = decoder
            .data
            .as_ref()
            .expect("set_data should have been called");
        let type_length = decoder.type_length as usize;
        let num_values = buffer.len().min(decoder.num_values);
        for item in buffer.iter_mut().take(num_values) {
            if data.len() < decoder.start + type_length {
                return Err(eof_err!("Not enough bytes to decode"));
            }
            item.set_data(data.slice(decoder.start..decoder.start + type_length));
            decoder.start += type_length;
        }
        decoder.num_values -= num_values;
        Ok(num_values)
    }

    fn dict_encoding_size(&self) -> (usize, usize) {
        (self.len(), 1)
    }
}

// ----------------------------------------------------------------------
// DataType: the compile-time association of physical type and value type

/// Contains the Parquet physical type information as well as the Rust value type.
pub trait DataType: 'static + Send {
    /// The Rust type backing values of this physical type.
    type T: private::ParquetValueType;

    /// Returns the physical type.
    fn get_physical_type() -> Type;

    /// Returns the typed [`ColumnWriterImpl`] if the untyped writer matches `Self`.
    fn get_column_writer(column_writer: ColumnWriter<'_>) -> Option<ColumnWriterImpl<'_, Self>>
    where
        Self: Sized;

    /// Returns a mutable reference to the typed writer if the untyped writer matches
    /// `Self`.
    fn get_column_writer_mut<'a, 'b: 'a>(
        column_writer: &'a mut ColumnWriter<'b>,
    ) -> Option<&'a mut ColumnWriterImpl<'b, Self>>
    where
        Self: Sized;
}

macro_rules! make_type {
    ($name:ident, $physical_ty:expr, $native_ty:ty, $writer_variant:ident) => {
        #[doc = concat!("Marker type for the ", stringify!($physical_ty), " physical type")]
        #[derive(Clone)]
        pub struct $name {}

        impl DataType for $name {
            type T = $native_ty;

            fn get_physical_type() -> Type {
                $physical_ty
            }

            fn get_column_writer(
                column_writer: ColumnWriter<'_>,
            ) -> Option<ColumnWriterImpl<'_, Self>> {
                match column_writer {
                    ColumnWriter::$writer_variant(w) => Some(w),
                    _ => None,
                }
            }

            fn get_column_writer_mut<'a, 'b: 'a>(
                column_writer: &'a mut ColumnWriter<'b>,
            ) -> Option<&'a mut ColumnWriterImpl<'b, Self>> {
                match column_writer {
                    ColumnWriter::$writer_variant(w) => Some(w),
                    _ => None,
                }
            }
        }
    };
}

make_type!(BoolType, Type::BOOLEAN, bool, BoolColumnWriter);
make_type!(Int32Type, Type::INT32, i32, Int32ColumnWriter);
make_type!(Int64Type, Type::INT64, i64, Int64ColumnWriter);
make_type!(Int96Type, Type::INT96, Int96, Int96ColumnWriter);
make_type!(FloatType, Type::FLOAT, f32, FloatColumnWriter);
make_type!(DoubleType, Type::DOUBLE, f64, DoubleColumnWriter);
make_type!(ByteArrayType, Type::BYTE_ARRAY, ByteArray, ByteArrayColumnWriter);
make_type!(
    FixedLenByteArrayType,
    Type::FIXED_LEN_BYTE_ARRAY,
    FixedLenByteArray,
    FixedLenByteArrayColumnWriter
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_array_from() {
        let ba = ByteArray::from(vec![1u8, 2, 3]);
        assert_eq!(ba.data(), &[1, 2, 3]);
        assert_eq!(ba.len(), 3);

        let ba = ByteArray::from("abc");
        assert_eq!(ba.data(), "abc".as_bytes());
    }

    #[test]
    fn test_byte_array_ord() {
        let a = ByteArray::from(vec![1u8, 2, 3]);
        let b = ByteArray::from(vec![1u8, 2, 4]);
        let c = ByteArray::from(vec![0xFFu8]);
        assert!(a < b);
        assert!(b < c);
        assert!(a == ByteArray::from(vec![1u8, 2, 3]));
    }

    #[test]
    fn test_int96_roundtrip() {
        let mut v = Int96::new();
        v.set_data(1, 2, 3);
        let bytes = v.as_bytes().to_vec();
        assert_eq!(bytes.len(), 12);
        assert_eq!(Int96::try_from_le_slice(&bytes).unwrap(), v);
    }

    #[test]
    fn test_int96_ordering_by_day_first() {
        let mut a = Int96::new();
        a.set_data(u32::MAX, u32::MAX, 1);
        let mut b = Int96::new();
        b.set_data(0, 0, 2);
        assert!(a < b);
    }

    #[test]
    fn test_as_bytes_little_endian() {
        assert_eq!(258i32.as_bytes(), &[2, 1, 0, 0]);
        assert_eq!(true.as_bytes(), &[1]);
        assert_eq!(1.5f32.as_bytes(), 1.5f32.to_le_bytes());
    }
}
