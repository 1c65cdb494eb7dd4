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

//! Contains definitions for working with Parquet statistics.
//!
//! Though some common methods are available on enum, a more specific version of
//! statistics are provided, e.g. [`ValueStatistics`] parameterized over the column's
//! value type.

use crate::basic::Type;
use crate::data_type::private::ParquetValueType;
use crate::data_type::{AsBytes, ByteArray, FixedLenByteArray, Int96};
use crate::errors::{ParquetError, Result};
use crate::file::metadata::thrift_codec::PageStatistics;

/// Builds the corresponding statistics variant for a physical type.
macro_rules! statistics_new_func {
    ($func:ident, $vtype:ty, $stat:ident) => {
        #[doc = concat!("Creates new statistics for `", stringify!($stat), "` column type.")]
        pub fn $func(
            min: $vtype,
            max: $vtype,
            distinct_count: Option<u64>,
            null_count: u64,
            is_deprecated: bool,
        ) -> Self {
            Statistics::$stat(ValueStatistics::new(
                min,
                max,
                distinct_count,
                null_count,
                is_deprecated,
            ))
        }
    };
}

// Macro to generate methods to create Statistics.
macro_rules! statistics_enum_func {
    ($self:ident, $func:ident) => {{
        match *$self {
            Statistics::Boolean(ref typed) => typed.$func(),
            Statistics::Int32(ref typed) => typed.$func(),
            Statistics::Int64(ref typed) => typed.$func(),
            Statistics::Int96(ref typed) => typed.$func(),
            Statistics::Float(ref typed) => typed.$func(),
            Statistics::Double(ref typed) => typed.$func(),
            Statistics::ByteArray(ref typed) => typed.$func(),
            Statistics::FixedLenByteArray(ref typed) => typed.$func(),
        }
    }};
}

/// Statistics for a column chunk or a page, in their type-specific form.
#[derive(Debug, Clone, PartialEq)]
pub enum Statistics {
    /// Statistics for a BOOLEAN column.
    Boolean(ValueStatistics<bool>),
    /// Statistics for a INT32 column.
    Int32(ValueStatistics<i32>),
    /// Statistics for a INT64 column.
    Int64(ValueStatistics<i64>),
    /// Statistics for a INT96 column.
    Int96(ValueStatistics<Int96>),
    /// Statistics for a FLOAT column.
    Float(ValueStatistics<f32>),
    /// Statistics for a DOUBLE column.
    Double(ValueStatistics<f64>),
    /// Statistics for a BYTE_ARRAY column.
    ByteArray(ValueStatistics<ByteArray>),
    /// Statistics for a FIXED_LEN_BYTE_ARRAY column.
    FixedLenByteArray(ValueStatistics<FixedLenByteArray>),
}

impl<T: ParquetValueType> From<ValueStatistics<T>> for Statistics {
    fn from(t: ValueStatistics<T>) -> Self {
        T::make_statistics(t)
    }
}

impl Statistics {
    /// Creates new statistics.
    pub fn new<T: ParquetValueType>(
        min: Option<T>,
        max: Option<T>,
        distinct_count: Option<u64>,
        null_count: u64,
        is_deprecated: bool,
    ) -> Self {
        Self::from(ValueStatistics::new(
            min,
            max,
            distinct_count,
            null_count,
            is_deprecated,
        ))
    }

    statistics_new_func![boolean, Option<bool>, Boolean];

    statistics_new_func![int32, Option<i32>, Int32];

    statistics_new_func![int64, Option<i64>, Int64];

    statistics_new_func![int96, Option<Int96>, Int96];

    statistics_new_func![float, Option<f32>, Float];

    statistics_new_func![double, Option<f64>, Double];

    statistics_new_func![byte_array, Option<ByteArray>, ByteArray];

    statistics_new_func![fixed_len_byte_array, Option<FixedLenByteArray>, FixedLenByteArray];

    /// Returns `true` if statistics have old `min` and `max` fields set.
    /// This means that the column order is likely to be undefined, which, for old
    /// files could mean a signed sort order of values.
    ///
    /// Refer to [`ColumnOrder`](crate::basic::ColumnOrder) and
    /// [`SortOrder`](crate::basic::SortOrder) for more information.
    pub fn is_min_max_deprecated(&self) -> bool {
        statistics_enum_func![self, is_min_max_deprecated]
    }

    /// Old versions of parquet stored statistics in `min` and `max` fields, ordered
    /// using signed comparison. This resulted in an undefined ordering for unsigned
    /// quantities, such as booleans and unsigned integers.
    ///
    /// These fields were therefore deprecated in favour of `min_value` and
    /// `max_value`, which have a type-defined sort order.
    ///
    /// However, not all readers have been updated. For backwards compatibility, this
    /// method returns `true` if the statistics within this have a signed sort order,
    /// that is compatible with being stored in the deprecated `min` and `max` fields.
    pub fn is_min_max_backwards_compatible(&self) -> bool {
        statistics_enum_func![self, is_min_max_backwards_compatible]
    }

    /// Returns number of null values for the column.
    pub fn null_count(&self) -> u64 {
        statistics_enum_func![self, null_count]
    }

    /// Returns `true` if min value and max value are set.
    /// Normally both min/max values will be set to `Some(value)` or `None`.
    pub fn has_min_max_set(&self) -> bool {
        statistics_enum_func![self, has_min_max_set]
    }

    /// Returns `true` if the min value is set, and is an exact min value.
    pub fn min_is_exact(&self) -> bool {
        statistics_enum_func![self, min_is_exact]
    }

    /// Returns `true` if the max value is set, and is an exact max value.
    pub fn max_is_exact(&self) -> bool {
        statistics_enum_func![self, max_is_exact]
    }

    /// Returns distinct count if set.
    pub fn distinct_count(&self) -> Option<u64> {
        statistics_enum_func![self, distinct_count]
    }

    /// Returns slice of bytes that represent min value, if min value is known.
    pub fn min_bytes_opt(&self) -> Option<&[u8]> {
        statistics_enum_func![self, min_bytes_opt]
    }

    /// Returns slice of bytes that represent max value, if max value is known.
    pub fn max_bytes_opt(&self) -> Option<&[u8]> {
        statistics_enum_func![self, max_bytes_opt]
    }

    /// Returns physical type associated with statistics.
    pub fn physical_type(&self) -> Type {
        match self {
            Statistics::Boolean(_) => Type::BOOLEAN,
            Statistics::Int32(_) => Type::INT32,
            Statistics::Int64(_) => Type::INT64,
            Statistics::Int96(_) => Type::INT96,
            Statistics::Float(_) => Type::FLOAT,
            Statistics::Double(_) => Type::DOUBLE,
            Statistics::ByteArray(_) => Type::BYTE_ARRAY,
            Statistics::FixedLenByteArray(_) => Type::FIXED_LEN_BYTE_ARRAY,
        }
    }
}

/// Typed statistics for one column chunk or page.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueStatistics<T> {
    min: Option<T>,
    max: Option<T>,
    // Distinct count could be omitted in some cases
    distinct_count: Option<u64>,
    null_count: u64,

    // Whether or not the min or max values are exact, or truncated.
    is_max_value_exact: bool,
    is_min_value_exact: bool,

    /// If `true` populate the deprecated `min` and `max` fields instead of
    /// `min_value` and `max_value`
    is_min_max_deprecated: bool,

    /// If `true` the statistics are compatible with the deprecated `min` and
    /// `max` fields. See [`ValueStatistics::is_min_max_backwards_compatible`]
    is_min_max_backwards_compatible: bool,
}

impl<T: ParquetValueType> ValueStatistics<T> {
    /// Creates new typed statistics.
    pub fn new(
        min: Option<T>,
        max: Option<T>,
        distinct_count: Option<u64>,
        null_count: u64,
        is_min_max_deprecated: bool,
    ) -> Self {
        Self {
            is_max_value_exact: max.is_some(),
            is_min_value_exact: min.is_some(),
            min,
            max,
            distinct_count,
            null_count,
            is_min_max_deprecated,
            is_min_max_backwards_compatible: is_min_max_deprecated,
        }
    }

    /// Set whether the stored `min` field represents the exact
    /// minimum, or just a bound on the minimum value.
    pub fn with_min_is_exact(self, is_min_value_exact: bool) -> Self {
        Self {
            is_min_value_exact,
            ..self
        }
    }

    /// Set whether the stored `max` field represents the exact
    /// maximum, or just a bound on the maximum value.
    pub fn with_max_is_exact(self, is_max_value_exact: bool) -> Self {
        Self {
            is_max_value_exact,
            ..self
        }
    }

    /// Set whether to write the deprecated `min` and `max` fields
    /// for compatibility with older parquet writers.
    ///
    /// This should only be enabled if the field is signed,
    /// see [`Self::is_min_max_backwards_compatible`].
    pub fn with_backwards_compatible_min_max(self, backwards_compatible: bool) -> Self {
        Self {
            is_min_max_backwards_compatible: backwards_compatible,
            ..self
        }
    }

    /// Returns min value of the statistics, if known.
    pub fn min_opt(&self) -> Option<&T> {
        self.min.as_ref()
    }

    /// Returns max value of the statistics, if known.
    pub fn max_opt(&self) -> Option<&T> {
        self.max.as_ref()
    }

    /// Returns min value as bytes of the statistics, if min value is known.
    pub fn min_bytes_opt(&self) -> Option<&[u8]> {
        self.min_opt().map(AsBytes::as_bytes)
    }

    /// Returns max value as bytes of the statistics, if max value is known.
    pub fn max_bytes_opt(&self) -> Option<&[u8]> {
        self.max_opt().map(AsBytes::as_bytes)
    }

    /// Whether or not min and max values are set.
    /// Normally both min/max values will be set to `Some(value)` or `None`.
    pub fn has_min_max_set(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }

    /// Whether or not max value is set, and is an exact value.
    pub fn max_is_exact(&self) -> bool {
        self.max.is_some() && self.is_max_value_exact
    }

    /// Whether or not min value is set, and is an exact value.
    pub fn min_is_exact(&self) -> bool {
        self.min.is_some() && self.is_min_value_exact
    }

    /// Returns optional value of number of distinct values occurring.
    pub fn distinct_count(&self) -> Option<u64> {
        self.distinct_count
    }

    /// Returns number of null values for the column.
    pub fn null_count(&self) -> u64 {
        self.null_count
    }

    /// Returns `true` if statistics were created using old min/max fields.
    fn is_min_max_deprecated(&self) -> bool {
        self.is_min_max_deprecated
    }

    /// Old versions of parquet stored statistics in `min` and `max` fields, ordered
    /// using signed comparison.
    fn is_min_max_backwards_compatible(&self) -> bool {
        self.is_min_max_backwards_compatible
    }

    /// Drops min and max values when either exceeds `max_len` encoded bytes, keeping
    /// the footer bounded for columns with very large values.
    pub(crate) fn with_size_limit(self, max_len: usize) -> Self {
        let exceeds = |v: &Option<T>| {
            v.as_ref()
                .map(|v| v.as_bytes().len() > max_len)
                .unwrap_or(false)
        };
        if exceeds(&self.min) || exceeds(&self.max) {
            Self {
                min: None,
                max: None,
                is_min_value_exact: false,
                is_max_value_exact: false,
                ..self
            }
        } else {
            self
        }
    }
}

/// Converts typed statistics into the thrift representation written to page headers
/// and column chunk metadata.
pub(crate) fn to_thrift(stats: Option<&Statistics>) -> Option<PageStatistics> {
    let stats = stats?;

    let mut thrift_stats = PageStatistics {
        max: None,
        min: None,
        null_count: Some(stats.null_count() as i64),
        distinct_count: stats.distinct_count().map(|c| c as i64),
        max_value: None,
        min_value: None,
        is_max_value_exact: None,
        is_min_value_exact: None,
    };

    // Get min/max if set.
    let (min, max, min_exact, max_exact) = if stats.has_min_max_set() {
        (
            Some(stats.min_bytes_opt().unwrap().to_vec()),
            Some(stats.max_bytes_opt().unwrap().to_vec()),
            Some(stats.min_is_exact()),
            Some(stats.max_is_exact()),
        )
    } else {
        (None, None, None, None)
    };

    if stats.is_min_max_backwards_compatible() {
        // Copy to deprecated min, max values for compatibility with older readers
        thrift_stats.min.clone_from(&min);
        thrift_stats.max.clone_from(&max);
    }

    if !stats.is_min_max_deprecated() {
        thrift_stats.min_value = min;
        thrift_stats.max_value = max;
    }

    thrift_stats.is_min_value_exact = min_exact;
    thrift_stats.is_max_value_exact = max_exact;

    Some(thrift_stats)
}

/// Converts the thrift statistics of a column of `physical_type` into their typed
/// form, preferring the modern `min_value`/`max_value` fields when present.
pub(crate) fn from_thrift(
    physical_type: Type,
    thrift_stats: Option<PageStatistics>,
) -> Result<Option<Statistics>> {
    Ok(match thrift_stats {
        Some(stats) => {
            // Number of nulls recorded, when it is not available, we just mark it as 0.
            let null_count = stats.null_count.unwrap_or(0);

            if null_count < 0 {
                return Err(general_err!(
                    "Statistics null count is negative {}",
                    null_count
                ));
            }

            let null_count = null_count as u64;
            // Generic distinct count (count of distinct values occurring)
            let distinct_count = stats.distinct_count.map(|value| value as u64);
            // Whether or not statistics use deprecated min/max fields.
            let old_format = stats.min_value.is_none() && stats.max_value.is_none();
            // Generic min value as bytes.
            let min = if old_format { stats.min } else { stats.min_value };
            // Generic max value as bytes.
            let max = if old_format { stats.max } else { stats.max_value };

            fn check_len(min: &Option<Vec<u8>>, max: &Option<Vec<u8>>, len: usize) -> Result<()> {
                if let Some(min) = min {
                    if min.len() < len {
                        return Err(general_err!("Insufficient bytes to parse min statistic"));
                    }
                }
                if let Some(max) = max {
                    if max.len() < len {
                        return Err(general_err!("Insufficient bytes to parse max statistic"));
                    }
                }
                Ok(())
            }

            match physical_type {
                Type::BOOLEAN => check_len(&min, &max, 1),
                Type::INT32 | Type::FLOAT => check_len(&min, &max, 4),
                Type::INT64 | Type::DOUBLE => check_len(&min, &max, 8),
                Type::INT96 => check_len(&min, &max, 12),
                _ => Ok(()),
            }?;

            // Values are encoded using PLAIN encoding definition, except that
            // variable-length byte arrays do not include a length prefix.
            //
            // Instead of using an actual decoder, we manually convert values.
            let res = match physical_type {
                Type::BOOLEAN => Statistics::boolean(
                    min.map(|data| data[0] != 0),
                    max.map(|data| data[0] != 0),
                    distinct_count,
                    null_count,
                    old_format,
                ),
                Type::INT32 => Statistics::int32(
                    min.map(|data| i32::from_le_bytes(data[..4].try_into().unwrap())),
                    max.map(|data| i32::from_le_bytes(data[..4].try_into().unwrap())),
                    distinct_count,
                    null_count,
                    old_format,
                ),
                Type::INT64 => Statistics::int64(
                    min.map(|data| i64::from_le_bytes(data[..8].try_into().unwrap())),
                    max.map(|data| i64::from_le_bytes(data[..8].try_into().unwrap())),
                    distinct_count,
                    null_count,
                    old_format,
                ),
                Type::INT96 => {
                    // INT96 statistics may not be correct, because comparison is signed
                    let min = min.map(|data| Int96::try_from_le_slice(&data)).transpose()?;
                    let max = max.map(|data| Int96::try_from_le_slice(&data)).transpose()?;
                    Statistics::int96(min, max, distinct_count, null_count, old_format)
                }
                Type::FLOAT => Statistics::float(
                    min.map(|data| f32::from_le_bytes(data[..4].try_into().unwrap())),
                    max.map(|data| f32::from_le_bytes(data[..4].try_into().unwrap())),
                    distinct_count,
                    null_count,
                    old_format,
                ),
                Type::DOUBLE => Statistics::double(
                    min.map(|data| f64::from_le_bytes(data[..8].try_into().unwrap())),
                    max.map(|data| f64::from_le_bytes(data[..8].try_into().unwrap())),
                    distinct_count,
                    null_count,
                    old_format,
                ),
                Type::BYTE_ARRAY => Statistics::ByteArray(
                    ValueStatistics::new(
                        min.map(ByteArray::from),
                        max.map(ByteArray::from),
                        distinct_count,
                        null_count,
                        old_format,
                    )
                    .with_max_is_exact(stats.is_max_value_exact.unwrap_or(false))
                    .with_min_is_exact(stats.is_min_value_exact.unwrap_or(false)),
                ),
                Type::FIXED_LEN_BYTE_ARRAY => Statistics::FixedLenByteArray(
                    ValueStatistics::new(
                        min.map(ByteArray::from).map(FixedLenByteArray::from),
                        max.map(ByteArray::from).map(FixedLenByteArray::from),
                        distinct_count,
                        null_count,
                        old_format,
                    )
                    .with_max_is_exact(stats.is_max_value_exact.unwrap_or(false))
                    .with_min_is_exact(stats.is_min_value_exact.unwrap_or(false)),
                ),
            };

            Some(res)
        }
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_basic() {
        let stats = Statistics::int32(Some(1), Some(5), None, 2, false);
        assert!(stats.has_min_max_set());
        assert_eq!(stats.null_count(), 2);
        assert_eq!(stats.min_bytes_opt().unwrap(), &[1, 0, 0, 0]);
        assert_eq!(stats.max_bytes_opt().unwrap(), &[5, 0, 0, 0]);
        assert_eq!(stats.physical_type(), Type::INT32);
        assert!(!stats.is_min_max_deprecated());
    }

    #[test]
    fn test_statistics_thrift_roundtrip() {
        let stats = Statistics::int64(Some(-10), Some(20), Some(3), 7, false);
        let thrift = to_thrift(Some(&stats));
        let back = from_thrift(Type::INT64, thrift).unwrap().unwrap();
        assert_eq!(back, stats);
    }

    #[test]
    fn test_statistics_thrift_roundtrip_byte_array() {
        let stats = Statistics::byte_array(
            Some(ByteArray::from("aaa")),
            Some(ByteArray::from("zzz")),
            None,
            0,
            false,
        );
        let thrift = to_thrift(Some(&stats));
        let back = from_thrift(Type::BYTE_ARRAY, thrift).unwrap().unwrap();
        assert_eq!(back, stats);
    }

    #[test]
    fn test_deprecated_stats_use_legacy_fields() {
        let stats = Statistics::int32(Some(1), Some(2), None, 0, true);
        let thrift = to_thrift(Some(&stats)).unwrap();
        assert!(thrift.min.is_some());
        assert!(thrift.max.is_some());
        assert!(thrift.min_value.is_none());
        assert!(thrift.max_value.is_none());
    }

    #[test]
    fn test_modern_signed_stats_write_both() {
        let stats: Statistics = ValueStatistics::new(Some(1i32), Some(2), None, 0, false)
            .with_backwards_compatible_min_max(true)
            .into();
        let thrift = to_thrift(Some(&stats)).unwrap();
        assert!(thrift.min.is_some());
        assert!(thrift.min_value.is_some());
    }

    #[test]
    fn test_from_thrift_prefers_modern_fields() {
        let thrift = PageStatistics {
            min: Some(vec![9, 0, 0, 0]),
            max: Some(vec![9, 0, 0, 0]),
            min_value: Some(vec![1, 0, 0, 0]),
            max_value: Some(vec![5, 0, 0, 0]),
            null_count: Some(0),
            distinct_count: None,
            is_min_value_exact: None,
            is_max_value_exact: None,
        };
        let stats = from_thrift(Type::INT32, Some(thrift)).unwrap().unwrap();
        assert_eq!(stats.min_bytes_opt().unwrap(), &[1, 0, 0, 0]);
        assert_eq!(stats.max_bytes_opt().unwrap(), &[5, 0, 0, 0]);
    }

    #[test]
    fn test_negative_null_count_rejected() {
        let thrift = PageStatistics {
            min: None,
            max: None,
            min_value: None,
            max_value: None,
            null_count: Some(-3),
            distinct_count: None,
            is_min_value_exact: None,
            is_max_value_exact: None,
        };
        assert!(from_thrift(Type::INT32, Some(thrift)).is_err());
    }

    #[test]
    fn test_size_limit_drops_large_min_max() {
        let stats = ValueStatistics::new(
            Some(ByteArray::from(vec![0u8; 100])),
            Some(ByteArray::from(vec![1u8; 100])),
            None,
            0,
            false,
        );
        let capped = stats.clone().with_size_limit(64);
        assert!(!capped.has_min_max_set());
        assert_eq!(capped.null_count(), 0);

        let kept = stats.with_size_limit(128);
        assert!(kept.has_min_max_set());
    }
}
