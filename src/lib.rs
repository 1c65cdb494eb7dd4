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

//! A native Rust implementation of the [Apache Parquet](https://parquet.apache.org/)
//! columnar file format.
//!
//! The crate centers on the column-chunk write pipeline and the page I/O it feeds:
//! value-at-a-time encoding with dictionary fallback, v1 data page assembly with
//! RLE-encoded definition and repetition levels, block compression, the thrift
//! footer metadata, and the modular encryption layer that binds every encrypted
//! module to its position in the file.
//!
//! # Format Overview
//!
//! Parquet is a columnar format: a file is a sequence of row groups, each holding one
//! column chunk per leaf column, and each chunk a concatenation of pages. The file
//! ends with a self-describing thrift footer. For more details about the format, see
//! the [Parquet spec](https://github.com/apache/parquet-format/blob/master/README.md#file-format).
//!
//! # APIs
//!
//! * [`file::writer`] writes files one row group and one column at a time, with
//!   [`file::properties`] controlling page sizes, compression, statistics and
//!   encryption.
//! * [`file::reader`] and [`file::serialized_reader`] locate and parse the footer
//!   and iterate the pages of each column chunk.
//! * [`column`] exposes the lower level column writer driving the page pipeline.
//! * [`encryption`] configures Parquet Modular Encryption for both paths.
//!
//! # Example of writing and reading a file
//!
//! ```
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use parq::basic::{Repetition, Type};
//! use parq::data_type::Int32Type;
//! use parq::file::properties::WriterProperties;
//! use parq::file::reader::FileReader;
//! use parq::file::serialized_reader::SerializedFileReader;
//! use parq::file::writer::SerializedFileWriter;
//! use parq::schema::types::Type as SchemaType;
//!
//! let field = Arc::new(
//!     SchemaType::primitive_type_builder("id", Type::INT32)
//!         .with_repetition(Repetition::REQUIRED)
//!         .build()?,
//! );
//! let schema = Arc::new(
//!     SchemaType::group_type_builder("schema")
//!         .with_fields(vec![field])
//!         .build()?,
//! );
//!
//! let mut buffer = Vec::new();
//! let props = Arc::new(WriterProperties::builder().build());
//! let mut writer = SerializedFileWriter::new(&mut buffer, schema, props)?;
//! let mut row_group = writer.next_row_group()?;
//! let mut column = row_group.next_column()?.unwrap();
//! column.typed::<Int32Type>().write_batch(&[1, 2, 3], None, None)?;
//! column.close()?;
//! row_group.close()?;
//! writer.close()?;
//!
//! let reader = SerializedFileReader::new(Bytes::from(buffer))?;
//! assert_eq!(reader.metadata().file_metadata().num_rows(), 3);
//! # Ok::<(), parq::errors::ParquetError>(())
//! ```

#[macro_use]
pub mod errors;
mod thrift;

pub mod basic;
pub mod data_type;

pub mod util;

pub mod column;
pub mod compression;
pub mod encodings;
pub mod encryption;
pub mod file;
pub mod schema;
