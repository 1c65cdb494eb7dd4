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

//! APIs for reading and writing Parquet files.
//!
//! Provides access to file and row group readers and writers, metadata, statistics
//! and properties.
//!
//! # Example of writing a new file
//!
//! ```rust,no_run
//! use std::{fs, path::Path, sync::Arc};
//!
//! use parq::{
//!     basic::{Repetition, Type},
//!     data_type::Int32Type,
//!     file::{properties::WriterProperties, writer::SerializedFileWriter},
//!     schema::types::Type as SchemaType,
//! };
//!
//! let path = Path::new("/path/to/sample.parquet");
//!
//! let field = Arc::new(
//!     SchemaType::primitive_type_builder("b", Type::INT32)
//!         .with_repetition(Repetition::REQUIRED)
//!         .build()
//!         .unwrap(),
//! );
//! let schema = Arc::new(
//!     SchemaType::group_type_builder("schema")
//!         .with_fields(vec![field])
//!         .build()
//!         .unwrap(),
//! );
//! let file = fs::File::create(path).unwrap();
//! let mut writer = SerializedFileWriter::new(file, schema, Default::default()).unwrap();
//! let mut row_group_writer = writer.next_row_group().unwrap();
//! while let Some(mut col_writer) = row_group_writer.next_column().unwrap() {
//!     col_writer
//!         .typed::<Int32Type>()
//!         .write_batch(&[1, 2, 3], None, None)
//!         .unwrap();
//!     col_writer.close().unwrap();
//! }
//! row_group_writer.close().unwrap();
//! writer.close().unwrap();
//!
//! let bytes = fs::read(path).unwrap();
//! assert_eq!(&bytes[0..4], &[b'P', b'A', b'R', b'1']);
//! ```

pub mod footer;
pub mod metadata;
pub mod page_encoding_stats;
pub mod properties;
pub mod reader;
pub mod serialized_reader;
pub mod statistics;
pub mod writer;

/// The length of the parquet footer in bytes: a 4-byte little-endian metadata length
/// followed by the 4-byte magic.
pub const FOOTER_SIZE: usize = 8;

/// The magic framing unencrypted files and files with plaintext footers.
pub(crate) const PARQUET_MAGIC: [u8; 4] = *b"PAR1";

/// The magic framing files with encrypted footers.
pub(crate) const PARQUET_MAGIC_ENCRYPTED_FOOTER: [u8; 4] = *b"PARE";
