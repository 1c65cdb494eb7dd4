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

//! Contains file reader API and the [`ChunkReader`] input abstraction.

use bytes::{Buf, Bytes};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};

use crate::column::page::PageReader;
use crate::errors::{ParquetError, Result};
use crate::file::metadata::{ParquetMetaData, RowGroupMetaData};

/// Length should return the total number of bytes in the input source.
pub trait Length {
    /// Returns the amount of bytes of the inner source.
    fn len(&self) -> u64;
}

/// The ChunkReader trait generalizes random access reads from a source supporting
/// positioned reads.
pub trait ChunkReader: Length + Send + Sync {
    /// The concrete type of reader returned by this trait.
    type T: Read;

    /// Get a [`Read`] starting at the provided file offset.
    fn get_read(&self, start: u64) -> Result<Self::T>;

    /// Get a range as bytes.
    ///
    /// Concurrent calls to [`Self::get_bytes`] may result in interleaved output.
    fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes>;
}

impl Length for File {
    fn len(&self) -> u64 {
        self.metadata().map(|m| m.len()).unwrap_or(0u64)
    }
}

impl ChunkReader for File {
    type T = BufReader<File>;

    fn get_read(&self, start: u64) -> Result<Self::T> {
        let mut reader = self.try_clone()?;
        reader.seek(SeekFrom::Start(start))?;
        Ok(BufReader::new(reader))
    }

    fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes> {
        let mut buffer = Vec::with_capacity(length);
        let mut reader = self.try_clone()?;
        reader.seek(SeekFrom::Start(start))?;
        let read = reader.take(length as u64).read_to_end(&mut buffer)?;

        if read != length {
            return Err(eof_err!(
                "Expected to read {} bytes, read only {}",
                length,
                read
            ));
        }
        Ok(buffer.into())
    }
}

impl Length for Bytes {
    fn len(&self) -> u64 {
        self.len() as u64
    }
}

impl ChunkReader for Bytes {
    type T = bytes::buf::Reader<Bytes>;

    fn get_read(&self, start: u64) -> Result<Self::T> {
        let start = start as usize;
        if start > self.len() {
            return Err(eof_err!(
                "Expected to read at offset {}, file is only {} bytes",
                start,
                self.len()
            ));
        }
        Ok(self.slice(start..).reader())
    }

    fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes> {
        let start = start as usize;
        if start + length > self.len() {
            return Err(eof_err!(
                "Expected to read {} bytes at offset {}, file is only {} bytes",
                length,
                start,
                self.len()
            ));
        }
        Ok(self.slice(start..start + length))
    }
}

// ----------------------------------------------------------------------
// APIs for file & row group readers

/// Parquet file reader API. With this, user can get metadata information about the
/// Parquet file and can get a reader for each row group.
pub trait FileReader: Send + Sync {
    /// Get metadata information about this file.
    fn metadata(&self) -> &ParquetMetaData;

    /// Get the total number of row groups for this file.
    fn num_row_groups(&self) -> usize;

    /// Get the `i`th row group reader. Note this doesn't do bound check.
    fn get_row_group(&self, i: usize) -> Result<Box<dyn RowGroupReader + '_>>;
}

/// Parquet row group reader API. With this, user can get metadata information about
/// the row group, as well as readers for each individual column chunk.
pub trait RowGroupReader: Send + Sync {
    /// Get metadata information about this row group.
    fn metadata(&self) -> &RowGroupMetaData;

    /// Get the total number of column chunks in this row group.
    fn num_columns(&self) -> usize;

    /// Get page reader for the `i`th column chunk.
    fn get_column_page_reader(&self, i: usize) -> Result<Box<dyn PageReader>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_chunk_reader() {
        let data = Bytes::from(vec![0u8, 1, 2, 3, 4, 5]);
        assert_eq!(data.len(), 6);
        assert_eq!(data.get_bytes(2, 3).unwrap().as_ref(), &[2, 3, 4]);
        assert!(data.get_bytes(4, 3).is_err());

        let mut read = data.get_read(3).unwrap();
        let mut out = Vec::new();
        read.read_to_end(&mut out).unwrap();
        assert_eq!(out, vec![3, 4, 5]);
    }

    #[test]
    fn test_file_chunk_reader() {
        use std::io::Write;
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(&[9u8, 8, 7, 6]).unwrap();
        file.flush().unwrap();

        assert_eq!(Length::len(&file), 4);
        assert_eq!(file.get_bytes(1, 2).unwrap().as_ref(), &[8, 7]);
        assert!(file.get_bytes(3, 2).is_err());
    }
}
