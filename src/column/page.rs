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

//! Contains Parquet Page definitions and page reader interface.

use bytes::Bytes;

use crate::basic::{Encoding, PageType};
use crate::errors::Result;
use crate::file::metadata::ColumnChunkMetaData;
use crate::file::statistics::Statistics;

/// One in-memory page of a column chunk.
///
/// The writer emits v1 data pages and dictionary pages only.
#[derive(Clone, Debug, PartialEq)]
pub enum Page {
    /// Data page, version 1: concatenated repetition levels, definition levels and
    /// encoded values.
    DataPage {
        /// The page payload.
        buf: Bytes,
        /// Number of values (including nulls) in this page.
        num_values: u32,
        /// The values encoding.
        encoding: Encoding,
        /// Encoding of the definition levels.
        def_level_encoding: Encoding,
        /// Encoding of the repetition levels.
        rep_level_encoding: Encoding,
        /// Optional statistics for the values in this page.
        statistics: Option<Statistics>,
    },
    /// Dictionary page, at most one per column chunk, before all data pages.
    DictionaryPage {
        /// The PLAIN encoded dictionary entries.
        buf: Bytes,
        /// Number of dictionary entries.
        num_values: u32,
        /// The encoding of the dictionary page, always PLAIN.
        encoding: Encoding,
        /// Whether the dictionary entries are sorted.
        is_sorted: bool,
    },
}

impl Page {
    /// Returns [`PageType`] for this page.
    pub fn page_type(&self) -> PageType {
        match self {
            Page::DataPage { .. } => PageType::DATA_PAGE,
            Page::DictionaryPage { .. } => PageType::DICTIONARY_PAGE,
        }
    }

    /// Returns internal byte buffer reference for this page.
    pub fn buffer(&self) -> &Bytes {
        match self {
            Page::DataPage { ref buf, .. } => buf,
            Page::DictionaryPage { ref buf, .. } => buf,
        }
    }

    /// Returns number of values in this page.
    pub fn num_values(&self) -> u32 {
        match self {
            Page::DataPage { num_values, .. } => *num_values,
            Page::DictionaryPage { num_values, .. } => *num_values,
        }
    }

    /// Returns this page [`Encoding`].
    pub fn encoding(&self) -> Encoding {
        match self {
            Page::DataPage { encoding, .. } => *encoding,
            Page::DictionaryPage { encoding, .. } => *encoding,
        }
    }

    /// Returns optional [`Statistics`].
    pub fn statistics(&self) -> Option<&Statistics> {
        match self {
            Page::DataPage { ref statistics, .. } => statistics.as_ref(),
            Page::DictionaryPage { .. } => None,
        }
    }
}

/// Helper struct to represent pages with potentially compressed buffer or
/// concatenated buffer (def levels + rep levels + compressed values) for data page
/// v1, so not to break the assumption that `Page` buffer is uncompressed.
#[derive(Clone, Debug)]
pub struct CompressedPage {
    compressed_page: Page,
    uncompressed_size: usize,
}

impl CompressedPage {
    /// Creates a compressed page from a page, and the uncompressed size of its
    /// payload.
    pub fn new(compressed_page: Page, uncompressed_size: usize) -> Self {
        Self {
            compressed_page,
            uncompressed_size,
        }
    }

    /// Returns the page type.
    pub fn page_type(&self) -> PageType {
        self.compressed_page.page_type()
    }

    /// Returns underlying page with potentially compressed buffer.
    pub fn compressed_page(&self) -> &Page {
        &self.compressed_page
    }

    /// Returns uncompressed size in bytes.
    pub fn uncompressed_size(&self) -> usize {
        self.uncompressed_size
    }

    /// Returns compressed size in bytes.
    ///
    /// Note that it is assumed that buffer is compressed, but it may not be. In this
    /// case compressed size will be equal to uncompressed size.
    pub fn compressed_size(&self) -> usize {
        self.compressed_page.buffer().len()
    }

    /// Number of values in the page.
    pub fn num_values(&self) -> u32 {
        self.compressed_page.num_values()
    }

    /// Returns encoding for values in the page.
    pub fn encoding(&self) -> Encoding {
        self.compressed_page.encoding()
    }

    /// Returns slice of the compressed page payload.
    pub fn data(&self) -> &[u8] {
        self.compressed_page.buffer().as_ref()
    }

    /// Replaces the payload buffer, used when a page is encrypted in place.
    pub(crate) fn with_new_buffer(mut self, buf: Bytes) -> Self {
        match &mut self.compressed_page {
            Page::DataPage { buf: b, .. } => *b = buf,
            Page::DictionaryPage { buf: b, .. } => *b = buf,
        }
        self
    }
}

/// Contains metadata for a page in a column chunk.
pub struct PageWriteSpec {
    /// The type of the page.
    pub page_type: PageType,
    /// The total size of the page, before compression.
    pub uncompressed_size: usize,
    /// The compressed size of the page.
    pub compressed_size: usize,
    /// The number of values in the page.
    pub num_values: u32,
    /// The offset of the page in the column chunk. For writers that buffer a whole
    /// chunk in memory the offset is relative to the buffer until the chunk is
    /// appended to the file.
    pub offset: u64,
    /// The number of bytes written to the underlying sink, including the header.
    pub bytes_written: u64,
}

impl PageWriteSpec {
    /// Creates new spec with default page write metrics.
    pub fn new() -> Self {
        Self {
            page_type: PageType::DATA_PAGE,
            uncompressed_size: 0,
            compressed_size: 0,
            num_values: 0,
            offset: 0,
            bytes_written: 0,
        }
    }
}

impl Default for PageWriteSpec {
    fn default() -> Self {
        Self::new()
    }
}

/// API for writing pages in a column chunk.
///
/// It is reasonable to assume that all pages will be written in the correct order,
/// e.g. dictionary page followed by data pages, or a set of data pages, etc.
pub trait PageWriter: Send {
    /// Writes a page, returning the total number of bytes affected, including the
    /// page header.
    fn write_page(&mut self, page: CompressedPage) -> Result<PageWriteSpec>;

    /// Writes column chunk metadata into the output stream/sink.
    ///
    /// This method is called once before page writer is closed, normally when writes
    /// are finalised in column writer.
    fn write_metadata(&mut self, metadata: &ColumnChunkMetaData) -> Result<()>;

    /// The byte offset that will be added to page offsets recorded by this writer
    /// once its output reaches the file. Zero for writers that write straight through
    /// to the sink.
    fn rebase_offset(&self) -> u64 {
        0
    }

    /// Closes resources and flushes underlying sink.
    /// Page writer should not be used after this method is called.
    fn close(&mut self) -> Result<()>;
}

/// API for reading pages from a column chunk.
///
/// This offers a iterator like API to get the next page.
pub trait PageReader: Iterator<Item = Result<Page>> + Send {
    /// Gets the next page in the column chunk associated with this reader.
    /// Returns `None` if there are no pages left.
    fn get_next_page(&mut self) -> Result<Option<Page>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_accessors() {
        let page = Page::DataPage {
            buf: Bytes::from(vec![0, 1, 2]),
            num_values: 10,
            encoding: Encoding::PLAIN,
            def_level_encoding: Encoding::RLE,
            rep_level_encoding: Encoding::RLE,
            statistics: None,
        };
        assert_eq!(page.page_type(), PageType::DATA_PAGE);
        assert_eq!(page.buffer().as_ref(), &[0, 1, 2]);
        assert_eq!(page.num_values(), 10);
        assert_eq!(page.encoding(), Encoding::PLAIN);
        assert!(page.statistics().is_none());
    }

    #[test]
    fn test_compressed_page() {
        let page = Page::DataPage {
            buf: Bytes::from(vec![0u8; 5]),
            num_values: 10,
            encoding: Encoding::PLAIN,
            def_level_encoding: Encoding::RLE,
            rep_level_encoding: Encoding::RLE,
            statistics: None,
        };
        let compressed = CompressedPage::new(page, 100);
        assert_eq!(compressed.uncompressed_size(), 100);
        assert_eq!(compressed.compressed_size(), 5);
        assert_eq!(compressed.num_values(), 10);
    }
}
