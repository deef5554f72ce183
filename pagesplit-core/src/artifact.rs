//! Byte buffers flowing through the pipeline
//!
//! A [`SourceDocument`] is the decoded upload; a [`PageArtifact`] is one
//! single-page document cut from it.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Decoded bytes of an uploaded document. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceDocument {
    bytes: Vec<u8>,
}

impl SourceDocument {
    /// Wrap a decoded buffer. Returns `None` for an empty buffer.
    pub fn new(bytes: Vec<u8>) -> Option<Self> {
        if bytes.is_empty() {
            None
        } else {
            Some(Self { bytes })
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl Deref for SourceDocument {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for SourceDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceDocument")
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// One serialized single-page document.
///
/// The bytes are shared, so cloning an artifact out of a session store does
/// not copy the page data.
#[derive(Clone, PartialEq, Eq)]
pub struct PageArtifact {
    index: usize,
    bytes: Arc<[u8]>,
}

impl PageArtifact {
    pub fn new(index: usize, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            index,
            bytes: bytes.into(),
        }
    }

    /// 0-based page index in the source document
    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based page number as shown to clients
    pub fn page_number(&self) -> usize {
        self.index + 1
    }

    /// Size of the serialized page in bytes
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn filename(&self) -> String {
        page_filename(self.index)
    }
}

impl fmt::Debug for PageArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageArtifact")
            .field("index", &self.index)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Download filename for the page at a 0-based index.
pub fn page_filename(index: usize) -> String {
    format!("page_{}.pdf", index + 1)
}
