//! # pagesplit
//!
//! Split PDF documents into one document per page and keep the results
//! available for a short time.
//!
//! The pipeline has three stages:
//!
//! - [`decode`] normalizes a request body (raw PDF, base64 in JSON, or
//!   transport-flagged base64) into a [`SourceDocument`].
//! - [`PdfSplitter`] cuts the document into [`PageArtifact`]s, one per page,
//!   in page order.
//! - A [`SessionStore`] holds the artifacts under a generated [`SessionId`]
//!   for a fixed window, and [`retrieve`] reads them back.
//!
//! ```no_run
//! use pagesplit::{decode, retrieve, InMemorySessionStore, PdfSplitter, SessionStore, SplitOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let body = std::fs::read("document.pdf")?;
//! let doc = decode(&body, false, Some("application/pdf"))?;
//! let pages = PdfSplitter::lopdf(SplitOptions::default()).split(&doc)?;
//!
//! let store = InMemorySessionStore::default();
//! let session = store.create(pages);
//! let first = retrieve(&store, session.id.as_str(), 0)?;
//! assert_eq!(first.filename(), "page_1.pdf");
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod backend;
pub mod clock;
pub mod decode;
pub mod error;
pub mod retrieve;
pub mod split;
pub mod store;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use artifact::{page_filename, PageArtifact, SourceDocument};
pub use backend::{DocumentBackend, LopdfBackend, OpenedDocument};
pub use clock::{Clock, ManualClock, SystemClock};
pub use decode::{decode, decode_body, BodyEncoding, DecodedBody, NATIVE_MEDIA_TYPE};
pub use error::{BackendError, DecodeError, RetrievalError, SplitError, StoreError};
pub use retrieve::retrieve;
pub use split::{split_into_pages, PdfSplitter, SplitOptions, MAX_DOCUMENT_SIZE};
pub use store::{CreatedSession, InMemorySessionStore, SessionId, SessionStore, SESSION_TTL};
