//! Page retrieval from a session store

use crate::artifact::PageArtifact;
use crate::error::RetrievalError;
use crate::store::SessionStore;

/// Fetch one stored page.
///
/// An unknown or expired session and an out-of-range page are reported
/// separately. Both come from a single store lookup, so a concurrent expiry
/// cannot make a live session look like a missing page.
pub fn retrieve(
    store: &dyn SessionStore,
    session_id: &str,
    page_index: usize,
) -> Result<PageArtifact, RetrievalError> {
    store.get(session_id, page_index).map_err(|err| {
        tracing::debug!(session_id, page_index, %err, "Page lookup failed");
        RetrievalError::from(err)
    })
}
