//! JSON shapes returned by the split endpoint

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use pagesplit::{CreatedSession, PageArtifact, SessionId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How split pages reach the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// Every page is embedded as base64 in the split response
    Inline,
    /// Pages go to the session store; the response links to them
    #[default]
    Referenced,
}

impl ResponseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMode::Inline => "inline",
            ResponseMode::Referenced => "referenced",
        }
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown response mode {0:?} (expected \"inline\" or \"referenced\")")]
pub struct UnknownResponseMode(pub String);

impl FromStr for ResponseMode {
    type Err = UnknownResponseMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" => Ok(ResponseMode::Inline),
            "referenced" => Ok(ResponseMode::Referenced),
            _ => Err(UnknownResponseMode(s.to_string())),
        }
    }
}

/// Information about one split output file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SplitFileInfo {
    /// 1-based page number
    pub page: usize,
    pub filename: String,
    /// Size in bytes
    pub size: usize,
    /// Base64 page bytes (inline mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Retrieval URL (referenced mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl SplitFileInfo {
    pub fn inline(artifact: &PageArtifact) -> Self {
        Self {
            page: artifact.page_number(),
            filename: artifact.filename(),
            size: artifact.size(),
            data: Some(STANDARD.encode(artifact.bytes())),
            download_url: None,
        }
    }

    pub fn referenced(artifact: &PageArtifact, base_url: &str, session: &SessionId) -> Self {
        Self {
            page: artifact.page_number(),
            filename: artifact.filename(),
            size: artifact.size(),
            data: None,
            download_url: Some(download_url(base_url, session, artifact.index())),
        }
    }
}

/// Response for PDF split operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SplitPdfResponse {
    pub success: bool,
    pub total_pages: usize,
    pub files: Vec<SplitFileInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl SplitPdfResponse {
    pub fn inline(pages: &[PageArtifact]) -> Self {
        Self {
            success: true,
            total_pages: pages.len(),
            files: pages.iter().map(SplitFileInfo::inline).collect(),
            session_id: None,
            expires_at: None,
        }
    }

    pub fn referenced(pages: &[PageArtifact], base_url: &str, session: &CreatedSession) -> Self {
        Self {
            success: true,
            total_pages: pages.len(),
            files: pages
                .iter()
                .map(|page| SplitFileInfo::referenced(page, base_url, &session.id))
                .collect(),
            session_id: Some(session.id.to_string()),
            expires_at: Some(session.expires_at),
        }
    }

    /// Response for a document without pages; nothing is stored.
    pub fn empty() -> Self {
        Self::inline(&[])
    }
}

/// Path of the download endpoint for one page. `page` is the 0-based index.
pub fn download_url(base_url: &str, session: &SessionId, page: usize) -> String {
    format!("{base_url}/api/download-page?session={session}&page={page}")
}
