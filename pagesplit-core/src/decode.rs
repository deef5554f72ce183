//! Request body decoding
//!
//! Clients send a document in one of three shapes: raw PDF bytes, a JSON
//! object carrying the document as base64 under `pdf`, or a body the
//! transport has already flagged as base64. [`BodyEncoding::classify`] picks
//! the shape from the request metadata alone, and [`decode`] applies it.

use crate::artifact::SourceDocument;
use crate::error::{DecodeError, DecodeResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;

/// Media type of the documents this crate splits
pub const NATIVE_MEDIA_TYPE: &str = "application/pdf";

/// How an inbound body is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    /// The transport flagged the body as base64
    PreflaggedBase64,
    /// Raw document bytes (`application/pdf`)
    NativeBinary,
    /// JSON object with a base64 `pdf` field
    StructuredJson,
    /// Anything else; treated as raw bytes
    Unknown,
}

impl BodyEncoding {
    /// Select the decode strategy for a request.
    ///
    /// The transport flag wins over the content type.
    pub fn classify(is_preflagged_base64: bool, content_type: Option<&str>) -> Self {
        if is_preflagged_base64 {
            return BodyEncoding::PreflaggedBase64;
        }

        let Some(essence) = content_type.map(media_type_essence) else {
            return BodyEncoding::Unknown;
        };

        if essence.eq_ignore_ascii_case(NATIVE_MEDIA_TYPE) {
            BodyEncoding::NativeBinary
        } else if is_json_media_type(essence) {
            BodyEncoding::StructuredJson
        } else {
            BodyEncoding::Unknown
        }
    }
}

/// A decoded body plus the options a JSON upload may carry alongside the
/// document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBody {
    pub document: SourceDocument,
    pub encoding: BodyEncoding,
    /// Response mode requested in a JSON body, unvalidated
    pub requested_mode: Option<String>,
}

#[derive(Deserialize)]
struct JsonUpload {
    pdf: Option<String>,
    #[serde(default)]
    mode: Option<String>,
}

/// Decode a request body into a source document.
pub fn decode(
    raw_body: &[u8],
    is_preflagged_base64: bool,
    content_type: Option<&str>,
) -> DecodeResult<SourceDocument> {
    decode_body(raw_body, is_preflagged_base64, content_type).map(|body| body.document)
}

/// Decode a request body, keeping the detected encoding and any JSON-level
/// options.
pub fn decode_body(
    raw_body: &[u8],
    is_preflagged_base64: bool,
    content_type: Option<&str>,
) -> DecodeResult<DecodedBody> {
    let encoding = BodyEncoding::classify(is_preflagged_base64, content_type);
    tracing::debug!(?encoding, body_len = raw_body.len(), "Decoding request body");

    let (bytes, requested_mode) = match encoding {
        BodyEncoding::PreflaggedBase64 => (decode_base64(raw_body)?, None),
        BodyEncoding::NativeBinary | BodyEncoding::Unknown => (raw_body.to_vec(), None),
        BodyEncoding::StructuredJson => {
            let upload: JsonUpload =
                serde_json::from_slice(raw_body).map_err(|_| DecodeError::MissingPayload)?;
            let payload = upload.pdf.ok_or(DecodeError::MissingPayload)?;
            (decode_base64(strip_data_url(&payload).as_bytes())?, upload.mode)
        }
    };

    let document = SourceDocument::new(bytes).ok_or(DecodeError::EmptyPayload)?;

    Ok(DecodedBody {
        document,
        encoding,
        requested_mode,
    })
}

fn decode_base64(input: &[u8]) -> DecodeResult<Vec<u8>> {
    let cleaned: Vec<u8> = input
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    STANDARD
        .decode(cleaned)
        .map_err(|e| DecodeError::InvalidBase64(e.to_string()))
}

/// `data:application/pdf;base64,JVBER...` → `JVBER...`
fn strip_data_url(payload: &str) -> &str {
    if payload.starts_with("data:") {
        if let Some((_, data)) = payload.split_once(',') {
            return data;
        }
    }
    payload
}

fn media_type_essence(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
}

fn is_json_media_type(essence: &str) -> bool {
    let lower = essence.to_ascii_lowercase();
    lower == "application/json" || lower == "text/json" || lower.ends_with("+json")
}
