//! Wire framing: content negotiation and byte-level encoding.
//!
//! A call or result envelope travels as one of exactly two framings:
//!
//! - **JSON** (`application/json`) when the envelope contains no
//!   attachments: the body is the serialized skeleton.
//! - **Multipart** (`multipart/form-data`) otherwise, with parts in this
//!   order: `json` (the skeleton), `paths` (the attachment path list,
//!   positionally aligned), then one `file-{i}` part per attachment.
//!
//! Part labels are derived from the zero-based attachment index, so
//! encoding the same value twice yields identical labels and ordering.
//! Only the boundary string differs between encodes.
//!
//! Both sides use the same framer: the client frames call envelopes and
//! parses result envelopes, the server does the reverse. Multipart parsing
//! is delegated to `multer`; multipart encoding is produced here because
//! part ordering is part of the protocol.

use bytes::{BufMut, Bytes, BytesMut};
use uuid::Uuid;

use crate::codec::{extract, inject};
use crate::error::{Result, SeamError};
use crate::value::{Attachment, Path, Value};

/// Content type for the JSON-only framing.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Content-type prefix for the multipart framing.
pub const MULTIPART_PREFIX: &str = "multipart/form-data";

/// Label of the skeleton part.
pub const JSON_PART: &str = "json";

/// Label of the path-list part.
pub const PATHS_PART: &str = "paths";

/// Label prefix of attachment parts; index `i` yields `file-i`.
pub const FILE_PART_PREFIX: &str = "file-";

/// Media type assumed for attachments that carry no tag of their own.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// A fully framed message: the declared content type plus body bytes.
#[derive(Debug, Clone)]
pub struct WireMessage {
    /// Value for the `Content-Type` header (includes the boundary for
    /// multipart messages).
    pub content_type: String,
    /// The framed body.
    pub body: Bytes,
}

/// Label for the attachment part at `index`.
pub fn file_part_name(index: usize) -> String {
    format!("{}{}", FILE_PART_PREFIX, index)
}

/// Parse an attachment part label back to its index.
pub fn parse_file_index(name: &str) -> Option<usize> {
    name.strip_prefix(FILE_PART_PREFIX)?.parse().ok()
}

/// Frame an envelope value for the wire.
///
/// Runs [`extract`] over the envelope; no attachments means JSON framing,
/// otherwise multipart.
pub fn encode(envelope: &Value) -> Result<WireMessage> {
    let extracted = extract(envelope);

    if extracted.attachments.is_empty() {
        let body = serde_json::to_vec(&extracted.skeleton.to_json())?;
        return Ok(WireMessage {
            content_type: CONTENT_TYPE_JSON.to_string(),
            body: Bytes::from(body),
        });
    }

    let skeleton_json = serde_json::to_string(&extracted.skeleton.to_json())?;
    let paths: Vec<&Path> = extracted.attachments.iter().map(|(path, _)| path).collect();
    let paths_json = serde_json::to_string(&paths)?;

    let boundary = format!("seam-{}", Uuid::new_v4().simple());
    let mut body = BytesMut::new();

    write_text_part(&mut body, &boundary, JSON_PART, &skeleton_json);
    write_text_part(&mut body, &boundary, PATHS_PART, &paths_json);

    for (index, (_, attachment)) in extracted.attachments.iter().enumerate() {
        write_file_part(&mut body, &boundary, index, attachment);
    }

    body.put_slice(b"--");
    body.put_slice(boundary.as_bytes());
    body.put_slice(b"--\r\n");

    Ok(WireMessage {
        content_type: format!("{}; boundary={}", MULTIPART_PREFIX, boundary),
        body: body.freeze(),
    })
}

fn write_text_part(body: &mut BytesMut, boundary: &str, name: &str, content: &str) {
    body.put_slice(b"--");
    body.put_slice(boundary.as_bytes());
    body.put_slice(b"\r\n");
    body.put_slice(format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes());
    body.put_slice(content.as_bytes());
    body.put_slice(b"\r\n");
}

fn write_file_part(body: &mut BytesMut, boundary: &str, index: usize, attachment: &Attachment) {
    let label = file_part_name(index);
    let file_name = attachment
        .file_name()
        .map(sanitize_header_token)
        .unwrap_or_else(|| label.clone());
    let media_type = attachment.media_type().unwrap_or(OCTET_STREAM);

    body.put_slice(b"--");
    body.put_slice(boundary.as_bytes());
    body.put_slice(b"\r\n");
    body.put_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            label, file_name
        )
        .as_bytes(),
    );
    body.put_slice(format!("Content-Type: {}\r\n\r\n", media_type).as_bytes());
    body.put_slice(attachment.data());
    body.put_slice(b"\r\n");
}

// Quotes and CR/LF would break the disposition header.
fn sanitize_header_token(name: &str) -> String {
    name.chars()
        .map(|c| if c == '"' || c.is_control() { '_' } else { c })
        .collect()
}

/// Parse a wire message back into a skeleton and its attachment list.
///
/// # Errors
///
/// [`SeamError::UnsupportedEncoding`] for an unrecognized content type,
/// [`SeamError::Protocol`] for a multipart body missing the `json` or
/// `paths` part or carrying an attachment index with no matching path.
pub async fn decode(content_type: &str, body: Bytes) -> Result<(Value, Vec<(Path, Attachment)>)> {
    if content_type.starts_with(CONTENT_TYPE_JSON) {
        let skeleton = Value::from_json(serde_json::from_slice(&body)?);
        return Ok((skeleton, Vec::new()));
    }

    if content_type.starts_with(MULTIPART_PREFIX) {
        return decode_multipart(content_type, body).await;
    }

    Err(SeamError::UnsupportedEncoding(content_type.to_string()))
}

/// Parse a wire message and reconstruct the envelope value in one step.
pub async fn decode_value(content_type: &str, body: Bytes) -> Result<Value> {
    let (skeleton, attachments) = decode(content_type, body).await?;
    inject(skeleton, attachments)
}

async fn decode_multipart(
    content_type: &str,
    body: Bytes,
) -> Result<(Value, Vec<(Path, Attachment)>)> {
    let boundary = multer::parse_boundary(content_type)?;
    let stream =
        futures_util::stream::once(async move { Ok::<Bytes, std::convert::Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut skeleton: Option<Value> = None;
    let mut paths: Option<Vec<Path>> = None;
    let mut files: Vec<(usize, Attachment)> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(JSON_PART) => {
                let text = field.text().await?;
                skeleton = Some(Value::from_json(serde_json::from_str(&text)?));
            }
            Some(PATHS_PART) => {
                let text = field.text().await?;
                paths = Some(serde_json::from_str(&text)?);
            }
            Some(label) if label.starts_with(FILE_PART_PREFIX) => {
                let Some(index) = parse_file_index(label) else {
                    tracing::warn!("Skipping part with unparseable label: {}", label);
                    continue;
                };
                let file_name = field.file_name().map(str::to_string);
                let media_type = field.content_type().map(|m| m.to_string());
                let data = field.bytes().await?;

                let mut attachment = Attachment::new(data);
                if let Some(file_name) = file_name {
                    attachment = attachment.with_file_name(file_name);
                }
                if let Some(media_type) = media_type {
                    attachment = attachment.with_media_type(media_type);
                }
                files.push((index, attachment));
            }
            other => {
                tracing::warn!("Skipping unexpected multipart part: {:?}", other);
            }
        }
    }

    let skeleton =
        skeleton.ok_or_else(|| SeamError::Protocol("multipart body missing json part".into()))?;
    let paths =
        paths.ok_or_else(|| SeamError::Protocol("multipart body missing paths part".into()))?;

    let mut attachments = Vec::with_capacity(files.len());
    for (index, attachment) in files {
        let path = paths.get(index).cloned().ok_or_else(|| {
            SeamError::Protocol(format!("no path recorded for attachment index {}", index))
        })?;
        attachments.push((path, attachment));
    }

    Ok((skeleton, attachments))
}
