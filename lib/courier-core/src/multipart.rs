//! Multipart form data, the container [`to_form_data`](crate::to_form_data)
//! fills.
//!
//! # Example
//!
//! ```
//! use courier_core::{FileField, Form};
//!
//! let form = Form::with_boundary("xyz")
//!     .text("name", "Ada")
//!     .file("avatar", FileField::new("ada.png", vec![0x89, 0x50]));
//!
//! assert_eq!(form.parts().len(), 2);
//! assert_eq!(form.content_type(), "multipart/form-data; boundary=xyz");
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::{ContentType, FileField};

/// A single named part of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

impl Part {
    /// A plain text field (no per-part content type, like a browser form).
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            content_type: None,
            data: Bytes::from(value.into()),
        }
    }

    /// A file field.
    ///
    /// The content type is the file's explicit one, or guessed from the
    /// filename extension.
    #[must_use]
    pub fn file(name: impl Into<String>, file: &FileField) -> Self {
        let content_type = file
            .content_type()
            .map_or_else(|| guess_content_type(file.filename()), str::to_string);
        Self {
            name: name.into(),
            filename: Some(file.filename().to_string()),
            content_type: Some(content_type),
            data: file.data().clone(),
        }
    }

    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Filename, set for file parts only.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Content type, set for file parts only.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Raw content.
    #[must_use]
    pub const fn data(&self) -> &Bytes {
        &self.data
    }

    /// Returns `true` for file parts.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        self.filename.is_some()
    }
}

fn guess_content_type(filename: &str) -> String {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "m4a" => "audio/mp4",
        _ => "application/octet-stream",
    }
    .to_string()
}

/// Ordered multipart form.
#[derive(Debug, Clone)]
pub struct Form {
    parts: Vec<Part>,
    boundary: String,
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

impl Form {
    /// Create an empty form with a generated boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(generate_boundary())
    }

    /// Create an empty form with a fixed boundary.
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            parts: Vec::new(),
            boundary: boundary.into(),
        }
    }

    /// Append a part.
    #[must_use]
    pub fn part(mut self, part: Part) -> Self {
        self.push(part);
        self
    }

    /// Append a text field.
    #[must_use]
    pub fn text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.part(Part::text(name, value))
    }

    /// Append a file field.
    #[must_use]
    pub fn file(self, name: impl Into<String>, file: FileField) -> Self {
        self.part(Part::file(name, &file))
    }

    /// Append a part in place.
    pub fn push(&mut self, part: Part) {
        self.parts.push(part);
    }

    /// Boundary string.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Parts, in insertion order.
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// First part with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|part| part.name == name)
    }

    /// `Content-Type` header value for this form.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("{}; boundary={}", ContentType::FormData, self.boundary)
    }

    /// Consume into (content-type header value, body bytes).
    #[must_use]
    pub fn into_body(self) -> (String, Bytes) {
        let content_type = self.content_type();
        (content_type, self.encode())
    }

    fn encode(&self) -> Bytes {
        let delimiter = format!("--{}", self.boundary);
        let mut buf = BytesMut::new();

        for part in &self.parts {
            buf.put_slice(delimiter.as_bytes());
            buf.put_slice(b"\r\n");

            buf.put_slice(b"Content-Disposition: form-data; name=\"");
            put_quoted(&mut buf, &part.name);
            buf.put_u8(b'"');
            if let Some(filename) = &part.filename {
                buf.put_slice(b"; filename=\"");
                put_quoted(&mut buf, filename);
                buf.put_u8(b'"');
            }
            buf.put_slice(b"\r\n");

            if let Some(content_type) = &part.content_type {
                buf.put_slice(b"Content-Type: ");
                buf.put_slice(content_type.as_bytes());
                buf.put_slice(b"\r\n");
            }

            buf.put_slice(b"\r\n");
            buf.put_slice(&part.data);
            buf.put_slice(b"\r\n");
        }

        buf.put_slice(delimiter.as_bytes());
        buf.put_slice(b"--\r\n");

        buf.freeze()
    }
}

/// Write a quoted-string parameter value, escaping the bytes that would end
/// the quote or the header line the way browsers do.
fn put_quoted(buf: &mut BytesMut, value: &str) {
    for byte in value.bytes() {
        match byte {
            b'"' => buf.put_slice(b"%22"),
            b'\r' => buf.put_slice(b"%0D"),
            b'\n' => buf.put_slice(b"%0A"),
            other => buf.put_u8(other),
        }
    }
}

fn generate_boundary() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    format!("----CourierFormBoundary{timestamp:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_part_has_no_content_type() {
        let part = Part::text("field", "value");
        assert_eq!(part.name(), "field");
        assert_eq!(part.data().as_ref(), b"value");
        assert!(part.content_type().is_none());
        assert!(!part.is_file());
    }

    #[test]
    fn file_part_uses_explicit_or_guessed_type() {
        let guessed = Part::file("upload", &FileField::new("Photo.JPG", vec![0xFF, 0xD8]));
        assert_eq!(guessed.filename(), Some("Photo.JPG"));
        assert_eq!(guessed.content_type(), Some("image/jpeg"));
        assert!(guessed.is_file());

        let explicit = Part::file(
            "upload",
            &FileField::new("blob", vec![1]).with_content_type("application/x-custom"),
        );
        assert_eq!(explicit.content_type(), Some("application/x-custom"));
    }

    #[test]
    fn guess_content_type_fallback() {
        assert_eq!(guess_content_type("notes.txt"), "text/plain");
        assert_eq!(guess_content_type("archive"), "application/octet-stream");
        assert_eq!(guess_content_type("data.xyz"), "application/octet-stream");
    }

    #[test]
    fn generated_boundary_prefix() {
        assert!(Form::new().boundary().starts_with("----CourierFormBoundary"));
    }

    #[test]
    fn form_lookup_by_name() {
        let form = Form::with_boundary("b").text("a", "1").text("b", "2");
        assert_eq!(form.get("b").map(|p| p.data().as_ref()), Some(&b"2"[..]));
        assert!(form.get("c").is_none());
    }

    #[test]
    fn form_encode() {
        let form = Form::with_boundary("boundary123")
            .text("name", "Ada")
            .file("avatar", FileField::new("ada.txt", "hello"));

        let (content_type, body) = form.into_body();
        assert_eq!(content_type, "multipart/form-data; boundary=boundary123");

        let body = String::from_utf8_lossy(&body);
        assert_eq!(
            body,
            "--boundary123\r\n\
             Content-Disposition: form-data; name=\"name\"\r\n\
             \r\n\
             Ada\r\n\
             --boundary123\r\n\
             Content-Disposition: form-data; name=\"avatar\"; filename=\"ada.txt\"\r\n\
             Content-Type: text/plain\r\n\
             \r\n\
             hello\r\n\
             --boundary123--\r\n"
        );
    }

    #[test]
    fn quotes_and_line_breaks_cannot_escape_the_disposition_header() {
        let form = Form::with_boundary("b")
            .text("na\"me", "v")
            .file("up", FileField::new("a\".png\r\nX-Injected: 1", "x"));

        let (_, body) = form.into_body();
        let body = String::from_utf8_lossy(&body);

        assert!(body.contains("name=\"na%22me\""), "{body}");
        assert!(
            body.contains("filename=\"a%22.png%0D%0AX-Injected: 1\"\r\n"),
            "{body}"
        );
        assert!(!body.contains("\r\nX-Injected"));
    }
}
