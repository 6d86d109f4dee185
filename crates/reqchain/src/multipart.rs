//! multipart/form-data encoding for file uploads

use bytes::{BufMut, Bytes, BytesMut};

/// A single-file multipart body followed by plain text fields
#[derive(Debug)]
pub(crate) struct MultipartBody {
    boundary: String,
    buf: BytesMut,
}

impl MultipartBody {
    pub(crate) fn new() -> Self {
        Self::with_boundary(format!("{:032x}", rand::random::<u128>()))
    }

    pub(crate) fn with_boundary(boundary: String) -> Self {
        Self {
            boundary,
            buf: BytesMut::new(),
        }
    }

    /// `Content-Type` header value announcing the boundary
    pub(crate) fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Append a file part
    pub(crate) fn file(&mut self, name: &str, filename: &str, contents: &[u8]) {
        self.open_part();
        self.buf.put_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                escape_quotes(name),
                escape_quotes(filename)
            )
            .as_bytes(),
        );
        self.buf.put_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        self.buf.put_slice(contents);
    }

    /// Append a text field
    pub(crate) fn text(&mut self, name: &str, value: &str) {
        self.open_part();
        self.buf.put_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                escape_quotes(name)
            )
            .as_bytes(),
        );
        self.buf.put_slice(value.as_bytes());
    }

    /// Write the closing boundary and return the encoded body
    pub(crate) fn finish(mut self) -> Bytes {
        if !self.buf.is_empty() {
            self.buf.put_slice(b"\r\n");
        }
        self.buf.put_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.buf.freeze()
    }

    fn open_part(&mut self) {
        if !self.buf.is_empty() {
            self.buf.put_slice(b"\r\n");
        }
        self.buf.put_slice(format!("--{}\r\n", self.boundary).as_bytes());
    }
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
