//! Compressing response writer.
//!
//! Wraps a byte sink in a gzip encoder and, on the first non-empty write,
//! classifies the *uncompressed* bytes to fill in a missing `Content-Type`
//! header. Sniffing must happen before compression (classifying gzip output
//! would always yield `application/x-gzip`), so the header mutation is done
//! here, at the moment the first body bytes pass through, before anything is
//! handed to the transport.

use std::io::{self, Write};

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue};
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::http::sniff::detect_content_type;

/// Gzip writer that sets `Content-Type` from the first uncompressed bytes.
pub struct CompressingWriter<'a, W: Write> {
    encoder: GzEncoder<W>,
    headers: &'a mut HeaderMap,
}

impl<'a, W: Write> CompressingWriter<'a, W> {
    pub fn new(sink: W, headers: &'a mut HeaderMap) -> Self {
        Self {
            encoder: GzEncoder::new(sink, Compression::default()),
            headers,
        }
    }

    /// Finalize the gzip stream and return the sink. Must be called on every
    /// exit path; dropping the writer without finishing leaves the stream
    /// truncated.
    pub fn finish(self) -> io::Result<W> {
        self.encoder.finish()
    }
}

impl<W: Write> Write for CompressingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !buf.is_empty() && !self.headers.contains_key(CONTENT_TYPE) {
            self.headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static(detect_content_type(buf)),
            );
        }
        self.encoder.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.encoder.flush()
    }
}
