// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Writer adapter that percent-encodes everything passing through it.

use std::io::{self, Write};

/// Percent-encodes every byte written before handing it to the inner writer.
///
/// Encoding is byte-wise, so the output does not depend on how callers
/// split their writes.
#[derive(Debug)]
pub struct UrlEncodedWriter<W: Write> {
    inner: W,
}

impl<W: Write> UrlEncodedWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for UrlEncodedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let encoded = urlencoding::encode_binary(buf);
        self.inner.write_all(encoded.as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
