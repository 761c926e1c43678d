//! Incremental UTF-8 decoding of a chunked response body.

use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};

use crate::core::request::RequestError;

const REPLACEMENT: char = '\u{FFFD}';

/// Stateful UTF-8 decoder that carries an incomplete trailing sequence over
/// to the next call. Invalid bytes decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut buffer = std::mem::take(&mut self.pending);
        buffer.extend_from_slice(chunk);

        let mut out = String::with_capacity(buffer.len());
        let mut rest = buffer.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT);
                            rest = &after[len..];
                        }
                        None => {
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flushes a dangling partial sequence at end of input.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            REPLACEMENT.to_string()
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Lazy, forward-only sequence of text fragments read from a byte stream.
///
/// Fragments are never empty. After the stream ends or fails once, every
/// further call yields `Ok(None)`.
pub struct StreamDecoder<S> {
    inner: S,
    utf8: Utf8Decoder,
    exhausted: bool,
}

impl<S> StreamDecoder<S>
where
    S: Stream<Item = Result<Bytes, RequestError>> + Unpin,
{
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            utf8: Utf8Decoder::new(),
            exhausted: false,
        }
    }

    pub async fn next_fragment(&mut self) -> Result<Option<String>, RequestError> {
        while !self.exhausted {
            match self.inner.next().await {
                Some(Ok(chunk)) => {
                    let text = self.utf8.decode(&chunk);
                    if !text.is_empty() {
                        return Ok(Some(text));
                    }
                }
                Some(Err(err)) => {
                    self.exhausted = true;
                    return Err(err);
                }
                None => {
                    self.exhausted = true;
                    let tail = self.utf8.finish();
                    if !tail.is_empty() {
                        return Ok(Some(tail));
                    }
                }
            }
        }
        Ok(None)
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// The same fragment sequence as a `Stream`.
    pub fn into_fragments(self) -> impl Stream<Item = Result<String, RequestError>> {
        stream::unfold(self, |mut decoder| async move {
            match decoder.next_fragment().await {
                Ok(Some(fragment)) => Some((Ok(fragment), decoder)),
                Ok(None) => None,
                Err(err) => Some((Err(err), decoder)),
            }
        })
    }
}
