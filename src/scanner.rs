//! Framing of exiftool's merged output stream.
//!
//! Exiftool in stay-open mode answers every `-execute` with a block of output
//! followed by the ready token. [`split_ready_token`] is the pure split rule;
//! [`TokenScanner`] applies it incrementally over a [`Read`]er, pulling more
//! bytes whenever a record is still incomplete.

use crate::error::ExifToolError;
use std::io::{ErrorKind, Read};

const INITIAL_CAPACITY: usize = 4096;
const READ_CHUNK: usize = 64 * 1024;

/// Result of applying the split rule to the currently buffered bytes.
#[derive(Debug, PartialEq, Eq)]
pub enum Split<'a> {
    /// No token yet, more input is needed.
    NeedMore,
    /// A complete record. `advance` bytes (record plus token) are consumed.
    Record { advance: usize, record: &'a [u8] },
}

/// Searches `data` for `token` and splits off the bytes before it.
///
/// The token itself is never part of the record. Running out of input with
/// leftover bytes and no token means the stream was truncated.
pub fn split_ready_token<'a>(
    data: &'a [u8],
    at_eof: bool,
    token: &[u8],
) -> Result<Split<'a>, ExifToolError> {
    match find(data, token) {
        Some(idx) => Ok(Split::Record {
            advance: idx + token.len(),
            record: &data[..idx],
        }),
        None if at_eof && !data.is_empty() => Err(ExifToolError::NoFinalToken {
            buffered: data.len(),
        }),
        None => Ok(Split::NeedMore),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Incremental reader yielding one token-delimited record per call.
///
/// Bytes already searched are not searched again, and reads grow with the
/// pending record, so one record of `n` bytes costs `O(n)` to frame.
///
/// Once an error has been returned the scanner is finished: every later call
/// yields `Ok(None)` and [`last_error`](Self::last_error) keeps the cause.
#[derive(Debug)]
pub struct TokenScanner<R> {
    reader: R,
    token: Vec<u8>,
    // Initialized storage; bytes past `end` are spare room for reads.
    buffer: Vec<u8>,
    // Start of the unconsumed region in `buffer`.
    start: usize,
    end: usize,
    // No token starts before this offset in `buffer`.
    scan_from: usize,
    max_size: Option<usize>,
    eof: bool,
    failed: Option<String>,
}

impl<R: Read> TokenScanner<R> {
    /// Scans `reader` for records terminated by `token`, with no size limit.
    pub fn new(reader: R, token: impl Into<Vec<u8>>) -> Self {
        Self {
            reader,
            token: token.into(),
            buffer: Vec::with_capacity(INITIAL_CAPACITY),
            start: 0,
            end: 0,
            scan_from: 0,
            max_size: None,
            eof: false,
            failed: None,
        }
    }

    /// Limits how many unconsumed bytes may pile up while waiting for a token.
    pub fn with_max_size(mut self, max_size: Option<usize>) -> Self {
        self.max_size = max_size;
        self
    }

    /// Message of the error that stopped the scanner, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.failed.as_deref()
    }

    /// Bytes read but not yet returned as part of a record.
    pub fn buffered(&self) -> usize {
        self.end - self.start
    }

    /// Returns the next record, `Ok(None)` once the stream is exhausted.
    pub fn next_record(&mut self) -> Result<Option<Vec<u8>>, ExifToolError> {
        if self.failed.is_some() {
            return Ok(None);
        }

        loop {
            let at_eof = self.eof || self.is_full();
            let found = split_ready_token(&self.buffer[self.scan_from..self.end], false, &self.token)
                .map(|split| match split {
                    Split::Record { advance, .. } => Some(advance),
                    Split::NeedMore => None,
                });
            let found = match found {
                Ok(advance) => advance.map(|advance| self.scan_from + advance),
                Err(e) => return Err(self.fail(e)),
            };

            if let Some(end) = found {
                let record = self.buffer[self.start..end - self.token.len()].to_vec();
                self.start = end;
                self.scan_from = end;
                return Ok(Some(record));
            }

            if at_eof {
                // Nothing pending is a clean end; anything else was cut off.
                let truncated = split_ready_token(&self.buffer[self.start..self.end], true, &self.token)
                    .map(|_| ());
                return match truncated {
                    Ok(()) => Ok(None),
                    Err(e) => Err(self.fail(e)),
                };
            }

            // A token may straddle the end of what has been read so far.
            let overlap = self.token.len().saturating_sub(1);
            self.scan_from = self.end.saturating_sub(overlap).max(self.start);

            if let Err(e) = self.fill() {
                return Err(self.fail(e.into()));
            }
        }
    }

    fn is_full(&self) -> bool {
        self.max_size.is_some_and(|max| self.buffered() >= max)
    }

    fn fail(&mut self, err: ExifToolError) -> ExifToolError {
        self.failed = Some(err.to_string());
        err
    }

    /// Reads at least one chunk, or as much as is already pending, so a
    /// growing record needs a logarithmic number of reads.
    fn fill(&mut self) -> std::io::Result<()> {
        // Consumed bytes are shifted out once they outweigh the pending ones.
        if self.start > 0 && self.start >= self.buffered() {
            self.buffer.copy_within(self.start..self.end, 0);
            self.scan_from -= self.start;
            self.end -= self.start;
            self.start = 0;
        }

        let pending = self.buffered();
        let mut want = pending.max(READ_CHUNK);
        if let Some(max) = self.max_size {
            want = want.min(max.saturating_sub(pending));
        }
        // Storage only ever grows, so each byte is zeroed once.
        if self.buffer.len() < self.end + want {
            self.buffer.resize(self.end + want, 0);
        }

        let target = &mut self.buffer[self.end..self.end + want];
        let n = loop {
            match self.reader.read(target) {
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                other => break other?,
            }
        };
        self.end += n;
        if n == 0 {
            self.eof = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Cursor;

    const TOKEN: &[u8] = b"{ready}\n";

    /// Hands out its chunks one `read` call at a time.
    struct Chunked {
        chunks: Vec<Vec<u8>>,
    }

    impl Chunked {
        fn new(chunks: &[&[u8]]) -> Self {
            Self {
                chunks: chunks.iter().rev().map(|c| c.to_vec()).collect(),
            }
        }
    }

    impl Read for Chunked {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let Some(mut chunk) = self.chunks.pop() else {
                return Ok(0);
            };
            let n = chunk.len().min(buf.len());
            buf[..n].copy_from_slice(&chunk[..n]);
            if n < chunk.len() {
                self.chunks.push(chunk.split_off(n));
            }
            Ok(n)
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("pipe went away"))
        }
    }

    #[test]
    fn test_split_single_token() {
        let data = b"[{\"a\":1}]\n{ready}\n";
        let split = split_ready_token(data, false, TOKEN).unwrap();
        assert_eq!(
            split,
            Split::Record {
                advance: data.len(),
                record: b"[{\"a\":1}]\n",
            }
        );
    }

    #[test]
    fn test_split_token_mid_buffer() {
        let data = b"first{ready}\nsecond";
        assert_matches!(
            split_ready_token(data, false, TOKEN),
            Ok(Split::Record { advance: 13, record }) if record == b"first"
        );
    }

    #[test]
    fn test_split_empty_record() {
        let data = b"{ready}\n{ready}\n";
        assert_matches!(
            split_ready_token(data, false, TOKEN),
            Ok(Split::Record { advance: 8, record }) if record.is_empty()
        );
    }

    #[test]
    fn test_split_partial_token_needs_more() {
        assert_matches!(split_ready_token(b"data{rea", false, TOKEN), Ok(Split::NeedMore));
        assert_matches!(split_ready_token(b"", false, TOKEN), Ok(Split::NeedMore));
    }

    #[test]
    fn test_split_truncated_only_at_eof() {
        assert_matches!(split_ready_token(b"[{}]", false, TOKEN), Ok(Split::NeedMore));
        assert_matches!(
            split_ready_token(b"[{}]", true, TOKEN),
            Err(ExifToolError::NoFinalToken { buffered: 4 })
        );
        // Nothing left at EOF is a clean end, not a truncation.
        assert_matches!(split_ready_token(b"", true, TOKEN), Ok(Split::NeedMore));
    }

    #[test]
    fn test_split_crlf_token() {
        let data = b"out{ready}\r\n";
        assert_matches!(
            split_ready_token(data, false, b"{ready}\r\n"),
            Ok(Split::Record { advance: 12, record }) if record == b"out"
        );
        // A CRLF stream never matches the LF token.
        assert_matches!(
            split_ready_token(data, true, TOKEN),
            Err(ExifToolError::NoFinalToken { .. })
        );
    }

    #[test]
    fn test_scanner_token_across_reads() {
        let reader = Chunked::new(&[b"[{\"a\":1}]{rea", b"dy}", b"\n"]);
        let mut scanner = TokenScanner::new(reader, TOKEN);
        assert_eq!(scanner.next_record().unwrap(), Some(b"[{\"a\":1}]".to_vec()));
        assert_eq!(scanner.next_record().unwrap(), None);
        assert!(scanner.last_error().is_none());
    }

    #[test]
    fn test_scanner_multiple_records() {
        let reader = Cursor::new(b"one{ready}\n{ready}\nthree{ready}\n".to_vec());
        let mut scanner = TokenScanner::new(reader, TOKEN);
        assert_eq!(scanner.next_record().unwrap(), Some(b"one".to_vec()));
        assert_eq!(scanner.next_record().unwrap(), Some(Vec::new()));
        assert_eq!(scanner.next_record().unwrap(), Some(b"three".to_vec()));
        assert_eq!(scanner.next_record().unwrap(), None);
    }

    /// Counts `read` calls on the wrapped reader.
    struct Counting<R> {
        inner: R,
        reads: usize,
    }

    impl<R: Read> Read for Counting<R> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.reads += 1;
            self.inner.read(buf)
        }
    }

    #[test]
    fn test_scanner_large_record() {
        let size = 3 * READ_CHUNK + 17;
        let mut data = vec![b'x'; size];
        data.extend_from_slice(TOKEN);
        let mut scanner = TokenScanner::new(Cursor::new(data), TOKEN);
        let record = scanner.next_record().unwrap().unwrap();
        assert_eq!(record.len(), size);
    }

    #[test]
    fn test_scanner_multi_mib_record_reads_grow() {
        let size = 8 * 1024 * 1024;
        let mut data = vec![b'x'; size];
        data.extend_from_slice(TOKEN);
        data.extend_from_slice(b"tail{ready}\n");
        let reader = Counting {
            inner: Cursor::new(data),
            reads: 0,
        };
        let mut scanner = TokenScanner::new(reader, TOKEN);

        let record = scanner.next_record().unwrap().unwrap();
        assert_eq!(record.len(), size);
        assert!(record.iter().all(|&b| b == b'x'));
        assert_eq!(scanner.next_record().unwrap(), Some(b"tail".to_vec()));
        assert_eq!(scanner.next_record().unwrap(), None);
        // Doubling reads: 8 MiB from 64 KiB chunks takes about log2(128) + 1.
        assert!(scanner.reader.reads < 16, "{} reads", scanner.reader.reads);
    }

    #[test]
    fn test_scanner_token_straddles_chunk_boundary() {
        let mut data = vec![b'y'; READ_CHUNK - 3];
        data.extend_from_slice(TOKEN);
        data.extend_from_slice(b"next{ready}\n");
        let mut scanner = TokenScanner::new(Cursor::new(data), TOKEN);
        assert_eq!(scanner.next_record().unwrap().map(|r| r.len()), Some(READ_CHUNK - 3));
        assert_eq!(scanner.next_record().unwrap(), Some(b"next".to_vec()));
    }

    #[test]
    fn test_scanner_truncated_stream() {
        let reader = Chunked::new(&[b"ok{ready}\n", b"[{\"half\":"]);
        let mut scanner = TokenScanner::new(reader, TOKEN);
        assert_eq!(scanner.next_record().unwrap(), Some(b"ok".to_vec()));
        assert_matches!(
            scanner.next_record(),
            Err(ExifToolError::NoFinalToken { buffered: 9 })
        );
        assert!(scanner.last_error().unwrap().contains("no final token found"));
        assert_eq!(scanner.next_record().unwrap(), None);
    }

    #[test]
    fn test_scanner_buffer_limit() {
        let reader = Cursor::new(b"0123456789abcdef{ready}\n".to_vec());
        let mut scanner = TokenScanner::new(reader, TOKEN).with_max_size(Some(8));
        assert_matches!(
            scanner.next_record(),
            Err(ExifToolError::NoFinalToken { buffered: 8 })
        );
    }

    #[test]
    fn test_scanner_limit_fits_record_and_token() {
        let reader = Cursor::new(b"abc{ready}\n".to_vec());
        let mut scanner = TokenScanner::new(reader, TOKEN).with_max_size(Some(11));
        assert_eq!(scanner.next_record().unwrap(), Some(b"abc".to_vec()));
    }

    #[test]
    fn test_scanner_read_error_is_sticky() {
        let mut scanner = TokenScanner::new(Broken, TOKEN);
        assert_matches!(scanner.next_record(), Err(ExifToolError::Io(_)));
        assert!(scanner.last_error().unwrap().contains("pipe went away"));
        assert_eq!(scanner.next_record().unwrap(), None);
    }

    #[test]
    fn test_scanner_empty_stream() {
        let mut scanner = TokenScanner::new(Cursor::new(Vec::new()), TOKEN);
        assert_eq!(scanner.next_record().unwrap(), None);
        assert!(scanner.last_error().is_none());
    }
}
