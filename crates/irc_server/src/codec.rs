//! Line framing: turns a stream of arbitrarily-fragmented bytes into complete command
//! lines, per `SPEC_FULL.md` §4.2. Kept independent of any socket type so the
//! fragmentation-invariant in §8 property 6 can be unit-tested directly.

use crate::constants::MAX_READ_BUFFER;
use crate::errors::SessionError;

#[derive(Debug)]
pub struct LineFramer {
    buf: Vec<u8>,
    max_line_len: usize,
}

impl Default for LineFramer {
    fn default() -> Self {
        LineFramer::new(crate::constants::MAX_LINE_LEN)
    }
}

impl LineFramer {
    /// `max_line_len` bounds one *extracted* line (SPEC_FULL.md §10.3's configurable
    /// `max_message_length`); `MAX_READ_BUFFER` remains a fixed, absolute cap on
    /// unconsumed input regardless of that setting, guarding a client that never sends a
    /// newline at all.
    pub fn new(max_line_len: usize) -> Self {
        LineFramer { buf: Vec::new(), max_line_len }
    }

    /// Appends freshly-read bytes and returns every complete line they produced, in
    /// order. Lines are terminated by `\n`; an immediately preceding `\r` is stripped.
    /// Empty lines are silently dropped. Bytes after the last `\n` are retained for the
    /// next call.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, SessionError> {
        self.buf.extend_from_slice(bytes);
        if self.buf.len() > MAX_READ_BUFFER {
            return Err(SessionError::BufferOverflow(MAX_READ_BUFFER));
        }

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(rel_nl) = self.buf[start..].iter().position(|&b| b == b'\n') {
            let nl = start + rel_nl;
            let mut end = nl;
            if end > start && self.buf[end - 1] == b'\r' {
                end -= 1;
            }
            if end > start {
                if end - start > self.max_line_len {
                    return Err(SessionError::LineTooLong(self.max_line_len));
                }
                let line = String::from_utf8_lossy(&self.buf[start..end]).into_owned();
                lines.push(line);
            }
            start = nl + 1;
        }
        self.buf.drain(0..start);
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_crlf_and_lf_lines() {
        let mut framer = LineFramer::default();
        let lines = framer.push(b"NICK alice\r\nUSER a 0 * :A\n").unwrap();
        assert_eq!(lines, vec!["NICK alice", "USER a 0 * :A"]);
    }

    #[test]
    fn retains_partial_trailing_bytes() {
        let mut framer = LineFramer::default();
        let lines = framer.push(b"NICK al").unwrap();
        assert!(lines.is_empty());
        let lines = framer.push(b"ice\r\n").unwrap();
        assert_eq!(lines, vec!["NICK alice"]);
    }

    #[test]
    fn skips_empty_lines() {
        let mut framer = LineFramer::default();
        let lines = framer.push(b"\r\n\r\nNICK a\r\n\r\n").unwrap();
        assert_eq!(lines, vec!["NICK a"]);
    }

    #[test]
    fn overflow_is_an_error() {
        let mut framer = LineFramer::default();
        let big = vec![b'x'; MAX_READ_BUFFER + 1];
        assert!(matches!(
            framer.push(&big),
            Err(SessionError::BufferOverflow(_))
        ));
    }

    #[test]
    fn line_longer_than_configured_limit_is_an_error() {
        let mut framer = LineFramer::new(16);
        let line = format!("PRIVMSG #room :{}\r\n", "x".repeat(20));
        assert!(matches!(
            framer.push(line.as_bytes()),
            Err(SessionError::LineTooLong(16))
        ));
    }

    /// §8 property 6: parsing is independent of how the input was chunked.
    #[test]
    fn fragmentation_invariant() {
        let whole = b"PASS secret\r\nNICK alice\r\nUSER alice 0 * :Alice A\r\nJOIN #room\r\n";

        let mut baseline = LineFramer::default();
        let expected = baseline.push(whole).unwrap();

        for chunk_size in [1usize, 2, 3, 5, 7, 11, 13, 64] {
            let mut framer = LineFramer::default();
            let mut got = Vec::new();
            for chunk in whole.chunks(chunk_size) {
                got.extend(framer.push(chunk).unwrap());
            }
            assert_eq!(got, expected, "chunk_size={chunk_size}");
        }
    }
}
