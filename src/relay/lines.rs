//! Line tap
//!
//! Turns the inbound byte chunks into text lines for the session transcript.
//! A line ends at `\n`, `\r\n` or a lone `\r`; the terminator is dropped.
//! Invalid UTF-8 is replaced, never rejected.

use bytes::{BufMut, BytesMut};

/// Accumulates bytes across chunk boundaries until a line is complete
#[derive(Debug, Default)]
pub struct LineAccumulator {
    pending: BytesMut,
    // a `\r` ended the last line; swallow a directly following `\n`
    skip_lf: bool,
}

impl LineAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and collect every line it completes, in order
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();

        for &byte in chunk {
            if self.skip_lf {
                self.skip_lf = false;
                if byte == b'\n' {
                    continue;
                }
            }

            match byte {
                b'\n' => lines.push(self.take_line()),
                b'\r' => {
                    lines.push(self.take_line());
                    self.skip_lf = true;
                }
                _ => self.pending.put_u8(byte),
            }
        }

        lines
    }

    /// Flush an unterminated trailing line at end of stream
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.take_line())
        }
    }

    /// Bytes buffered for the current incomplete line
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn take_line(&mut self) -> String {
        let line = self.pending.split();
        String::from_utf8_lossy(&line).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line() {
        let mut acc = LineAccumulator::new();
        assert_eq!(acc.push(b"hello\n"), vec!["hello"]);
        assert_eq!(acc.finish(), None);
    }

    #[test]
    fn test_split_across_chunks() {
        let mut acc = LineAccumulator::new();
        assert!(acc.push(b"who").is_empty());
        assert_eq!(acc.pending_len(), 3);
        assert_eq!(acc.push(b"ami\nroot\nuid="), vec!["whoami", "root"]);
        assert_eq!(acc.finish(), Some("uid=".to_string()));
    }

    #[test]
    fn test_terminators() {
        let mut acc = LineAccumulator::new();
        assert_eq!(acc.push(b"a\r\nb\rc\n"), vec!["a", "b", "c"]);

        // CRLF split between chunks still yields one line
        assert_eq!(acc.push(b"d\r"), vec!["d"]);
        assert_eq!(acc.push(b"\ne\n"), vec!["e"]);
    }

    #[test]
    fn test_empty_lines_are_kept() {
        let mut acc = LineAccumulator::new();
        assert_eq!(acc.push(b"\n\nx\n"), vec!["", "", "x"]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut acc = LineAccumulator::new();
        let lines = acc.push(b"caf\xe9\n");
        assert_eq!(lines, vec!["caf\u{FFFD}"]);
    }
}
