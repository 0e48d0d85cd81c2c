//! Keystore passphrase entry
//!
//! The passphrase is read masked when stdin is a terminal (crossterm raw mode),
//! otherwise as a plain line. Its buffer is zeroed as soon as it is dropped.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::fmt;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;
use std::sync::atomic::{compiler_fence, Ordering};

use crate::common::{ListenerError, Result};

/// Secret used to decrypt the credential store
///
/// Never printed; the backing memory is overwritten on [`Passphrase::erase`]
/// and on drop.
pub struct Passphrase {
    bytes: Vec<u8>,
}

impl Passphrase {
    /// The passphrase as text, empty once erased
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes).unwrap_or("")
    }

    fn with_capacity(capacity: usize) -> Self {
        Self { bytes: Vec::with_capacity(capacity) }
    }

    /// Overwrite the whole allocation with zeros
    pub fn erase(&mut self) {
        wipe(&mut self.bytes);
    }

    /// Append `more`, never leaving an unwiped copy behind on reallocation
    fn extend(&mut self, more: &[u8]) {
        let needed = self.bytes.len() + more.len();
        if needed > self.bytes.capacity() {
            let mut grown = Vec::with_capacity(needed.max(self.bytes.capacity() * 2));
            grown.extend_from_slice(&self.bytes);
            let mut old = std::mem::replace(&mut self.bytes, grown);
            wipe(&mut old);
        }
        self.bytes.extend_from_slice(more);
    }
}

fn wipe(bytes: &mut Vec<u8>) {
    let capacity = bytes.capacity();
    bytes.resize(capacity, 0);
    for byte in bytes.iter_mut() {
        // SAFETY: `byte` is a valid, aligned, exclusive reference into the vector
        unsafe { std::ptr::write_volatile(byte, 0) };
    }
    compiler_fence(Ordering::SeqCst);
    bytes.clear();
}

impl From<String> for Passphrase {
    fn from(secret: String) -> Self {
        Self { bytes: secret.into_bytes() }
    }
}

impl From<&str> for Passphrase {
    fn from(secret: &str) -> Self {
        Self { bytes: secret.as_bytes().to_vec() }
    }
}

impl Drop for Passphrase {
    fn drop(&mut self) {
        self.erase();
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(<redacted>)")
    }
}

/// Ask the operator for the keystore passphrase
///
/// Piped input passes through the process-wide stdin buffer, which std gives
/// no way to wipe; only a terminal keeps the passphrase out of it.
pub fn prompt_passphrase(keystore: &Path) -> Result<Passphrase> {
    let prompt = format!("[>] Enter password for keystore '{}': ", keystore.display());

    if io::stdin().is_terminal() {
        read_masked(&prompt)
    } else {
        read_plain(&prompt, &mut io::stdin().lock())
    }
}

/// Read one visible line; the line terminator is not part of the passphrase
///
/// Bytes after the newline stay in `input`.
pub fn read_plain<R: BufRead>(prompt: &str, input: &mut R) -> Result<Passphrase> {
    eprint!("{}", prompt);
    io::stderr().flush()?;

    let mut secret = Passphrase::with_capacity(128);
    let mut got_input = false;
    loop {
        let available = input.fill_buf()?;
        if available.is_empty() {
            break;
        }
        got_input = true;

        match available.iter().position(|b| *b == b'\n') {
            Some(end) => {
                secret.extend(&available[..end]);
                input.consume(end + 1);
                break;
            }
            None => {
                let len = available.len();
                secret.extend(available);
                input.consume(len);
            }
        }
    }

    if !got_input {
        return Err(ListenerError::Configuration(
            "No passphrase supplied on standard input".to_string(),
        ));
    }
    if secret.bytes.last() == Some(&b'\r') {
        secret.bytes.pop();
    }

    Ok(secret)
}

fn read_masked(prompt: &str) -> Result<Passphrase> {
    eprint!("{}", prompt);
    io::stderr().flush()?;

    enable_raw_mode()?;
    let result = collect_keys();
    let _ = disable_raw_mode();
    eprintln!();

    result
}

fn collect_keys() -> Result<Passphrase> {
    let mut secret = Passphrase::with_capacity(256);

    loop {
        let Event::Key(KeyEvent { code, modifiers, kind, .. }) = event::read()? else {
            continue;
        };
        if kind == KeyEventKind::Release {
            continue;
        }

        match code {
            KeyCode::Enter => return Ok(secret),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                return Err(ListenerError::Cancelled);
            }
            KeyCode::Backspace => {
                if let Ok(text) = std::str::from_utf8(&secret.bytes) {
                    let keep = text.char_indices().last().map(|(i, _)| i).unwrap_or(0);
                    secret.bytes.truncate(keep);
                }
            }
            KeyCode::Char(c) => {
                let mut buf = [0u8; 4];
                secret.extend(c.encode_utf8(&mut buf).as_bytes());
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_plain_strips_terminator() {
        let mut input = Cursor::new(b"s3cret\r\nnext line\n".to_vec());
        let pass = read_plain("", &mut input).unwrap();
        assert_eq!(pass.as_str(), "s3cret");
    }

    #[test]
    fn test_read_plain_without_newline() {
        let mut input = Cursor::new(b"changeit".to_vec());
        let pass = read_plain("", &mut input).unwrap();
        assert_eq!(pass.as_str(), "changeit");
    }

    #[test]
    fn test_read_plain_eof() {
        let mut input = Cursor::new(Vec::new());
        assert!(matches!(
            read_plain("", &mut input),
            Err(ListenerError::Configuration(_))
        ));
    }

    #[test]
    fn test_read_plain_long_passphrase() {
        let long = "x".repeat(1000);
        let mut input = Cursor::new(format!("{}\nrest", long).into_bytes());
        let pass = read_plain("", &mut input).unwrap();
        assert_eq!(pass.as_str(), long);

        // the rest of the input is left for whoever reads next
        let mut rest = String::new();
        input.read_line(&mut rest).unwrap();
        assert_eq!(rest, "rest");
    }

    #[test]
    fn test_extend_keeps_content_across_growth() {
        let mut pass = Passphrase::with_capacity(2);
        pass.extend(b"ab");
        pass.extend(b"cdef");
        assert_eq!(pass.as_str(), "abcdef");
        assert!(pass.bytes.capacity() >= 6);

        pass.erase();
        assert!(pass.bytes.is_empty());
    }

    #[test]
    fn test_erase() {
        let mut pass = Passphrase::from("hunter2");
        pass.erase();
        assert_eq!(pass.as_str(), "");
        assert!(pass.bytes.iter().all(|b| *b == 0));
    }

    #[test]
    fn test_debug_is_redacted() {
        let pass = Passphrase::from("hunter2");
        assert!(!format!("{:?}", pass).contains("hunter2"));
    }
}
