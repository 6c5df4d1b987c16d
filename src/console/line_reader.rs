//! Terminal line reader.
//!
//! Reads one line at a time from a raw byte stream, as delivered by a
//! terminal channel in raw mode.
//!
//! # Design Decisions
//! - `\r`, `\r\n` and `\n` all end a line; the `\n` of a `\r\n` pair is
//!   dropped on the next read so a lone `\r` never blocks waiting for it
//! - EOT (Ctrl-D) ends the stream: pending text is returned first, then `None`
//! - Backspace and DEL erase the previous character
//! - Reads byte by byte from the inner reader and never buffers past a line

use std::io::{self, ErrorKind, Read, Write};

const EOT: u8 = 0x04;
const BACKSPACE: u8 = 0x08;
const DEL: u8 = 0x7f;

#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    skip_newline: bool,
    finished: bool,
}

impl<R: Read> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            skip_newline: false,
            finished: false,
        }
    }

    /// Read the next line without its terminator.
    ///
    /// Returns `Ok(None)` at end of stream. Bytes read are echoed to `echo`,
    /// with line ends echoed as `\r\n`.
    pub fn read_line(&mut self, mut echo: Option<&mut dyn Write>) -> io::Result<Option<String>> {
        if self.finished {
            return Ok(None);
        }
        let mut line: Vec<u8> = Vec::new();

        loop {
            let Some(byte) = self.next_byte()? else {
                self.finished = true;
                return Ok((!line.is_empty()).then(|| decode(line)));
            };

            if std::mem::take(&mut self.skip_newline) && byte == b'\n' {
                continue;
            }

            match byte {
                b'\r' | b'\n' => {
                    self.skip_newline = byte == b'\r';
                    if let Some(out) = echo.as_deref_mut() {
                        out.write_all(b"\r\n")?;
                        out.flush()?;
                    }
                    return Ok(Some(decode(line)));
                }
                EOT => {
                    self.finished = true;
                    return Ok((!line.is_empty()).then(|| decode(line)));
                }
                BACKSPACE | DEL => {
                    if pop_char(&mut line) {
                        if let Some(out) = echo.as_deref_mut() {
                            out.write_all(b"\x08 \x08")?;
                            out.flush()?;
                        }
                    }
                }
                _ => {
                    line.push(byte);
                    if let Some(out) = echo.as_deref_mut() {
                        out.write_all(&[byte])?;
                        out.flush()?;
                    }
                }
            }
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Remove the last UTF-8 character. Returns false if the line was empty.
fn pop_char(line: &mut Vec<u8>) -> bool {
    let Some(mut end) = line.len().checked_sub(1) else {
        return false;
    };
    while end > 0 && (line[end] & 0xC0) == 0x80 {
        end -= 1;
    }
    line.truncate(end);
    true
}

fn decode(line: Vec<u8>) -> String {
    String::from_utf8(line).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}
