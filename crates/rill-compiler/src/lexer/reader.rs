//! Look-ahead character buffer over any `std::io::Read`.
//!
//! Bytes are pulled in blocks and decoded as UTF-8 incrementally. Consumed
//! characters are evicted lazily, keeping a short tail before the current
//! position.

use std::io::{self, Read};

/// Bytes requested from the source per read, and the growth step of the buffer.
pub const BLOCK_SIZE: usize = 1024;

/// Consumed characters kept before the current position after eviction.
const RETAINED: usize = 16;

pub struct ReaderBuffer {
    /// Dropped once exhausted or failed.
    source: Option<Box<dyn Read + Send>>,
    chars: Vec<char>,
    pos: usize,
    /// Trailing bytes of an incomplete UTF-8 sequence.
    pending: Vec<u8>,
    line: u32,
    column: u32,
    offset: usize,
}

impl ReaderBuffer {
    pub fn new(source: impl Read + Send + 'static) -> Self {
        Self {
            source: Some(Box::new(source)),
            chars: Vec::new(),
            pos: 0,
            pending: Vec::new(),
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(io::Cursor::new(text.as_bytes().to_vec()))
    }

    /// Character `offset` positions ahead, without consuming.
    ///
    /// Returns `None` at end of input, and after a read failure.
    pub fn peek(&mut self, offset: usize) -> io::Result<Option<char>> {
        while self.pos + offset >= self.chars.len() {
            if !self.fill()? {
                return Ok(None);
            }
        }
        Ok(Some(self.chars[self.pos + offset]))
    }

    /// Consume up to `count` characters.
    pub fn read(&mut self, count: usize) -> io::Result<String> {
        if count > 0 {
            self.peek(count - 1)?;
        }
        let end = (self.pos + count).min(self.chars.len());
        let mut text = String::with_capacity(end - self.pos);
        for &c in &self.chars[self.pos..end] {
            text.push(c);
            self.offset += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.pos = end;
        self.evict();
        Ok(text)
    }

    /// 1-based line of the next character.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// 1-based column of the next character.
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Byte offset of the next character.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Characters currently held, consumed tail included.
    pub fn buffered(&self) -> usize {
        self.chars.len()
    }

    /// Pull one block from the source. `false` once the source is exhausted.
    fn fill(&mut self) -> io::Result<bool> {
        let Some(source) = self.source.as_mut() else {
            return Ok(false);
        };
        if self.chars.capacity() - self.chars.len() < BLOCK_SIZE {
            self.chars.reserve(BLOCK_SIZE);
        }

        let mut block = [0u8; BLOCK_SIZE];
        let n = match source.read(&mut block) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(true),
            Err(e) => {
                self.close();
                return Err(e);
            }
        };

        if n == 0 {
            let truncated = !self.pending.is_empty();
            self.close();
            if truncated {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "incomplete UTF-8 sequence at end of input",
                ));
            }
            return Ok(false);
        }

        self.pending.extend_from_slice(&block[..n]);
        self.decode_pending()?;
        Ok(true)
    }

    fn decode_pending(&mut self) -> io::Result<()> {
        let valid = match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                self.chars.extend(text.chars());
                self.pending.clear();
                return Ok(());
            }
            // Sequence split across reads: keep the tail for the next block.
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => {
                self.close();
                return Err(io::Error::new(io::ErrorKind::InvalidData, e));
            }
        };
        let text = std::str::from_utf8(&self.pending[..valid])
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.chars.extend(text.chars());
        self.pending.drain(..valid);
        Ok(())
    }

    fn evict(&mut self) {
        if self.pos > BLOCK_SIZE {
            self.chars.drain(..self.pos - RETAINED);
            self.pos = RETAINED;
        }
    }

    fn close(&mut self) {
        self.source = None;
        self.pending.clear();
    }
}

impl std::fmt::Debug for ReaderBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderBuffer")
            .field("open", &self.source.is_some())
            .field("buffered", &self.chars.len())
            .field("line", &self.line)
            .field("column", &self.column)
            .finish()
    }
}
