//! Module for everything that reads the user-provided input: log lines and the file names that classify them.

use std::io::{BufRead, BufReader, Read};

mod classify;


pub use classify::{FileClass, classify};

/// Iterator over the physical lines of a log, decoded leniently.
pub struct LossyLines<R> {
    reader: BufReader<R>,
    buffer: Vec<u8>,
}

/// Splits the data provided by the reader into lines. Line terminators (`\n` or `\r\n`) are removed
/// and byte sequences that are not valid UTF-8 are replaced by U+FFFD instead of failing the read.
pub fn read_lines_lossy<R: Read>(reader: R) -> LossyLines<R> {
    LossyLines {
        reader: BufReader::new(reader),
        buffer: Vec::new(),
    }
}

impl<R: Read> Iterator for LossyLines<R> {
    type Item = std::io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buffer.clear();
        match self.reader.read_until(b'\n', &mut self.buffer) {
            Ok(0) => None,
            Ok(_) => {
                if self.buffer.last() == Some(&b'\n') {
                    self.buffer.pop();
                    if self.buffer.last() == Some(&b'\r') {
                        self.buffer.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.buffer).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
