use std::io::{BufRead, Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use encoding_rs::Encoding;

use crate::error::{Result, VmError};

/// Bounds-checked little-endian reader over a compiled script buffer.
pub(crate) struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
    encoding: &'static Encoding,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8], encoding: &'static Encoding) -> Self {
        Self { cursor: Cursor::new(bytes), encoding }
    }

    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    fn truncated(&self, what: &str) -> VmError {
        VmError::load(format!("unexpected end of data reading {} at offset 0x{:X}", what, self.position()))
    }

    pub fn read_u8(&mut self, what: &str) -> Result<u8> {
        self.cursor.read_u8().map_err(|_| self.truncated(what))
    }

    pub fn read_u32(&mut self, what: &str) -> Result<u32> {
        self.cursor.read_u32::<LittleEndian>().map_err(|_| self.truncated(what))
    }

    pub fn read_i32(&mut self, what: &str) -> Result<i32> {
        self.cursor.read_i32::<LittleEndian>().map_err(|_| self.truncated(what))
    }

    pub fn read_f32(&mut self, what: &str) -> Result<f32> {
        self.cursor.read_f32::<LittleEndian>().map_err(|_| self.truncated(what))
    }

    pub fn skip(&mut self, len: u64, what: &str) -> Result<()> {
        let end = self.position().checked_add(len).ok_or_else(|| self.truncated(what))?;
        if end > self.cursor.get_ref().len() as u64 {
            return Err(self.truncated(what));
        }
        self.cursor.set_position(end);
        Ok(())
    }

    pub fn read_bytes(&mut self, len: usize, what: &str) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.cursor.read_exact(&mut buf).map_err(|_| self.truncated(what))?;
        Ok(buf)
    }

    /// Reads a `'\n'`-terminated line and decodes it with the script's code page.
    pub fn read_line(&mut self, what: &str) -> Result<String> {
        let mut raw = Vec::new();
        self.cursor.read_until(b'\n', &mut raw).map_err(|_| self.truncated(what))?;
        match raw.pop() {
            Some(b'\n') => {}
            _ => return Err(self.truncated(what)),
        }
        let (text, _, _) = self.encoding.decode(&raw);
        Ok(text.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1252;

    #[test]
    fn reads_little_endian_and_lines() {
        let bytes = [0x01, 0x02, 0x00, 0x00, 0x00, b'H', 0xE4, b'\n'];
        let mut r = Reader::new(&bytes, WINDOWS_1252);
        assert_eq!(r.read_u8("a").unwrap(), 1);
        assert_eq!(r.read_u32("b").unwrap(), 2);
        assert_eq!(r.read_line("c").unwrap(), "H\u{e4}");
    }

    #[test]
    fn truncation_is_an_error() {
        let bytes = [0x01, 0x02];
        let mut r = Reader::new(&bytes, WINDOWS_1252);
        assert!(matches!(r.read_u32("count"), Err(VmError::Load(_))));

        let mut r = Reader::new(b"NO_NEWLINE", WINDOWS_1252);
        assert!(r.read_line("name").is_err());
        assert!(Reader::new(&bytes, WINDOWS_1252).skip(3, "table").is_err());
    }
}
