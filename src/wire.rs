//! Byte stream helpers for cross-process surface hand-off.
//!
//! The container a serialized handle travels in is owned by the process
//! boundary transport; this module only provides the length-prefixed
//! little-endian primitives both sides agree on: UTF-8 strings, opaque
//! byte blocks and `u64` scalars. There is no version field, the reader
//! must consume exactly the fields the writer produced, in order.

use crate::error::SurfaceError;

/// Growable byte sink a surface handle is serialized into.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Create an empty writer.
    pub fn new() -> ByteWriter {
        ByteWriter::default()
    }

    /// Append a length-prefixed UTF-8 string.
    pub fn write_string(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
    }

    /// Append a length-prefixed opaque byte block.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
        self.buf.extend_from_slice(value);
    }

    /// Append a `u64` scalar.
    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// The bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer, returning the accumulated bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over the serialized form of a surface handle.
#[derive(Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Wrap a byte slice for reading.
    pub fn new(buf: &'a [u8]) -> ByteReader<'a> {
        ByteReader { buf, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], SurfaceError> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or(SurfaceError::Decode("length overflows the stream"))?;
        if end > self.buf.len() {
            return Err(SurfaceError::Decode("stream is truncated"));
        }
        let chunk = &self.buf[self.pos..end];
        self.pos = end;
        Ok(chunk)
    }

    fn read_u32(&mut self) -> Result<u32, SurfaceError> {
        // take() returned exactly 4 bytes
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String, SurfaceError> {
        let bytes = self.read_bytes()?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| SurfaceError::Decode("string is not valid UTF-8"))
    }

    /// Read a length-prefixed opaque byte block.
    pub fn read_bytes(&mut self) -> Result<&'a [u8], SurfaceError> {
        let len = self.read_u32()? as usize;
        self.take(len)
    }

    /// Read a `u64` scalar.
    pub fn read_u64(&mut self) -> Result<u64, SurfaceError> {
        // take() returned exactly 8 bytes
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    /// Number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_roundtrip() {
        let mut writer = ByteWriter::new();
        writer.write_string("surface 🪟");
        writer.write_string("");
        let bytes = writer.into_vec();

        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.read_string().unwrap(), "surface 🪟");
        assert_eq!(reader.read_string().unwrap(), "");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn scalar_and_block_roundtrip() {
        let mut writer = ByteWriter::new();
        writer.write_u64(0xdead_beef_cafe);
        writer.write_bytes(&[1, 2, 3]);
        let bytes = writer.into_vec();

        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.read_u64().unwrap(), 0xdead_beef_cafe);
        assert_eq!(reader.read_bytes().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn truncated_stream() {
        let mut writer = ByteWriter::new();
        writer.write_string("truncate me");
        let bytes = writer.into_vec();

        let mut reader = ByteReader::new(&bytes[..bytes.len() - 1]);
        assert!(matches!(
            reader.read_string(),
            Err(SurfaceError::Decode(_))
        ));

        let mut reader = ByteReader::new(&[0xff; 3]);
        assert!(matches!(reader.read_u64(), Err(SurfaceError::Decode(_))));
    }

    #[test]
    fn invalid_utf8() {
        let mut writer = ByteWriter::new();
        writer.write_bytes(&[0xff, 0xfe]);
        let bytes = writer.into_vec();

        let mut reader = ByteReader::new(&bytes);
        assert!(matches!(
            reader.read_string(),
            Err(SurfaceError::Decode(_))
        ));
    }
}
