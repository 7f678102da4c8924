use crate::{util::get_split, Error, ErrorKind};

/// Bounds checked sequential reader over an in-memory buffer
///
/// Positions are absolute: a reader split off for a block payload reports
/// offsets relative to the start of the file, so errors point at the right
/// place.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    original_length: usize,
    base: usize,
}

impl<'a> ByteReader<'a> {
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_base(data, 0)
    }

    #[inline]
    fn with_base(data: &'a [u8], base: usize) -> Self {
        Self {
            data,
            original_length: data.len(),
            base,
        }
    }

    /// Returns the absolute offset of the next byte to be read
    #[inline]
    pub fn position(&self) -> usize {
        self.base + self.original_length - self.data.len()
    }

    #[inline]
    pub fn remainder(&self) -> &'a [u8] {
        self.data
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    fn truncated(&self, needed: usize) -> Error {
        Error::new(ErrorKind::TruncatedInput {
            offset: self.position(),
            needed,
        })
    }

    #[inline]
    fn take<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let (head, rest) = get_split::<N>(self.data).ok_or_else(|| self.truncated(N))?;
        self.data = rest;
        Ok(head)
    }

    /// Look at the next four bytes without consuming them
    #[inline]
    pub fn peek_u32(&self) -> Option<u32> {
        get_split::<4>(self.data).map(|(head, _)| u32::from_le_bytes(head))
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        self.take::<1>().map(|x| x[0])
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32, Error> {
        self.take::<4>().map(u32::from_le_bytes)
    }

    #[inline]
    pub fn read_i32(&mut self) -> Result<i32, Error> {
        self.take::<4>().map(i32::from_le_bytes)
    }

    #[inline]
    pub fn read_i64(&mut self) -> Result<i64, Error> {
        self.take::<8>().map(i64::from_le_bytes)
    }

    #[inline]
    pub fn read_f32(&mut self) -> Result<f32, Error> {
        self.take::<4>().map(f32::from_le_bytes)
    }

    #[inline]
    pub fn read_f64(&mut self) -> Result<f64, Error> {
        self.take::<8>().map(f64::from_le_bytes)
    }

    /// Reads a single byte, nonzero is true
    #[inline]
    pub fn read_bool(&mut self) -> Result<bool, Error> {
        self.read_u8().map(|x| x != 0)
    }

    #[inline]
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], Error> {
        if n > self.data.len() {
            return Err(self.truncated(n));
        }

        let (head, rest) = self.data.split_at(n);
        self.data = rest;
        Ok(head)
    }

    /// Reads a u32 byte count followed by that many bytes
    #[inline]
    pub fn read_prefixed_bytes(&mut self) -> Result<&'a [u8], Error> {
        let len = self.read_u32()?;
        self.read_bytes(len as usize)
    }

    /// Reads a u32 count of UTF-16 code units followed by the little endian
    /// units themselves
    pub fn read_utf16(&mut self) -> Result<Vec<u16>, Error> {
        let count = self.read_u32()? as usize;
        let byte_len = count
            .checked_mul(2)
            .ok_or_else(|| self.truncated(usize::MAX))?;
        let data = self.read_bytes(byte_len)?;
        Ok(data
            .chunks_exact(2)
            .map(|x| u16::from_le_bytes([x[0], x[1]]))
            .collect())
    }

    /// Splits off a reader over the next `n` bytes and advances past them
    pub fn split(&mut self, n: usize) -> Result<ByteReader<'a>, Error> {
        let base = self.position();
        let data = self.read_bytes(n)?;
        Ok(ByteReader::with_base(data, base))
    }
}

/// Growable writer whose position can be moved back to patch previously
/// written bytes (for instance a block length placeholder)
#[derive(Debug, Clone, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
    pos: usize,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ByteWriter {
            buf: Vec::with_capacity(capacity),
            pos: 0,
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Moves the write position. Subsequent writes overwrite existing bytes
    /// and grow the buffer once they pass its end.
    ///
    /// # Panics
    ///
    /// If the position lies beyond the bytes written so far
    pub fn seek(&mut self, pos: usize) {
        assert!(pos <= self.buf.len(), "seek past end of written data");
        self.pos = pos;
    }

    #[inline]
    pub fn write_bytes(&mut self, data: &[u8]) {
        let overlap = (self.buf.len() - self.pos).min(data.len());
        let (over, append) = data.split_at(overlap);
        self.buf[self.pos..self.pos + overlap].copy_from_slice(over);
        self.buf.extend_from_slice(append);
        self.pos += data.len();
    }

    #[inline]
    pub fn write_u8(&mut self, x: u8) {
        self.write_bytes(&[x])
    }

    #[inline]
    pub fn write_u32(&mut self, x: u32) {
        self.write_bytes(&x.to_le_bytes())
    }

    #[inline]
    pub fn write_i32(&mut self, x: i32) {
        self.write_bytes(&x.to_le_bytes())
    }

    #[inline]
    pub fn write_i64(&mut self, x: i64) {
        self.write_bytes(&x.to_le_bytes())
    }

    #[inline]
    pub fn write_f32(&mut self, x: f32) {
        self.write_bytes(&x.to_le_bytes())
    }

    #[inline]
    pub fn write_f64(&mut self, x: f64) {
        self.write_bytes(&x.to_le_bytes())
    }

    #[inline]
    pub fn write_bool(&mut self, x: bool) {
        self.write_u8(u8::from(x))
    }

    /// Writes a u32 byte count followed by the bytes
    pub fn write_prefixed_bytes(&mut self, data: &[u8]) {
        self.write_u32(data.len() as u32);
        self.write_bytes(data);
    }

    /// Writes a u32 code unit count followed by little endian UTF-16 units
    pub fn write_utf16(&mut self, units: &[u16]) {
        self.write_u32(units.len() as u32);
        for unit in units {
            self.write_bytes(&unit.to_le_bytes());
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}
