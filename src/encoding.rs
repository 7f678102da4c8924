use crate::{data::windows_1252_byte, data::WINDOWS_1252, util::le_u64};
use std::borrow::Cow;

/// Decodes record keys according to the windows1252 code page
///
/// ```
/// use vaultsave::Windows1252Encoding;
///
/// assert_eq!(Windows1252Encoding::decode(b"baseName"), "baseName");
/// assert_eq!(Windows1252Encoding::decode(b"\xa7Hunter"), "§Hunter");
/// assert_eq!(Windows1252Encoding::decode(b"\x8a"), "Š");
/// assert_eq!(Windows1252Encoding::decode(b"hi\x81\x8a"), "hi\u{81}Š");
/// ```
#[derive(Debug, Default, Copy, Clone)]
pub struct Windows1252Encoding;

impl Windows1252Encoding {
    /// Creates a new windows 1252 decoder
    pub fn new() -> Self {
        Windows1252Encoding
    }

    /// Static method for decoding windows 1252 data
    pub fn decode(data: &[u8]) -> Cow<str> {
        decode_windows1252(data)
    }

    /// Encodes text into windows 1252, returning `None` when a character has
    /// no representation in the code page
    ///
    /// ```
    /// use vaultsave::Windows1252Encoding;
    ///
    /// assert_eq!(Windows1252Encoding::encode("§Hunter").as_deref(), Some(&b"\xa7Hunter"[..]));
    /// assert_eq!(Windows1252Encoding::encode("\u{3042}"), None);
    /// ```
    pub fn encode(text: &str) -> Option<Cow<[u8]>> {
        if text.is_ascii() {
            return Some(Cow::Borrowed(text.as_bytes()));
        }

        text.chars()
            .map(windows_1252_byte)
            .collect::<Option<Vec<u8>>>()
            .map(Cow::Owned)
    }
}

#[inline]
pub(crate) fn decode_windows1252(d: &[u8]) -> Cow<str> {
    // Iterate through the data in 8 byte chunks and ensure that each chunk
    // is ascii before falling back to the table
    let mut chunk_iter = d.chunks_exact(8);
    let mut offset = 0;
    for n in &mut chunk_iter {
        let wide = le_u64(n);
        if wide & 0x8080_8080_8080_8080 != 0 {
            return Cow::Owned(windows_1252_create(d, offset));
        }

        offset += 8;
    }

    let remainder = chunk_iter.remainder();
    for &byte in remainder {
        if !byte.is_ascii() {
            return Cow::Owned(windows_1252_create(d, offset));
        }

        offset += 1;
    }

    match std::str::from_utf8(d) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => Cow::Owned(windows_1252_create(d, 0)),
    }
}

fn windows_1252_create(d: &[u8], offset: usize) -> String {
    let (upto, rest) = d.split_at(offset);

    // size estimate: all remaining characters need translation
    let size_estimate = offset + (d.len() - offset) * 2;
    let mut result = String::with_capacity(size_estimate);
    result.extend(upto.iter().map(|&c| c as char));
    result.extend(rest.iter().map(|&c| WINDOWS_1252[usize::from(c)]));
    result
}
