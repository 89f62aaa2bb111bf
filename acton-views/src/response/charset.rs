//! Output character encodings
//!
//! Templates always render UTF-8 text. [`TranscodingWriter`] converts that
//! stream into the character encoding a view asks for on its way to the
//! response body.

use std::io::{self, Write};

/// Character encodings the response body can be written in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Charset {
    /// UTF-8
    Utf8,
    /// UTF-16, big-endian with a byte order mark
    Utf16,
    /// UTF-16 big-endian, no byte order mark
    Utf16Be,
    /// UTF-16 little-endian, no byte order mark
    Utf16Le,
    /// ISO-8859-1
    Latin1,
    /// 7-bit US-ASCII
    Ascii,
}

impl Charset {
    /// Look up an encoding by its IANA name or a common alias, ignoring case
    ///
    /// ```rust
    /// use acton_views::Charset;
    ///
    /// assert_eq!(Charset::from_label("utf-8"), Some(Charset::Utf8));
    /// assert_eq!(Charset::from_label("ISO-8859-1"), Some(Charset::Latin1));
    /// assert_eq!(Charset::from_label("klingon"), None);
    /// ```
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_lowercase();
        let charset = match label.as_str() {
            "utf-8" | "utf8" => Self::Utf8,
            "utf-16" | "utf16" => Self::Utf16,
            "utf-16be" | "utf16be" => Self::Utf16Be,
            "utf-16le" | "utf16le" => Self::Utf16Le,
            "iso-8859-1" | "iso8859-1" | "iso_8859_1" | "latin1" | "l1" => Self::Latin1,
            "us-ascii" | "ascii" => Self::Ascii,
            _ => return None,
        };
        Some(charset)
    }

    fn encode_into(self, text: &str, out: &mut Vec<u8>) {
        match self {
            Self::Utf8 => out.extend_from_slice(text.as_bytes()),
            Self::Utf16 | Self::Utf16Be => {
                out.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
            }
            Self::Utf16Le => out.extend(text.encode_utf16().flat_map(u16::to_le_bytes)),
            Self::Latin1 => out.extend(text.chars().map(|c| u8::try_from(c).unwrap_or(b'?'))),
            Self::Ascii => out.extend(
                text.chars()
                    .map(|c| u8::try_from(c).ok().filter(u8::is_ascii).unwrap_or(b'?')),
            ),
        }
    }
}

/// Writer that re-encodes a UTF-8 byte stream into another [`Charset`]
///
/// Multi-byte sequences split across `write` calls are held back until they
/// are complete. Call [`finish`](Self::finish) once all output is written to
/// detect a truncated trailing sequence.
pub struct TranscodingWriter<W: Write> {
    inner: W,
    charset: Charset,
    pending: Vec<u8>,
    started: bool,
}

impl<W: Write> TranscodingWriter<W> {
    /// Wrap `inner`, encoding everything written into `charset`
    pub const fn new(inner: W, charset: Charset) -> Self {
        Self {
            inner,
            charset,
            pending: Vec::new(),
            started: false,
        }
    }

    /// Flush and check that no incomplete UTF-8 sequence is left over
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::InvalidData`] if the input ended mid-character,
    /// or any error from the inner writer.
    pub fn finish(mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            return Err(invalid_utf8());
        }
        self.inner.flush()
    }

    fn emit(&mut self, text: &str) -> io::Result<()> {
        if self.charset == Charset::Utf8 {
            return self.inner.write_all(text.as_bytes());
        }
        let mut encoded = Vec::with_capacity(text.len() * 2 + 2);
        if !self.started && self.charset == Charset::Utf16 {
            encoded.extend_from_slice(&[0xFE, 0xFF]);
        }
        self.started = true;
        self.charset.encode_into(text, &mut encoded);
        self.inner.write_all(&encoded)
    }
}

impl<W: Write> Write for TranscodingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        let (valid_up_to, invalid) = match std::str::from_utf8(&self.pending) {
            Ok(_) => (self.pending.len(), false),
            Err(err) => (err.valid_up_to(), err.error_len().is_some()),
        };
        if invalid {
            self.pending.clear();
            return Err(invalid_utf8());
        }
        let rest = self.pending.split_off(valid_up_to);
        let complete = std::mem::replace(&mut self.pending, rest);
        let text = String::from_utf8(complete).map_err(|_| invalid_utf8())?;
        self.emit(&text)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn invalid_utf8() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, "rendered output is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(charset: Charset, chunks: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut writer = TranscodingWriter::new(&mut out, charset);
        for chunk in chunks {
            writer.write_all(chunk).unwrap();
        }
        writer.finish().unwrap();
        out
    }

    #[test]
    fn test_utf8_passes_through() {
        assert_eq!(encode(Charset::Utf8, &["héllo".as_bytes()]), "héllo".as_bytes());
    }

    #[test]
    fn test_utf16_writes_bom_once() {
        let out = encode(Charset::Utf16, &[b"A", b"B"]);
        assert_eq!(out, vec![0xFE, 0xFF, 0x00, b'A', 0x00, b'B']);
    }

    #[test]
    fn test_utf16le_has_no_bom() {
        assert_eq!(encode(Charset::Utf16Le, &[b"A"]), vec![b'A', 0x00]);
    }

    #[test]
    fn test_split_multibyte_sequence_is_reassembled() {
        let bytes = "é".as_bytes();
        let out = encode(Charset::Latin1, &[&bytes[..1], &bytes[1..]]);
        assert_eq!(out, vec![0xE9]);
    }

    #[test]
    fn test_unmappable_characters_become_question_marks() {
        assert_eq!(encode(Charset::Ascii, &["naïve".as_bytes()]), b"na?ve");
        assert_eq!(encode(Charset::Latin1, &["€1".as_bytes()]), b"?1");
    }

    #[test]
    fn test_truncated_sequence_fails_on_finish() {
        let mut out = Vec::new();
        let mut writer = TranscodingWriter::new(&mut out, Charset::Latin1);
        writer.write_all(&"é".as_bytes()[..1]).unwrap();
        let err = writer.finish().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_invalid_bytes_fail_immediately() {
        let mut out = Vec::new();
        let mut writer = TranscodingWriter::new(&mut out, Charset::Utf16);
        assert!(writer.write_all(&[0xFF, b'a']).is_err());
    }

    #[test]
    fn test_labels_are_case_insensitive() {
        assert_eq!(Charset::from_label("UTF-16"), Some(Charset::Utf16));
        assert_eq!(Charset::from_label(" Latin1 "), Some(Charset::Latin1));
        assert_eq!(Charset::from_label("US-ASCII"), Some(Charset::Ascii));
    }
}
