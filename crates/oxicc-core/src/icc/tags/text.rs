//! Text Tag Types
//!
//! ICC profiles can contain text in several formats:
//! - text: Simple ASCII text
//! - desc: Profile description (v2 format)
//! - mluc: Multi-localized Unicode (v4 format)
//!
//! See ICC.1:2022 Sections 10.24 (text), 10.14 (desc), 10.15 (mluc)

use crate::icc::error::IccError;
use crate::icc::io::{IccReader, IccWriter};

/// Read a `text` body of `size` bytes; stops at the first NUL
pub fn read_text(rd: &mut IccReader<'_>, size: usize) -> Result<String, IccError> {
    let bytes = rd.read_bytes(size)?;
    Ok(latin1_until_nul(&bytes))
}

/// Write a `text` body: the characters then a terminating NUL
pub fn write_text(wr: &mut IccWriter<'_>, text: &str) -> Result<(), IccError> {
    wr.write_bytes(&to_latin1(text))?;
    wr.write_u8(0)
}

/// Fixed-width NUL-padded ASCII field, as used by `ncl2` and `clrt`
pub(crate) fn read_fixed_ascii(rd: &mut IccReader<'_>, width: usize) -> Result<String, IccError> {
    let bytes = rd.read_bytes(width)?;
    Ok(latin1_until_nul(&bytes))
}

/// Write `text` into a NUL-padded field; the last byte is always NUL
pub(crate) fn write_fixed_ascii(
    wr: &mut IccWriter<'_>,
    text: &str,
    width: usize,
) -> Result<(), IccError> {
    let mut field = vec![0u8; width];
    let bytes = to_latin1(text);
    let n = bytes.len().min(width.saturating_sub(1));
    field[..n].copy_from_slice(&bytes[..n]);
    wr.write_bytes(&field)
}

fn latin1_until_nul(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| b as char)
        .collect()
}

fn to_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(c as u32).unwrap_or(b'?'))
        .collect()
}

/// Decode UTF-16BE code units, replacing invalid sequences
pub fn decode_utf16be(data: &[u8]) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Profile description (`desc`, ICC v2)
///
/// The Unicode and ScriptCode parts are kept as stored; many writers leave
/// them empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextDescriptionData {
    pub ascii: String,
    /// Stored bytes after the ASCII text: terminator and any padding the
    /// count covers. None writes a single NUL.
    pub ascii_tail: Option<Vec<u8>>,
    pub unicode_language: u32,
    /// UTF-16 code units including any terminator
    pub unicode: Vec<u16>,
    pub scriptcode_code: u16,
    /// ScriptCode bytes (at most 67)
    pub scriptcode: Vec<u8>,
}

impl TextDescriptionData {
    pub fn new(ascii: impl Into<String>) -> Self {
        Self {
            ascii: ascii.into(),
            ..Default::default()
        }
    }

    /// Read a `desc` body of `size` bytes
    ///
    /// Profiles that stop after the ASCII part are accepted; the remaining
    /// fields stay empty.
    pub fn read(rd: &mut IccReader<'_>, size: usize) -> Result<Self, IccError> {
        let end = rd.tell() + size as u64;
        let ascii_count = rd.read_u32()? as usize;
        let raw = rd.read_bytes(ascii_count)?;
        let ascii = latin1_until_nul(&raw);
        let mut desc = Self::new(ascii);
        desc.ascii_tail = Some(raw[desc.ascii.chars().count()..].to_vec());

        if end.saturating_sub(rd.tell()) >= 8 {
            desc.unicode_language = rd.read_u32()?;
            let unicode_count = rd.read_u32()? as usize;
            desc.unicode = rd.read_u16_vec(unicode_count)?;
        }
        if end.saturating_sub(rd.tell()) >= 3 {
            desc.scriptcode_code = rd.read_u16()?;
            let count = (rd.read_u8()? as usize).min(67);
            let available = end.saturating_sub(rd.tell()).min(67) as usize;
            let field = rd.read_bytes(available)?;
            desc.scriptcode = field[..count.min(field.len())].to_vec();
        }
        if rd.tell() < end {
            rd.seek(end)?;
        }
        Ok(desc)
    }

    pub fn write(&self, wr: &mut IccWriter<'_>) -> Result<(), IccError> {
        let ascii = to_latin1(&self.ascii);
        let tail = self.ascii_tail.as_deref().unwrap_or(&[0]);
        wr.write_u32((ascii.len() + tail.len()) as u32)?;
        wr.write_bytes(&ascii)?;
        wr.write_bytes(tail)?;

        wr.write_u32(self.unicode_language)?;
        wr.write_u32(self.unicode.len() as u32)?;
        wr.write_u16_slice(&self.unicode)?;

        let mut script = [0u8; 67];
        let n = self.scriptcode.len().min(67);
        script[..n].copy_from_slice(&self.scriptcode[..n]);
        wr.write_u16(self.scriptcode_code)?;
        wr.write_u8(n as u8)?;
        wr.write_bytes(&script)
    }

    /// Unicode text, if any was stored
    pub fn unicode_text(&self) -> Option<String> {
        let units: Vec<u16> = self.unicode.iter().copied().take_while(|&u| u != 0).collect();
        if units.is_empty() {
            None
        } else {
            Some(String::from_utf16_lossy(&units))
        }
    }
}

/// One localized string of an `mluc` tag
#[derive(Debug, Clone, PartialEq)]
pub struct MlucRecord {
    /// ISO 639-1 language code, e.g. `en`
    pub language: [u8; 2],
    /// ISO 3166-1 country code, e.g. `US`
    pub country: [u8; 2],
    pub text: String,
}

/// Multi-localized Unicode (`mluc`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MlucData {
    pub records: Vec<MlucRecord>,
}

impl MlucData {
    /// Single en/US record
    pub fn english(text: impl Into<String>) -> Self {
        Self {
            records: vec![MlucRecord {
                language: *b"en",
                country: *b"US",
                text: text.into(),
            }],
        }
    }

    /// Read an `mluc` body of `size` bytes
    ///
    /// String offsets are relative to the start of the tag, which sits 8 bytes
    /// before the reader's position.
    pub fn read(rd: &mut IccReader<'_>, size: usize) -> Result<Self, IccError> {
        let tag_start = rd.tell().saturating_sub(8);
        let end = rd.tell() + size as u64;
        let count = rd.read_u32()? as usize;
        let record_size = rd.read_u32()? as u64;
        if record_size < 12 {
            return Err(IccError::CorruptedData(format!(
                "mluc record size {}",
                record_size
            )));
        }
        if count as u64 * record_size > size as u64 {
            return Err(IccError::CorruptedData(format!(
                "mluc lists {} records in {} bytes",
                count, size
            )));
        }

        let table = rd.tell();
        let mut records = Vec::with_capacity(count);
        for i in 0..count as u64 {
            rd.seek(table + i * record_size)?;
            let language: [u8; 2] = rd.read_array()?;
            let country: [u8; 2] = rd.read_array()?;
            let len = rd.read_u32()? as u64;
            let offset = rd.read_u32()? as u64;

            rd.seek(tag_start + offset)?;
            if rd.tell() + len > end {
                return Err(IccError::CorruptedData(
                    "mluc string outside tag".to_string(),
                ));
            }
            let text = decode_utf16be(&rd.read_bytes(len as usize)?);
            records.push(MlucRecord {
                language,
                country,
                text,
            });
        }
        rd.seek(end)?;
        Ok(Self { records })
    }

    /// Write an `mluc` body; identical strings share storage
    pub fn write(&self, wr: &mut IccWriter<'_>) -> Result<(), IccError> {
        let tag_start = wr.tell().saturating_sub(8);
        wr.write_u32(self.records.len() as u32)?;
        wr.write_u32(12)?;

        let mut pool: Vec<(String, u32, u32)> = Vec::new();
        let mut next = 16 + 12 * self.records.len() as u32;
        let mut entries = Vec::with_capacity(self.records.len());
        for rec in &self.records {
            let len = rec.text.encode_utf16().count() as u32 * 2;
            let offset = match pool.iter().find(|(s, _, _)| *s == rec.text) {
                Some(&(_, off, _)) => off,
                None => {
                    pool.push((rec.text.clone(), next, len));
                    next += len;
                    next - len
                }
            };
            entries.push((rec, len, offset));
        }

        for (rec, len, offset) in entries {
            wr.write_bytes(&rec.language)?;
            wr.write_bytes(&rec.country)?;
            wr.write_u32(len)?;
            wr.write_u32(offset)?;
        }
        for (text, offset, _) in &pool {
            debug_assert_eq!(wr.tell(), tag_start + *offset as u64);
            let units: Vec<u16> = text.encode_utf16().collect();
            wr.write_u16_slice(&units)?;
        }
        Ok(())
    }

    /// Best-match lookup: exact language/country, then language, then first record
    pub fn get(&self, language: &str, country: &str) -> Option<&str> {
        let lang = language.as_bytes();
        let ctry = country.as_bytes();
        self.records
            .iter()
            .find(|r| r.language == lang && r.country == ctry)
            .or_else(|| self.records.iter().find(|r| r.language == lang))
            .or_else(|| self.records.first())
            .map(|r| r.text.as_str())
    }

    /// English text, falling back to the first record
    pub fn text(&self) -> Option<&str> {
        self.get("en", "US")
    }

    pub fn describe(&self) -> String {
        self.records
            .iter()
            .map(|r| {
                format!(
                    "{}{}: {}",
                    String::from_utf8_lossy(&r.language),
                    String::from_utf8_lossy(&r.country),
                    r.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
