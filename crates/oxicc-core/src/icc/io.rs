//! Position-tracked big-endian byte I/O
//!
//! Every structure in a profile is read through [`IccReader`] and written
//! through [`IccWriter`]. Both sit on top of any seekable byte source or sink
//! (files, `Cursor<Vec<u8>>`, `Cursor<&[u8]>`), keep their own position, and
//! refuse to read past the end of the source instead of zero-filling.

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use super::error::IccError;
use super::types::{DateTimeNumber, S15Fixed16, U8Fixed8, U16Fixed16, XyzNumber};

/// Seekable byte source
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// Seekable byte sink
pub trait WriteSeek: Write + Seek {}
impl<T: Write + Seek + ?Sized> WriteSeek for T {}

/// Typed big-endian reader over a seekable source
pub struct IccReader<'a> {
    inner: &'a mut dyn ReadSeek,
    pos: u64,
    len: u64,
}

impl<'a> IccReader<'a> {
    /// Wrap a source, starting at its current position
    pub fn new(inner: &'a mut dyn ReadSeek) -> Result<Self, IccError> {
        let pos = inner.stream_position()?;
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(pos))?;
        Ok(Self { inner, pos, len })
    }

    /// Total length of the source in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current position
    pub fn tell(&self) -> u64 {
        self.pos
    }

    /// Bytes left between the position and the end of the source
    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.pos)
    }

    /// Move to an absolute position; positions past the end are rejected
    pub fn seek(&mut self, pos: u64) -> Result<(), IccError> {
        if pos > self.len {
            return Err(IccError::Truncated {
                needed: (pos - self.pos.min(pos)) as usize,
                available: self.remaining() as usize,
            });
        }
        self.inner.seek(SeekFrom::Start(pos))?;
        self.pos = pos;
        Ok(())
    }

    /// Skip `n` bytes forward
    pub fn skip(&mut self, n: u64) -> Result<(), IccError> {
        self.ensure(n)?;
        self.seek(self.pos + n)
    }

    fn ensure(&self, n: u64) -> Result<(), IccError> {
        if n > self.remaining() {
            return Err(IccError::Truncated {
                needed: n as usize,
                available: self.remaining() as usize,
            });
        }
        Ok(())
    }

    fn advance(&mut self, n: u64) {
        self.pos += n;
    }

    pub fn read_u8(&mut self) -> Result<u8, IccError> {
        self.ensure(1)?;
        let v = self.inner.read_u8()?;
        self.advance(1);
        Ok(v)
    }

    pub fn read_u16(&mut self) -> Result<u16, IccError> {
        self.ensure(2)?;
        let v = self.inner.read_u16::<BigEndian>()?;
        self.advance(2);
        Ok(v)
    }

    pub fn read_u32(&mut self) -> Result<u32, IccError> {
        self.ensure(4)?;
        let v = self.inner.read_u32::<BigEndian>()?;
        self.advance(4);
        Ok(v)
    }

    pub fn read_u64(&mut self) -> Result<u64, IccError> {
        self.ensure(8)?;
        let v = self.inner.read_u64::<BigEndian>()?;
        self.advance(8);
        Ok(v)
    }

    pub fn read_i32(&mut self) -> Result<i32, IccError> {
        self.ensure(4)?;
        let v = self.inner.read_i32::<BigEndian>()?;
        self.advance(4);
        Ok(v)
    }

    pub fn read_f32(&mut self) -> Result<f32, IccError> {
        self.ensure(4)?;
        let v = self.inner.read_f32::<BigEndian>()?;
        self.advance(4);
        Ok(v)
    }

    /// Read a 4-byte signature
    pub fn read_sig(&mut self) -> Result<u32, IccError> {
        self.read_u32()
    }

    pub fn read_s15f16(&mut self) -> Result<S15Fixed16, IccError> {
        Ok(S15Fixed16(self.read_i32()?))
    }

    pub fn read_u16f16(&mut self) -> Result<U16Fixed16, IccError> {
        Ok(U16Fixed16(self.read_u32()?))
    }

    pub fn read_u8f8(&mut self) -> Result<U8Fixed8, IccError> {
        Ok(U8Fixed8(self.read_u16()?))
    }

    pub fn read_xyz(&mut self) -> Result<XyzNumber, IccError> {
        Ok(XyzNumber {
            x: self.read_s15f16()?,
            y: self.read_s15f16()?,
            z: self.read_s15f16()?,
        })
    }

    pub fn read_datetime(&mut self) -> Result<DateTimeNumber, IccError> {
        Ok(DateTimeNumber {
            year: self.read_u16()?,
            month: self.read_u16()?,
            day: self.read_u16()?,
            hour: self.read_u16()?,
            minute: self.read_u16()?,
            second: self.read_u16()?,
        })
    }

    /// Read exactly `n` raw bytes
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, IccError> {
        self.ensure(n as u64)?;
        let mut buf = vec![0u8; n];
        self.inner.read_exact(&mut buf)?;
        self.advance(n as u64);
        Ok(buf)
    }

    /// Fill a fixed-size array
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], IccError> {
        self.ensure(N as u64)?;
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf)?;
        self.advance(N as u64);
        Ok(buf)
    }

    /// Read `count` big-endian u16 values
    pub fn read_u16_vec(&mut self, count: usize) -> Result<Vec<u16>, IccError> {
        let bytes = count
            .checked_mul(2)
            .ok_or_else(|| IccError::CorruptedData(format!("u16 array of {} entries", count)))?;
        self.ensure(bytes as u64)?;
        let mut out = vec![0u16; count];
        self.inner.read_u16_into::<BigEndian>(&mut out)?;
        self.advance(bytes as u64);
        Ok(out)
    }

    /// Read `count` big-endian float32 values
    pub fn read_f32_vec(&mut self, count: usize) -> Result<Vec<f32>, IccError> {
        let bytes = count
            .checked_mul(4)
            .ok_or_else(|| IccError::CorruptedData(format!("f32 array of {} entries", count)))?;
        self.ensure(bytes as u64)?;
        let mut out = vec![0f32; count];
        self.inner.read_f32_into::<BigEndian>(&mut out)?;
        self.advance(bytes as u64);
        Ok(out)
    }
}

/// Typed big-endian writer over a seekable sink
pub struct IccWriter<'a> {
    inner: &'a mut dyn WriteSeek,
    pos: u64,
}

impl<'a> IccWriter<'a> {
    /// Wrap a sink, starting at its current position
    pub fn new(inner: &'a mut dyn WriteSeek) -> Result<Self, IccError> {
        let pos = inner.stream_position()?;
        Ok(Self { inner, pos })
    }

    /// Current position
    pub fn tell(&self) -> u64 {
        self.pos
    }

    pub fn seek(&mut self, pos: u64) -> Result<(), IccError> {
        self.inner.seek(SeekFrom::Start(pos))?;
        self.pos = pos;
        Ok(())
    }

    pub fn write_u8(&mut self, v: u8) -> Result<(), IccError> {
        self.inner.write_u8(v)?;
        self.pos += 1;
        Ok(())
    }

    pub fn write_u16(&mut self, v: u16) -> Result<(), IccError> {
        self.inner.write_u16::<BigEndian>(v)?;
        self.pos += 2;
        Ok(())
    }

    pub fn write_u32(&mut self, v: u32) -> Result<(), IccError> {
        self.inner.write_u32::<BigEndian>(v)?;
        self.pos += 4;
        Ok(())
    }

    pub fn write_u64(&mut self, v: u64) -> Result<(), IccError> {
        self.inner.write_u64::<BigEndian>(v)?;
        self.pos += 8;
        Ok(())
    }

    pub fn write_i32(&mut self, v: i32) -> Result<(), IccError> {
        self.inner.write_i32::<BigEndian>(v)?;
        self.pos += 4;
        Ok(())
    }

    pub fn write_f32(&mut self, v: f32) -> Result<(), IccError> {
        self.inner.write_f32::<BigEndian>(v)?;
        self.pos += 4;
        Ok(())
    }

    pub fn write_sig(&mut self, sig: u32) -> Result<(), IccError> {
        self.write_u32(sig)
    }

    pub fn write_s15f16(&mut self, v: S15Fixed16) -> Result<(), IccError> {
        self.write_i32(v.0)
    }

    pub fn write_u16f16(&mut self, v: U16Fixed16) -> Result<(), IccError> {
        self.write_u32(v.0)
    }

    pub fn write_u8f8(&mut self, v: U8Fixed8) -> Result<(), IccError> {
        self.write_u16(v.0)
    }

    pub fn write_xyz(&mut self, v: &XyzNumber) -> Result<(), IccError> {
        self.write_s15f16(v.x)?;
        self.write_s15f16(v.y)?;
        self.write_s15f16(v.z)
    }

    pub fn write_datetime(&mut self, v: &DateTimeNumber) -> Result<(), IccError> {
        for field in [v.year, v.month, v.day, v.hour, v.minute, v.second] {
            self.write_u16(field)?;
        }
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), IccError> {
        self.inner.write_all(bytes)?;
        self.pos += bytes.len() as u64;
        Ok(())
    }

    pub fn write_u16_slice(&mut self, values: &[u16]) -> Result<(), IccError> {
        for &v in values {
            self.write_u16(v)?;
        }
        Ok(())
    }

    pub fn write_f32_slice(&mut self, values: &[f32]) -> Result<(), IccError> {
        for &v in values {
            self.write_f32(v)?;
        }
        Ok(())
    }

    /// Zero-pad up to the next multiple of `alignment`; returns the pad length
    pub fn align(&mut self, alignment: u64) -> Result<u64, IccError> {
        let pad = (alignment - self.pos % alignment) % alignment;
        for _ in 0..pad {
            self.write_u8(0)?;
        }
        Ok(pad)
    }

    /// Overwrite a u32 at `at` and return to the current position
    pub fn patch_u32(&mut self, at: u64, v: u32) -> Result<(), IccError> {
        let here = self.pos;
        self.seek(at)?;
        self.write_u32(v)?;
        self.seek(here)
    }

    pub fn flush(&mut self) -> Result<(), IccError> {
        self.inner.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_read_primitives() {
        let data = [
            0x12, 0x34, // u16
            0xDE, 0xAD, 0xBE, 0xEF, // u32
            0xFF, 0xFF, 0x80, 0x00, // s15Fixed16 = -0.5
        ];
        let mut cur = Cursor::new(&data[..]);
        let mut rd = IccReader::new(&mut cur).unwrap();

        assert_eq!(rd.len(), 10);
        assert_eq!(rd.read_u16().unwrap(), 0x1234);
        assert_eq!(rd.read_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(rd.read_s15f16().unwrap().to_f64(), -0.5);
        assert_eq!(rd.tell(), 10);
        assert_eq!(rd.remaining(), 0);
    }

    #[test]
    fn test_read_past_end_fails() {
        let data = [0u8; 3];
        let mut cur = Cursor::new(&data[..]);
        let mut rd = IccReader::new(&mut cur).unwrap();

        let err = rd.read_u32().unwrap_err();
        assert_eq!(
            err,
            IccError::Truncated {
                needed: 4,
                available: 3
            }
        );
        // Position is untouched by the failed read
        assert_eq!(rd.tell(), 0);
        assert!(rd.read_u16_vec(2).is_err());
        assert!(rd.read_bytes(4).is_err());
    }

    #[test]
    fn test_writer_align_and_patch() {
        let mut cur = Cursor::new(Vec::new());
        {
            let mut wr = IccWriter::new(&mut cur).unwrap();
            wr.write_u32(0).unwrap();
            wr.write_u8(7).unwrap();
            assert_eq!(wr.align(4).unwrap(), 3);
            assert_eq!(wr.tell(), 8);
            wr.patch_u32(0, 0xCAFE_F00D).unwrap();
            assert_eq!(wr.tell(), 8);
            wr.write_u16(1).unwrap();
        }
        assert_eq!(
            cur.into_inner(),
            vec![0xCA, 0xFE, 0xF0, 0x0D, 7, 0, 0, 0, 0, 1]
        );
    }

    #[test]
    fn test_xyz_and_date_roundtrip() {
        let xyz = XyzNumber {
            x: S15Fixed16(0xF6D6),
            y: S15Fixed16(0x1_0000),
            z: S15Fixed16(0xD32D),
        };
        let date = DateTimeNumber::from_unix_seconds(1_000_000_000);

        let mut cur = Cursor::new(Vec::new());
        {
            let mut wr = IccWriter::new(&mut cur).unwrap();
            wr.write_xyz(&xyz).unwrap();
            wr.write_datetime(&date).unwrap();
        }
        cur.set_position(0);
        let mut rd = IccReader::new(&mut cur).unwrap();
        assert_eq!(rd.read_xyz().unwrap(), xyz);
        assert_eq!(rd.read_datetime().unwrap(), date);
    }
}
