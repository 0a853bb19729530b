//! Little-endian cursor helpers shared by every codec in the crate

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Result, Seek, SeekFrom, Write};

/// Extension trait for reading little-endian values from a reader
pub trait ReadExt: Read {
    fn read_u8(&mut self) -> Result<u8> {
        ReadBytesExt::read_u8(self)
    }

    fn read_i8(&mut self) -> Result<i8> {
        ReadBytesExt::read_i8(self)
    }

    fn read_u16_le(&mut self) -> Result<u16> {
        self.read_u16::<LittleEndian>()
    }

    fn read_i16_le(&mut self) -> Result<i16> {
        self.read_i16::<LittleEndian>()
    }

    fn read_u32_le(&mut self) -> Result<u32> {
        self.read_u32::<LittleEndian>()
    }

    fn read_i32_le(&mut self) -> Result<i32> {
        self.read_i32::<LittleEndian>()
    }

    fn read_f32_le(&mut self) -> Result<f32> {
        self.read_f32::<LittleEndian>()
    }

    fn read_magic(&mut self) -> Result<[u8; 4]> {
        let mut magic = [0u8; 4];
        self.read_exact(&mut magic)?;
        Ok(magic)
    }
}

/// Extension trait for writing little-endian values to a writer
pub trait WriteExt: Write {
    fn write_u8(&mut self, n: u8) -> Result<()> {
        WriteBytesExt::write_u8(self, n)
    }

    fn write_i8(&mut self, n: i8) -> Result<()> {
        WriteBytesExt::write_i8(self, n)
    }

    fn write_u16_le(&mut self, n: u16) -> Result<()> {
        self.write_u16::<LittleEndian>(n)
    }

    fn write_i16_le(&mut self, n: i16) -> Result<()> {
        self.write_i16::<LittleEndian>(n)
    }

    fn write_u32_le(&mut self, n: u32) -> Result<()> {
        self.write_u32::<LittleEndian>(n)
    }

    fn write_i32_le(&mut self, n: i32) -> Result<()> {
        self.write_i32::<LittleEndian>(n)
    }

    fn write_f32_le(&mut self, n: f32) -> Result<()> {
        self.write_f32::<LittleEndian>(n)
    }
}

impl<R: Read + ?Sized> ReadExt for R {}
impl<W: Write + ?Sized> WriteExt for W {}

/// Length of a seekable stream, leaving the position untouched
pub fn stream_len<S: Seek + ?Sized>(stream: &mut S) -> Result<u64> {
    let position = stream.stream_position()?;
    let len = stream.seek(SeekFrom::End(0))?;
    if position != len {
        stream.seek(SeekFrom::Start(position))?;
    }
    Ok(len)
}

/// Object-safe reader used for side files handed out by collaborators
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// Object-safe writer used for side files handed out by collaborators
pub trait WriteSeek: Write + Seek {}
impl<T: Write + Seek + ?Sized> WriteSeek for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_little_endian_reads() {
        let data = [
            0x01, // u8
            0x34, 0x12, // u16 = 0x1234
            0xFF, 0xFF, // i16 = -1
            0x78, 0x56, 0x34, 0x12, // u32 = 0x12345678
            0x00, 0x00, 0x80, 0x3F, // f32 = 1.0
        ];
        let mut cursor = Cursor::new(data);

        assert_eq!(ReadExt::read_u8(&mut cursor).unwrap(), 1);
        assert_eq!(cursor.read_u16_le().unwrap(), 0x1234);
        assert_eq!(cursor.read_i16_le().unwrap(), -1);
        assert_eq!(cursor.read_u32_le().unwrap(), 0x1234_5678);
        assert_eq!(cursor.read_f32_le().unwrap(), 1.0);
    }

    #[test]
    fn test_writes_match_reads() {
        let mut cursor = Cursor::new(Vec::new());
        cursor.write_i32_le(-2).unwrap();
        cursor.write_f32_le(0.5).unwrap();

        cursor.set_position(0);
        assert_eq!(cursor.read_i32_le().unwrap(), -2);
        assert_eq!(cursor.read_f32_le().unwrap(), 0.5);
    }

    #[test]
    fn test_stream_len_keeps_position() {
        let mut cursor = Cursor::new(vec![0u8; 10]);
        cursor.set_position(3);
        assert_eq!(stream_len(&mut cursor).unwrap(), 10);
        assert_eq!(cursor.position(), 3);
    }
}
