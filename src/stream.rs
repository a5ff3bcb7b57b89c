use std::fs::File;
use std::io::Read;
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::crc::CrcCalculator;
use crate::error::{FitError, Result};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// Random-access byte source over a fully loaded FIT file.
///
/// When a CRC calculator is attached, every read (but no peek or slice)
/// feeds the consumed bytes into it; the record walker uses this to keep a
/// running checksum of each sub-file.
#[derive(Debug)]
pub struct Stream {
    data: Vec<u8>,
    position: usize,
    crc_calculator: Option<CrcCalculator>,
}

impl Stream {
    pub fn from_bytes(data: Vec<u8>) -> Stream {
        Stream {
            data,
            position: 0,
            crc_calculator: None,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Stream> {
        let mut data = Vec::new();
        File::open(path)?.read_to_end(&mut data)?;
        Ok(Stream::from_bytes(data))
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn seek(&mut self, position: usize) {
        self.position = position;
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }

    pub fn peek_byte(&self) -> Result<u8> {
        self.data
            .get(self.position)
            .copied()
            .ok_or(FitError::EndOfStream {
                needed: 1,
                remaining: 0,
            })
    }

    pub fn peek_bytes(&self, num_bytes: usize) -> Result<&[u8]> {
        self.check_remaining(num_bytes)?;
        Ok(&self.data[self.position..self.position + num_bytes])
    }

    /// Bytes in `[start, end)` regardless of the current position, which is
    /// left untouched. Does not feed the CRC tap.
    pub fn slice(&self, start: usize, end: usize) -> Result<&[u8]> {
        if end > self.data.len() || start > end {
            return Err(FitError::EndOfStream {
                needed: end.saturating_sub(start),
                remaining: self.data.len().saturating_sub(start),
            });
        }
        Ok(&self.data[start..end])
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_bytes(&mut self, num_bytes: usize) -> Result<Vec<u8>> {
        self.check_remaining(num_bytes)?;
        let bytes = self.data[self.position..self.position + num_bytes].to_vec();
        self.position += num_bytes;

        if let Some(crc_calculator) = self.crc_calculator.as_mut() {
            crc_calculator.add_bytes(&bytes, 0, bytes.len());
        }

        Ok(bytes)
    }

    pub fn read_u16(&mut self, endianness: Endianness) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(match endianness {
            Endianness::Little => LittleEndian::read_u16(&bytes),
            Endianness::Big => BigEndian::read_u16(&bytes),
        })
    }

    pub fn read_u32(&mut self, endianness: Endianness) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(match endianness {
            Endianness::Little => LittleEndian::read_u32(&bytes),
            Endianness::Big => BigEndian::read_u32(&bytes),
        })
    }

    /// Raw bytes of a fixed-length string field; NUL handling happens later.
    pub fn read_string(&mut self, length: usize) -> Result<Vec<u8>> {
        self.read_bytes(length)
    }

    pub fn set_crc_calculator(&mut self, crc_calculator: Option<CrcCalculator>) {
        self.crc_calculator = crc_calculator;
    }

    pub fn take_crc_calculator(&mut self) -> Option<CrcCalculator> {
        self.crc_calculator.take()
    }

    fn check_remaining(&self, needed: usize) -> Result<()> {
        let remaining = self.data.len().saturating_sub(self.position);
        if needed > remaining {
            return Err(FitError::EndOfStream { needed, remaining });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream() -> Stream {
        Stream::from_bytes(vec![0x0E, 0x20, 0x8B])
    }

    #[test]
    fn peek_does_not_advance() {
        let mut s = stream();
        assert_eq!(s.peek_byte().unwrap(), 0x0E);
        assert_eq!(s.peek_byte().unwrap(), s.read_byte().unwrap());
        assert_eq!(s.position(), 1);
        assert_eq!(s.peek_byte().unwrap(), 0x20);
    }

    #[test]
    fn read_bytes_advances() {
        let mut s = stream();
        assert_eq!(s.read_bytes(2).unwrap(), vec![0x0E, 0x20]);
        assert_eq!(s.position(), 2);
        assert_eq!(s.read_bytes(1).unwrap(), vec![0x8B]);
    }

    #[test]
    fn slice_keeps_position() {
        let mut s = stream();
        s.seek(1);
        assert_eq!(s.slice(0, 2).unwrap(), &[0x0E, 0x20]);
        assert_eq!(s.position(), 1);
        assert_eq!(s.slice(0, 3).unwrap(), &[0x0E, 0x20, 0x8B]);
    }

    #[test]
    fn over_read_is_end_of_stream() {
        let mut s = stream();
        s.seek(2);
        assert!(matches!(
            s.read_bytes(2),
            Err(FitError::EndOfStream {
                needed: 2,
                remaining: 1
            })
        ));
    }

    #[test]
    fn endian_integer_reads() {
        let mut s = Stream::from_bytes(vec![0x0D, 0x0C, 0x0B, 0x0A]);
        assert_eq!(s.read_u16(Endianness::Little).unwrap(), 0x0C0D);
        s.reset();
        assert_eq!(s.read_u16(Endianness::Big).unwrap(), 0x0D0C);
        s.reset();
        assert_eq!(s.read_u32(Endianness::Little).unwrap(), 0x0A0B0C0D);
    }

    #[test]
    fn crc_tap_sees_reads_but_not_peeks() {
        let mut s = stream();
        s.set_crc_calculator(Some(CrcCalculator::new()));
        s.peek_byte().unwrap();
        s.read_bytes(3).unwrap();
        let tapped = s.take_crc_calculator().unwrap();

        assert_eq!(
            tapped.current(),
            CrcCalculator::calculate(&[0x0E, 0x20, 0x8B], 0, 3)
        );
    }
}
