//! Bounds-checked cursor over an in-memory system file.

use crate::error::{Result, SavError};

/// Byte order of a system file, detected from the header layout code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

impl Endian {
    /// Decode an 8-byte slot as a float.
    #[must_use]
    pub fn read_f64(self, bytes: [u8; 8]) -> f64 {
        match self {
            Self::Little => f64::from_le_bytes(bytes),
            Self::Big => f64::from_be_bytes(bytes),
        }
    }

    pub(crate) fn read_i32(self, bytes: [u8; 4]) -> i32 {
        match self {
            Self::Little => i32::from_le_bytes(bytes),
            Self::Big => i32::from_be_bytes(bytes),
        }
    }

    pub(crate) fn write_f64(self, value: f64) -> [u8; 8] {
        match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        }
    }
}

pub(crate) struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    endian: Endian,
}

impl<'a> ByteCursor<'a> {
    pub(crate) fn at(data: &'a [u8], pos: usize, endian: Endian) -> Self {
        Self { data, pos, endian }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(SavError::Truncated {
                offset: self.pos,
                needed: len,
                available: self.remaining(),
            })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub(crate) fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    pub(crate) fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn i32(&mut self) -> Result<i32> {
        let bytes = self.array::<4>()?;
        Ok(self.endian.read_i32(bytes))
    }

    pub(crate) fn i64(&mut self) -> Result<i64> {
        let bytes = self.array::<8>()?;
        Ok(match self.endian {
            Endian::Little => i64::from_le_bytes(bytes),
            Endian::Big => i64::from_be_bytes(bytes),
        })
    }

    pub(crate) fn f64(&mut self) -> Result<f64> {
        let bytes = self.array::<8>()?;
        Ok(self.endian.read_f64(bytes))
    }

    /// Read a count field that must be non-negative.
    pub(crate) fn count(&mut self, record: &'static str) -> Result<usize> {
        let offset = self.pos;
        let value = self.i32()?;
        usize::try_from(value).map_err(|_| {
            SavError::invalid_record(record, offset, format!("negative count {value}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_past_end_is_truncated() {
        let data = [1u8, 2, 3];
        let mut cursor = ByteCursor::at(&data, 1, Endian::Little);
        let err = cursor.take(4).unwrap_err();
        assert!(matches!(
            err,
            SavError::Truncated {
                offset: 1,
                needed: 4,
                available: 2
            }
        ));
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_endian_aware_integers() {
        let data = [0u8, 0, 0, 2, 2, 0, 0, 0];
        let mut big = ByteCursor::at(&data, 0, Endian::Big);
        assert_eq!(big.i32().unwrap(), 2);
        let mut little = ByteCursor::at(&data, 4, Endian::Little);
        assert_eq!(little.i32().unwrap(), 2);
        assert!(little.is_at_end());
    }

    #[test]
    fn test_negative_count_rejected() {
        let data = (-1i32).to_le_bytes();
        let mut cursor = ByteCursor::at(&data, 0, Endian::Little);
        assert!(matches!(
            cursor.count("value label"),
            Err(SavError::InvalidRecord { .. })
        ));
    }
}
