//! Bounds-checked cursor over an in-memory dataset.

use crate::error::{DtaError, Result};

/// Byte order declared by the file (`HILO`/`MSF` or `LOHI`/`LSF`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    Big,
    #[default]
    Little,
}

impl ByteOrder {
    /// Legacy header code: 1 = HILO, 2 = LOHI.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Big),
            2 => Some(Self::Little),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Big => 1,
            Self::Little => 2,
        }
    }

    /// Tagged header token.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Big => "MSF",
            Self::Little => "LSF",
        }
    }

    /// Unsigned integer from the first `bytes.len()` (≤ 8) bytes.
    pub(crate) fn uint(self, bytes: &[u8]) -> u64 {
        let fold = |acc: u64, b: &u8| (acc << 8) | u64::from(*b);
        match self {
            Self::Big => bytes.iter().fold(0, fold),
            Self::Little => bytes.iter().rev().fold(0, fold),
        }
    }
}

macro_rules! read_num {
    ($name:ident, $ty:ty, $len:expr) => {
        pub(crate) fn $name(&mut self) -> Result<$ty> {
            let bytes = self.array::<$len>()?;
            Ok(match self.order {
                ByteOrder::Big => <$ty>::from_be_bytes(bytes),
                ByteOrder::Little => <$ty>::from_le_bytes(bytes),
            })
        }
    };
}

pub(crate) struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    order: ByteOrder,
}

impl<'a> ByteCursor<'a> {
    pub(crate) fn at(data: &'a [u8], pos: usize, order: ByteOrder) -> Self {
        Self { data, pos, order }
    }

    pub(crate) fn order(&self) -> ByteOrder {
        self.order
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(DtaError::Truncated {
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

    read_num!(u16, u16, 2);
    read_num!(u32, u32, 4);
    read_num!(u64, u64, 8);
    read_num!(i8, i8, 1);
    read_num!(i16, i16, 2);
    read_num!(i32, i32, 4);
    read_num!(f32, f32, 4);
    read_num!(f64, f64, 8);

    /// Consume an exact `<tag>` marker.
    pub(crate) fn expect(&mut self, tag: &'static str) -> Result<()> {
        let offset = self.pos;
        if self.take(tag.len())? != tag.as_bytes() {
            return Err(DtaError::invalid_section(
                "tagged section",
                offset,
                format!("expected {tag}"),
            ));
        }
        Ok(())
    }

    /// Consume `<tag>` if it is next; leaves the cursor alone otherwise.
    pub(crate) fn accept(&mut self, tag: &str) -> bool {
        let matches = self
            .data
            .get(self.pos..self.pos + tag.len())
            .is_some_and(|bytes| bytes == tag.as_bytes());
        if matches {
            self.pos += tag.len();
        }
        matches
    }

    /// Read a length field as `usize`.
    pub(crate) fn len_u32(&mut self) -> Result<usize> {
        let value = self.u32()?;
        usize::try_from(value).map_err(|_| {
            DtaError::invalid_section("length", self.pos - 4, format!("{value} too large"))
        })
    }
}
