//! Bounded primitive reader shared by every binary decoder
//!
//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT

use std::io::Cursor;
use std::marker::PhantomData;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};

/// Sequential reader over an in-memory byte slice.
///
/// Reads never cross the current *limit*, which starts at the end of the
/// data and can be narrowed to a chunk's end with [`ByteCursor::set_limit`].
/// A read that needs more bytes than remain before the limit fails with
/// [`Error::TruncatedInput`]; a seek past the limit fails with
/// [`Error::UnexpectedEof`].
#[derive(Debug, Clone)]
pub struct ByteCursor<'a, E: ByteOrder = LittleEndian> {
    inner: Cursor<&'a [u8]>,
    limit: u64,
    _order: PhantomData<E>,
}

impl<'a, E: ByteOrder> ByteCursor<'a, E> {
    /// Create a cursor at offset 0 covering all of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            inner: Cursor::new(data),
            limit: data.len() as u64,
            _order: PhantomData,
        }
    }

    /// Current absolute offset.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    /// Total length of the underlying data.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.inner.get_ref().len() as u64
    }

    /// True when the underlying data is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.get_ref().is_empty()
    }

    /// Current read limit (absolute offset).
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Narrow or widen the read limit, returning the previous one.
    ///
    /// The limit never exceeds the data length.
    pub fn set_limit(&mut self, limit: u64) -> u64 {
        let previous = self.limit;
        self.limit = limit.min(self.len());
        previous
    }

    /// Bytes left before the limit.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.position()) as usize
    }

    /// True once the cursor has reached the limit.
    #[must_use]
    pub fn at_limit(&self) -> bool {
        self.position() >= self.limit
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        let available = self.remaining();
        if available < needed {
            return Err(Error::TruncatedInput {
                offset: self.position(),
                needed,
                available,
            });
        }
        Ok(())
    }

    // ==================== Primitive reads ====================

    /// Read one byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.inner.read_u8()?)
    }

    /// Read a signed 16-bit integer.
    pub fn read_i16(&mut self) -> Result<i16> {
        self.ensure(2)?;
        Ok(self.inner.read_i16::<E>()?)
    }

    /// Read an unsigned 16-bit integer.
    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.inner.read_u16::<E>()?)
    }

    /// Read an unsigned 24-bit integer.
    pub fn read_u24(&mut self) -> Result<u32> {
        self.ensure(3)?;
        Ok(self.inner.read_u24::<E>()?)
    }

    /// Read a signed 32-bit integer.
    pub fn read_i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        Ok(self.inner.read_i32::<E>()?)
    }

    /// Read an unsigned 32-bit integer.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.inner.read_u32::<E>()?)
    }

    /// Read an IEEE-754 single precision float.
    pub fn read_f32(&mut self) -> Result<f32> {
        self.ensure(4)?;
        Ok(self.inner.read_f32::<E>()?)
    }

    /// Read a raw 4-byte tag.
    pub fn read_tag(&mut self) -> Result<[u8; 4]> {
        let bytes = self.read_bytes(4)?;
        Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Borrow the next `count` bytes and advance past them.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        self.ensure(count)?;
        let data: &'a [u8] = *self.inner.get_ref();
        let start = self.position() as usize;
        self.inner.set_position((start + count) as u64);
        Ok(&data[start..start + count])
    }

    /// Read a null-terminated string, one byte per character.
    ///
    /// The terminator is consumed but not returned. Running into the limit
    /// before a terminator is a truncation.
    pub fn read_cstring(&mut self) -> Result<String> {
        let data: &'a [u8] = *self.inner.get_ref();
        let start = self.position() as usize;
        let end = self.limit as usize;
        let body = data.get(start..end).unwrap_or_default();
        let Some(len) = body.iter().position(|&b| b == 0) else {
            return Err(Error::TruncatedInput {
                offset: self.position(),
                needed: body.len() + 1,
                available: body.len(),
            });
        };
        self.inner.set_position((start + len + 1) as u64);
        Ok(body[..len].iter().copied().map(char::from).collect())
    }

    // ==================== Positioning ====================

    /// Move to an absolute offset within the limit.
    pub fn seek_to(&mut self, target: u64) -> Result<()> {
        if target > self.limit {
            return Err(Error::UnexpectedEof {
                offset: self.position(),
                target,
            });
        }
        self.inner.set_position(target);
        Ok(())
    }

    /// Move forward by `count` bytes.
    pub fn skip(&mut self, count: u64) -> Result<()> {
        let target = self.position().saturating_add(count);
        self.seek_to(target)
    }
}
