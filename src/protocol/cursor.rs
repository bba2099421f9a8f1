//! Bounds-checked field extraction
//!
//! Semua read memakai offset absolut di dalam body frame dan mengembalikan
//! `FrameTooSmall` bila field melewati batas. Tidak ada pointer cast ke struct.

use crate::error::DecodeError;

/// Read-only view over a frame body (already trimmed to its declared size).
#[derive(Debug, Clone, Copy)]
pub struct FieldReader<'a> {
    buf: &'a [u8],
    tag: u32,
}

impl<'a> FieldReader<'a> {
    #[inline(always)]
    pub fn new(buf: &'a [u8], tag: u32) -> Self {
        Self { buf, tag }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline(always)]
    pub fn bytes(&self, at: usize, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = at
            .checked_add(len)
            .ok_or_else(|| self.too_small(usize::MAX))?;
        if end > self.buf.len() {
            return Err(self.too_small(end));
        }
        Ok(&self.buf[at..end])
    }

    #[inline(always)]
    fn array<const N: usize>(&self, at: usize) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(at, N)?);
        Ok(out)
    }

    #[inline(always)]
    pub fn u32(&self, at: usize) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.array(at)?))
    }

    #[inline(always)]
    pub fn u64(&self, at: usize) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.array(at)?))
    }

    #[inline(always)]
    pub fn f32(&self, at: usize) -> Result<f32, DecodeError> {
        Ok(f32::from_le_bytes(self.array(at)?))
    }

    #[inline(always)]
    pub fn f64(&self, at: usize) -> Result<f64, DecodeError> {
        Ok(f64::from_le_bytes(self.array(at)?))
    }

    /// Fixed-width C string: dipotong di NUL pertama, UTF-8 lossy.
    pub fn c_str(&self, at: usize, width: usize) -> Result<String, DecodeError> {
        Ok(c_string(self.bytes(at, width)?))
    }

    /// Everything from `at` to the end of the body (possibly empty).
    #[inline(always)]
    pub fn tail(&self, at: usize) -> &'a [u8] {
        self.buf.get(at..).unwrap_or(&[])
    }

    #[inline(always)]
    fn too_small(&self, min: usize) -> DecodeError {
        DecodeError::FrameTooSmall {
            tag: Some(self.tag),
            len: self.buf.len(),
            min,
        }
    }
}

/// Decode a NUL-padded byte field.
pub fn c_string(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
