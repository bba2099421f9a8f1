//! Memory-Mapped Frame Capture
//!
//! Merekam raw frame dari host ke file mmap supaya bisa di-replay tanpa host:
//! - Append-only: frame ditulis berurutan, tidak ada wraparound
//! - Kernel-managed flush: data tersimpan ke disk lewat page cache
//! - Bounds-checked read: file rusak tidak bisa membuat reader membaca di luar map
//!
//! Layout file:
//! ```text
//! ┌──────────────────────────── header (64 bytes) ───────────────────────────┐
//! │ magic "SIMLCAP1" (8) │ version u32 │ reserved u32 │ capacity u64 │ write_pos u64 │ pad │
//! ├──────────────────────────────── data ────────────────────────────────────┤
//! │ [len u32][frame bytes] [len u32][frame bytes] ...                         │
//! └───────────────────────────────────────────────────────────────────────────┘
//! ```

use memmap2::{Mmap, MmapMut, MmapOptions};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use crate::protocol::HEADER_SIZE;

const MAGIC: [u8; 8] = *b"SIMLCAP1";
const VERSION: u32 = 1;

const VERSION_AT: usize = 8;
const CAPACITY_AT: usize = 16;
const WRITE_POS_AT: usize = 24;

/// Size of the file header preceding the frame region.
pub const CAPTURE_HEADER_SIZE: usize = 64;

const LEN_PREFIX: usize = 4;

/// Smallest data region that still fits one header-only frame.
pub const MIN_CAPTURE_CAPACITY: usize = LEN_PREFIX + HEADER_SIZE;

/// Append-only frame recorder
pub struct FrameCapture {
    mmap: MmapMut,
    capacity: usize,
    write_pos: usize,
    frames: u64,
}

impl FrameCapture {
    /// Membuat file capture baru (file lama di-truncate)
    ///
    /// # Arguments
    /// * `path` - Path ke file capture
    /// * `capacity` - Ukuran data region dalam bytes
    pub fn create<P: AsRef<Path>>(path: P, capacity: usize) -> io::Result<Self> {
        if capacity < MIN_CAPTURE_CAPACITY {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("capture capacity {capacity} below minimum {MIN_CAPTURE_CAPACITY}"),
            ));
        }

        let total_size = CAPTURE_HEADER_SIZE + capacity;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(total_size as u64)?;

        // SAFETY: file baru dibuka read/write dan tidak dibagi dengan proses lain
        let mut mmap = unsafe { MmapOptions::new().len(total_size).map_mut(&file)? };

        mmap[..8].copy_from_slice(&MAGIC);
        mmap[VERSION_AT..VERSION_AT + 4].copy_from_slice(&VERSION.to_le_bytes());
        mmap[CAPACITY_AT..CAPACITY_AT + 8].copy_from_slice(&(capacity as u64).to_le_bytes());
        mmap[WRITE_POS_AT..WRITE_POS_AT + 8].copy_from_slice(&0u64.to_le_bytes());

        Ok(Self {
            mmap,
            capacity,
            write_pos: 0,
            frames: 0,
        })
    }

    /// Append satu frame.
    ///
    /// Returns `false` jika sisa ruang tidak cukup; frame tidak ditulis sebagian.
    #[inline(always)]
    pub fn append(&mut self, frame: &[u8]) -> bool {
        let needed = LEN_PREFIX + frame.len();
        if needed > self.remaining() || frame.len() > u32::MAX as usize {
            return false;
        }

        let at = CAPTURE_HEADER_SIZE + self.write_pos;
        self.mmap[at..at + LEN_PREFIX].copy_from_slice(&(frame.len() as u32).to_le_bytes());
        self.mmap[at + LEN_PREFIX..at + needed].copy_from_slice(frame);

        // write_pos di-update terakhir: reader tidak pernah melihat frame setengah jadi
        self.write_pos += needed;
        self.mmap[WRITE_POS_AT..WRITE_POS_AT + 8]
            .copy_from_slice(&(self.write_pos as u64).to_le_bytes());
        self.frames += 1;
        true
    }

    pub fn flush(&self) -> io::Result<()> {
        self.mmap.flush()
    }

    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    pub fn bytes_written(&self) -> usize {
        self.write_pos
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.write_pos
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Read-only view over a capture file.
pub struct CaptureReader {
    mmap: Mmap,
    write_pos: usize,
}

impl CaptureReader {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;

        // SAFETY: map read-only; isi divalidasi sebelum dipakai
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < CAPTURE_HEADER_SIZE || mmap[..8] != MAGIC {
            return Err(invalid("not a capture file"));
        }
        let version = read_u32(&mmap, VERSION_AT);
        if version != VERSION {
            return Err(invalid(&format!("unsupported capture version {version}")));
        }

        let capacity = read_u64(&mmap, CAPACITY_AT) as usize;
        let write_pos = read_u64(&mmap, WRITE_POS_AT) as usize;
        let region = mmap.len() - CAPTURE_HEADER_SIZE;
        if write_pos > capacity || write_pos > region {
            return Err(invalid("capture write position out of bounds"));
        }

        Ok(Self { mmap, write_pos })
    }

    /// Frame yang dimulai di `offset` (relatif ke data region) beserta offset
    /// frame berikutnya. `None` di akhir data atau jika entry terpotong.
    pub fn frame_at(&self, offset: usize) -> Option<(&[u8], usize)> {
        let data = &self.mmap[CAPTURE_HEADER_SIZE..CAPTURE_HEADER_SIZE + self.write_pos];
        let len_end = offset.checked_add(LEN_PREFIX)?;
        let prefix = data.get(offset..len_end)?;
        let len = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        let end = len_end.checked_add(len)?;
        let frame = data.get(len_end..end)?;
        Some((frame, end))
    }

    pub fn frames(&self) -> CaptureFrames<'_> {
        CaptureFrames {
            reader: self,
            offset: 0,
        }
    }

    /// Bytes of recorded data (length prefixes included).
    pub fn data_len(&self) -> usize {
        self.write_pos
    }
}

/// Iterator over recorded frames in append order.
pub struct CaptureFrames<'a> {
    reader: &'a CaptureReader,
    offset: usize,
}

impl<'a> Iterator for CaptureFrames<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let (frame, next) = self.reader.frame_at(self.offset)?;
        self.offset = next;
        Some(frame)
    }
}

fn invalid(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}

#[inline(always)]
fn read_u32(buf: &[u8], at: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[at..at + 4]);
    u32::from_le_bytes(raw)
}

#[inline(always)]
fn read_u64(buf: &[u8], at: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(raw)
}
