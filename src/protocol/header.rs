//! Frame Header dan Message Tag
//!
//! Layout setiap frame dari native host:
//! ┌─────────────────────────────────────────────────────┐
//! │ FrameHeader (12 bytes): size | version | tag        │
//! ├─────────────────────────────────────────────────────┤
//! │ Body (fixed-shape fields, atau list header + entries)│
//! └─────────────────────────────────────────────────────┘
//!
//! Semua field little-endian u32. `size` adalah ukuran yang dideklarasikan
//! host dan menjadi acuan bounds check, bukan ukuran struct yang diharapkan.

use crate::error::DecodeError;

pub const HEADER_SIZE: usize = 12;

/// Fixed 12-byte prefix of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHeader {
    /// Declared total frame size in bytes (header included).
    pub size: u32,
    /// Protocol version of the sending host.
    pub version: u32,
    /// Message tag (discriminator).
    pub tag: u32,
}

impl FrameHeader {
    /// Parse header dari raw bytes. Tidak memvalidasi `size`.
    #[inline(always)]
    pub fn parse(buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() < HEADER_SIZE {
            return Err(DecodeError::FrameTooSmall {
                tag: None,
                len: buf.len(),
                min: HEADER_SIZE,
            });
        }
        Ok(Self {
            size: read_u32(buf, 0),
            version: read_u32(buf, 4),
            tag: read_u32(buf, 8),
        })
    }

    /// Slice the frame down to its declared size.
    ///
    /// Declared size below the header or beyond the available bytes is
    /// rejected; the frame is never partially read.
    #[inline(always)]
    pub fn body<'a>(&self, frame: &'a [u8]) -> Result<&'a [u8], DecodeError> {
        let declared = self.size as usize;
        if declared < HEADER_SIZE {
            return Err(DecodeError::FrameTooSmall {
                tag: Some(self.tag),
                len: declared,
                min: HEADER_SIZE,
            });
        }
        if declared > frame.len() {
            return Err(DecodeError::DeclaredSizeExceedsFrame {
                declared,
                available: frame.len(),
            });
        }
        Ok(&frame[..declared])
    }

    #[inline(always)]
    pub fn message_tag(&self) -> Option<MessageTag> {
        MessageTag::from_u32(self.tag)
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.size.to_le_bytes());
        out[4..8].copy_from_slice(&self.version.to_le_bytes());
        out[8..12].copy_from_slice(&self.tag.to_le_bytes());
        out
    }
}

#[inline(always)]
fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

/// Message tags yang dikenal decoder.
///
/// Tag di luar daftar ini bukan error: decoder menghasilkan varian fallback
/// `Unknown` supaya stream tetap jalan saat protokol berevolusi.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageTag {
    Exception = 1,
    Open = 2,
    Quit = 3,
    Event = 4,
    ObjectAddRemove = 5,
    EventFilename = 6,
    EventFrame = 7,
    ObjectData = 8,
    ObjectDataByType = 9,
    AssignedObjectId = 12,
    SystemState = 15,
    ClientData = 16,
    AirportList = 18,
    VorList = 19,
    NdbList = 20,
    WaypointList = 21,
    MultiplayerServerStarted = 22,
    MultiplayerClientStarted = 23,
    MultiplayerSessionEnded = 24,
    EventEx = 27,
    FacilityData = 28,
    FacilityDataEnd = 29,
    InputEventList = 34,
    InputEventValue = 35,
    InputEventSubscription = 36,
    InputEventParams = 37,
}

impl MessageTag {
    #[inline(always)]
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            1 => Some(Self::Exception),
            2 => Some(Self::Open),
            3 => Some(Self::Quit),
            4 => Some(Self::Event),
            5 => Some(Self::ObjectAddRemove),
            6 => Some(Self::EventFilename),
            7 => Some(Self::EventFrame),
            8 => Some(Self::ObjectData),
            9 => Some(Self::ObjectDataByType),
            12 => Some(Self::AssignedObjectId),
            15 => Some(Self::SystemState),
            16 => Some(Self::ClientData),
            18 => Some(Self::AirportList),
            19 => Some(Self::VorList),
            20 => Some(Self::NdbList),
            21 => Some(Self::WaypointList),
            22 => Some(Self::MultiplayerServerStarted),
            23 => Some(Self::MultiplayerClientStarted),
            24 => Some(Self::MultiplayerSessionEnded),
            27 => Some(Self::EventEx),
            28 => Some(Self::FacilityData),
            29 => Some(Self::FacilityDataEnd),
            34 => Some(Self::InputEventList),
            35 => Some(Self::InputEventValue),
            36 => Some(Self::InputEventSubscription),
            37 => Some(Self::InputEventParams),
            _ => None,
        }
    }
}

/// Ephemeral view of one frame handed out by the host.
///
/// The lifetime ties the view to the host borrow that produced it, so a
/// frame cannot survive into the next poll.
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    bytes: &'a [u8],
}

impl<'a> RawFrame<'a> {
    #[inline(always)]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Build a view from a native `(pointer, length)` pair.
    ///
    /// Null pointer atau length nol menghasilkan frame kosong.
    ///
    /// # Safety
    /// `ptr` must point to `len` readable bytes that stay valid and unmodified
    /// for `'a`, i.e. until the next native poll call.
    #[inline(always)]
    pub unsafe fn from_raw_parts(ptr: *const u8, len: usize) -> Self {
        if ptr.is_null() || len == 0 {
            return Self { bytes: &[] };
        }
        Self {
            bytes: std::slice::from_raw_parts(ptr, len),
        }
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline(always)]
    pub fn header(&self) -> Result<FrameHeader, DecodeError> {
        FrameHeader::parse(self.bytes)
    }
}
