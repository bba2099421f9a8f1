//! Frame Builder
//!
//! Menyusun frame biner persis seperti yang dikirim native host. Dipakai
//! oleh fake host, test, dan benchmark; decoder sendiri tidak membutuhkannya.
//!
//! Field `size` di header diisi otomatis saat `finish()`.

use super::header::{FrameHeader, MessageTag, HEADER_SIZE};
use super::message::{EntryExtra, FacilityKind, InputEventDescriptor, InputValueType, ListEntry};
use super::stride::{
    EntryLayout, Field, ListShape, Packing, IDENT_LEN, INPUT_EVENT_NAME_LEN, LIST_HEADER_SIZE,
    REGION_LEN,
};

/// Protocol version stamped on synthesized frames.
pub const DEFAULT_VERSION: u32 = 4;

/// Incremental little-endian frame writer.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    buffer: Vec<u8>,
}

impl FrameBuilder {
    pub fn new(tag: MessageTag) -> Self {
        Self::with_raw_tag(tag as u32)
    }

    /// Builder untuk tag arbitrer (termasuk tag yang tidak dikenal decoder).
    pub fn with_raw_tag(tag: u32) -> Self {
        let header = FrameHeader {
            size: 0,
            version: DEFAULT_VERSION,
            tag,
        };
        let mut buffer = Vec::with_capacity(64);
        buffer.extend_from_slice(&header.to_bytes());
        Self { buffer }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.buffer[4..8].copy_from_slice(&version.to_le_bytes());
        self
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.buffer.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32s(mut self, vs: &[u32]) -> Self {
        for v in vs {
            self.buffer.extend_from_slice(&v.to_le_bytes());
        }
        self
    }

    pub fn u64(mut self, v: u64) -> Self {
        self.buffer.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f32(mut self, v: f32) -> Self {
        self.buffer.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f64(mut self, v: f64) -> Self {
        self.buffer.extend_from_slice(&v.to_le_bytes());
        self
    }

    /// NUL-padded fixed-width string; overlong input is truncated.
    pub fn c_str(mut self, s: &str, width: usize) -> Self {
        let start = self.buffer.len();
        self.buffer.resize(start + width, 0);
        write_c_str(&mut self.buffer[start..start + width], s);
        self
    }

    pub fn bytes(mut self, raw: &[u8]) -> Self {
        self.buffer.extend_from_slice(raw);
        self
    }

    pub fn zeros(mut self, n: usize) -> Self {
        self.buffer.resize(self.buffer.len() + n, 0);
        self
    }

    /// Current length, header included.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.len() == HEADER_SIZE
    }

    /// Patch declared size and return the frame bytes.
    pub fn finish(mut self) -> Vec<u8> {
        let size = self.buffer.len() as u32;
        self.buffer[0..4].copy_from_slice(&size.to_le_bytes());
        self.buffer
    }

    /// List frame with an arbitrary (possibly malformed) entry payload.
    pub fn list_with_payload(
        tag: MessageTag,
        request_id: u32,
        count: u32,
        packet_index: u32,
        total_packets: u32,
        payload: &[u8],
    ) -> Vec<u8> {
        let frame = Self::new(tag)
            .u32(request_id)
            .u32(count)
            .u32(packet_index)
            .u32(total_packets);
        debug_assert_eq!(frame.len(), LIST_HEADER_SIZE);
        frame.bytes(payload).finish()
    }

    /// Facility list frame with entries serialized in the given packing.
    pub fn facility_list(
        kind: FacilityKind,
        packing: Packing,
        request_id: u32,
        packet_index: u32,
        total_packets: u32,
        entries: &[ListEntry],
    ) -> Vec<u8> {
        let tag = match kind {
            FacilityKind::Airport => MessageTag::AirportList,
            FacilityKind::Vor => MessageTag::VorList,
            FacilityKind::Ndb => MessageTag::NdbList,
            FacilityKind::Waypoint => MessageTag::WaypointList,
        };
        let layout = EntryLayout::compute(kind.shape(), packing);
        let mut payload = Vec::with_capacity(layout.stride * entries.len());
        for entry in entries {
            payload.extend_from_slice(&Self::list_entry(entry, &layout));
        }
        Self::list_with_payload(
            tag,
            request_id,
            entries.len() as u32,
            packet_index,
            total_packets,
            &payload,
        )
    }

    /// Serialize one facility entry using `layout` (padding bytes zeroed).
    pub fn list_entry(entry: &ListEntry, layout: &EntryLayout) -> Vec<u8> {
        let mut out = vec![0u8; layout.stride];
        let at = |field: Field| layout.offset(field);

        write_c_str(&mut out[at(Field::Ident)..at(Field::Ident) + IDENT_LEN], &entry.ident);
        write_c_str(&mut out[at(Field::Region)..at(Field::Region) + REGION_LEN], &entry.region);
        put(&mut out, at(Field::Latitude), &entry.latitude.to_le_bytes());
        put(&mut out, at(Field::Longitude), &entry.longitude.to_le_bytes());
        put(&mut out, at(Field::Altitude), &entry.altitude.to_le_bytes());

        match (layout.shape, entry.extra) {
            (ListShape::Waypoint, EntryExtra::Waypoint { mag_var }) => {
                put(&mut out, at(Field::MagVar), &mag_var.to_le_bytes());
            }
            (ListShape::Ndb, EntryExtra::Ndb { mag_var, frequency }) => {
                put(&mut out, at(Field::MagVar), &mag_var.to_le_bytes());
                put(&mut out, at(Field::Frequency), &frequency.to_le_bytes());
            }
            (
                ListShape::Vor,
                EntryExtra::Vor {
                    mag_var,
                    frequency,
                    flags,
                    localizer,
                    glide_latitude,
                    glide_longitude,
                    glide_altitude,
                    glide_slope_angle,
                },
            ) => {
                put(&mut out, at(Field::MagVar), &mag_var.to_le_bytes());
                put(&mut out, at(Field::Frequency), &frequency.to_le_bytes());
                put(&mut out, at(Field::Flags), &flags.to_le_bytes());
                put(&mut out, at(Field::Localizer), &localizer.to_le_bytes());
                put(&mut out, at(Field::GlideLatitude), &glide_latitude.to_le_bytes());
                put(&mut out, at(Field::GlideLongitude), &glide_longitude.to_le_bytes());
                put(&mut out, at(Field::GlideAltitude), &glide_altitude.to_le_bytes());
                put(&mut out, at(Field::GlideSlopeAngle), &glide_slope_angle.to_le_bytes());
            }
            // Extra yang tidak sesuai shape: field tambahan dibiarkan nol
            _ => {}
        }
        out
    }

    /// Input-event enumeration frame.
    pub fn input_event_list(
        packing: Packing,
        request_id: u32,
        descriptors: &[InputEventDescriptor],
    ) -> Vec<u8> {
        let layout = EntryLayout::compute(ListShape::InputEvent, packing);
        let mut payload = vec![0u8; layout.stride * descriptors.len()];
        for (i, d) in descriptors.iter().enumerate() {
            let entry = &mut payload[i * layout.stride..(i + 1) * layout.stride];
            let name_at = layout.offset(Field::NAME);
            write_c_str(&mut entry[name_at..name_at + INPUT_EVENT_NAME_LEN], &d.name);
            put(entry, layout.offset(Field::HASH), &d.hash.to_le_bytes());
            let value_type = match d.value_type {
                InputValueType::Double => 0,
                InputValueType::String => 1,
                InputValueType::Other(v) => v,
            };
            put(entry, layout.offset(Field::VALUE_TYPE), &value_type.to_le_bytes());
        }
        Self::list_with_payload(
            MessageTag::InputEventList,
            request_id,
            descriptors.len() as u32,
            0,
            1,
            &payload,
        )
    }
}

#[inline(always)]
fn put(out: &mut [u8], at: usize, raw: &[u8]) {
    out[at..at + raw.len()].copy_from_slice(raw);
}

fn write_c_str(dst: &mut [u8], s: &str) {
    let n = s.len().min(dst.len());
    dst[..n].copy_from_slice(&s.as_bytes()[..n]);
}
