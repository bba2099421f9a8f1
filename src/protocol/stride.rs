//! Variable-Stride Resolver
//!
//! Ukuran per-entry pada list payload TIDAK ditetapkan protokol: tergantung
//! packing struct di build native host. Stride ditemukan dari aritmatika:
//!
//! ```text
//! payload = declared_size - LIST_HEADER_SIZE
//! stride  = payload / declared_count      (harus habis dibagi)
//! ```
//!
//! Lalu stride dicocokkan ke tabel layout yang dihitung untuk tiga packing
//! (packed, align 4, align 8). Airport misalnya: 33 / 36 / 40 bytes, dengan
//! koordinat di offset 9 / 12 / 16.
//!
//! Stride yang tidak dikenal TIDAK di-default diam-diam: hasilnya
//! `Resolution::Unknown` dan decoder yang memutuskan lewat policy.

use std::fmt;

use crate::error::DecodeError;

/// Fixed list header: frame header + request_id, array_size, packet_index,
/// total_packets.
pub const LIST_HEADER_SIZE: usize = 28;

pub const MAX_FIELDS: usize = 13;

/// Entry shape carried by a list-type frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListShape {
    Airport,
    Waypoint,
    Ndb,
    Vor,
    InputEvent,
}

impl ListShape {
    pub const ALL: [ListShape; 5] = [
        ListShape::Airport,
        ListShape::Waypoint,
        ListShape::Ndb,
        ListShape::Vor,
        ListShape::InputEvent,
    ];

    #[inline(always)]
    fn index(self) -> usize {
        self as usize
    }

    /// Field table, in declaration order.
    pub fn fields(self) -> &'static [(Field, FieldKind)] {
        match self {
            ListShape::Airport => &FACILITY_FIELDS[..5],
            ListShape::Waypoint => &FACILITY_FIELDS[..6],
            ListShape::Ndb => &FACILITY_FIELDS[..7],
            ListShape::Vor => &FACILITY_FIELDS[..],
            ListShape::InputEvent => &INPUT_EVENT_FIELDS[..],
        }
    }
}

impl fmt::Display for ListShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ListShape::Airport => "airport",
            ListShape::Waypoint => "waypoint",
            ListShape::Ndb => "ndb",
            ListShape::Vor => "vor",
            ListShape::InputEvent => "input-event",
        };
        f.write_str(name)
    }
}

/// Primitive field encodings used in list entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bytes(usize),
    U32,
    F32,
    U64,
    F64,
}

impl FieldKind {
    #[inline(always)]
    const fn size(self) -> usize {
        match self {
            FieldKind::Bytes(n) => n,
            FieldKind::U32 | FieldKind::F32 => 4,
            FieldKind::U64 | FieldKind::F64 => 8,
        }
    }

    #[inline(always)]
    const fn align(self) -> usize {
        match self {
            FieldKind::Bytes(_) => 1,
            FieldKind::U32 | FieldKind::F32 => 4,
            FieldKind::U64 | FieldKind::F64 => 8,
        }
    }
}

/// Named entry field. Discriminant = position dalam field table shape-nya.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Ident = 0,
    Region = 1,
    Latitude = 2,
    Longitude = 3,
    Altitude = 4,
    MagVar = 5,
    Frequency = 6,
    Flags = 7,
    Localizer = 8,
    GlideLatitude = 9,
    GlideLongitude = 10,
    GlideAltitude = 11,
    GlideSlopeAngle = 12,
}

/// Input-event descriptor fields share slots 0..3 with their own meaning.
impl Field {
    pub const NAME: Field = Field::Ident;
    pub const HASH: Field = Field::Region;
    pub const VALUE_TYPE: Field = Field::Latitude;
}

pub const IDENT_LEN: usize = 6;
pub const REGION_LEN: usize = 3;
pub const INPUT_EVENT_NAME_LEN: usize = 64;

/// Layout field-datar: Waypoint/NDB/VOR dihitung sebagai satu daftar field
/// berurutan, bukan base struct + field turunan. Dengan pewarisan C++ field
/// turunan mulai setelah `sizeof(base)` (termasuk tail padding), jadi pada
/// Align8 NDB akan menjadi frequency@48 stride 56, bukan frequency@44 stride
/// 48. Stride host yang dikenal (Waypoint 37/40/48, NDB 41/44/48, VOR
/// 77/80/88) cocok dengan layout datar; stride lain ditolak atau ditandai
/// best-effort, tidak pernah ditebak diam-diam.
const FACILITY_FIELDS: [(Field, FieldKind); MAX_FIELDS] = [
    (Field::Ident, FieldKind::Bytes(IDENT_LEN)),
    (Field::Region, FieldKind::Bytes(REGION_LEN)),
    (Field::Latitude, FieldKind::F64),
    (Field::Longitude, FieldKind::F64),
    (Field::Altitude, FieldKind::F64),
    (Field::MagVar, FieldKind::F32),
    (Field::Frequency, FieldKind::U32),
    (Field::Flags, FieldKind::U32),
    (Field::Localizer, FieldKind::F32),
    (Field::GlideLatitude, FieldKind::F64),
    (Field::GlideLongitude, FieldKind::F64),
    (Field::GlideAltitude, FieldKind::F64),
    (Field::GlideSlopeAngle, FieldKind::F32),
];

const INPUT_EVENT_FIELDS: [(Field, FieldKind); 3] = [
    (Field::NAME, FieldKind::Bytes(INPUT_EVENT_NAME_LEN)),
    (Field::HASH, FieldKind::U64),
    (Field::VALUE_TYPE, FieldKind::U32),
];

/// Struct packing of the sending host build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Packing {
    Packed,
    Align4,
    Align8,
}

impl Packing {
    pub const ALL: [Packing; 3] = [Packing::Packed, Packing::Align4, Packing::Align8];

    #[inline(always)]
    const fn cap(self) -> usize {
        match self {
            Packing::Packed => 1,
            Packing::Align4 => 4,
            Packing::Align8 => 8,
        }
    }
}

/// Resolved byte layout of one list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryLayout {
    pub shape: ListShape,
    pub packing: Packing,
    pub stride: usize,
    offsets: [usize; MAX_FIELDS],
}

impl EntryLayout {
    /// Hitung offset field dengan aturan padding C: tiap field di kelipatan
    /// `min(align, packing)`, ukuran struct dibulatkan ke alignment terbesar.
    pub fn compute(shape: ListShape, packing: Packing) -> Self {
        let cap = packing.cap();
        let mut offsets = [0usize; MAX_FIELDS];
        let mut pos = 0usize;
        let mut struct_align = 1usize;

        for (i, (_, kind)) in shape.fields().iter().enumerate() {
            let align = kind.align().min(cap);
            pos = round_up(pos, align);
            offsets[i] = pos;
            pos += kind.size();
            struct_align = struct_align.max(align);
        }

        Self {
            shape,
            packing,
            stride: round_up(pos, struct_align),
            offsets,
        }
    }

    /// Offset of `field` inside one entry.
    #[inline(always)]
    pub fn offset(&self, field: Field) -> usize {
        self.offsets[field as usize]
    }

    /// Same offsets for every field of the shape (stride may differ).
    pub fn same_fields(&self, other: &EntryLayout) -> bool {
        let n = self.shape.fields().len();
        self.shape == other.shape && self.offsets[..n] == other.offsets[..n]
    }

    /// Bytes actually covered by fields (tanpa trailing padding).
    pub fn span(&self) -> usize {
        let fields = self.shape.fields();
        let last = fields.len() - 1;
        self.offsets[last] + fields[last].1.size()
    }
}

#[inline(always)]
const fn round_up(value: usize, align: usize) -> usize {
    (value + align - 1) / align * align
}

/// How a list entry layout was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutSource {
    /// Stride matched a known layout exactly.
    Known,
    /// Stride unknown; widest fitting known layout used, excess treated as padding.
    BestEffort,
}

/// Outcome of stride inference for one list frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Declared entry count is zero.
    Empty,
    Known(EntryLayout),
    /// Evenly divisible, but no known layout has this stride.
    Unknown { stride: usize },
}

/// Precomputed layout table for every list shape and packing.
#[derive(Debug, Clone)]
pub struct StrideResolver {
    table: [[EntryLayout; 3]; 5],
}

impl Default for StrideResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl StrideResolver {
    pub fn new() -> Self {
        let table = ListShape::ALL.map(|shape| Packing::ALL.map(|p| EntryLayout::compute(shape, p)));
        Self { table }
    }

    /// Known layouts for a shape, ordered by packing.
    #[inline(always)]
    pub fn layouts(&self, shape: ListShape) -> &[EntryLayout; 3] {
        &self.table[shape.index()]
    }

    /// Infer the entry layout from payload length and declared count.
    pub fn resolve(
        &self,
        shape: ListShape,
        payload_len: usize,
        count: usize,
    ) -> Result<Resolution, DecodeError> {
        if count == 0 {
            return Ok(Resolution::Empty);
        }
        if payload_len % count != 0 {
            return Err(DecodeError::IndivisibleStride {
                shape,
                payload_len,
                count,
            });
        }

        let stride = payload_len / count;
        match select(self.layouts(shape), stride) {
            Selection::One(layout) => Ok(Resolution::Known(layout)),
            Selection::None => Ok(Resolution::Unknown { stride }),
            Selection::Conflict => Err(DecodeError::AmbiguousStride { shape, stride }),
        }
    }

    /// Widest known layout that fits inside `stride`, re-strided to it.
    pub fn best_effort(&self, shape: ListShape, stride: usize) -> Option<EntryLayout> {
        self.layouts(shape)
            .iter()
            .filter(|l| l.stride <= stride)
            .max_by_key(|l| l.stride)
            .map(|l| EntryLayout { stride, ..*l })
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Selection {
    None,
    One(EntryLayout),
    Conflict,
}

/// Pilih layout dengan stride yang cocok. Layout identik (stride dan offset
/// sama) dihitung satu; layout berbeda dengan stride sama = konflik.
fn select(candidates: &[EntryLayout], stride: usize) -> Selection {
    let mut found: Option<EntryLayout> = None;
    for layout in candidates.iter().filter(|l| l.stride == stride) {
        match found {
            None => found = Some(*layout),
            Some(prev) if prev.same_fields(layout) => {}
            Some(_) => return Selection::Conflict,
        }
    }
    found.map_or(Selection::None, Selection::One)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_discriminant_matches_table_position() {
        for shape in ListShape::ALL {
            for (i, (field, _)) in shape.fields().iter().enumerate() {
                assert_eq!(*field as usize, i, "{shape} field {field:?}");
            }
        }
    }

    #[test]
    fn test_airport_strides() {
        let r = StrideResolver::new();
        let strides: Vec<_> = r.layouts(ListShape::Airport).iter().map(|l| l.stride).collect();
        assert_eq!(strides, vec![33, 36, 40]);

        let lat: Vec<_> = r
            .layouts(ListShape::Airport)
            .iter()
            .map(|l| l.offset(Field::Latitude))
            .collect();
        assert_eq!(lat, vec![9, 12, 16]);
    }

    #[test]
    fn test_navaid_strides() {
        let r = StrideResolver::new();
        let stride = |s| r.layouts(s).map(|l| l.stride);
        assert_eq!(stride(ListShape::Waypoint), [37, 40, 48]);
        assert_eq!(stride(ListShape::Ndb), [41, 44, 48]);
        assert_eq!(stride(ListShape::Vor), [77, 80, 88]);
        assert_eq!(stride(ListShape::InputEvent), [76, 76, 80]);
    }

    #[test]
    fn test_navaid_layouts_are_flat() {
        let ndb = EntryLayout::compute(ListShape::Ndb, Packing::Align8);
        assert_eq!(ndb.offset(Field::MagVar), 40);
        assert_eq!(ndb.offset(Field::Frequency), 44);
        assert_eq!(ndb.stride, 48);

        // Layout base+turunan (frequency@48, stride 56) bukan layout yang dikenal
        let r = StrideResolver::new();
        assert_eq!(
            r.resolve(ListShape::Ndb, 56 * 2, 2).unwrap(),
            Resolution::Unknown { stride: 56 }
        );
    }

    #[test]
    fn test_resolve_selects_each_known_stride() {
        let r = StrideResolver::new();
        for (stride, packing) in [(33, Packing::Packed), (36, Packing::Align4), (40, Packing::Align8)] {
            match r.resolve(ListShape::Airport, stride * 5, 5).unwrap() {
                Resolution::Known(layout) => {
                    assert_eq!(layout.stride, stride);
                    assert_eq!(layout.packing, packing);
                }
                other => panic!("stride {stride}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_zero_count_is_empty() {
        let r = StrideResolver::new();
        assert_eq!(r.resolve(ListShape::Airport, 0, 0).unwrap(), Resolution::Empty);
    }

    #[test]
    fn test_indivisible_payload() {
        let r = StrideResolver::new();
        let err = r.resolve(ListShape::Airport, 100, 3).unwrap_err();
        assert_eq!(
            err,
            DecodeError::IndivisibleStride {
                shape: ListShape::Airport,
                payload_len: 100,
                count: 3
            }
        );
    }

    #[test]
    fn test_unknown_stride_is_not_guessed() {
        let r = StrideResolver::new();
        assert_eq!(
            r.resolve(ListShape::Airport, 44 * 2, 2).unwrap(),
            Resolution::Unknown { stride: 44 }
        );
    }

    #[test]
    fn test_identical_layouts_deduplicated() {
        // Packed dan Align4 identik untuk input-event descriptor
        let r = StrideResolver::new();
        match r.resolve(ListShape::InputEvent, 76, 1).unwrap() {
            Resolution::Known(layout) => assert_eq!(layout.offset(Field::HASH), 64),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn test_conflicting_layouts() {
        let a = EntryLayout::compute(ListShape::Airport, Packing::Align4);
        let mut b = EntryLayout::compute(ListShape::Airport, Packing::Packed);
        b.stride = a.stride;
        assert_eq!(select(&[a, b], a.stride), Selection::Conflict);
        assert_eq!(select(&[a, a], a.stride), Selection::One(a));
        assert_eq!(select(&[a], 99), Selection::None);
    }

    #[test]
    fn test_best_effort_picks_widest_fit() {
        let r = StrideResolver::new();
        let layout = r.best_effort(ListShape::Airport, 44).unwrap();
        assert_eq!(layout.packing, Packing::Align8);
        assert_eq!(layout.stride, 44);
        assert_eq!(layout.offset(Field::Latitude), 16);

        assert!(r.best_effort(ListShape::Airport, 20).is_none());
    }

    #[test]
    fn test_span_excludes_trailing_padding() {
        let waypoint = EntryLayout::compute(ListShape::Waypoint, Packing::Align8);
        assert_eq!(waypoint.span(), 44);
        assert_eq!(waypoint.stride, 48);
    }
}
