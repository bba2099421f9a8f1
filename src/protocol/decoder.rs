//! Decoder dan Type Dispatch Table
//!
//! Alur decode satu frame:
//! 1. Parse header (>= 12 bytes)
//! 2. Potong frame ke `size` yang dideklarasikan
//! 3. Lookup tag di dispatch table (tag tidak dikenal → `Unknown`)
//! 4. Cek `size >= min_size` untuk tag tersebut
//! 5. Ekstraksi field dengan bounds check, hasil owned
//!
//! Semua offset di bawah adalah offset absolut dalam frame (termasuk header).

use super::cursor::{c_string, FieldReader};
use super::header::{FrameHeader, MessageTag, RawFrame, HEADER_SIZE};
use super::message::*;
use super::stride::{
    EntryLayout, Field, LayoutSource, ListShape, Resolution, StrideResolver, IDENT_LEN,
    INPUT_EVENT_NAME_LEN, LIST_HEADER_SIZE, REGION_LEN,
};
use crate::config::UnknownStridePolicy;
use crate::error::DecodeError;

/// Width of fixed C string fields (`MAX_PATH`).
pub const PATH_LEN: usize = 260;
pub const APP_NAME_LEN: usize = 256;

/// Offset payload untuk object/client/facility data.
pub const DATA_BLOCK_OFFSET: usize = 40;

type DecodeFn = fn(&Decoder, &FrameHeader, FieldReader<'_>) -> Result<TypedMessage, DecodeError>;

/// One row of the dispatch table.
pub struct DispatchEntry {
    pub tag: MessageTag,
    /// Minimum declared frame size for this tag.
    pub min_size: usize,
    decode: DecodeFn,
}

/// Tag → (min size, decode routine).
static DISPATCH_TABLE: &[DispatchEntry] = &[
    DispatchEntry { tag: MessageTag::Exception, min_size: 24, decode: decode_exception },
    DispatchEntry { tag: MessageTag::Open, min_size: 308, decode: decode_open },
    DispatchEntry { tag: MessageTag::Quit, min_size: HEADER_SIZE, decode: decode_quit },
    DispatchEntry { tag: MessageTag::Event, min_size: 24, decode: decode_event },
    DispatchEntry { tag: MessageTag::ObjectAddRemove, min_size: 28, decode: decode_object_add_remove },
    DispatchEntry { tag: MessageTag::EventFilename, min_size: 288, decode: decode_event_filename },
    DispatchEntry { tag: MessageTag::EventFrame, min_size: 32, decode: decode_event_frame },
    DispatchEntry { tag: MessageTag::ObjectData, min_size: DATA_BLOCK_OFFSET, decode: decode_object_data },
    DispatchEntry { tag: MessageTag::ObjectDataByType, min_size: DATA_BLOCK_OFFSET, decode: decode_object_data },
    DispatchEntry { tag: MessageTag::AssignedObjectId, min_size: 20, decode: decode_assigned_object_id },
    DispatchEntry { tag: MessageTag::SystemState, min_size: 284, decode: decode_system_state },
    DispatchEntry { tag: MessageTag::ClientData, min_size: DATA_BLOCK_OFFSET, decode: decode_object_data },
    DispatchEntry { tag: MessageTag::AirportList, min_size: LIST_HEADER_SIZE, decode: decode_facility_list },
    DispatchEntry { tag: MessageTag::VorList, min_size: LIST_HEADER_SIZE, decode: decode_facility_list },
    DispatchEntry { tag: MessageTag::NdbList, min_size: LIST_HEADER_SIZE, decode: decode_facility_list },
    DispatchEntry { tag: MessageTag::WaypointList, min_size: LIST_HEADER_SIZE, decode: decode_facility_list },
    DispatchEntry { tag: MessageTag::MultiplayerServerStarted, min_size: 24, decode: decode_event },
    DispatchEntry { tag: MessageTag::MultiplayerClientStarted, min_size: 24, decode: decode_event },
    DispatchEntry { tag: MessageTag::MultiplayerSessionEnded, min_size: 24, decode: decode_event },
    DispatchEntry { tag: MessageTag::EventEx, min_size: 40, decode: decode_event_ex },
    DispatchEntry { tag: MessageTag::FacilityData, min_size: DATA_BLOCK_OFFSET, decode: decode_facility_data },
    DispatchEntry { tag: MessageTag::FacilityDataEnd, min_size: 16, decode: decode_facility_data_end },
    DispatchEntry { tag: MessageTag::InputEventList, min_size: LIST_HEADER_SIZE, decode: decode_input_event_list },
    DispatchEntry { tag: MessageTag::InputEventValue, min_size: 20, decode: decode_input_event_value },
    DispatchEntry { tag: MessageTag::InputEventSubscription, min_size: 24, decode: decode_input_event_subscription },
    DispatchEntry { tag: MessageTag::InputEventParams, min_size: 20, decode: decode_input_event_params },
];

/// Look up the dispatch row for a raw tag.
#[inline(always)]
pub fn lookup(tag: u32) -> Option<&'static DispatchEntry> {
    let tag = MessageTag::from_u32(tag)?;
    DISPATCH_TABLE.iter().find(|entry| entry.tag == tag)
}

/// Minimum valid frame size for a raw tag, if the tag is known.
pub fn min_size(tag: u32) -> Option<usize> {
    lookup(tag).map(|entry| entry.min_size)
}

/// Stateless frame decoder (apart from its precomputed stride table).
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    resolver: StrideResolver,
    policy: UnknownStridePolicy,
}

impl Decoder {
    pub fn new(policy: UnknownStridePolicy) -> Self {
        Self {
            resolver: StrideResolver::new(),
            policy,
        }
    }

    pub fn policy(&self) -> UnknownStridePolicy {
        self.policy
    }

    pub fn resolver(&self) -> &StrideResolver {
        &self.resolver
    }

    /// Decode one frame into an owned message.
    pub fn decode(&self, frame: RawFrame<'_>) -> Result<TypedMessage, DecodeError> {
        let bytes = frame.as_bytes();
        let header = FrameHeader::parse(bytes)?;
        let body = header.body(bytes)?;

        let Some(entry) = lookup(header.tag) else {
            return Ok(TypedMessage::Unknown(header));
        };

        if body.len() < entry.min_size {
            return Err(DecodeError::FrameTooSmall {
                tag: Some(header.tag),
                len: body.len(),
                min: entry.min_size,
            });
        }

        (entry.decode)(self, &header, FieldReader::new(body, header.tag))
    }

    /// Decode, mapping stride failures into an `Undecodable` message.
    ///
    /// Error lain (frame terlalu kecil, size palsu) tetap dikembalikan sebagai
    /// `Err` supaya pemanggil bisa membuangnya.
    pub fn decode_or_surface(&self, frame: RawFrame<'_>) -> Result<TypedMessage, DecodeError> {
        match self.decode(frame) {
            Err(error) if error.is_stride_error() => {
                let header = frame.header()?;
                Ok(TypedMessage::Undecodable(UndecodableFrame { header, error }))
            }
            other => other,
        }
    }

    /// Resolve the entry layout of a list payload according to the policy.
    fn list_layout(
        &self,
        shape: ListShape,
        payload_len: usize,
        count: usize,
    ) -> Result<Option<(EntryLayout, LayoutSource)>, DecodeError> {
        match self.resolver.resolve(shape, payload_len, count)? {
            Resolution::Empty => Ok(None),
            Resolution::Known(layout) => Ok(Some((layout, LayoutSource::Known))),
            Resolution::Unknown { stride } => {
                let fallback = match self.policy {
                    UnknownStridePolicy::Reject => None,
                    UnknownStridePolicy::BestEffort => self.resolver.best_effort(shape, stride),
                };
                match fallback {
                    Some(layout) => {
                        tracing::debug!(%shape, stride, count, "best-effort list layout");
                        Ok(Some((layout, LayoutSource::BestEffort)))
                    }
                    None => Err(DecodeError::UnknownStride {
                        shape,
                        stride,
                        count,
                    }),
                }
            }
        }
    }
}

fn read_event(r: &FieldReader<'_>) -> Result<EventInfo, DecodeError> {
    Ok(EventInfo {
        group_id: r.u32(12)?,
        event_id: r.u32(16)?,
        data: r.u32(20)?,
    })
}

fn read_version(r: &FieldReader<'_>, at: usize) -> Result<Version, DecodeError> {
    Ok(Version {
        major: r.u32(at)?,
        minor: r.u32(at + 4)?,
        build_major: r.u32(at + 8)?,
        build_minor: r.u32(at + 12)?,
    })
}

fn read_paging(r: &FieldReader<'_>, at: usize) -> Result<PagingInfo, DecodeError> {
    Ok(PagingInfo {
        packet_index: r.u32(at)?,
        total_packets: r.u32(at + 4)?,
    })
}

fn decode_exception(_: &Decoder, _: &FrameHeader, r: FieldReader<'_>) -> Result<TypedMessage, DecodeError> {
    Ok(TypedMessage::Exception(ExceptionInfo {
        exception: r.u32(12)?,
        send_id: r.u32(16)?,
        index: r.u32(20)?,
    }))
}

fn decode_open(_: &Decoder, _: &FrameHeader, r: FieldReader<'_>) -> Result<TypedMessage, DecodeError> {
    let name_end = HEADER_SIZE + APP_NAME_LEN;
    Ok(TypedMessage::Open(OpenInfo {
        application_name: r.c_str(HEADER_SIZE, APP_NAME_LEN)?,
        application_version: read_version(&r, name_end)?,
        host_version: read_version(&r, name_end + 16)?,
    }))
}

fn decode_quit(_: &Decoder, _: &FrameHeader, _: FieldReader<'_>) -> Result<TypedMessage, DecodeError> {
    Ok(TypedMessage::Quit)
}

fn decode_event(_: &Decoder, header: &FrameHeader, r: FieldReader<'_>) -> Result<TypedMessage, DecodeError> {
    let event = read_event(&r)?;
    Ok(match header.message_tag() {
        Some(MessageTag::MultiplayerServerStarted) => TypedMessage::MultiplayerServerStarted(event),
        Some(MessageTag::MultiplayerClientStarted) => TypedMessage::MultiplayerClientStarted(event),
        Some(MessageTag::MultiplayerSessionEnded) => TypedMessage::MultiplayerSessionEnded(event),
        _ => TypedMessage::Event(event),
    })
}

fn decode_event_ex(_: &Decoder, _: &FrameHeader, r: FieldReader<'_>) -> Result<TypedMessage, DecodeError> {
    let mut data = [0u32; 5];
    for (i, slot) in data.iter_mut().enumerate() {
        *slot = r.u32(20 + i * 4)?;
    }
    Ok(TypedMessage::EventEx(EventExInfo {
        group_id: r.u32(12)?,
        event_id: r.u32(16)?,
        data,
    }))
}

fn decode_event_filename(_: &Decoder, _: &FrameHeader, r: FieldReader<'_>) -> Result<TypedMessage, DecodeError> {
    Ok(TypedMessage::EventFilename(EventFilename {
        event: read_event(&r)?,
        file_name: r.c_str(24, PATH_LEN)?,
        flags: r.u32(24 + PATH_LEN)?,
    }))
}

fn decode_event_frame(_: &Decoder, _: &FrameHeader, r: FieldReader<'_>) -> Result<TypedMessage, DecodeError> {
    Ok(TypedMessage::EventFrame(EventFrame {
        event: read_event(&r)?,
        frame_rate: r.f32(24)?,
        sim_speed: r.f32(28)?,
    }))
}

fn decode_object_add_remove(_: &Decoder, _: &FrameHeader, r: FieldReader<'_>) -> Result<TypedMessage, DecodeError> {
    Ok(TypedMessage::ObjectAddRemove(ObjectAddRemove {
        event: read_event(&r)?,
        object_type: r.u32(24)?,
    }))
}

fn decode_object_data(_: &Decoder, header: &FrameHeader, r: FieldReader<'_>) -> Result<TypedMessage, DecodeError> {
    let data = ObjectData {
        request_id: r.u32(12)?,
        object_id: r.u32(16)?,
        define_id: r.u32(20)?,
        flags: r.u32(24)?,
        paging: read_paging(&r, 28)?,
        define_count: r.u32(36)?,
        data: r.tail(DATA_BLOCK_OFFSET).to_vec(),
    };
    Ok(match header.message_tag() {
        Some(MessageTag::ObjectDataByType) => TypedMessage::ObjectDataByType(data),
        Some(MessageTag::ClientData) => TypedMessage::ClientData(data),
        _ => TypedMessage::ObjectData(data),
    })
}

fn decode_assigned_object_id(_: &Decoder, _: &FrameHeader, r: FieldReader<'_>) -> Result<TypedMessage, DecodeError> {
    Ok(TypedMessage::AssignedObjectId(AssignedObjectId {
        request_id: r.u32(12)?,
        object_id: r.u32(16)?,
    }))
}

fn decode_system_state(_: &Decoder, _: &FrameHeader, r: FieldReader<'_>) -> Result<TypedMessage, DecodeError> {
    Ok(TypedMessage::SystemState(SystemState {
        request_id: r.u32(12)?,
        integer: r.u32(16)?,
        float: r.f32(20)?,
        string: r.c_str(24, PATH_LEN)?,
    }))
}

fn decode_facility_data(_: &Decoder, _: &FrameHeader, r: FieldReader<'_>) -> Result<TypedMessage, DecodeError> {
    Ok(TypedMessage::FacilityData(FacilityData {
        user_request_id: r.u32(12)?,
        unique_request_id: r.u32(16)?,
        parent_unique_request_id: r.u32(20)?,
        data_type: r.u32(24)?,
        is_list_item: r.u32(28)? != 0,
        item_index: r.u32(32)?,
        list_size: r.u32(36)?,
        data: r.tail(DATA_BLOCK_OFFSET).to_vec(),
    }))
}

fn decode_facility_data_end(_: &Decoder, _: &FrameHeader, r: FieldReader<'_>) -> Result<TypedMessage, DecodeError> {
    Ok(TypedMessage::FacilityDataEnd(FacilityDataEnd {
        request_id: r.u32(12)?,
    }))
}

/// Common list header: (request_id, array_size, paging).
fn read_list_header(r: &FieldReader<'_>) -> Result<(u32, usize, PagingInfo), DecodeError> {
    Ok((r.u32(12)?, r.u32(16)? as usize, read_paging(r, 20)?))
}

fn decode_facility_list(dec: &Decoder, header: &FrameHeader, r: FieldReader<'_>) -> Result<TypedMessage, DecodeError> {
    let kind = match header.message_tag() {
        Some(MessageTag::VorList) => FacilityKind::Vor,
        Some(MessageTag::NdbList) => FacilityKind::Ndb,
        Some(MessageTag::WaypointList) => FacilityKind::Waypoint,
        _ => FacilityKind::Airport,
    };
    let (request_id, count, paging) = read_list_header(&r)?;
    let payload_len = r.len() - LIST_HEADER_SIZE;

    let mut list = FacilityList {
        kind,
        request_id,
        paging,
        stride: 0,
        layout_source: LayoutSource::Known,
        entries: Vec::new(),
    };

    if let Some((layout, source)) = dec.list_layout(kind.shape(), payload_len, count)? {
        list.stride = layout.stride;
        list.layout_source = source;
        list.entries.reserve_exact(count);
        for i in 0..count {
            list.entries.push(read_list_entry(&r, &layout, LIST_HEADER_SIZE + i * layout.stride)?);
        }
    }

    Ok(TypedMessage::FacilityList(list))
}

fn read_list_entry(r: &FieldReader<'_>, layout: &EntryLayout, base: usize) -> Result<ListEntry, DecodeError> {
    let at = |field: Field| base + layout.offset(field);

    let extra = match layout.shape {
        ListShape::Waypoint => EntryExtra::Waypoint {
            mag_var: r.f32(at(Field::MagVar))?,
        },
        ListShape::Ndb => EntryExtra::Ndb {
            mag_var: r.f32(at(Field::MagVar))?,
            frequency: r.u32(at(Field::Frequency))?,
        },
        ListShape::Vor => EntryExtra::Vor {
            mag_var: r.f32(at(Field::MagVar))?,
            frequency: r.u32(at(Field::Frequency))?,
            flags: r.u32(at(Field::Flags))?,
            localizer: r.f32(at(Field::Localizer))?,
            glide_latitude: r.f64(at(Field::GlideLatitude))?,
            glide_longitude: r.f64(at(Field::GlideLongitude))?,
            glide_altitude: r.f64(at(Field::GlideAltitude))?,
            glide_slope_angle: r.f32(at(Field::GlideSlopeAngle))?,
        },
        ListShape::Airport | ListShape::InputEvent => EntryExtra::None,
    };

    Ok(ListEntry {
        ident: r.c_str(at(Field::Ident), IDENT_LEN)?,
        region: r.c_str(at(Field::Region), REGION_LEN)?,
        latitude: r.f64(at(Field::Latitude))?,
        longitude: r.f64(at(Field::Longitude))?,
        altitude: r.f64(at(Field::Altitude))?,
        extra,
    })
}

fn decode_input_event_list(dec: &Decoder, _: &FrameHeader, r: FieldReader<'_>) -> Result<TypedMessage, DecodeError> {
    let (request_id, count, paging) = read_list_header(&r)?;
    let payload_len = r.len() - LIST_HEADER_SIZE;

    let mut list = InputEventList {
        request_id,
        paging,
        stride: 0,
        layout_source: LayoutSource::Known,
        entries: Vec::new(),
    };

    if let Some((layout, source)) = dec.list_layout(ListShape::InputEvent, payload_len, count)? {
        list.stride = layout.stride;
        list.layout_source = source;
        list.entries.reserve_exact(count);
        for i in 0..count {
            let base = LIST_HEADER_SIZE + i * layout.stride;
            list.entries.push(InputEventDescriptor {
                name: r.c_str(base + layout.offset(Field::NAME), INPUT_EVENT_NAME_LEN)?,
                hash: r.u64(base + layout.offset(Field::HASH))?,
                value_type: InputValueType::from_u32(r.u32(base + layout.offset(Field::VALUE_TYPE))?),
            });
        }
    }

    Ok(TypedMessage::InputEventList(list))
}

/// Value yang mengikuti field `value_type`: f64 atau C string sisa frame.
fn read_input_value(r: &FieldReader<'_>, value_type: u32, at: usize) -> Result<InputValue, DecodeError> {
    Ok(match InputValueType::from_u32(value_type) {
        InputValueType::Double => InputValue::Double(r.f64(at)?),
        InputValueType::String => InputValue::String(c_string(r.tail(at))),
        InputValueType::Other(_) => InputValue::Raw(r.tail(at).to_vec()),
    })
}

fn decode_input_event_value(_: &Decoder, _: &FrameHeader, r: FieldReader<'_>) -> Result<TypedMessage, DecodeError> {
    Ok(TypedMessage::InputEventValue(InputEventValue {
        request_id: r.u32(12)?,
        value: read_input_value(&r, r.u32(16)?, 20)?,
    }))
}

fn decode_input_event_subscription(_: &Decoder, _: &FrameHeader, r: FieldReader<'_>) -> Result<TypedMessage, DecodeError> {
    Ok(TypedMessage::InputEventSubscription(InputEventSubscription {
        hash: r.u64(12)?,
        value: read_input_value(&r, r.u32(20)?, 24)?,
    }))
}

fn decode_input_event_params(_: &Decoder, _: &FrameHeader, r: FieldReader<'_>) -> Result<TypedMessage, DecodeError> {
    Ok(TypedMessage::InputEventParams(InputEventParams {
        hash: r.u64(12)?,
        params: c_string(r.tail(20)),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encoder::FrameBuilder;
    use crate::protocol::stride::Packing;

    fn decode(bytes: &[u8]) -> Result<TypedMessage, DecodeError> {
        Decoder::default().decode(RawFrame::new(bytes))
    }

    fn lkpr(extra: EntryExtra) -> ListEntry {
        ListEntry {
            ident: "LKPR".into(),
            region: "CZE".into(),
            latitude: 50.100833,
            longitude: 14.26,
            altitude: 364.0,
            extra,
        }
    }

    #[test]
    fn test_every_table_tag_is_unique() {
        for (i, a) in DISPATCH_TABLE.iter().enumerate() {
            for b in &DISPATCH_TABLE[i + 1..] {
                assert_ne!(a.tag, b.tag);
            }
        }
    }

    const SAMPLE_EVENT: EventInfo = EventInfo {
        group_id: 3,
        event_id: 44,
        data: 0xDEAD,
    };

    fn event_frame(tag: MessageTag) -> FrameBuilder {
        FrameBuilder::new(tag).u32(SAMPLE_EVENT.group_id).u32(SAMPLE_EVENT.event_id).u32(SAMPLE_EVENT.data)
    }

    fn facility_sample(kind: FacilityKind, extra: EntryExtra) -> (Vec<u8>, TypedMessage) {
        let entries = vec![lkpr(extra)];
        let frame = FrameBuilder::facility_list(kind, Packing::Align4, 21, 1, 3, &entries);
        let expected = TypedMessage::FacilityList(FacilityList {
            kind,
            request_id: 21,
            paging: PagingInfo {
                packet_index: 1,
                total_packets: 3,
            },
            stride: EntryLayout::compute(kind.shape(), Packing::Align4).stride,
            layout_source: LayoutSource::Known,
            entries,
        });
        (frame, expected)
    }

    fn object_data_sample(tag: MessageTag) -> (Vec<u8>, TypedMessage) {
        let frame = FrameBuilder::new(tag).u32s(&[6, 1, 2, 0x10, 0, 1, 1]).f64(1013.25).finish();
        let data = ObjectData {
            request_id: 6,
            object_id: 1,
            define_id: 2,
            flags: 0x10,
            paging: PagingInfo {
                packet_index: 0,
                total_packets: 1,
            },
            define_count: 1,
            data: 1013.25f64.to_le_bytes().to_vec(),
        };
        let expected = match tag {
            MessageTag::ObjectDataByType => TypedMessage::ObjectDataByType(data),
            MessageTag::ClientData => TypedMessage::ClientData(data),
            _ => TypedMessage::ObjectData(data),
        };
        (frame, expected)
    }

    /// Frame contoh dan hasil decode yang diharapkan untuk setiap tag.
    /// Match exhaustive: tag baru wajib punya contoh di sini.
    fn sample(tag: MessageTag) -> (Vec<u8>, TypedMessage) {
        match tag {
            MessageTag::Exception => (
                FrameBuilder::new(tag).u32(7).u32(99).u32(2).finish(),
                TypedMessage::Exception(ExceptionInfo {
                    exception: 7,
                    send_id: 99,
                    index: 2,
                }),
            ),
            MessageTag::Open => (
                FrameBuilder::new(tag)
                    .c_str("Lockheed Martin Prepar3D", APP_NAME_LEN)
                    .u32s(&[5, 3, 12, 0])
                    .u32s(&[5, 0, 0, 1])
                    .u32s(&[0, 0])
                    .finish(),
                TypedMessage::Open(OpenInfo {
                    application_name: "Lockheed Martin Prepar3D".into(),
                    application_version: Version {
                        major: 5,
                        minor: 3,
                        build_major: 12,
                        build_minor: 0,
                    },
                    host_version: Version {
                        major: 5,
                        minor: 0,
                        build_major: 0,
                        build_minor: 1,
                    },
                }),
            ),
            MessageTag::Quit => (FrameBuilder::new(tag).finish(), TypedMessage::Quit),
            MessageTag::Event => (event_frame(tag).finish(), TypedMessage::Event(SAMPLE_EVENT)),
            MessageTag::ObjectAddRemove => (
                event_frame(tag).u32(4).finish(),
                TypedMessage::ObjectAddRemove(ObjectAddRemove {
                    event: SAMPLE_EVENT,
                    object_type: 4,
                }),
            ),
            MessageTag::EventFilename => (
                event_frame(tag).c_str("C:\\flights\\saved.FLT", PATH_LEN).u32(1).finish(),
                TypedMessage::EventFilename(EventFilename {
                    event: SAMPLE_EVENT,
                    file_name: "C:\\flights\\saved.FLT".into(),
                    flags: 1,
                }),
            ),
            MessageTag::EventFrame => (
                event_frame(tag).f32(59.5).f32(2.0).finish(),
                TypedMessage::EventFrame(EventFrame {
                    event: SAMPLE_EVENT,
                    frame_rate: 59.5,
                    sim_speed: 2.0,
                }),
            ),
            MessageTag::ObjectData | MessageTag::ObjectDataByType | MessageTag::ClientData => {
                object_data_sample(tag)
            }
            MessageTag::AssignedObjectId => (
                FrameBuilder::new(tag).u32(17).u32(0x0100_0002).finish(),
                TypedMessage::AssignedObjectId(AssignedObjectId {
                    request_id: 17,
                    object_id: 0x0100_0002,
                }),
            ),
            MessageTag::SystemState => (
                FrameBuilder::new(tag)
                    .u32(11)
                    .u32(1)
                    .f32(0.5)
                    .c_str("C:\\flights\\default.FLT", PATH_LEN)
                    .finish(),
                TypedMessage::SystemState(SystemState {
                    request_id: 11,
                    integer: 1,
                    float: 0.5,
                    string: "C:\\flights\\default.FLT".into(),
                }),
            ),
            MessageTag::AirportList => facility_sample(FacilityKind::Airport, EntryExtra::None),
            MessageTag::VorList => facility_sample(
                FacilityKind::Vor,
                EntryExtra::Vor {
                    mag_var: 4.5,
                    frequency: 113_600_000,
                    flags: 7,
                    localizer: 243.0,
                    glide_latitude: 50.1,
                    glide_longitude: 14.2,
                    glide_altitude: 380.0,
                    glide_slope_angle: 3.0,
                },
            ),
            MessageTag::NdbList => facility_sample(
                FacilityKind::Ndb,
                EntryExtra::Ndb {
                    mag_var: 4.5,
                    frequency: 415_000,
                },
            ),
            MessageTag::WaypointList => facility_sample(FacilityKind::Waypoint, EntryExtra::Waypoint { mag_var: -1.5 }),
            MessageTag::MultiplayerServerStarted => (
                event_frame(tag).finish(),
                TypedMessage::MultiplayerServerStarted(SAMPLE_EVENT),
            ),
            MessageTag::MultiplayerClientStarted => (
                event_frame(tag).finish(),
                TypedMessage::MultiplayerClientStarted(SAMPLE_EVENT),
            ),
            MessageTag::MultiplayerSessionEnded => (
                event_frame(tag).finish(),
                TypedMessage::MultiplayerSessionEnded(SAMPLE_EVENT),
            ),
            MessageTag::EventEx => (
                FrameBuilder::new(tag).u32(1).u32(2).u32s(&[10, 20, 30, 40, 50]).finish(),
                TypedMessage::EventEx(EventExInfo {
                    group_id: 1,
                    event_id: 2,
                    data: [10, 20, 30, 40, 50],
                }),
            ),
            MessageTag::FacilityData => (
                FrameBuilder::new(tag)
                    .u32s(&[31, 900, 899, 2, 1, 4, 12])
                    .bytes(b"LKPR\0\0\0\0")
                    .finish(),
                TypedMessage::FacilityData(FacilityData {
                    user_request_id: 31,
                    unique_request_id: 900,
                    parent_unique_request_id: 899,
                    data_type: 2,
                    is_list_item: true,
                    item_index: 4,
                    list_size: 12,
                    data: b"LKPR\0\0\0\0".to_vec(),
                }),
            ),
            MessageTag::FacilityDataEnd => (
                FrameBuilder::new(tag).u32(31).finish(),
                TypedMessage::FacilityDataEnd(FacilityDataEnd { request_id: 31 }),
            ),
            MessageTag::InputEventList => {
                let entries = vec![InputEventDescriptor {
                    name: "AS1000_PFD_SOFTKEYS_1".into(),
                    hash: 0x1234_5678_9ABC_DEF0,
                    value_type: InputValueType::Double,
                }];
                (
                    FrameBuilder::input_event_list(Packing::Align8, 5, &entries),
                    TypedMessage::InputEventList(InputEventList {
                        request_id: 5,
                        paging: PagingInfo {
                            packet_index: 0,
                            total_packets: 1,
                        },
                        stride: EntryLayout::compute(ListShape::InputEvent, Packing::Align8).stride,
                        layout_source: LayoutSource::Known,
                        entries,
                    }),
                )
            }
            MessageTag::InputEventValue => (
                FrameBuilder::new(tag).u32(8).u32(0).f64(0.75).finish(),
                TypedMessage::InputEventValue(InputEventValue {
                    request_id: 8,
                    value: InputValue::Double(0.75),
                }),
            ),
            MessageTag::InputEventSubscription => (
                FrameBuilder::new(tag).u64(99).u32(1).c_str("ON", 8).finish(),
                TypedMessage::InputEventSubscription(InputEventSubscription {
                    hash: 99,
                    value: InputValue::String("ON".into()),
                }),
            ),
            MessageTag::InputEventParams => (
                FrameBuilder::new(tag).u64(0xABCD_0001).c_str("FLOAT64;STRING", 32).finish(),
                TypedMessage::InputEventParams(InputEventParams {
                    hash: 0xABCD_0001,
                    params: "FLOAT64;STRING".into(),
                }),
            ),
        }
    }

    #[test]
    fn test_every_table_kind_decodes_all_fields() {
        for entry in DISPATCH_TABLE {
            let (frame, expected) = sample(entry.tag);
            assert!(frame.len() >= entry.min_size, "{:?}: sample below min size", entry.tag);
            assert_eq!(decode(&frame).as_ref(), Ok(&expected), "{:?}", entry.tag);
        }
    }

    #[test]
    fn test_facility_data_item_fields() {
        let (frame, _) = sample(MessageTag::FacilityData);
        let msg = decode(&frame).unwrap();
        let data = msg.as_facility_data().unwrap();
        assert!(data.is_list_item);
        assert_eq!((data.item_index, data.list_size), (4, 12));
        assert_eq!(&data.data[..4], b"LKPR");

        // is_list_item: nilai non-nol apa pun berarti true, nol berarti false
        let frame = FrameBuilder::new(MessageTag::FacilityData).u32s(&[1, 2, 0, 0, 0, 0, 0]).finish();
        let msg = decode(&frame).unwrap();
        let data = msg.as_facility_data().unwrap();
        assert!(!data.is_list_item);
        assert!(data.data.is_empty());
    }

    #[test]
    fn test_event_roundtrip() {
        let frame = FrameBuilder::new(MessageTag::Event).u32(3).u32(44).u32(0xDEAD).finish();
        let msg = decode(&frame).unwrap();
        assert_eq!(
            msg.as_event(),
            Some(&EventInfo {
                group_id: 3,
                event_id: 44,
                data: 0xDEAD
            })
        );
    }

    #[test]
    fn test_open_roundtrip() {
        let frame = FrameBuilder::new(MessageTag::Open)
            .c_str("Lockheed Martin Prepar3D", APP_NAME_LEN)
            .u32s(&[5, 3, 12, 0])
            .u32s(&[5, 0, 0, 1])
            .u32s(&[0, 0])
            .finish();
        assert_eq!(frame.len(), 308);

        let open = decode(&frame).unwrap();
        let open = open.as_open().unwrap();
        assert_eq!(open.application_name, "Lockheed Martin Prepar3D");
        assert_eq!(open.application_version.build_major, 12);
        assert_eq!(open.host_version.build_minor, 1);
    }

    #[test]
    fn test_exception_and_system_state() {
        let frame = FrameBuilder::new(MessageTag::Exception).u32(7).u32(99).u32(2).finish();
        assert_eq!(
            decode(&frame).unwrap().as_exception(),
            Some(&ExceptionInfo {
                exception: 7,
                send_id: 99,
                index: 2
            })
        );

        let frame = FrameBuilder::new(MessageTag::SystemState)
            .u32(11)
            .u32(1)
            .f32(0.5)
            .c_str("C:\\flights\\default.FLT", PATH_LEN)
            .finish();
        let msg = decode(&frame).unwrap();
        let state = msg.as_system_state().unwrap();
        assert_eq!(state.request_id, 11);
        assert_eq!(state.float, 0.5);
        assert_eq!(state.string, "C:\\flights\\default.FLT");
    }

    #[test]
    fn test_multiplayer_events_keep_their_kind() {
        let frame = event_frame(MessageTag::MultiplayerSessionEnded).finish();
        let msg = decode(&frame).unwrap();
        assert!(msg.is_multiplayer_session_ended());
        assert!(!msg.is_event());

        let frame = event_frame(MessageTag::MultiplayerServerStarted).finish();
        assert_eq!(decode(&frame).unwrap().as_multiplayer_server_started(), Some(&SAMPLE_EVENT));
        let frame = event_frame(MessageTag::MultiplayerClientStarted).finish();
        let msg = decode(&frame).unwrap();
        assert_eq!(msg.as_multiplayer_client_started(), Some(&SAMPLE_EVENT));
        assert!(!msg.is_multiplayer_server_started());
    }

    #[test]
    fn test_object_data_variants() {
        let cases: [(MessageTag, fn(&TypedMessage) -> bool); 3] = [
            (MessageTag::ObjectData, TypedMessage::is_object_data),
            (MessageTag::ObjectDataByType, TypedMessage::is_object_data_by_type),
            (MessageTag::ClientData, TypedMessage::is_client_data),
        ];
        for (tag, check) in cases {
            let frame = FrameBuilder::new(tag)
                .u32s(&[1, 2, 3, 0, 0, 1, 1])
                .f64(1013.25)
                .finish();
            let msg = decode(&frame).unwrap();
            assert!(check(&msg), "{tag:?}");
            assert_eq!(msg.request_id(), Some(1));
            assert_eq!(msg.paging().map(|p| p.total_packets), Some(1));
        }
    }

    #[test]
    fn test_object_data_payload_copied() {
        let frame = FrameBuilder::new(MessageTag::ObjectData)
            .u32s(&[4, 0, 9, 0, 0, 1, 2])
            .f64(1.25)
            .f64(-3.0)
            .finish();
        let msg = decode(&frame).unwrap();
        let data = msg.as_object_data().unwrap();
        assert_eq!(data.define_count, 2);
        assert_eq!(data.f64_at(0), Some(1.25));
        assert_eq!(data.f64_at(8), Some(-3.0));
    }

    #[test]
    fn test_frame_too_small_for_tag() {
        // Event butuh 24 bytes, declared size hanya 20
        let frame = FrameBuilder::new(MessageTag::Event).u32(1).u32(2).finish();
        assert_eq!(
            decode(&frame).unwrap_err(),
            DecodeError::FrameTooSmall {
                tag: Some(4),
                len: 20,
                min: 24
            }
        );
    }

    #[test]
    fn test_every_kind_rejects_truncation() {
        for entry in DISPATCH_TABLE.iter().filter(|e| e.min_size > HEADER_SIZE) {
            let frame = FrameBuilder::new(entry.tag).zeros(entry.min_size - HEADER_SIZE - 1).finish();
            let err = decode(&frame).unwrap_err();
            assert!(
                matches!(err, DecodeError::FrameTooSmall { min, .. } if min == entry.min_size),
                "{:?}: {err:?}",
                entry.tag
            );
        }
    }

    #[test]
    fn test_declared_size_is_authoritative() {
        // Buffer dari host lebih panjang dari declared size: sisa diabaikan
        let mut frame = FrameBuilder::new(MessageTag::FacilityDataEnd).u32(5).finish();
        frame.extend_from_slice(&[0xFF; 16]);
        assert_eq!(
            decode(&frame).unwrap().as_facility_data_end(),
            Some(&FacilityDataEnd { request_id: 5 })
        );

        let mut frame = FrameBuilder::new(MessageTag::FacilityDataEnd).u32(5).finish();
        frame[0..4].copy_from_slice(&64u32.to_le_bytes());
        assert!(matches!(
            decode(&frame),
            Err(DecodeError::DeclaredSizeExceedsFrame { declared: 64, available: 16 })
        ));
    }

    #[test]
    fn test_unknown_tag_falls_back() {
        let frame = FrameBuilder::with_raw_tag(10).u32(1).finish();
        let msg = decode(&frame).unwrap();
        let header = msg.as_unknown().unwrap();
        assert_eq!(header.tag, 10);
        assert_eq!(header.size, 16);
    }

    #[test]
    fn test_airport_list_each_packing() {
        for packing in Packing::ALL {
            let entries = vec![lkpr(EntryExtra::None), lkpr(EntryExtra::None)];
            let frame = FrameBuilder::facility_list(FacilityKind::Airport, packing, 9, 0, 1, &entries);
            let msg = decode(&frame).unwrap();
            let list = msg.as_airport_list().unwrap();
            assert_eq!(list.stride, EntryLayout::compute(ListShape::Airport, packing).stride);
            assert_eq!(list.entries, entries);
            assert_eq!(list.layout_source, LayoutSource::Known);
        }
    }

    #[test]
    fn test_navaid_lists_roundtrip() {
        let vor = lkpr(EntryExtra::Vor {
            mag_var: 4.5,
            frequency: 113_600_000,
            flags: 7,
            localizer: 243.0,
            glide_latitude: 50.1,
            glide_longitude: 14.2,
            glide_altitude: 380.0,
            glide_slope_angle: 3.0,
        });
        let ndb = lkpr(EntryExtra::Ndb {
            mag_var: 4.5,
            frequency: 415_000,
        });
        let wpt = lkpr(EntryExtra::Waypoint { mag_var: -1.5 });

        for (kind, entry) in [
            (FacilityKind::Vor, vor),
            (FacilityKind::Ndb, ndb),
            (FacilityKind::Waypoint, wpt),
        ] {
            for packing in Packing::ALL {
                let frame = FrameBuilder::facility_list(kind, packing, 1, 0, 1, &[entry.clone()]);
                let msg = decode(&frame).unwrap();
                let list = msg.as_facility_list_of(kind).unwrap();
                assert_eq!(list.entries, vec![entry.clone()], "{kind:?} {packing:?}");
            }
        }
    }

    #[test]
    fn test_empty_list() {
        let frame = FrameBuilder::facility_list(FacilityKind::Ndb, Packing::Packed, 3, 0, 1, &[]);
        let msg = decode(&frame).unwrap();
        let list = msg.as_ndb_list().unwrap();
        assert!(list.entries.is_empty());
        assert_eq!(list.stride, 0);
    }

    #[test]
    fn test_unknown_stride_rejected_by_default() {
        let frame = FrameBuilder::list_with_payload(MessageTag::AirportList, 1, 2, 0, 1, &[0u8; 88]);
        assert_eq!(
            decode(&frame).unwrap_err(),
            DecodeError::UnknownStride {
                shape: ListShape::Airport,
                stride: 44,
                count: 2
            }
        );
    }

    #[test]
    fn test_unknown_stride_best_effort() {
        let entry = lkpr(EntryExtra::None);
        let mut payload = FrameBuilder::list_entry(&entry, &EntryLayout::compute(ListShape::Airport, Packing::Align8));
        payload.extend_from_slice(&[0u8; 4]);

        let frame = FrameBuilder::list_with_payload(MessageTag::AirportList, 1, 1, 0, 1, &payload);
        let dec = Decoder::new(UnknownStridePolicy::BestEffort);
        let msg = dec.decode(RawFrame::new(&frame)).unwrap();
        let list = msg.as_airport_list().unwrap();
        assert_eq!(list.stride, 44);
        assert_eq!(list.layout_source, LayoutSource::BestEffort);
        assert_eq!(list.entries, vec![entry]);
    }

    #[test]
    fn test_stride_errors_surface_as_message() {
        let frame = FrameBuilder::list_with_payload(MessageTag::AirportList, 1, 3, 0, 1, &[0u8; 100]);
        let msg = Decoder::default().decode_or_surface(RawFrame::new(&frame)).unwrap();
        let bad = msg.as_undecodable().unwrap();
        assert_eq!(bad.header.tag, MessageTag::AirportList as u32);
        assert!(matches!(bad.error, DecodeError::IndivisibleStride { count: 3, .. }));

        // Frame terlalu kecil tetap Err
        let frame = FrameBuilder::new(MessageTag::Event).finish();
        assert!(Decoder::default().decode_or_surface(RawFrame::new(&frame)).is_err());
    }

    #[test]
    fn test_input_event_list() {
        let descriptors = vec![
            InputEventDescriptor {
                name: "AS1000_PFD_SOFTKEYS_1".into(),
                hash: 0x1234_5678_9ABC_DEF0,
                value_type: InputValueType::Double,
            },
            InputEventDescriptor {
                name: "LIGHTING_PANEL_1".into(),
                hash: 42,
                value_type: InputValueType::String,
            },
        ];
        for packing in [Packing::Packed, Packing::Align8] {
            let frame = FrameBuilder::input_event_list(packing, 5, &descriptors);
            let msg = decode(&frame).unwrap();
            assert_eq!(msg.as_input_event_list().unwrap().entries, descriptors);
        }
    }

    #[test]
    fn test_input_event_values() {
        let frame = FrameBuilder::new(MessageTag::InputEventValue).u32(8).u32(0).f64(0.75).finish();
        assert_eq!(
            decode(&frame).unwrap().as_input_event_value().map(|v| &v.value),
            Some(&InputValue::Double(0.75))
        );

        let frame = FrameBuilder::new(MessageTag::InputEventSubscription)
            .u64(99)
            .u32(1)
            .c_str("ON", 8)
            .finish();
        let msg = decode(&frame).unwrap();
        let sub = msg.as_input_event_subscription().unwrap();
        assert_eq!(sub.hash, 99);
        assert_eq!(sub.value, InputValue::String("ON".into()));

        // Double yang terpotong → error, bukan read melewati batas
        let frame = FrameBuilder::new(MessageTag::InputEventValue).u32(8).u32(0).u32(0).finish();
        assert!(matches!(decode(&frame), Err(DecodeError::FrameTooSmall { .. })));
    }

    #[test]
    fn test_event_ex_and_frame() {
        let frame = FrameBuilder::new(MessageTag::EventEx).u32(1).u32(2).u32s(&[10, 20, 30, 40, 50]).finish();
        assert_eq!(
            decode(&frame).unwrap().as_event_ex().map(|e| e.data),
            Some([10, 20, 30, 40, 50])
        );

        let frame = FrameBuilder::new(MessageTag::EventFrame).u32(1).u32(2).u32(0).f32(59.5).f32(1.0).finish();
        let msg = decode(&frame).unwrap();
        assert_eq!(msg.as_event_frame().map(|f| f.frame_rate), Some(59.5));
    }

    #[test]
    fn test_min_size_lookup() {
        assert_eq!(min_size(MessageTag::Open as u32), Some(308));
        assert_eq!(min_size(MessageTag::AirportList as u32), Some(LIST_HEADER_SIZE));
        assert_eq!(min_size(0), None);
    }
}
