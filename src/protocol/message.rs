//! Typed Message: hasil decode yang sepenuhnya owned
//!
//! Setiap varian menyalin field dari frame, tidak ada referensi ke memori
//! native host setelah decode selesai.
//!
//! Consumer mengakses union lewat predicate `is_*()` dan accessor `as_*()`
//! yang tidak pernah panic: tipe yang tidak cocok menghasilkan `false`/`None`.

use super::header::FrameHeader;
use super::stride::{LayoutSource, ListShape};
use crate::error::DecodeError;

/// Four-part version number (major, minor, build major, build minor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub build_major: u32,
    pub build_minor: u32,
}

/// Connection-opened handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenInfo {
    pub application_name: String,
    pub application_version: Version,
    pub host_version: Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionInfo {
    pub exception: u32,
    /// Send id of the request that caused the exception.
    pub send_id: u32,
    /// Parameter index at fault (`u32::MAX` when unknown).
    pub index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventInfo {
    pub group_id: u32,
    pub event_id: u32,
    pub data: u32,
}

/// Event with five parameter words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventExInfo {
    pub group_id: u32,
    pub event_id: u32,
    pub data: [u32; 5],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilename {
    pub event: EventInfo,
    pub file_name: String,
    pub flags: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventFrame {
    pub event: EventInfo,
    pub frame_rate: f32,
    pub sim_speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectAddRemove {
    pub event: EventInfo,
    pub object_type: u32,
}

/// Per-message page position inside one logical list response.
///
/// Tidak ada agregasi lintas packet di layer ini.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingInfo {
    pub packet_index: u32,
    pub total_packets: u32,
}

impl PagingInfo {
    /// True when no further packets are expected for this request.
    #[inline(always)]
    pub fn is_last(&self) -> bool {
        self.packet_index.saturating_add(1) >= self.total_packets
    }
}

/// Object / client data block. `data` holds the raw define payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectData {
    pub request_id: u32,
    pub object_id: u32,
    pub define_id: u32,
    pub flags: u32,
    pub paging: PagingInfo,
    pub define_count: u32,
    pub data: Vec<u8>,
}

impl ObjectData {
    /// Read an f64 at a byte offset of the payload, if present.
    pub fn f64_at(&self, offset: usize) -> Option<f64> {
        let raw = self.data.get(offset..offset.checked_add(8)?)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(raw);
        Some(f64::from_le_bytes(buf))
    }

    /// Read a u32 at a byte offset of the payload, if present.
    pub fn u32_at(&self, offset: usize) -> Option<u32> {
        let raw = self.data.get(offset..offset.checked_add(4)?)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(raw);
        Some(u32::from_le_bytes(buf))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignedObjectId {
    pub request_id: u32,
    pub object_id: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemState {
    pub request_id: u32,
    pub integer: u32,
    pub float: f32,
    pub string: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacilityData {
    pub user_request_id: u32,
    pub unique_request_id: u32,
    pub parent_unique_request_id: u32,
    pub data_type: u32,
    pub is_list_item: bool,
    pub item_index: u32,
    pub list_size: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacilityDataEnd {
    pub request_id: u32,
}

/// One facility entry in a list payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub ident: String,
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub extra: EntryExtra,
}

/// Shape-specific trailing fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntryExtra {
    None,
    Waypoint {
        mag_var: f32,
    },
    Ndb {
        mag_var: f32,
        frequency: u32,
    },
    Vor {
        mag_var: f32,
        frequency: u32,
        flags: u32,
        localizer: f32,
        glide_latitude: f64,
        glide_longitude: f64,
        glide_altitude: f64,
        glide_slope_angle: f32,
    },
}

/// Facility category of a list message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacilityKind {
    Airport,
    Vor,
    Ndb,
    Waypoint,
}

impl FacilityKind {
    pub fn shape(self) -> ListShape {
        match self {
            FacilityKind::Airport => ListShape::Airport,
            FacilityKind::Vor => ListShape::Vor,
            FacilityKind::Ndb => ListShape::Ndb,
            FacilityKind::Waypoint => ListShape::Waypoint,
        }
    }
}

/// One packet of a facility list response.
#[derive(Debug, Clone, PartialEq)]
pub struct FacilityList {
    pub kind: FacilityKind,
    pub request_id: u32,
    pub paging: PagingInfo,
    /// Inferred entry stride in bytes (0 for an empty list).
    pub stride: usize,
    pub layout_source: LayoutSource,
    pub entries: Vec<ListEntry>,
}

/// Value type of an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputValueType {
    Double,
    String,
    Other(u32),
}

impl InputValueType {
    pub fn from_u32(v: u32) -> Self {
        match v {
            0 => Self::Double,
            1 => Self::String,
            other => Self::Other(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Double(f64),
    String(String),
    /// Unrecognized value type; raw bytes kept.
    Raw(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEventDescriptor {
    pub name: String,
    pub hash: u64,
    pub value_type: InputValueType,
}

/// One packet of an input-event enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEventList {
    pub request_id: u32,
    pub paging: PagingInfo,
    pub stride: usize,
    pub layout_source: LayoutSource,
    pub entries: Vec<InputEventDescriptor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputEventValue {
    pub request_id: u32,
    pub value: InputValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputEventSubscription {
    pub hash: u64,
    pub value: InputValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEventParams {
    pub hash: u64,
    pub params: String,
}

/// Frame the decoder recognized but could not decode safely; surfaced so the
/// consumer can decide what to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndecodableFrame {
    pub header: FrameHeader,
    pub error: DecodeError,
}

/// Decoded message union.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedMessage {
    Open(OpenInfo),
    Quit,
    Exception(ExceptionInfo),
    Event(EventInfo),
    EventEx(EventExInfo),
    EventFilename(EventFilename),
    EventFrame(EventFrame),
    ObjectAddRemove(ObjectAddRemove),
    ObjectData(ObjectData),
    ObjectDataByType(ObjectData),
    AssignedObjectId(AssignedObjectId),
    SystemState(SystemState),
    ClientData(ObjectData),
    FacilityData(FacilityData),
    FacilityDataEnd(FacilityDataEnd),
    FacilityList(FacilityList),
    InputEventList(InputEventList),
    InputEventValue(InputEventValue),
    InputEventSubscription(InputEventSubscription),
    InputEventParams(InputEventParams),
    MultiplayerServerStarted(EventInfo),
    MultiplayerClientStarted(EventInfo),
    MultiplayerSessionEnded(EventInfo),
    /// Tag tidak dikenal: hanya header yang disimpan untuk diagnostik.
    Unknown(FrameHeader),
    Undecodable(UndecodableFrame),
}

/// Discriminant-only view of `TypedMessage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Open,
    Quit,
    Exception,
    Event,
    EventEx,
    EventFilename,
    EventFrame,
    ObjectAddRemove,
    ObjectData,
    ObjectDataByType,
    AssignedObjectId,
    SystemState,
    ClientData,
    FacilityData,
    FacilityDataEnd,
    FacilityList,
    InputEventList,
    InputEventValue,
    InputEventSubscription,
    InputEventParams,
    MultiplayerServerStarted,
    MultiplayerClientStarted,
    MultiplayerSessionEnded,
    Unknown,
    Undecodable,
}

macro_rules! accessors {
    ($($variant:ident => $is:ident, $as:ident: $ty:ty;)*) => {
        impl TypedMessage {
            $(
                #[inline(always)]
                pub fn $is(&self) -> bool {
                    matches!(self, TypedMessage::$variant(_))
                }

                #[inline(always)]
                pub fn $as(&self) -> Option<&$ty> {
                    match self {
                        TypedMessage::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            )*
        }
    };
}

accessors! {
    Open => is_open, as_open: OpenInfo;
    Exception => is_exception, as_exception: ExceptionInfo;
    Event => is_event, as_event: EventInfo;
    EventEx => is_event_ex, as_event_ex: EventExInfo;
    EventFilename => is_event_filename, as_event_filename: EventFilename;
    EventFrame => is_event_frame, as_event_frame: EventFrame;
    ObjectAddRemove => is_object_add_remove, as_object_add_remove: ObjectAddRemove;
    ObjectData => is_object_data, as_object_data: ObjectData;
    ObjectDataByType => is_object_data_by_type, as_object_data_by_type: ObjectData;
    AssignedObjectId => is_assigned_object_id, as_assigned_object_id: AssignedObjectId;
    SystemState => is_system_state, as_system_state: SystemState;
    ClientData => is_client_data, as_client_data: ObjectData;
    FacilityData => is_facility_data, as_facility_data: FacilityData;
    FacilityDataEnd => is_facility_data_end, as_facility_data_end: FacilityDataEnd;
    FacilityList => is_facility_list, as_facility_list: FacilityList;
    InputEventList => is_input_event_list, as_input_event_list: InputEventList;
    InputEventValue => is_input_event_value, as_input_event_value: InputEventValue;
    InputEventSubscription => is_input_event_subscription, as_input_event_subscription: InputEventSubscription;
    InputEventParams => is_input_event_params, as_input_event_params: InputEventParams;
    MultiplayerServerStarted => is_multiplayer_server_started, as_multiplayer_server_started: EventInfo;
    MultiplayerClientStarted => is_multiplayer_client_started, as_multiplayer_client_started: EventInfo;
    MultiplayerSessionEnded => is_multiplayer_session_ended, as_multiplayer_session_ended: EventInfo;
    Unknown => is_unknown, as_unknown: FrameHeader;
    Undecodable => is_undecodable, as_undecodable: UndecodableFrame;
}

impl TypedMessage {
    #[inline(always)]
    pub fn is_quit(&self) -> bool {
        matches!(self, TypedMessage::Quit)
    }

    /// `Some(())` for a quit notification.
    #[inline(always)]
    pub fn as_quit(&self) -> Option<()> {
        self.is_quit().then_some(())
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            TypedMessage::Open(_) => MessageKind::Open,
            TypedMessage::Quit => MessageKind::Quit,
            TypedMessage::Exception(_) => MessageKind::Exception,
            TypedMessage::Event(_) => MessageKind::Event,
            TypedMessage::EventEx(_) => MessageKind::EventEx,
            TypedMessage::EventFilename(_) => MessageKind::EventFilename,
            TypedMessage::EventFrame(_) => MessageKind::EventFrame,
            TypedMessage::ObjectAddRemove(_) => MessageKind::ObjectAddRemove,
            TypedMessage::ObjectData(_) => MessageKind::ObjectData,
            TypedMessage::ObjectDataByType(_) => MessageKind::ObjectDataByType,
            TypedMessage::AssignedObjectId(_) => MessageKind::AssignedObjectId,
            TypedMessage::SystemState(_) => MessageKind::SystemState,
            TypedMessage::ClientData(_) => MessageKind::ClientData,
            TypedMessage::FacilityData(_) => MessageKind::FacilityData,
            TypedMessage::FacilityDataEnd(_) => MessageKind::FacilityDataEnd,
            TypedMessage::FacilityList(_) => MessageKind::FacilityList,
            TypedMessage::InputEventList(_) => MessageKind::InputEventList,
            TypedMessage::InputEventValue(_) => MessageKind::InputEventValue,
            TypedMessage::InputEventSubscription(_) => MessageKind::InputEventSubscription,
            TypedMessage::InputEventParams(_) => MessageKind::InputEventParams,
            TypedMessage::MultiplayerServerStarted(_) => MessageKind::MultiplayerServerStarted,
            TypedMessage::MultiplayerClientStarted(_) => MessageKind::MultiplayerClientStarted,
            TypedMessage::MultiplayerSessionEnded(_) => MessageKind::MultiplayerSessionEnded,
            TypedMessage::Unknown(_) => MessageKind::Unknown,
            TypedMessage::Undecodable(_) => MessageKind::Undecodable,
        }
    }

    /// Facility list of the given category.
    pub fn as_facility_list_of(&self, kind: FacilityKind) -> Option<&FacilityList> {
        self.as_facility_list().filter(|l| l.kind == kind)
    }

    pub fn as_airport_list(&self) -> Option<&FacilityList> {
        self.as_facility_list_of(FacilityKind::Airport)
    }

    pub fn as_vor_list(&self) -> Option<&FacilityList> {
        self.as_facility_list_of(FacilityKind::Vor)
    }

    pub fn as_ndb_list(&self) -> Option<&FacilityList> {
        self.as_facility_list_of(FacilityKind::Ndb)
    }

    pub fn as_waypoint_list(&self) -> Option<&FacilityList> {
        self.as_facility_list_of(FacilityKind::Waypoint)
    }

    pub fn is_airport_list(&self) -> bool {
        self.as_airport_list().is_some()
    }

    pub fn is_vor_list(&self) -> bool {
        self.as_vor_list().is_some()
    }

    pub fn is_ndb_list(&self) -> bool {
        self.as_ndb_list().is_some()
    }

    pub fn is_waypoint_list(&self) -> bool {
        self.as_waypoint_list().is_some()
    }

    /// Pagination metadata for paged kinds.
    pub fn paging(&self) -> Option<PagingInfo> {
        match self {
            TypedMessage::FacilityList(l) => Some(l.paging),
            TypedMessage::InputEventList(l) => Some(l.paging),
            TypedMessage::ObjectData(d)
            | TypedMessage::ObjectDataByType(d)
            | TypedMessage::ClientData(d) => Some(d.paging),
            _ => None,
        }
    }

    /// Request id the message answers, when it carries one.
    pub fn request_id(&self) -> Option<u32> {
        match self {
            TypedMessage::ObjectData(d)
            | TypedMessage::ObjectDataByType(d)
            | TypedMessage::ClientData(d) => Some(d.request_id),
            TypedMessage::AssignedObjectId(a) => Some(a.request_id),
            TypedMessage::SystemState(s) => Some(s.request_id),
            TypedMessage::FacilityData(f) => Some(f.user_request_id),
            TypedMessage::FacilityDataEnd(f) => Some(f.request_id),
            TypedMessage::FacilityList(l) => Some(l.request_id),
            TypedMessage::InputEventList(l) => Some(l.request_id),
            TypedMessage::InputEventValue(v) => Some(v.request_id),
            _ => None,
        }
    }

    /// Last packet of a paged response (non-paged kinds: false).
    pub fn is_end_of_request(&self) -> bool {
        self.paging().is_some_and(|p| p.is_last())
    }
}
