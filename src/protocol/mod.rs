//! Protocol Layer: decoding frame biner dari native host
//!
//! Prinsip desain:
//! - Bounds-checked: tidak ada cast pointer ke struct, setiap field dibaca
//!   dengan cek batas terhadap declared size
//! - Owned output: hasil decode tidak menyimpan referensi ke frame
//! - Runtime layout: stride list payload disimpulkan dari ukuran frame

mod cursor;
mod decoder;
mod encoder;
mod header;
mod message;
mod stride;

pub use cursor::{c_string, FieldReader};
pub use decoder::{lookup, min_size, DispatchEntry, Decoder, APP_NAME_LEN, DATA_BLOCK_OFFSET, PATH_LEN};
pub use encoder::{FrameBuilder, DEFAULT_VERSION};
pub use header::{FrameHeader, MessageTag, RawFrame, HEADER_SIZE};
pub use message::{
    AssignedObjectId, EntryExtra, EventExInfo, EventFilename, EventFrame, EventInfo, ExceptionInfo,
    FacilityData, FacilityDataEnd, FacilityKind, FacilityList, InputEventDescriptor,
    InputEventList, InputEventParams, InputEventSubscription, InputEventValue, InputValue,
    InputValueType, ListEntry, MessageKind, ObjectAddRemove, ObjectData, OpenInfo, PagingInfo,
    SystemState, TypedMessage, UndecodableFrame, Version,
};
pub use stride::{
    EntryLayout, Field, FieldKind, LayoutSource, ListShape, Packing, Resolution, StrideResolver,
    IDENT_LEN, INPUT_EVENT_NAME_LEN, LIST_HEADER_SIZE, REGION_LEN,
};
