//! MAPI property lists embedded in TNEF attributes
//!
//! Intended for internal use but publicly exposed for research purposes and low
//! level operations
//!
//! The payload of the *attMsgProps* and *attAttachment* attributes is a flat
//! sequence of typed MAPI properties. Each entry carries a 16-bit property
//! type, a 16-bit property id, an optional named-property specification and a
//! value whose encoding and padding rules depend on the type. Every element is
//! aligned to a 4-byte boundary relative to its own length field.
#[cfg(test)]
mod test;

use crate::ioutil::*;
use crate::win32::{filetime_to_datetime, GUID};
use crate::TnefError;
use serde::Serialize;
use std::borrow::Cow;
use tracing::{debug, warn};

/// PidTagBody
pub const TAG_BODY: u16 = 0x1000;
/// PidTagBodyHtml
pub const TAG_BODY_HTML: u16 = 0x1013;
/// PidTagAttachContentId
pub const TAG_ATTACH_CONTENT_ID: u16 = 0x3712;
/// PidTagAttachLongFilename
pub const TAG_ATTACH_LONG_FILENAME: u16 = 0x3707;
/// PidTagAttachMimeTag
pub const TAG_ATTACH_MIME_TAG: u16 = 0x370e;
/// PidTagDisplayName
pub const TAG_DISPLAY_NAME: u16 = 0x3001;

// Property ids from this value up carry a named-property specification
const NAMED_ID_BASE: u16 = 0x8000;
// Marks the multi-value variant of the base type in the low 12 bits
const MV_FLAG: u16 = 0x1000;

/// The typed value of a MAPI property
///
/// Exactly one variant exists per supported property-type code; the
/// `Multi*` variants map the same base types with the `0x1000` bit set
#[derive(Debug, PartialEq, Serialize)]
pub enum PropertyValue {
    /// PtypNull (0x0001)
    Null,
    /// PtypInteger16 (0x0002)
    Int16(i16),
    /// PtypInteger32 (0x0003)
    Int32(i32),
    /// PtypFloating32 (0x0004)
    Float32(f32),
    /// PtypFloating64 (0x0005)
    Float64(f64),
    /// PtypCurrency (0x0006)
    Currency(i64),
    /// PtypFloatingTime (0x0007)
    AppTime(f64),
    /// PtypBoolean (0x000B)
    Bool(bool),
    /// PtypObject (0x000D)
    Object(Vec<u8>),
    /// PtypInteger64 (0x0014)
    Int64(i64),
    /// PtypString8 (0x001E), raw bytes with the trailing NUL removed
    String8(Vec<u8>),
    /// PtypString (0x001F), UTF-16LE decoded
    Unicode(String),
    /// PtypTime (0x0040), a raw FILETIME
    Time(u64),
    /// PtypGuid (0x0048)
    Clsid(GUID),
    /// PtypBinary (0x0102)
    Binary(Vec<u8>),
    /// PtypMultipleInteger16 (0x1002)
    MultiInt16(Vec<i16>),
    /// PtypMultipleInteger32 (0x1003)
    MultiInt32(Vec<i32>),
    /// PtypMultipleFloating32 (0x1004)
    MultiFloat32(Vec<f32>),
    /// PtypMultipleFloating64 (0x1005)
    MultiFloat64(Vec<f64>),
    /// PtypMultipleCurrency (0x1006)
    MultiCurrency(Vec<i64>),
    /// PtypMultipleFloatingTime (0x1007)
    MultiAppTime(Vec<f64>),
    /// PtypMultipleBoolean (0x100B)
    MultiBool(Vec<bool>),
    /// PtypMultipleObject (0x100D)
    MultiObject(Vec<Vec<u8>>),
    /// PtypMultipleInteger64 (0x1014)
    MultiInt64(Vec<i64>),
    /// PtypMultipleString8 (0x101E)
    MultiString8(Vec<Vec<u8>>),
    /// PtypMultipleString (0x101F)
    MultiUnicode(Vec<String>),
    /// PtypMultipleTime (0x1040)
    MultiTime(Vec<u64>),
    /// PtypMultipleGuid (0x1048)
    MultiClsid(Vec<GUID>),
    /// PtypMultipleBinary (0x1102)
    MultiBinary(Vec<Vec<u8>>),
}

impl PropertyValue {
    /// Return the descriptive kind of the value
    ///
    /// The kind is derived from the property-type code alone and is therefore
    /// identical for a scalar and its multi-value counterpart
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int16(_) | Self::MultiInt16(_) => "int16",
            Self::Int32(_) | Self::MultiInt32(_) => "int32",
            Self::Float32(_) | Self::MultiFloat32(_) => "float32",
            Self::Float64(_) | Self::MultiFloat64(_) | Self::AppTime(_) | Self::MultiAppTime(_) => {
                "float64"
            }
            Self::Currency(_)
            | Self::MultiCurrency(_)
            | Self::Int64(_)
            | Self::MultiInt64(_) => "int64",
            Self::Bool(_) | Self::MultiBool(_) => "bool",
            Self::Object(_) | Self::MultiObject(_) => "object",
            Self::String8(_)
            | Self::MultiString8(_)
            | Self::Unicode(_)
            | Self::MultiUnicode(_) => "string",
            Self::Time(_) | Self::MultiTime(_) => "time",
            Self::Clsid(_) | Self::MultiClsid(_) => "guid",
            Self::Binary(_) | Self::MultiBinary(_) => "binary",
        }
    }
}

/// How a named property is identified within its namespace
#[derive(Debug, PartialEq, Serialize)]
pub enum NamedId {
    /// Identified by a 32-bit number
    Number(u32),
    /// Identified by a string name
    Name(String),
}

/// The named-property specification carried by ids in the `0x8000`+ range
#[derive(Debug, PartialEq, Serialize)]
pub struct NamedProperty {
    /// The property set (namespace) GUID
    pub guid: GUID,
    /// The numeric or string identifier
    pub id: NamedId,
}

impl NamedProperty {
    fn read(r: &mut &[u8]) -> Result<Self, TnefError> {
        let guid = GUID::from_le_stream(r)?;
        let id = if rdu32le(r)? == 0 {
            NamedId::Number(rdu32le(r)?)
        } else {
            // The name is a length-prefixed UTF-16LE string; the pad is
            // computed from the declared byte length
            let len = into_usize(rdu32le(r)?)?;
            let raw = take_bytes(r, len)?;
            skip_align4(r, len);
            NamedId::Name(decode_utf16le(raw))
        };
        Ok(Self { guid, id })
    }
}

/// A single MAPI property
#[derive(Debug, PartialEq, Serialize)]
pub struct Property {
    /// The property-type code
    pub tag_type: u16,
    /// The property id
    pub tag_id: u16,
    /// The named-property specification, for ids in the `0x8000`+ range
    pub name: Option<NamedProperty>,
    /// The declared element count (1 for plain scalars)
    pub count: u32,
    /// The decoded value
    pub value: PropertyValue,
}

impl Property {
    fn read(r: &mut &[u8]) -> Result<Self, TnefError> {
        let tag_type = rdu16le(r)?;
        let tag_id = rdu16le(r)?;
        let name = if tag_id >= NAMED_ID_BASE {
            Some(NamedProperty::read(r)?)
        } else {
            None
        };
        let (count, value) = read_value(r, tag_type)?;
        Ok(Self {
            tag_type,
            tag_id,
            name,
            count,
            value,
        })
    }

    /// Return the value as an integer
    pub fn as_int(&self) -> Option<i64> {
        match self.value {
            PropertyValue::Int16(v) => Some(i64::from(v)),
            PropertyValue::Int32(v) => Some(i64::from(v)),
            PropertyValue::Int64(v) | PropertyValue::Currency(v) => Some(v),
            _ => None,
        }
    }

    /// Return the value as a float
    pub fn as_float(&self) -> Option<f64> {
        match self.value {
            PropertyValue::Float32(v) => Some(f64::from(v)),
            PropertyValue::Float64(v) | PropertyValue::AppTime(v) => Some(v),
            _ => None,
        }
    }

    /// Return the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        if let PropertyValue::Bool(v) = self.value {
            Some(v)
        } else {
            None
        }
    }

    /// Return the value as a datetime
    pub fn as_time(&self) -> Option<time::OffsetDateTime> {
        if let PropertyValue::Time(v) = self.value {
            filetime_to_datetime(v)
        } else {
            None
        }
    }

    /// Return the value as text
    ///
    /// UTF-16LE strings are borrowed as decoded; 8-bit strings are passed
    /// through lossily
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match &self.value {
            PropertyValue::Unicode(s) => Some(Cow::from(s.as_str())),
            PropertyValue::String8(b) => Some(String::from_utf8_lossy(b)),
            _ => None,
        }
    }

    /// Return the value as raw bytes
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.value {
            PropertyValue::Binary(b) | PropertyValue::Object(b) | PropertyValue::String8(b) => {
                Some(b.as_slice())
            }
            _ => None,
        }
    }
}

/// An ordered list of MAPI properties
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct PropertyList {
    /// The properties, in wire order
    pub entries: Vec<Property>,
}

impl PropertyList {
    /// Parse a property list from the payload of a TNEF attribute
    ///
    /// The payload starts with a 32-bit property count which is consumed but
    /// not trusted: decoding continues until the end of the blob is reached
    ///
    /// # Errors
    /// [`PropertyListTooShort`](TnefError::PropertyListTooShort) if the blob
    /// cannot hold the leading count,
    /// [`UnknownTagType`](TnefError::UnknownTagType) for property-type codes
    /// outside the supported set and
    /// [`Truncated`](TnefError::Truncated) whenever a declared length points
    /// past the end of the blob
    pub fn parse(data: &[u8]) -> Result<Self, TnefError> {
        if data.len() < 4 {
            return Err(TnefError::PropertyListTooShort);
        }
        let mut r = data;
        let declared = rdu32le(&mut r)?;
        let mut entries: Vec<Property> = Vec::new();
        while !r.is_empty() {
            entries.push(Property::read(&mut r)?);
        }
        if into_usize(declared).ok() != Some(entries.len()) {
            debug!(
                "Property list declares {} entries but contains {}",
                declared,
                entries.len()
            );
        }
        Ok(Self { entries })
    }

    /// Find a property by id (first match)
    pub fn find(&self, tag_id: u16) -> Option<&Property> {
        self.entries.iter().find(|p| p.tag_id == tag_id)
    }

    /// Return a property value as an integer
    pub fn as_int(&self, tag_id: u16) -> Option<i64> {
        self.find(tag_id)?.as_int()
    }

    /// Return a property value as a boolean
    pub fn as_bool(&self, tag_id: u16) -> Option<bool> {
        self.find(tag_id)?.as_bool()
    }

    /// Return a property value as a datetime
    pub fn as_time(&self, tag_id: u16) -> Option<time::OffsetDateTime> {
        self.find(tag_id)?.as_time()
    }

    /// Return a property value as text
    pub fn as_text(&self, tag_id: u16) -> Option<Cow<'_, str>> {
        self.find(tag_id)?.as_text()
    }

    /// Return a property value as raw bytes
    pub fn as_bytes(&self, tag_id: u16) -> Option<&[u8]> {
        self.find(tag_id)?.as_bytes()
    }

    /// Return the number of properties
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the list holds no properties
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reads one length-prefixed element (String8, Unicode, Object, Binary)
///
/// The element is padded to a 4-byte boundary computed from its declared
/// byte length
fn read_sized<'a>(r: &mut &'a [u8]) -> Result<&'a [u8], TnefError> {
    let len = into_usize(rdu32le(r)?)?;
    let data = take_bytes(r, len)?;
    skip_align4(r, len);
    Ok(data)
}

/// Reads the elements of a length-prefixed type and folds them back into a
/// scalar when `multi` is unset
///
/// A scalar whose leading count is not exactly 1 decodes to an empty value;
/// all declared elements are consumed either way
fn read_chunks(
    r: &mut &[u8],
    multi: bool,
    mut elem: impl FnMut(&mut &[u8]) -> Result<(), TnefError>,
) -> Result<u32, TnefError> {
    let count = rdu32le(r)?;
    if !multi && count != 1 {
        warn!("Scalar property declares {} values", count);
    }
    for _ in 0..count {
        elem(r)?;
    }
    Ok(count)
}

fn read_value(r: &mut &[u8], tag_type: u16) -> Result<(u32, PropertyValue), TnefError> {
    use PropertyValue as PV;
    if tag_type & !(MV_FLAG | 0x0fff) != 0 {
        return Err(TnefError::UnknownTagType(tag_type));
    }
    let multi = tag_type & MV_FLAG != 0;
    let res = match (tag_type & 0x0fff, multi) {
        (0x0001, false) => (1, PV::Null),
        (0x0002, false) => {
            let v = rdi16le(r)?;
            skip_align4(r, 2);
            (1, PV::Int16(v))
        }
        (0x0002, true) => {
            let count = rdu32le(r)?;
            let mut vals: Vec<i16> = Vec::new();
            for _ in 0..count {
                vals.push(rdi16le(r)?);
            }
            // one trailing pad for the whole element block
            skip_align4(r, vals.len() * 2);
            (count, PV::MultiInt16(vals))
        }
        (0x0003, false) => (1, PV::Int32(rdi32le(r)?)),
        (0x0003, true) => {
            let count = rdu32le(r)?;
            let mut vals: Vec<i32> = Vec::new();
            for _ in 0..count {
                vals.push(rdi32le(r)?);
            }
            (count, PV::MultiInt32(vals))
        }
        (0x0004, false) => (1, PV::Float32(rdf32le(r)?)),
        (0x0004, true) => {
            let count = rdu32le(r)?;
            let mut vals: Vec<f32> = Vec::new();
            for _ in 0..count {
                vals.push(rdf32le(r)?);
            }
            (count, PV::MultiFloat32(vals))
        }
        (0x0005, false) => (1, PV::Float64(rdf64le(r)?)),
        (0x0005, true) => {
            let count = rdu32le(r)?;
            let mut vals: Vec<f64> = Vec::new();
            for _ in 0..count {
                vals.push(rdf64le(r)?);
            }
            (count, PV::MultiFloat64(vals))
        }
        (0x0006, false) => (1, PV::Currency(rdi64le(r)?)),
        (0x0006, true) => {
            let count = rdu32le(r)?;
            let mut vals: Vec<i64> = Vec::new();
            for _ in 0..count {
                vals.push(rdi64le(r)?);
            }
            (count, PV::MultiCurrency(vals))
        }
        (0x0007, false) => (1, PV::AppTime(rdf64le(r)?)),
        (0x0007, true) => {
            let count = rdu32le(r)?;
            let mut vals: Vec<f64> = Vec::new();
            for _ in 0..count {
                vals.push(rdf64le(r)?);
            }
            (count, PV::MultiAppTime(vals))
        }
        (0x000b, false) => {
            let v = rdi16le(r)?;
            skip_align4(r, 2);
            (1, PV::Bool(v != 0))
        }
        (0x000b, true) => {
            let count = rdu32le(r)?;
            let mut vals: Vec<bool> = Vec::new();
            for _ in 0..count {
                vals.push(rdi16le(r)? != 0);
            }
            skip_align4(r, vals.len() * 2);
            (count, PV::MultiBool(vals))
        }
        (0x000d, false) | (0x0102, false) => {
            let mut vals: Vec<Vec<u8>> = Vec::new();
            let count = read_chunks(r, false, |r| {
                vals.push(read_sized(r)?.to_vec());
                Ok(())
            })?;
            let bytes = if vals.len() == 1 {
                vals.swap_remove(0)
            } else {
                Vec::new()
            };
            if tag_type == 0x000d {
                (count, PV::Object(bytes))
            } else {
                (count, PV::Binary(bytes))
            }
        }
        (0x000d, true) | (0x0102, true) => {
            let mut vals: Vec<Vec<u8>> = Vec::new();
            let count = read_chunks(r, true, |r| {
                vals.push(read_sized(r)?.to_vec());
                Ok(())
            })?;
            if tag_type & 0x0fff == 0x000d {
                (count, PV::MultiObject(vals))
            } else {
                (count, PV::MultiBinary(vals))
            }
        }
        (0x0014, false) => (1, PV::Int64(rdi64le(r)?)),
        (0x0014, true) => {
            let count = rdu32le(r)?;
            let mut vals: Vec<i64> = Vec::new();
            for _ in 0..count {
                vals.push(rdi64le(r)?);
            }
            (count, PV::MultiInt64(vals))
        }
        (0x001e, false) => {
            let mut vals: Vec<Vec<u8>> = Vec::new();
            let count = read_chunks(r, false, |r| {
                vals.push(trim_nul(read_sized(r)?).to_vec());
                Ok(())
            })?;
            let bytes = if vals.len() == 1 {
                vals.swap_remove(0)
            } else {
                Vec::new()
            };
            (count, PV::String8(bytes))
        }
        (0x001e, true) => {
            let mut vals: Vec<Vec<u8>> = Vec::new();
            let count = read_chunks(r, true, |r| {
                vals.push(trim_nul(read_sized(r)?).to_vec());
                Ok(())
            })?;
            (count, PV::MultiString8(vals))
        }
        (0x001f, false) => {
            let mut vals: Vec<String> = Vec::new();
            let count = read_chunks(r, false, |r| {
                vals.push(decode_unicode_elem(r)?);
                Ok(())
            })?;
            let s = if vals.len() == 1 {
                vals.swap_remove(0)
            } else {
                String::new()
            };
            (count, PV::Unicode(s))
        }
        (0x001f, true) => {
            let mut vals: Vec<String> = Vec::new();
            let count = read_chunks(r, true, |r| {
                vals.push(decode_unicode_elem(r)?);
                Ok(())
            })?;
            (count, PV::MultiUnicode(vals))
        }
        (0x0040, false) => (1, PV::Time(rdu64le(r)?)),
        (0x0040, true) => {
            let count = rdu32le(r)?;
            let mut vals: Vec<u64> = Vec::new();
            for _ in 0..count {
                vals.push(rdu64le(r)?);
            }
            (count, PV::MultiTime(vals))
        }
        (0x0048, false) => (1, PV::Clsid(GUID::from_le_stream(r)?)),
        (0x0048, true) => {
            let count = rdu32le(r)?;
            let mut vals: Vec<GUID> = Vec::new();
            for _ in 0..count {
                vals.push(GUID::from_le_stream(r)?);
            }
            (count, PV::MultiClsid(vals))
        }
        _ => return Err(TnefError::UnknownTagType(tag_type)),
    };
    Ok(res)
}

/// Decodes one UTF-16LE string element and trims its trailing NULs
fn decode_unicode_elem(r: &mut &[u8]) -> Result<String, TnefError> {
    let mut s = decode_utf16le(read_sized(r)?);
    while s.ends_with('\0') {
        s.pop();
    }
    Ok(s)
}
