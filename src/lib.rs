//! # A library to read TNEF files
//!
//! Provide functionality to extract the message bodies, the message class,
//! the MAPI properties and the attachments from a *Transport Neutral
//! Encapsulation Format* stream (the `winmail.dat` files produced by
//! Outlook and Exchange)
//!
//! The implementation, which is based upon
//! [\[MS-OXTNEF\]](https://docs.microsoft.com/en-us/openspecs/exchange_server_protocols/ms-oxtnef/1f0544d7-30b7-4194-b58f-adc82f3763bb), is
//! mostly focused towards malware analysis. For this reason it tries its best
//! to mimic the empirically determinated behaviour of MS products: this
//! includes accepting malformed (when not intentionally evil) content
//!
//! See [Tnef] for the main interface documentation
//!

#![warn(missing_docs)]

pub mod ioutil;
pub mod mapi;
pub mod win32;


use ioutil::*;
use mapi::{PropertyList, PropertyValue};
use serde::Serialize;
use std::fmt;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// The fixed marker every TNEF stream starts with
pub const TNEF_SIGNATURE: u32 = 0x223e9f78;

/// Message level record
pub const LVL_MESSAGE: u8 = 0x01;
/// Attachment level record
pub const LVL_ATTACHMENT: u8 = 0x02;

/// Owner
pub const ATT_OWNER: u16 = 0x0000;
/// Sent for
pub const ATT_SENT_FOR: u16 = 0x0001;
/// Delegate
pub const ATT_DELEGATE: u16 = 0x0002;
/// Date start
pub const ATT_DATE_START: u16 = 0x0006;
/// Date end
pub const ATT_DATE_END: u16 = 0x0007;
/// Owner appointment id
pub const ATT_AID_OWNER: u16 = 0x0008;
/// Response requested
pub const ATT_REQUEST_RES: u16 = 0x0009;
/// From
pub const ATT_FROM: u16 = 0x8000;
/// Subject
pub const ATT_SUBJECT: u16 = 0x8004;
/// Date sent
pub const ATT_DATE_SENT: u16 = 0x8005;
/// Date received
pub const ATT_DATE_RECD: u16 = 0x8006;
/// Message status
pub const ATT_MESSAGE_STATUS: u16 = 0x8007;
/// Message class
pub const ATT_MESSAGE_CLASS: u16 = 0x8008;
/// Message id
pub const ATT_MESSAGE_ID: u16 = 0x8009;
/// Parent id
pub const ATT_PARENT_ID: u16 = 0x800a;
/// Conversation id
pub const ATT_CONVERSATION_ID: u16 = 0x800b;
/// Body
pub const ATT_BODY: u16 = 0x800c;
/// Priority
pub const ATT_PRIORITY: u16 = 0x800d;
/// Attachment data
pub const ATT_ATTACH_DATA: u16 = 0x800f;
/// Attachment file name
pub const ATT_ATTACH_TITLE: u16 = 0x8010;
/// Attachment meta file
pub const ATT_ATTACH_META_FILE: u16 = 0x8011;
/// Attachment creation date
pub const ATT_ATTACH_CREATE_DATE: u16 = 0x8012;
/// Attachment modification date
pub const ATT_ATTACH_MODIFY_DATE: u16 = 0x8013;
/// Date modified
pub const ATT_DATE_MODIFY: u16 = 0x8020;
/// Attachment transport filename
pub const ATT_ATTACH_TRANSPORT_FILENAME: u16 = 0x9001;
/// Attachment rendering data
pub const ATT_ATTACH_REND_DATA: u16 = 0x9002;
/// Message MAPI properties
pub const ATT_MAPI_PROPS: u16 = 0x9003;
/// Recipient table
pub const ATT_RECIP_TABLE: u16 = 0x9004;
/// Attachment MAPI properties
pub const ATT_ATTACHMENT: u16 = 0x9005;
/// TNEF version
pub const ATT_TNEF_VERSION: u16 = 0x9006;
/// OEM codepage
pub const ATT_OEM_CODEPAGE: u16 = 0x9007;
/// Original message class
pub const ATT_ORIGINAL_MESSAGE_CLASS: u16 = 0x9008;

/// The error type for TNEF decoding
#[derive(Debug)]
pub enum TnefError {
    /// The data does not begin with the TNEF signature
    NoMarker,
    /// A length or element count points past the end of the available data
    Truncated,
    /// A property list cannot hold its leading count
    PropertyListTooShort,
    /// A property carries a type code outside the supported set
    UnknownTagType(u16),
    /// An IO error occurred while reading the input file
    Io(io::Error),
}

impl fmt::Display for TnefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMarker => write!(f, "Data does not begin with a TNEF marker"),
            Self::Truncated => write!(f, "Data truncated inside a TNEF structure"),
            Self::PropertyListTooShort => write!(f, "Property list too short"),
            Self::UnknownTagType(t) => write!(f, "Invalid property type {:#06x}", t),
            Self::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for TnefError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Self::Io(e) = self {
            Some(e)
        } else {
            None
        }
    }
}

impl From<io::Error> for TnefError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Self::Truncated
        } else {
            Self::Io(e)
        }
    }
}

/// A single TNEF record, in wire form
///
/// Intended for internal use but publicly exposed for research purposes and
/// low level operations
#[derive(Debug, Serialize)]
pub struct TnefRecord<'a> {
    /// The record level ([`LVL_MESSAGE`] or [`LVL_ATTACHMENT`])
    pub level: u8,
    /// The attribute id (one of the `ATT_` constants)
    pub id: u16,
    /// The attribute type
    pub data_type: u16,
    /// The record payload
    pub data: &'a [u8],
    /// The record checksum (carried, not verified)
    pub checksum: u16,
}

/// Scans the next record off the input window
///
/// Returns `None` when no whole record fits in the remaining bytes, which is
/// the regular end of stream condition; nothing is consumed in that case
pub fn next_record<'a>(input: &mut &'a [u8]) -> Option<TnefRecord<'a>> {
    let mut r: &'a [u8] = input;
    let level = rdu8(&mut r).ok()?;
    let id = rdu16le(&mut r).ok()?;
    let data_type = rdu16le(&mut r).ok()?;
    let len = into_usize(rdu32le(&mut r).ok()?).ok()?;
    if r.len() < len.checked_add(2)? {
        return None;
    }
    let data = take_bytes(&mut r, len).ok()?;
    let checksum = rdu16le(&mut r).ok()?;
    *input = r;
    Some(TnefRecord {
        level,
        id,
        data_type,
        data,
        checksum,
    })
}

/// A file attachment extracted from a TNEF stream
#[derive(Debug, Default, Serialize)]
pub struct Attachment {
    /// The attachment file name, with NUL bytes removed
    pub title: String,
    /// The raw attachment payload
    pub data: Option<Vec<u8>>,
    /// The attachment MAPI properties
    pub properties: PropertyList,
}

/// A decoded TNEF message
#[derive(Debug, Default, Serialize)]
pub struct Tnef {
    /// The legacy key following the signature
    pub key: u16,
    /// The plain text body, if present
    pub body: Option<Vec<u8>>,
    /// The HTML body, if present
    pub body_html: Option<Vec<u8>>,
    /// The message class, with trailing NULs removed
    pub message_class: Option<Vec<u8>>,
    /// The message level MAPI properties
    pub properties: PropertyList,
    /// The attachments, in stream order
    pub attachments: Vec<Attachment>,
}

impl Tnef {
    /// Decodes a TNEF stream held in memory
    ///
    /// # Errors
    /// [`NoMarker`](TnefError::NoMarker) if the data does not start with the
    /// TNEF signature; otherwise the errors of
    /// [`PropertyList::parse`](mapi::PropertyList::parse) whenever a MAPI
    /// carrying attribute is malformed
    ///
    /// Trailing garbage after the last whole record is silently ignored
    pub fn decode(data: &[u8]) -> Result<Self, TnefError> {
        let mut r = data;
        match rdu32le(&mut r) {
            Ok(sig) if sig == TNEF_SIGNATURE => {}
            _ => return Err(TnefError::NoMarker),
        }
        let key = rdu16le(&mut r)?;
        let mut tnef = Self {
            key,
            ..Self::default()
        };
        let mut current: Option<usize> = None;
        while let Some(rec) = next_record(&mut r) {
            if rec.id == ATT_OEM_CODEPAGE {
                debug!("OEM codepage attribute ignored");
            } else if rec.id == ATT_MESSAGE_CLASS {
                tnef.message_class = Some(trim_nul(rec.data).to_vec());
            } else if rec.id == ATT_ATTACH_REND_DATA {
                // Every attachment group starts with its render data attribute
                tnef.attachments.push(Attachment::default());
                current = Some(tnef.attachments.len() - 1);
            } else if rec.level == LVL_ATTACHMENT {
                if let Some(cur) = current {
                    let attachment = &mut tnef.attachments[cur];
                    match rec.id {
                        ATT_ATTACHMENT => {
                            attachment.properties = PropertyList::parse(rec.data)?;
                        }
                        ATT_ATTACH_TITLE => {
                            let bytes: Vec<u8> =
                                rec.data.iter().copied().filter(|b| *b != 0).collect();
                            attachment.title = String::from_utf8_lossy(&bytes).into_owned();
                        }
                        ATT_ATTACH_DATA => {
                            attachment.data = Some(rec.data.to_vec());
                        }
                        id => debug!("Attachment attribute {:#06x} ignored", id),
                    }
                } else {
                    debug!(
                        "Attachment attribute {:#06x} found outside an attachment group",
                        rec.id
                    );
                }
            } else if rec.id == ATT_MAPI_PROPS {
                tnef.properties = PropertyList::parse(rec.data)?;
                tnef.body = tnef
                    .properties
                    .find(mapi::TAG_BODY)
                    .and_then(value_to_bytes);
                tnef.body_html = tnef
                    .properties
                    .find(mapi::TAG_BODY_HTML)
                    .and_then(value_to_bytes);
            } else {
                debug!("Message attribute {:#06x} ignored", rec.id);
            }
        }
        Ok(tnef)
    }

    /// Reads a file into memory and decodes it as a TNEF stream
    pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<Self, TnefError> {
        let data = std::fs::read(path).map_err(TnefError::Io)?;
        Self::decode(&data)
    }

    /// Checks whether the attachment is cross referenced as `cid:` from the
    /// HTML body
    pub fn attachment_is_inline(&self, attachment: &Attachment) -> bool {
        let html = match &self.body_html {
            Some(html) if !html.is_empty() => html,
            _ => return false,
        };
        let cid = match attachment.properties.as_text(mapi::TAG_ATTACH_CONTENT_ID) {
            Some(cid) if !cid.is_empty() => cid.into_owned(),
            _ => return false,
        };
        let pattern = format!(r#"['"]\s*cid\s*:\s*{}\s*['"]"#, regex::escape(&cid));
        match regex::bytes::Regex::new(&pattern) {
            Ok(re) => re.is_match(html),
            Err(e) => {
                warn!("Failed to compile the content-id pattern: {}", e);
                false
            }
        }
    }
}

/// Extracts the raw bytes of a body carrying property
fn value_to_bytes(prop: &mapi::Property) -> Option<Vec<u8>> {
    match &prop.value {
        PropertyValue::String8(b) | PropertyValue::Binary(b) | PropertyValue::Object(b) => {
            Some(b.clone())
        }
        PropertyValue::Unicode(s) => Some(s.clone().into_bytes()),
        _ => None,
    }
}
