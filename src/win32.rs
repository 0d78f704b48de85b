//! Win32 structs and fns
use serde::{Serialize, Serializer};
use std::fmt::{self, Debug, Display};
use std::io::{self, Read};

/// A Win32 GUID
#[derive(PartialEq, Eq, Clone)]
pub struct GUID {
    data1: u32,
    data2: u16,
    data3: u16,
    data4: [u8; 8],
}

impl GUID {
    /// Create a null (all zeroes) GUID
    pub fn null() -> Self {
        Self {
            data1: 0,
            data2: 0,
            data3: 0,
            data4: [0u8; 8],
        }
    }

    /// Create a GUID from 16 raw bytes
    pub fn from_le_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != 16 {
            return None;
        }
        Some(Self {
            data1: u32::from_le_bytes(bytes[0..4].try_into().ok()?),
            data2: u16::from_le_bytes(bytes[4..6].try_into().ok()?),
            data3: u16::from_le_bytes(bytes[6..8].try_into().ok()?),
            data4: bytes[8..16].try_into().ok()?,
        })
    }

    /// Create a GUID from a [`Read`] stream
    pub fn from_le_stream<R: Read>(f: &mut R) -> Result<Self, io::Error> {
        let mut guid = [0u8; 16];
        f.read_exact(&mut guid)?;
        Self::from_le_bytes(&guid)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "Invalid GUID"))
    }

    /// Check whether the GUID is null
    pub fn is_null(&self) -> bool {
        *self == Self::null()
    }
}

impl Display for GUID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.data1,
            self.data2,
            self.data3,
            self.data4[0],
            self.data4[1],
            self.data4[2],
            self.data4[3],
            self.data4[4],
            self.data4[5],
            self.data4[6],
            self.data4[7]
        )
    }
}

impl Debug for GUID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self)
    }
}

impl Default for GUID {
    fn default() -> Self {
        Self::null()
    }
}

impl Serialize for GUID {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_string().serialize(serializer)
    }
}

/// Translates a windows FILETIME to a [datetime](time::OffsetDateTime)
///
/// Returns None if the date is out of range
pub fn filetime_to_datetime(ftime: u64) -> Option<time::OffsetDateTime> {
    let ftime = i128::from(ftime);
    let ftime = ftime.checked_sub(116444736000000000)?;
    time::OffsetDateTime::from_unix_timestamp_nanos(ftime * 100).ok()
}
