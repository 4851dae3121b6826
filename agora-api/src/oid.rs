use std::{fmt, str::FromStr};

use chrono::Utc;

use crate::Error;

/// 12-byte document identifier, written as 24 hex digits on the wire.
///
/// The first four bytes are the unix timestamp of creation, the remaining
/// eight are random. Nothing ever decodes the timestamp back out; it only
/// makes freshly minted ids sort roughly by creation time.
#[derive(
    Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd, bolero::generator::TypeGenerator,
)]
pub struct ObjectId(pub [u8; 12]);

pub const STUB_OID: ObjectId = ObjectId([0xff; 12]);

impl ObjectId {
    pub fn new() -> ObjectId {
        let mut bytes = [0; 12];
        bytes[..4].copy_from_slice(&(Utc::now().timestamp() as u32).to_be_bytes());
        bytes[4..].copy_from_slice(&rand::random::<[u8; 8]>());
        ObjectId(bytes)
    }

    pub fn stub() -> ObjectId {
        STUB_OID
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<ObjectId, Error> {
        if s.len() != 24 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidObjectId(String::from(s)));
        }
        let mut bytes = [0; 12];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = u8::from_str_radix(&s[2 * i..2 * i + 2], 16)
                .map_err(|_| Error::InvalidObjectId(String::from(s)))?;
        }
        Ok(ObjectId(bytes))
    }
}

impl serde::Serialize for ObjectId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for ObjectId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<ObjectId, D::Error> {
        struct Visitor;

        impl<'de> serde::de::Visitor<'de> for Visitor {
            type Value = ObjectId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a 24-character hex string")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<ObjectId, E> {
                v.parse()
                    .map_err(|_| E::invalid_value(serde::de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_str(Visitor)
    }
}
