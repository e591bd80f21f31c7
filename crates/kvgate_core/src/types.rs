//! Result payload types.

/// How a result payload is decoded before delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputEncoding {
    /// Deliver the raw bytes (the default).
    #[default]
    Bytes,
    /// Decode to text, replacing invalid UTF-8 sequences.
    Text,
}

impl OutputEncoding {
    /// Decodes `bytes` into a [`Datum`] per this encoding.
    pub fn decode(self, bytes: Vec<u8>) -> Datum {
        match self {
            OutputEncoding::Bytes => Datum::Bytes(bytes),
            OutputEncoding::Text => Datum::Text(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }
}

/// One decoded payload, either raw bytes or text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datum {
    /// Raw bytes, exactly as stored.
    Bytes(Vec<u8>),
    /// Text decoded from the stored bytes.
    Text(String),
}

impl Datum {
    /// The payload as bytes, whichever way it was decoded.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Datum::Bytes(bytes) => bytes,
            Datum::Text(text) => text.as_bytes(),
        }
    }
}

/// One delivered cursor step: the projected key and/or value.
///
/// Fields are `None` when the corresponding projection flag was disabled at
/// cursor creation, not when the element is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The key at the delivered position, if projected.
    pub key: Option<Datum>,
    /// The value at the delivered position, if projected.
    pub value: Option<Datum>,
}
