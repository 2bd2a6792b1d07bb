use crate::error::AflibError;
use std::fmt;
use std::vec::Vec;

/// API will not accept attribute values larger than this.
pub const MAX_ATTRIBUTE_SIZE: usize = 255;

pub type AttributeId = u16;

/// Raw attribute value, bounded by [`MAX_ATTRIBUTE_SIZE`].
///
/// Integers use the hub's little-endian byte order. Strings are carried as
/// their UTF-8 bytes without a terminator.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct AttributeValue(Vec<u8>);

impl AttributeValue {
    pub fn new(bytes: &[u8]) -> Result<Self, AflibError> {
        Self::try_from(bytes.to_vec())
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn from_bool(value: bool) -> Self {
        Self(vec![value as u8])
    }

    pub fn from_i8(value: i8) -> Self {
        Self(value.to_le_bytes().to_vec())
    }

    pub fn from_i16(value: i16) -> Self {
        Self(value.to_le_bytes().to_vec())
    }

    pub fn from_i32(value: i32) -> Self {
        Self(value.to_le_bytes().to_vec())
    }

    pub fn from_i64(value: i64) -> Self {
        Self(value.to_le_bytes().to_vec())
    }

    pub fn from_str(value: &str) -> Result<Self, AflibError> {
        Self::new(value.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Any non-zero byte reads as `true`.
    pub fn as_bool(&self) -> Option<bool> {
        match self.0.as_slice() {
            [byte] => Some(*byte != 0),
            _ => None,
        }
    }

    pub fn as_i8(&self) -> Option<i8> {
        self.fixed::<1>().map(i8::from_le_bytes)
    }

    pub fn as_i16(&self) -> Option<i16> {
        self.fixed::<2>().map(i16::from_le_bytes)
    }

    pub fn as_i32(&self) -> Option<i32> {
        self.fixed::<4>().map(i32::from_le_bytes)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.fixed::<8>().map(i64::from_le_bytes)
    }

    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    fn fixed<const N: usize>(&self) -> Option<[u8; N]> {
        self.0.as_slice().try_into().ok()
    }
}

impl TryFrom<Vec<u8>> for AttributeValue {
    type Error = AflibError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        if bytes.len() > MAX_ATTRIBUTE_SIZE {
            return Err(AflibError::ValueTooLarge(bytes.len()));
        }
        Ok(Self(bytes))
    }
}

impl TryFrom<&[u8]> for AttributeValue {
    type Error = AflibError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::new(bytes)
    }
}

impl AsRef<[u8]> for AttributeValue {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttributeValue(")?;
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, ")")
    }
}
