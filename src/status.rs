use crate::error::AflibError;

/// Call-level outcome, numerically compatible with the hub's status codes.
///
/// Codes -1 through -5 belong to errors that never occur on the device side
/// and are not representable here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AfStatus {
    Success = 0,
    /// Bad input parameter.
    InvalidParam = -6,
    /// The hub is not available right now.
    Unavailable = -7,
}

impl AfStatus {
    pub fn code(self) -> i8 {
        self as i8
    }

    pub fn is_success(self) -> bool {
        self == AfStatus::Success
    }
}

impl TryFrom<i8> for AfStatus {
    type Error = i8;

    fn try_from(code: i8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(AfStatus::Success),
            -6 => Ok(AfStatus::InvalidParam),
            -7 => Ok(AfStatus::Unavailable),
            other => Err(other),
        }
    }
}

impl<T> From<Result<T, AflibError>> for AfStatus {
    fn from(result: Result<T, AflibError>) -> Self {
        match result {
            Ok(_) => AfStatus::Success,
            Err(err) => err.status(),
        }
    }
}
