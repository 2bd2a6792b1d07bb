use serde::{Deserialize, Serialize};

/// Verbosity of the library's own diagnostics, from `Off` up to `Debug4`.
///
/// Each level includes everything below it:
/// - `Debug1`: requests sent and events received
/// - `Debug2`: handshake and connection changes
/// - `Debug3`: attribute value bytes
/// - `Debug4`: raw frames
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugLevel {
    #[default]
    Off = 0,
    Debug1 = 1,
    Debug2 = 2,
    Debug3 = 3,
    Debug4 = 4,
}

impl DebugLevel {
    pub fn allows(self, level: DebugLevel) -> bool {
        level != DebugLevel::Off && self >= level
    }
}

impl TryFrom<i32> for DebugLevel {
    type Error = i32;

    fn try_from(level: i32) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(DebugLevel::Off),
            1 => Ok(DebugLevel::Debug1),
            2 => Ok(DebugLevel::Debug2),
            3 => Ok(DebugLevel::Debug3),
            4 => Ok(DebugLevel::Debug4),
            other => Err(other),
        }
    }
}
